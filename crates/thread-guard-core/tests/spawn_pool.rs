// crates/thread-guard-core/tests/spawn_pool.rs
// ============================================================================
// Module: Checked Spawn and Trusted Pool Tests
// Description: Thread and group creation through the authority slot.
// Purpose: Ensure only the trusted pool creates threads while guarded.
// Dependencies: thread-guard-core
// ============================================================================
//! ## Overview
//! Checked spawning must consult the slot before creating threads or groups,
//! spawned threads must join the spawner's group, and the trusted pool must
//! be the only creator that gets through an installed guard.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;
use std::sync::mpsc;

use common::pool_policy;
use thread_guard_core::AuthoritySlot;
use thread_guard_core::EntryPoint;
use thread_guard_core::GuardPolicy;
use thread_guard_core::PoolError;
use thread_guard_core::PoolOptions;
use thread_guard_core::SecurityViolation;
use thread_guard_core::SpawnContext;
use thread_guard_core::SpawnError;
use thread_guard_core::TRUSTED_POOL_ENTRY_POINT;
use thread_guard_core::ThreadCreationGuard;
use thread_guard_core::ThreadGroup;
use thread_guard_core::TrustedPool;
use thread_guard_core::create_group;
use thread_guard_core::current_group;
use thread_guard_core::enter_group;
use thread_guard_core::main_group;
use thread_guard_core::spawn_thread;

/// Verifies spawning is unrestricted when the slot is empty.
#[test]
fn spawn_allowed_without_authority() {
    let slot = AuthoritySlot::new();
    let worker = spawn_thread(&slot, SpawnContext::untrusted(), "free", || 41 + 1).unwrap();
    assert_eq!(worker.join().unwrap(), 42);
}

/// Verifies untrusted spawning is refused under a guard.
#[test]
fn untrusted_spawn_denied_under_guard() {
    let slot = AuthoritySlot::new();
    let policy = pool_policy();
    let _handle = ThreadCreationGuard::install(&slot, &policy).unwrap();

    let error = spawn_thread(&slot, SpawnContext::untrusted(), "rogue", || ()).unwrap_err();
    assert_eq!(error.violation(), Some(&SecurityViolation::ThreadModification));
}

/// Verifies a trusted context spawns under a guard.
#[test]
fn trusted_spawn_allowed_under_guard() {
    let slot = AuthoritySlot::new();
    let policy = pool_policy();
    let _handle = ThreadCreationGuard::install(&slot, &policy).unwrap();
    let capability = policy.grant_spawn_capability();
    let origin = [TRUSTED_POOL_ENTRY_POINT.clone()];

    let worker =
        spawn_thread(&slot, SpawnContext::new(&origin, Some(&capability)), "trusted", || "ok")
            .unwrap();
    assert_eq!(worker.join().unwrap(), "ok");
}

/// Verifies NUL bytes in thread names are rejected before spawning.
#[test]
fn spawn_rejects_nul_in_name() {
    let slot = AuthoritySlot::new();
    let error = spawn_thread(&slot, SpawnContext::untrusted(), "bad\0name", || ()).unwrap_err();
    assert_eq!(error, SpawnError::InvalidName);
}

/// Verifies spawned threads join the spawner's group.
#[test]
fn spawned_thread_inherits_group() {
    let slot = AuthoritySlot::new();
    let group = create_group(&slot, SpawnContext::untrusted(), main_group(), "requests").unwrap();
    let expected = group.id();
    let _membership = enter_group(group);

    let worker =
        spawn_thread(&slot, SpawnContext::untrusted(), "member", || current_group().id()).unwrap();
    assert_eq!(worker.join().unwrap(), expected);
}

/// Verifies group creation follows the same rule as thread creation.
#[test]
fn group_creation_checked_under_guard() {
    let slot = AuthoritySlot::new();
    let policy = pool_policy();
    let _handle = ThreadCreationGuard::install(&slot, &policy).unwrap();
    let parent = ThreadGroup::detached_root("parent");

    let error = create_group(&slot, SpawnContext::untrusted(), &parent, "child").unwrap_err();
    assert_eq!(error.violation(), Some(&SecurityViolation::ThreadModification));

    let capability = policy.grant_spawn_capability();
    let origin = [TRUSTED_POOL_ENTRY_POINT.clone()];
    let child =
        create_group(&slot, SpawnContext::new(&origin, Some(&capability)), &parent, "child")
            .unwrap();
    assert!(child.parent().is_some_and(|found| Arc::ptr_eq(found, &parent)));
    assert!(parent.is_ancestor_of(&child));
    assert!(!child.is_ancestor_of(&parent));
}

/// Verifies the trusted pool runs jobs under a guard.
#[test]
fn trusted_pool_runs_jobs_under_guard() {
    let slot = AuthoritySlot::new();
    let policy = pool_policy();
    let _handle = ThreadCreationGuard::install(&slot, &policy).unwrap();
    let options = PoolOptions {
        max_threads: 2,
        name_prefix: "test-pool".to_string(),
    };
    let mut pool = TrustedPool::new(&slot, policy.grant_spawn_capability(), options);
    let (sender, receiver) = mpsc::channel();

    for value in 0 .. 5 {
        let sender = sender.clone();
        pool.execute(move || {
            sender.send(value).unwrap();
        })
        .unwrap();
    }
    drop(sender);
    assert_eq!(pool.worker_count(), 2);
    pool.join().unwrap();

    let mut values: Vec<i32> = receiver.iter().collect();
    values.sort_unstable();
    assert_eq!(values, vec![0, 1, 2, 3, 4]);
}

/// Verifies worker names carry the configured prefix.
#[test]
fn trusted_pool_names_workers() {
    let slot = AuthoritySlot::new();
    let policy = pool_policy();
    let options = PoolOptions {
        max_threads: 1,
        name_prefix: "named".to_string(),
    };
    let mut pool = TrustedPool::new(&slot, policy.grant_spawn_capability(), options);
    let (sender, receiver) = mpsc::channel();

    pool.execute(move || {
        let name = std::thread::current().name().map(ToString::to_string);
        sender.send(name).unwrap();
    })
    .unwrap();
    assert_eq!(receiver.recv().unwrap(), Some("named-0".to_string()));
    pool.join().unwrap();
}

/// Verifies a pool holding a foreign capability cannot grow under a guard.
#[test]
fn pool_with_foreign_capability_is_denied() {
    let slot = AuthoritySlot::new();
    let policy = pool_policy();
    let foreign = pool_policy();
    let _handle = ThreadCreationGuard::install(&slot, &policy).unwrap();
    let mut pool =
        TrustedPool::new(&slot, foreign.grant_spawn_capability(), PoolOptions::default());

    let error = pool.execute(|| ()).unwrap_err();
    assert!(matches!(
        error,
        PoolError::Spawn(ref spawn) if spawn.violation() == Some(&SecurityViolation::ThreadModification)
    ));
    assert_eq!(pool.worker_count(), 0);
}

/// Verifies the pool is refused when the policy trusts a different entry point.
#[test]
fn pool_denied_when_policy_trusts_other_entry_point() {
    let slot = AuthoritySlot::new();
    let policy = GuardPolicy::new(EntryPoint::from_static("server::Acceptor", "spawn_worker"));
    let _handle = ThreadCreationGuard::install(&slot, &policy).unwrap();
    let mut pool = TrustedPool::new(&slot, policy.grant_spawn_capability(), PoolOptions::default());

    assert!(matches!(pool.execute(|| ()), Err(PoolError::Spawn(_))));
}

/// Verifies a panicking job is reported on join.
#[test]
fn pool_reports_panicked_worker() {
    let slot = AuthoritySlot::new();
    let policy = pool_policy();
    let options = PoolOptions {
        max_threads: 1,
        name_prefix: "panicky".to_string(),
    };
    let mut pool = TrustedPool::new(&slot, policy.grant_spawn_capability(), options);

    pool.execute(|| panic!("job failure")).unwrap();
    assert_eq!(pool.join(), Err(PoolError::WorkerPanicked(1)));
}

/// Verifies a pool that may not create workers refuses jobs.
#[test]
fn pool_without_workers_rejects_jobs() {
    let slot = AuthoritySlot::new();
    let policy = pool_policy();
    let options = PoolOptions {
        max_threads: 0,
        name_prefix: "empty".to_string(),
    };
    let mut pool = TrustedPool::new(&slot, policy.grant_spawn_capability(), options);
    let (sender, receiver) = mpsc::channel();

    let error = pool.execute(move || sender.send(()).unwrap()).unwrap_err();
    assert_eq!(error, PoolError::NoWorkers);
    assert_eq!(pool.worker_count(), 0);
    pool.join().unwrap();
    assert!(receiver.recv().is_err());
}
