// crates/thread-guard-core/src/lib.rs
// ============================================================================
// Module: Thread Guard Core Library
// Description: Public API surface for the thread-creation guard.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Thread Guard restricts thread creation while a protected operation runs.
//! A [`ThreadCreationGuard`] is installed into an [`AuthoritySlot`] over the
//! prior authority, lets only the trusted pool create threads, permits a
//! single authority restore afterwards, and delegates every other permission
//! check to the prior authority. [`run_protected`] scopes the guard so the
//! prior authority is restored on every exit path.
//!
//! Trust is established by capability passing: a [`GuardPolicy`] mints a
//! [`SpawnCapability`] that its owner hands to the [`TrustedPool`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::Authority;
pub use interfaces::GuardAuditSink;
pub use interfaces::PermitAllAuthority;
pub use runtime::AuthoritySlot;
pub use runtime::DispatchMode;
pub use runtime::FileGuardAuditSink;
pub use runtime::GuardAuditEvent;
pub use runtime::GuardError;
pub use runtime::GuardEventKind;
pub use runtime::GuardHandle;
pub use runtime::GuardId;
pub use runtime::GuardPhase;
pub use runtime::GuardedDispatcher;
pub use runtime::NoopGuardAuditSink;
pub use runtime::PoolError;
pub use runtime::PoolOptions;
pub use runtime::SlotError;
pub use runtime::SpawnContext;
pub use runtime::SpawnError;
pub use runtime::StderrGuardAuditSink;
pub use runtime::TRUSTED_POOL_ENTRY_POINT;
pub use runtime::ThreadCreationGuard;
pub use runtime::TrustedPool;
pub use runtime::create_group;
pub use runtime::run_protected;
pub use runtime::run_protected_async;
pub use runtime::spawn_thread;
