// crates/thread-guard-core/src/runtime/mod.rs
// ============================================================================
// Module: Thread Guard Runtime
// Description: Authority slot, guard, scopes, checked spawning, and pool.
// Purpose: Enforce thread-creation restrictions for protected operations.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the decision logic. Every thread-group
//! modification made through this crate goes through [`AuthoritySlot::check`],
//! so the installed authority sees every request.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod dispatch;
pub mod guard;
pub mod pool;
pub mod scope;
pub mod slot;
pub mod spawn;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileGuardAuditSink;
pub use audit::GuardAuditEvent;
pub use audit::GuardEventKind;
pub use audit::NoopGuardAuditSink;
pub use audit::StderrGuardAuditSink;
pub use dispatch::DispatchMode;
pub use dispatch::GuardedDispatcher;
pub use guard::GuardError;
pub use guard::GuardHandle;
pub use guard::GuardId;
pub use guard::GuardPhase;
pub use guard::ThreadCreationGuard;
pub use pool::PoolError;
pub use pool::PoolOptions;
pub use pool::TRUSTED_POOL_ENTRY_POINT;
pub use pool::TrustedPool;
pub use scope::run_protected;
pub use scope::run_protected_async;
pub use slot::AuthoritySlot;
pub use slot::SlotError;
pub use spawn::SpawnContext;
pub use spawn::SpawnError;
pub use spawn::create_group;
pub use spawn::spawn_thread;
