// crates/thread-guard-core/src/runtime/scope.rs
// ============================================================================
// Module: Protected Scopes
// Description: Scoped acquisition of a thread-creation guard.
// Purpose: Run an operation under the guard and always restore the prior authority.
// Dependencies: crate::{core, runtime::guard, runtime::slot}
// ============================================================================

//! ## Overview
//! [`run_protected`] and [`run_protected_async`] install a guard, run the
//! operation, and restore the prior authority on every exit path: normal
//! return, error values returned by the operation, panic unwinding, and
//! cancellation of the future (the
//! [`GuardHandle`](crate::GuardHandle) restores on drop).
//!
//! The slot is process state: while an async operation is suspended, other
//! tasks sharing the slot are also subject to the guard.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use crate::core::capability::GuardPolicy;
use crate::runtime::guard::GuardError;
use crate::runtime::guard::ThreadCreationGuard;
use crate::runtime::slot::AuthoritySlot;

// ============================================================================
// SECTION: Scoped Acquisition
// ============================================================================

/// Runs `operation` with a guard for `policy` installed in `slot`.
///
/// # Errors
///
/// Returns [`GuardError`] when the guard cannot be installed or restored.
/// The operation's own output, including any error it returns, is passed
/// through in `Ok`.
pub fn run_protected<T>(
    slot: &AuthoritySlot,
    policy: &Arc<GuardPolicy>,
    operation: impl FnOnce() -> T,
) -> Result<T, GuardError> {
    let handle = ThreadCreationGuard::install(slot, policy)?;
    let output = operation();
    handle.restore()?;
    Ok(output)
}

/// Awaits the future built by `operation` with a guard for `policy`
/// installed in `slot`.
///
/// # Errors
///
/// Returns [`GuardError`] when the guard cannot be installed or restored.
pub async fn run_protected_async<F, Fut, T>(
    slot: &AuthoritySlot,
    policy: &Arc<GuardPolicy>,
    operation: F,
) -> Result<T, GuardError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let handle = ThreadCreationGuard::install(slot, policy)?;
    let output = operation().await;
    handle.restore()?;
    Ok(output)
}
