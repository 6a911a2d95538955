// crates/thread-guard-core/src/runtime/dispatch.rs
// ============================================================================
// Module: Guarded Dispatch
// Description: Request dispatch in async or blocking mode.
// Purpose: Run blocking handlers under the guard and async handlers directly.
// Dependencies: crate::{core, runtime::scope}, serde
// ============================================================================

//! ## Overview
//! Hosts that serve requests on a blocking thread-per-request path wrap each
//! handler in a guard so handler code cannot spawn threads of its own. The
//! async mode runs handlers unguarded: the slot is process state and a guard
//! held across suspension points would apply to unrelated tasks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::core::capability::GuardPolicy;
use crate::runtime::guard::GuardError;
use crate::runtime::scope::run_protected;
use crate::runtime::scope::run_protected_async;
use crate::runtime::slot::AuthoritySlot;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Handler dispatch mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Handlers run directly without a guard.
    Async,
    /// Each handler runs inside a guard scope.
    #[default]
    Blocking,
}

/// Dispatches handlers according to a [`DispatchMode`].
pub struct GuardedDispatcher<'s> {
    /// Slot guards are installed into.
    slot: &'s AuthoritySlot,
    /// Policy for installed guards.
    policy: Arc<GuardPolicy>,
    /// Dispatch mode.
    mode: DispatchMode,
}

impl<'s> GuardedDispatcher<'s> {
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(
        slot: &'s AuthoritySlot,
        policy: Arc<GuardPolicy>,
        mode: DispatchMode,
    ) -> Self {
        Self {
            slot,
            policy,
            mode,
        }
    }

    /// Returns the dispatch mode.
    #[must_use]
    pub const fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Returns the guard policy.
    #[must_use]
    pub const fn policy(&self) -> &Arc<GuardPolicy> {
        &self.policy
    }

    /// Runs a blocking handler.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError`] when the guard cannot be installed or restored
    /// in [`DispatchMode::Blocking`].
    pub fn dispatch<T>(&self, handler: impl FnOnce() -> T) -> Result<T, GuardError> {
        match self.mode {
            DispatchMode::Blocking => run_protected(self.slot, &self.policy, handler),
            DispatchMode::Async => Ok(handler()),
        }
    }

    /// Runs an async handler; in [`DispatchMode::Blocking`] the guard stays
    /// installed until the handler's future completes or is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError`] when the guard cannot be installed or restored
    /// in [`DispatchMode::Blocking`].
    pub async fn dispatch_async<F, Fut, T>(&self, handler: F) -> Result<T, GuardError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.mode {
            DispatchMode::Blocking => run_protected_async(self.slot, &self.policy, handler).await,
            DispatchMode::Async => Ok(handler().await),
        }
    }
}
