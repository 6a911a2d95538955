// crates/thread-guard-core/src/runtime/spawn.rs
// ============================================================================
// Module: Checked Spawning
// Description: Thread and thread-group creation gated by the authority slot.
// Purpose: Route every thread-group modification through a permission check.
// Dependencies: crate::{core, runtime::slot}
// ============================================================================

//! ## Overview
//! [`spawn_thread`] and [`create_group`] submit a
//! [`PermissionKind::ModifyThreadGroup`](crate::PermissionKind) request to the
//! slot before touching any thread state. Spawned threads join the spawner's
//! current group.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use thiserror::Error;

use crate::core::capability::SpawnCapability;
use crate::core::group::ThreadGroup;
use crate::core::group::current_group;
use crate::core::group::enter_group;
use crate::core::permission::EntryPoint;
use crate::core::permission::PermissionRequest;
use crate::core::permission::SecurityViolation;
use crate::runtime::slot::AuthoritySlot;
use crate::runtime::slot::SlotError;

// ============================================================================
// SECTION: Spawn Context
// ============================================================================

/// Caller identity presented with a spawn request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnContext<'a> {
    /// Declared origin frames, innermost first.
    pub origin: &'a [EntryPoint],
    /// Capability presented by the caller.
    pub capability: Option<&'a SpawnCapability>,
}

impl<'a> SpawnContext<'a> {
    /// Context with no origin frames and no capability.
    #[must_use]
    pub const fn untrusted() -> Self {
        Self {
            origin: &[],
            capability: None,
        }
    }

    /// Context with explicit origin frames and capability.
    #[must_use]
    pub const fn new(origin: &'a [EntryPoint], capability: Option<&'a SpawnCapability>) -> Self {
        Self {
            origin,
            capability,
        }
    }

    /// Builds the permission request for this context.
    const fn request(&self) -> PermissionRequest<'a> {
        PermissionRequest::modify_thread_group(self.origin, self.capability)
    }
}

// ============================================================================
// SECTION: Checked Operations
// ============================================================================

/// Spawns a named thread after the slot allows a thread-group modification.
///
/// # Errors
///
/// Returns [`SpawnError`] when the request is denied, the name is invalid,
/// or the operating system refuses the thread.
pub fn spawn_thread<F, T>(
    slot: &AuthoritySlot,
    context: SpawnContext<'_>,
    name: impl Into<String>,
    task: F,
) -> Result<JoinHandle<T>, SpawnError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let name = name.into();
    if name.contains('\0') {
        return Err(SpawnError::InvalidName);
    }
    slot.check(&context.request())?;
    let group = current_group();
    thread::Builder::new()
        .name(name)
        .spawn(move || {
            let _membership = enter_group(group);
            task()
        })
        .map_err(|err| SpawnError::Io(err.to_string()))
}

/// Creates a child of `parent` after the slot allows a thread-group
/// modification.
///
/// # Errors
///
/// Returns [`SpawnError`] when the request is denied.
pub fn create_group(
    slot: &AuthoritySlot,
    context: SpawnContext<'_>,
    parent: &Arc<ThreadGroup>,
    name: impl Into<String>,
) -> Result<Arc<ThreadGroup>, SpawnError> {
    slot.check(&context.request())?;
    Ok(ThreadGroup::child_of(parent, name))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Checked spawn failures.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// The authority slot denied the request or failed.
    #[error(transparent)]
    Slot(#[from] SlotError),
    /// Thread names must not contain NUL bytes.
    #[error("thread name contains a NUL byte")]
    InvalidName,
    /// The operating system refused to create the thread.
    #[error("thread spawn failed: {0}")]
    Io(String),
}

impl SpawnError {
    /// Returns the security violation behind this error, if any.
    #[must_use]
    pub const fn violation(&self) -> Option<&SecurityViolation> {
        match self {
            Self::Slot(error) => error.violation(),
            Self::InvalidName | Self::Io(_) => None,
        }
    }
}
