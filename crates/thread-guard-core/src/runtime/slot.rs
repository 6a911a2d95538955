// crates/thread-guard-core/src/runtime/slot.rs
// ============================================================================
// Module: Authority Slot
// Description: Single-slot registry holding the current process authority.
// Purpose: Make authority replacement an explicit, checked operation.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! An [`AuthoritySlot`] holds at most one [`Authority`]. Every replacement is
//! first submitted to the authority being replaced as a
//! [`PermissionKind::ReassignAuthority`](crate::PermissionKind) request, so an
//! installed guard decides when it may be removed. [`AuthoritySlot::global`]
//! is the process-wide slot; independent slots can be created for hosts that
//! scope authority more narrowly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::RwLock;

use thiserror::Error;

use crate::core::permission::PermissionRequest;
use crate::core::permission::SecurityViolation;
use crate::interfaces::Authority;

/// Process-wide authority slot.
static GLOBAL_SLOT: AuthoritySlot = AuthoritySlot::new();

// ============================================================================
// SECTION: Authority Slot
// ============================================================================

/// Single-slot registry of the current authority.
///
/// # Invariants
/// - A replacement happens only after the current authority allowed it.
/// - Authorities are called outside the read lock and inside the write lock;
///   they must not call back into the slot.
pub struct AuthoritySlot {
    /// Installed authority; `None` allows every request.
    current: RwLock<Option<Arc<dyn Authority>>>,
}

impl AuthoritySlot {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Returns the process-wide slot.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_SLOT
    }

    /// Returns the installed authority.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::Poisoned`] when the slot lock is poisoned.
    pub fn current(&self) -> Result<Option<Arc<dyn Authority>>, SlotError> {
        self.current.read().map(|current| Option::clone(&current)).map_err(|_| SlotError::Poisoned)
    }

    /// Returns true when `authority` is the installed authority.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::Poisoned`] when the slot lock is poisoned.
    pub fn holds(&self, authority: &Arc<dyn Authority>) -> Result<bool, SlotError> {
        Ok(self.current()?.is_some_and(|current| Arc::ptr_eq(&current, authority)))
    }

    /// Evaluates `request` against the installed authority; an empty slot
    /// allows everything.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] when the request is denied or the lock is poisoned.
    pub fn check(&self, request: &PermissionRequest<'_>) -> Result<(), SlotError> {
        match self.current()? {
            Some(authority) => authority.check_permission(request).map_err(SlotError::from),
            None => Ok(()),
        }
    }

    /// Replaces the installed authority and returns the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] when the installed authority refuses the
    /// reassignment or the lock is poisoned.
    pub fn replace(
        &self,
        next: Option<Arc<dyn Authority>>,
    ) -> Result<Option<Arc<dyn Authority>>, SlotError> {
        let (previous, ()) = self.exchange(|_| Ok::<_, SlotError>((next, ())))?;
        Ok(previous)
    }

    /// Replaces the installed authority with the value chosen by `select`,
    /// which sees the current authority under the write lock.
    pub(crate) fn exchange<R, E>(
        &self,
        select: impl FnOnce(Option<&Arc<dyn Authority>>) -> Result<(Option<Arc<dyn Authority>>, R), E>,
    ) -> Result<(Option<Arc<dyn Authority>>, R), E>
    where
        E: From<SlotError>,
    {
        let mut slot = self.current.write().map_err(|_| SlotError::Poisoned)?;
        let (next, output) = select(slot.as_ref())?;
        if let Some(current) = slot.as_ref() {
            current
                .check_permission(&PermissionRequest::reassign_authority())
                .map_err(SlotError::from)?;
        }
        let previous = std::mem::replace(&mut *slot, next);
        Ok((previous, output))
    }
}

impl Default for AuthoritySlot {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authority slot failures.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    /// The installed authority denied the request.
    #[error(transparent)]
    Violation(#[from] SecurityViolation),
    /// The slot lock was poisoned by a panicking writer.
    #[error("authority slot lock poisoned")]
    Poisoned,
}

impl SlotError {
    /// Returns the security violation, if this error is a denial.
    #[must_use]
    pub const fn violation(&self) -> Option<&SecurityViolation> {
        match self {
            Self::Violation(violation) => Some(violation),
            Self::Poisoned => None,
        }
    }
}
