// crates/thread-guard-core/src/runtime/guard.rs
// ============================================================================
// Module: Thread-Creation Guard
// Description: Authority that blocks untrusted thread creation while installed.
// Purpose: Enforce the trusted spawn path and a one-shot authority restore.
// Dependencies: crate::{core, interfaces, runtime::slot}
// ============================================================================

//! ## Overview
//! A [`ThreadCreationGuard`] is installed into an [`AuthoritySlot`] over the
//! authority that was there before. While installed it:
//! - allows thread-group modification only for requests that present a
//!   capability from its policy and originate from the trusted entry point;
//! - allows exactly one authority reassignment, and only after the restore
//!   was armed;
//! - delegates every other request to the prior authority.
//!
//! Phases advance `Installed -> RestoreAllowed -> Uninstalled` by
//! compare-and-set only. Among racing restorers exactly one wins.
//! Security posture: fail closed; denials are surfaced, never retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Serialize;
use thiserror::Error;

use crate::core::capability::GuardPolicy;
use crate::core::group::ThreadGroup;
use crate::core::group::current_group;
use crate::core::permission::PermissionKind;
use crate::core::permission::PermissionRequest;
use crate::core::permission::SecurityViolation;
use crate::interfaces::Authority;
use crate::runtime::audit::GuardAuditEvent;
use crate::runtime::audit::GuardEventKind;
use crate::runtime::slot::AuthoritySlot;
use crate::runtime::slot::SlotError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Phase encoding: guard is active.
const PHASE_INSTALLED: u8 = 0;
/// Phase encoding: one-shot restore armed.
const PHASE_RESTORE_ALLOWED: u8 = 1;
/// Phase encoding: one-shot consumed.
const PHASE_UNINSTALLED: u8 = 2;

/// Source of guard identifiers; zero is never issued.
static NEXT_GUARD_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// SECTION: Types
// ============================================================================

/// Process-unique guard identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GuardId(u64);

impl GuardId {
    /// Allocates the next guard identifier.
    fn next() -> Self {
        Self(NEXT_GUARD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GuardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Guard lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardPhase {
    /// Guard is active; authority reassignment is denied.
    Installed,
    /// Restore is armed; the next authority reassignment is allowed.
    RestoreAllowed,
    /// Restore permission was consumed.
    Uninstalled,
}

impl GuardPhase {
    /// Decodes the atomic phase value.
    const fn from_raw(raw: u8) -> Self {
        match raw {
            PHASE_INSTALLED => Self::Installed,
            PHASE_RESTORE_ALLOWED => Self::RestoreAllowed,
            _ => Self::Uninstalled,
        }
    }
}

// ============================================================================
// SECTION: Thread-Creation Guard
// ============================================================================

/// Authority restricting thread creation to the trusted entry point.
pub struct ThreadCreationGuard {
    /// Guard identifier.
    id: GuardId,
    /// Policy the guard was installed from.
    policy: Arc<GuardPolicy>,
    /// Authority installed before this guard.
    delegate: Option<Arc<dyn Authority>>,
    /// Encoded [`GuardPhase`].
    phase: AtomicU8,
    /// Root thread group, resolved on first use.
    root_group: OnceLock<Arc<ThreadGroup>>,
}

impl ThreadCreationGuard {
    /// Installs a guard for `policy` into `slot` over the current authority.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::AlreadyInstalled`] when the slot holds an
    /// authority that cannot be replaced, or a violation when the current
    /// authority refuses the reassignment.
    pub fn install<'s>(
        slot: &'s AuthoritySlot,
        policy: &Arc<GuardPolicy>,
    ) -> Result<GuardHandle<'s>, GuardError> {
        let (prior, guard) = slot.exchange(|prior| {
            if prior.is_some_and(|prior| !prior.replaceable()) {
                return Err(GuardError::AlreadyInstalled);
            }
            let guard = Arc::new(Self::new(Arc::clone(policy), prior.cloned()));
            Ok((Some(Arc::clone(&guard) as Arc<dyn Authority>), guard))
        })?;
        guard.audit(
            GuardAuditEvent::new(GuardEventKind::Installed, guard.id, guard.policy.id())
                .with_prior(prior.as_ref().map(|prior| prior.label())),
        );
        Ok(GuardHandle {
            slot,
            guard,
            prior,
        })
    }

    /// Builds a guard delegating to `delegate`.
    fn new(policy: Arc<GuardPolicy>, delegate: Option<Arc<dyn Authority>>) -> Self {
        Self {
            id: GuardId::next(),
            policy,
            delegate,
            phase: AtomicU8::new(PHASE_INSTALLED),
            root_group: OnceLock::new(),
        }
    }

    /// Returns the guard identifier.
    #[must_use]
    pub const fn id(&self) -> GuardId {
        self.id
    }

    /// Returns the policy the guard was installed from.
    #[must_use]
    pub const fn policy(&self) -> &Arc<GuardPolicy> {
        &self.policy
    }

    /// Returns the authority this guard delegates to.
    #[must_use]
    pub const fn delegate(&self) -> Option<&Arc<dyn Authority>> {
        self.delegate.as_ref()
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> GuardPhase {
        GuardPhase::from_raw(self.phase.load(Ordering::Acquire))
    }

    /// Arms the one-shot authority restore.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityViolation::AuthorityChange`] when the restore was
    /// already armed or consumed.
    pub fn allow_authority_restore(&self) -> Result<(), SecurityViolation> {
        match self.phase.compare_exchange(
            PHASE_INSTALLED,
            PHASE_RESTORE_ALLOWED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                self.audit(GuardAuditEvent::new(
                    GuardEventKind::RestoreArmed,
                    self.id,
                    self.policy.id(),
                ));
                Ok(())
            }
            Err(_) => {
                self.audit(
                    GuardAuditEvent::new(
                        GuardEventKind::AuthorityChangeDenied,
                        self.id,
                        self.policy.id(),
                    )
                    .with_request(&PermissionRequest::reassign_authority()),
                );
                Err(SecurityViolation::AuthorityChange)
            }
        }
    }

    /// Returns the root of the thread group hierarchy, resolved from the
    /// calling thread's group on first call and cached afterwards.
    #[must_use]
    pub fn protected_group(&self) -> Arc<ThreadGroup> {
        Arc::clone(self.root_group.get_or_init(|| current_group().root()))
    }

    /// Returns true when the request presents this policy's capability from
    /// the trusted entry point.
    fn trusts(&self, request: &PermissionRequest<'_>) -> bool {
        request.capability.is_some_and(|capability| capability.issued_by(self.policy.id()))
            && request.originates_from(self.policy.trusted_entry_point())
    }

    /// Records a denial for `request`.
    fn deny(&self, kind: GuardEventKind, request: &PermissionRequest<'_>) {
        self.audit(GuardAuditEvent::new(kind, self.id, self.policy.id()).with_request(request));
    }

    /// Sends an event to the policy audit sink.
    fn audit(&self, event: GuardAuditEvent) {
        self.policy.audit().record(&event);
    }
}

impl Authority for ThreadCreationGuard {
    fn check_permission(&self, request: &PermissionRequest<'_>) -> Result<(), SecurityViolation> {
        match request.kind {
            PermissionKind::ModifyThreadGroup => {
                if self.trusts(request) {
                    return Ok(());
                }
                self.deny(GuardEventKind::ThreadModificationDenied, request);
                Err(SecurityViolation::ThreadModification)
            }
            PermissionKind::ReassignAuthority => {
                if self
                    .phase
                    .compare_exchange(
                        PHASE_RESTORE_ALLOWED,
                        PHASE_UNINSTALLED,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
                {
                    return Ok(());
                }
                self.deny(GuardEventKind::AuthorityChangeDenied, request);
                Err(SecurityViolation::AuthorityChange)
            }
            PermissionKind::Other(_) => {
                self.delegate.as_ref().map_or(Ok(()), |delegate| delegate.check_permission(request))
            }
        }
    }

    fn replaceable(&self) -> bool {
        false
    }

    fn label(&self) -> &'static str {
        "thread_creation_guard"
    }
}

impl fmt::Debug for ThreadCreationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadCreationGuard")
            .field("id", &self.id)
            .field("policy", &self.policy)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Guard Handle
// ============================================================================

/// Installation of a guard in a slot.
///
/// Dropping the handle restores the prior authority unless the one-shot
/// restore was already consumed, so the guard cannot outlive its scope. A
/// restore that fails on drop is reported to the policy audit sink.
pub struct GuardHandle<'s> {
    /// Slot the guard is installed in.
    slot: &'s AuthoritySlot,
    /// Installed guard.
    guard: Arc<ThreadCreationGuard>,
    /// Authority to put back on restore.
    prior: Option<Arc<dyn Authority>>,
}

impl GuardHandle<'_> {
    /// Returns the installed guard.
    #[must_use]
    pub const fn guard(&self) -> &Arc<ThreadCreationGuard> {
        &self.guard
    }

    /// Returns the authority that will be restored.
    #[must_use]
    pub const fn prior(&self) -> Option<&Arc<dyn Authority>> {
        self.prior.as_ref()
    }

    /// Returns the guard's protected root group.
    #[must_use]
    pub fn protected_group(&self) -> Arc<ThreadGroup> {
        self.guard.protected_group()
    }

    /// Arms the one-shot restore unless it is already armed, then puts the
    /// prior authority back, consuming the one-shot.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityViolation::AuthorityChange`] (wrapped) once the
    /// one-shot was consumed, or a slot error if the slot lock is poisoned.
    /// After a slot error the restore stays armed and may be retried.
    pub fn restore(&self) -> Result<(), GuardError> {
        if self.guard.phase() != GuardPhase::RestoreAllowed {
            self.guard.allow_authority_restore()?;
        }
        let prior = self.prior.clone();
        self.slot.exchange(|_| Ok::<_, SlotError>((prior, ())))?;
        self.guard.audit(GuardAuditEvent::new(
            GuardEventKind::Restored,
            self.guard.id,
            self.guard.policy.id(),
        ));
        Ok(())
    }
}

impl Drop for GuardHandle<'_> {
    fn drop(&mut self) {
        if self.guard.phase() == GuardPhase::Uninstalled {
            return;
        }
        if let Err(error) = self.restore() {
            self.guard.audit(
                GuardAuditEvent::new(
                    GuardEventKind::RestoreFailed,
                    self.guard.id,
                    self.guard.policy.id(),
                )
                .with_error(&error),
            );
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Guard installation and restore failures.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// The slot already holds an authority that cannot be replaced.
    #[error("authority slot already holds a guard")]
    AlreadyInstalled,
    /// An authority denied the operation.
    #[error(transparent)]
    Violation(#[from] SecurityViolation),
    /// The authority slot failed.
    #[error(transparent)]
    Slot(#[from] SlotError),
}

impl GuardError {
    /// Returns the security violation behind this error, if any.
    #[must_use]
    pub const fn violation(&self) -> Option<&SecurityViolation> {
        match self {
            Self::Violation(violation) => Some(violation),
            Self::Slot(error) => error.violation(),
            Self::AlreadyInstalled => None,
        }
    }
}
