// crates/thread-guard-core/src/interfaces/mod.rs
// ============================================================================
// Module: Thread Guard Interfaces
// Description: Authority and audit contracts used by the guard runtime.
// Purpose: Define the seams hosts plug their own authorities and sinks into.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! An [`Authority`] answers permission requests for an authority slot. The
//! thread-creation guard is one authority; whatever was installed before it
//! becomes its delegate. Implementations must be synchronous, must not block,
//! and must not call back into the slot that is consulting them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::permission::PermissionRequest;
use crate::core::permission::SecurityViolation;
use crate::runtime::audit::GuardAuditEvent;

// ============================================================================
// SECTION: Authority
// ============================================================================

/// Process authority granting or denying permission requests.
pub trait Authority: Send + Sync {
    /// Evaluates a permission request.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityViolation`] when the request is denied.
    fn check_permission(&self, request: &PermissionRequest<'_>) -> Result<(), SecurityViolation>;

    /// Returns true when a guard may be installed over this authority.
    fn replaceable(&self) -> bool {
        true
    }

    /// Returns a stable label for audit output.
    fn label(&self) -> &'static str {
        "authority"
    }
}

/// Authority that allows every request.
///
/// # Invariants
/// - Always allows, including authority reassignment.
pub struct PermitAllAuthority;

impl Authority for PermitAllAuthority {
    fn check_permission(&self, _request: &PermissionRequest<'_>) -> Result<(), SecurityViolation> {
        Ok(())
    }

    fn label(&self) -> &'static str {
        "permit_all"
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink for guard events.
///
/// Sinks must not fail the caller; write errors are dropped.
pub trait GuardAuditSink: Send + Sync {
    /// Records a guard event.
    fn record(&self, event: &GuardAuditEvent);
}
