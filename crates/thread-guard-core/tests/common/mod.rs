// crates/thread-guard-core/tests/common/mod.rs
// =============================================================================
// Module: Thread Guard Test Helpers
// Description: Shared authorities and audit sinks for guard tests.
// Purpose: Reduce duplication across integration tests for thread-guard-core.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::sync::Arc;
use std::sync::Mutex;

use thread_guard_core::Authority;
use thread_guard_core::AuthoritySlot;
use thread_guard_core::GuardAuditEvent;
use thread_guard_core::GuardAuditSink;
use thread_guard_core::GuardEventKind;
use thread_guard_core::GuardPolicy;
use thread_guard_core::PermissionKind;
use thread_guard_core::PermissionRequest;
use thread_guard_core::SecurityViolation;
use thread_guard_core::TRUSTED_POOL_ENTRY_POINT;

/// Permission name the recording authority refuses.
pub const DENIED_PERMISSION: &str = "deny-me";

/// Authority that records permission labels and denies [`DENIED_PERMISSION`].
#[derive(Default)]
pub struct RecordingAuthority {
    pub checks: Mutex<Vec<String>>,
}

impl RecordingAuthority {
    pub fn checks(&self) -> Vec<String> {
        self.checks.lock().expect("checks lock").clone()
    }
}

impl Authority for RecordingAuthority {
    fn check_permission(&self, request: &PermissionRequest<'_>) -> Result<(), SecurityViolation> {
        self.checks.lock().expect("checks lock").push(request.kind.label().to_string());
        match request.kind {
            PermissionKind::Other(DENIED_PERMISSION) => {
                Err(SecurityViolation::Denied("recording authority refused".into()))
            }
            _ => Ok(()),
        }
    }

    fn label(&self) -> &'static str {
        "recording"
    }
}

/// Authority that refuses to be replaced.
pub struct LockedAuthority;

impl Authority for LockedAuthority {
    fn check_permission(&self, request: &PermissionRequest<'_>) -> Result<(), SecurityViolation> {
        match request.kind {
            PermissionKind::ReassignAuthority => {
                Err(SecurityViolation::Denied("locked authority".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Audit sink that keeps events in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    pub events: Mutex<Vec<GuardAuditEvent>>,
}

impl RecordingAuditSink {
    pub fn kinds(&self) -> Vec<GuardEventKind> {
        self.events.lock().expect("events lock").iter().map(|event| event.kind).collect()
    }

    pub fn events(&self) -> Vec<GuardAuditEvent> {
        self.events.lock().expect("events lock").clone()
    }
}

impl GuardAuditSink for RecordingAuditSink {
    fn record(&self, event: &GuardAuditEvent) {
        self.events.lock().expect("events lock").push(event.clone());
    }
}

/// Returns a policy trusting the trusted pool entry point.
pub fn pool_policy() -> Arc<GuardPolicy> {
    GuardPolicy::new(TRUSTED_POOL_ENTRY_POINT.clone())
}

/// Returns a slot holding `prior`.
pub fn slot_with(prior: Arc<dyn Authority>) -> AuthoritySlot {
    let slot = AuthoritySlot::new();
    slot.replace(Some(prior)).expect("empty slot accepts authority");
    slot
}

/// Returns the label of the slot's current authority.
pub fn current_label(slot: &AuthoritySlot) -> Option<&'static str> {
    slot.current().expect("slot lock").map(|authority| authority.label())
}
