// crates/thread-guard-core/src/runtime/audit.rs
// ============================================================================
// Module: Thread Guard Audit Logging
// Description: Structured audit events for guard lifecycle and denials.
// Purpose: Emit JSON-lines audit records without hard logging dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Guards report installation, restore, and every denial through a
//! [`GuardAuditSink`]. Events are plain `serde` payloads so deployments can
//! route them to their preferred pipeline. A failing sink never changes a
//! permission decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::capability::PolicyId;
use crate::core::permission::PermissionRequest;
use crate::interfaces::GuardAuditSink;
use crate::runtime::guard::GuardId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Guard event classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardEventKind {
    /// Guard replaced the prior authority.
    Installed,
    /// Thread-group modification was refused.
    ThreadModificationDenied,
    /// Authority reassignment was refused.
    AuthorityChangeDenied,
    /// One-shot restore permission was armed.
    RestoreArmed,
    /// Prior authority was put back in the slot.
    Restored,
    /// Dropping a guard handle failed to put the prior authority back.
    RestoreFailed,
}

/// Guard audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct GuardAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event classification.
    pub kind: GuardEventKind,
    /// Guard that produced the event.
    pub guard_id: GuardId,
    /// Policy the guard was installed from.
    pub policy_id: PolicyId,
    /// Permission label for denial events.
    pub permission: Option<String>,
    /// Declared origin frames for denial events, innermost first.
    pub origin: Vec<String>,
    /// Label of the authority the guard delegates to, if any.
    pub prior_authority: Option<&'static str>,
    /// Failure description for `restore_failed` events.
    pub error: Option<String>,
}

impl GuardAuditEvent {
    /// Creates a lifecycle event.
    #[must_use]
    pub fn new(kind: GuardEventKind, guard_id: GuardId, policy_id: PolicyId) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "thread_guard",
            timestamp_ms,
            kind,
            guard_id,
            policy_id,
            permission: None,
            origin: Vec::new(),
            prior_authority: None,
            error: None,
        }
    }

    /// Attaches the request that triggered a denial.
    #[must_use]
    pub fn with_request(mut self, request: &PermissionRequest<'_>) -> Self {
        self.permission = Some(request.kind.label().to_string());
        self.origin = request.origin.iter().map(ToString::to_string).collect();
        self
    }

    /// Attaches a failure description.
    #[must_use]
    pub fn with_error(mut self, error: &impl std::fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Attaches the prior authority label.
    #[must_use]
    pub const fn with_prior(mut self, prior: Option<&'static str>) -> Self {
        self.prior_authority = prior;
        self
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct StderrGuardAuditSink;

impl GuardAuditSink for StderrGuardAuditSink {
    fn record(&self, event: &GuardAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileGuardAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileGuardAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl GuardAuditSink for FileGuardAuditSink {
    fn record(&self, event: &GuardAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopGuardAuditSink;

impl GuardAuditSink for NoopGuardAuditSink {
    fn record(&self, _event: &GuardAuditEvent) {}
}
