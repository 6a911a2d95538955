// crates/thread-guard-core/src/core/permission.rs
// ============================================================================
// Module: Thread Guard Permissions
// Description: Permission requests, entry-point identities, and violations.
// Purpose: Describe what a caller asks an authority for and why it was refused.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`PermissionRequest`] is built per check and borrowed by the authority
//! evaluating it. Requests never own their origin frames or capability, so a
//! check on the allow path performs no allocation.
//! Security posture: requests are caller-supplied and untrusted; only the
//! capability carried with a request is unforgeable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::capability::SpawnCapability;

// ============================================================================
// SECTION: Entry Points
// ============================================================================

/// Identity of a call path as a `(component, method)` pair.
///
/// # Invariants
/// - Equality is exact, case-sensitive string equality on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryPoint {
    /// Component (type or module path) owning the call path.
    pub component: Cow<'static, str>,
    /// Method name within the component.
    pub method: Cow<'static, str>,
}

impl EntryPoint {
    /// Creates an entry point from owned or borrowed names.
    #[must_use]
    pub fn new(
        component: impl Into<Cow<'static, str>>,
        method: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            component: component.into(),
            method: method.into(),
        }
    }

    /// Creates an entry point from static names without allocating.
    #[must_use]
    pub const fn from_static(component: &'static str, method: &'static str) -> Self {
        Self {
            component: Cow::Borrowed(component),
            method: Cow::Borrowed(method),
        }
    }

    /// Returns the component name.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Returns the method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.component, self.method)
    }
}

// ============================================================================
// SECTION: Permission Requests
// ============================================================================

/// Kind of permission being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionKind<'a> {
    /// Create a thread or thread group, or otherwise modify a thread group.
    ModifyThreadGroup,
    /// Replace the authority installed in an authority slot.
    ReassignAuthority,
    /// Any other named permission; evaluated by the delegate authority.
    Other(&'a str),
}

impl PermissionKind<'_> {
    /// Returns a stable label for audit output.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::ModifyThreadGroup => "modify_thread_group",
            Self::ReassignAuthority => "reassign_authority",
            Self::Other(name) => *name,
        }
    }
}

/// Transient permission request evaluated by an [`Authority`](crate::Authority).
///
/// # Invariants
/// - `origin` is ordered innermost frame first.
#[derive(Debug, Clone, Copy)]
pub struct PermissionRequest<'a> {
    /// Requested permission.
    pub kind: PermissionKind<'a>,
    /// Frames the caller declares it is executing under.
    pub origin: &'a [EntryPoint],
    /// Capability presented with the request, if any.
    pub capability: Option<&'a SpawnCapability>,
}

impl<'a> PermissionRequest<'a> {
    /// Builds a thread-group modification request.
    #[must_use]
    pub const fn modify_thread_group(
        origin: &'a [EntryPoint],
        capability: Option<&'a SpawnCapability>,
    ) -> Self {
        Self {
            kind: PermissionKind::ModifyThreadGroup,
            origin,
            capability,
        }
    }

    /// Builds an authority reassignment request.
    #[must_use]
    pub const fn reassign_authority() -> Self {
        Self {
            kind: PermissionKind::ReassignAuthority,
            origin: &[],
            capability: None,
        }
    }

    /// Builds a request for an arbitrary named permission.
    #[must_use]
    pub const fn other(name: &'a str) -> Self {
        Self {
            kind: PermissionKind::Other(name),
            origin: &[],
            capability: None,
        }
    }

    /// Returns true when `entry_point` appears in the origin frames.
    #[must_use]
    pub fn originates_from(&self, entry_point: &EntryPoint) -> bool {
        self.origin.iter().any(|frame| frame == entry_point)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Permission denial raised by an authority.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityViolation {
    /// Thread or thread-group modification outside the trusted entry point.
    #[error("thread modification not allowed")]
    ThreadModification,
    /// Authority reassignment before the restore was armed, or a repeat.
    #[error("authority change not allowed")]
    AuthorityChange,
    /// Denial raised by a delegated authority.
    #[error("permission denied: {0}")]
    Denied(Cow<'static, str>),
}

impl SecurityViolation {
    /// Returns the denial reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::ThreadModification => "thread modification not allowed",
            Self::AuthorityChange => "authority change not allowed",
            Self::Denied(reason) => reason,
        }
    }
}
