// crates/thread-guard-core/src/core/capability.rs
// ============================================================================
// Module: Thread Guard Capabilities
// Description: Guard policies and the spawn capabilities they mint.
// Purpose: Authorize thread creation by explicit token instead of caller inspection.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`GuardPolicy`] names the one entry point allowed to create threads while
//! a guard is installed and mints [`SpawnCapability`] tokens for it. Tokens
//! have no public constructor: the only way to obtain one is from the policy
//! owner, who hands it to the trusted pool.
//! Security posture: a token proves it was granted by a policy; it does not
//! prove which code is presenting it. The origin frame check narrows that.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Serialize;

use crate::core::permission::EntryPoint;
use crate::interfaces::GuardAuditSink;
use crate::runtime::audit::NoopGuardAuditSink;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Source of policy identifiers; zero is never issued.
static NEXT_POLICY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique guard policy identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PolicyId(u64);

impl PolicyId {
    /// Allocates the next policy identifier.
    fn next() -> Self {
        Self(NEXT_POLICY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Guard Policy
// ============================================================================

/// Trust configuration shared by every guard installed from it.
pub struct GuardPolicy {
    /// Policy identifier embedded in minted capabilities.
    id: PolicyId,
    /// Entry point permitted to create threads while guarded.
    trusted_entry_point: EntryPoint,
    /// Audit sink for guard lifecycle and denial events.
    audit: Arc<dyn GuardAuditSink>,
}

impl GuardPolicy {
    /// Creates a policy trusting `trusted_entry_point` with no audit output.
    #[must_use]
    pub fn new(trusted_entry_point: EntryPoint) -> Arc<Self> {
        Self::with_audit(trusted_entry_point, Arc::new(NoopGuardAuditSink))
    }

    /// Creates a policy trusting `trusted_entry_point` that reports to `audit`.
    #[must_use]
    pub fn with_audit(
        trusted_entry_point: EntryPoint,
        audit: Arc<dyn GuardAuditSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: PolicyId::next(),
            trusted_entry_point,
            audit,
        })
    }

    /// Returns the policy identifier.
    #[must_use]
    pub const fn id(&self) -> PolicyId {
        self.id
    }

    /// Returns the trusted entry point.
    #[must_use]
    pub const fn trusted_entry_point(&self) -> &EntryPoint {
        &self.trusted_entry_point
    }

    /// Returns the audit sink.
    #[must_use]
    pub fn audit(&self) -> &dyn GuardAuditSink {
        self.audit.as_ref()
    }

    /// Mints a capability for the holder of this policy to hand to a trusted
    /// thread creator.
    #[must_use]
    pub const fn grant_spawn_capability(&self) -> SpawnCapability {
        SpawnCapability {
            policy_id: self.id,
        }
    }
}

impl fmt::Debug for GuardPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardPolicy")
            .field("id", &self.id)
            .field("trusted_entry_point", &self.trusted_entry_point)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Spawn Capability
// ============================================================================

/// Opaque token authorizing thread creation under guards of one policy.
///
/// # Invariants
/// - Only [`GuardPolicy::grant_spawn_capability`] constructs values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnCapability {
    /// Policy that granted the capability.
    policy_id: PolicyId,
}

impl SpawnCapability {
    /// Returns the policy that granted this capability.
    #[must_use]
    pub const fn policy_id(&self) -> PolicyId {
        self.policy_id
    }

    /// Returns true when this capability was granted by `policy`.
    #[must_use]
    pub fn issued_by(&self, policy: PolicyId) -> bool {
        self.policy_id == policy
    }
}
