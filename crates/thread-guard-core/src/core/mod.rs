// crates/thread-guard-core/src/core/mod.rs
// ============================================================================
// Module: Thread Guard Core Types
// Description: Permission, capability, and thread-group data types.
// Purpose: Provide the value types shared by authorities and the runtime.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types carry no process-wide state beyond identifier counters and the
//! per-thread group membership. Decisions live in [`crate::runtime`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod capability;
pub mod group;
pub mod permission;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use capability::GuardPolicy;
pub use capability::PolicyId;
pub use capability::SpawnCapability;
pub use group::GroupId;
pub use group::GroupScope;
pub use group::ThreadGroup;
pub use group::current_group;
pub use group::enter_group;
pub use group::main_group;
pub use group::system_group;
pub use permission::EntryPoint;
pub use permission::PermissionKind;
pub use permission::PermissionRequest;
pub use permission::SecurityViolation;
