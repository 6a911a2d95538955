// crates/thread-guard-config/src/lib.rs
// ============================================================================
// Module: Thread Guard Config Library
// Description: Canonical config model and validation for the thread guard.
// Purpose: Single source of truth for thread-guard.toml semantics.
// Dependencies: thread-guard-core, serde, toml
// ============================================================================

//! ## Overview
//! `thread-guard-config` defines the configuration model for the thread
//! guard: the trusted entry point, dispatch mode, trusted pool sizing, and the
//! audit sink. Validation is strict and fail-closed, and a validated config
//! builds the [`thread_guard_core::GuardPolicy`] used to install guards.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
