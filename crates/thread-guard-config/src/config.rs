// crates/thread-guard-config/src/config.rs
// ============================================================================
// Module: Thread Guard Configuration
// Description: Configuration loading and validation for the thread guard.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: thread-guard-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys and invalid values fail closed: a guard is never built from a
//! configuration that did not validate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use thread_guard_core::DispatchMode;
use thread_guard_core::EntryPoint;
use thread_guard_core::FileGuardAuditSink;
use thread_guard_core::GuardAuditSink;
use thread_guard_core::GuardPolicy;
use thread_guard_core::NoopGuardAuditSink;
use thread_guard_core::PoolOptions;
use thread_guard_core::StderrGuardAuditSink;
use thread_guard_core::TRUSTED_POOL_ENTRY_POINT;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "thread-guard.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "THREAD_GUARD_CONFIG";
/// Maximum config file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 64 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of an entry-point component or method name.
pub(crate) const MAX_ENTRY_POINT_NAME_LENGTH: usize = 256;
/// Maximum length of the worker name prefix.
pub(crate) const MAX_NAME_PREFIX_LENGTH: usize = 64;
/// Upper bound for trusted pool workers.
pub(crate) const MAX_POOL_THREADS: usize = 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Thread guard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThreadGuardConfig {
    /// Guard installation settings.
    #[serde(default)]
    pub guard: GuardConfig,
    /// Trusted pool settings.
    #[serde(default)]
    pub pool: PoolConfig,
    /// Audit sink settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl ThreadGuardConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.guard.validate()?;
        self.pool.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Builds the guard policy, opening the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid or the audit
    /// file cannot be opened.
    pub fn build_policy(&self) -> Result<Arc<GuardPolicy>, ConfigError> {
        self.validate()?;
        let audit = self.audit.build_sink()?;
        Ok(GuardPolicy::with_audit(self.guard.trusted_entry_point.clone(), audit))
    }

    /// Returns trusted pool options.
    #[must_use]
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            max_threads: self.pool.max_threads,
            name_prefix: self.pool.name_prefix.clone(),
        }
    }

    /// Returns the configured dispatch mode.
    #[must_use]
    pub const fn dispatch_mode(&self) -> DispatchMode {
        self.guard.dispatch_mode
    }
}

/// Guard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
    /// Dispatch mode for guarded handlers.
    #[serde(default)]
    pub dispatch_mode: DispatchMode,
    /// Only entry point allowed to modify thread groups while installed.
    #[serde(default = "default_trusted_entry_point")]
    pub trusted_entry_point: EntryPoint,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            dispatch_mode: DispatchMode::default(),
            trusted_entry_point: default_trusted_entry_point(),
        }
    }
}

impl GuardConfig {
    /// Validates the trusted entry point names.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_name(
            "guard.trusted_entry_point.component",
            self.trusted_entry_point.component(),
            MAX_ENTRY_POINT_NAME_LENGTH,
        )?;
        validate_name(
            "guard.trusted_entry_point.method",
            self.trusted_entry_point.method(),
            MAX_ENTRY_POINT_NAME_LENGTH,
        )
    }
}

/// Trusted pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Maximum number of pool workers.
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
    /// Prefix for worker thread names.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_threads: default_max_threads(),
            name_prefix: default_name_prefix(),
        }
    }
}

impl PoolConfig {
    /// Validates pool sizing and naming.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_threads == 0 || self.max_threads > MAX_POOL_THREADS {
            return Err(ConfigError::Invalid(format!(
                "pool.max_threads must be between 1 and {MAX_POOL_THREADS}"
            )));
        }
        validate_name("pool.name_prefix", &self.name_prefix, MAX_NAME_PREFIX_LENGTH)
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
    /// Discard audit events.
    None,
}

/// Audit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink receiving guard audit events.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates sink and path consistency.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, self.path.as_deref()) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.sink=file requires audit.path".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path is only valid with audit.sink=file".to_string()))
            }
            (_, None) => Ok(()),
        }
    }

    /// Constructs the configured sink.
    fn build_sink(&self) -> Result<Arc<dyn GuardAuditSink>, ConfigError> {
        match (self.sink, self.path.as_deref()) {
            (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrGuardAuditSink)),
            (AuditSinkKind::None, _) => Ok(Arc::new(NoopGuardAuditSink)),
            (AuditSinkKind::File, Some(path)) => {
                let sink = FileGuardAuditSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.sink=file requires audit.path".to_string()))
            }
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration or opening the audit log.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default trusted entry point: the trusted pool's thread factory.
fn default_trusted_entry_point() -> EntryPoint {
    TRUSTED_POOL_ENTRY_POINT.clone()
}

/// Default trusted pool size.
fn default_max_threads() -> usize {
    PoolOptions::default().max_threads
}

/// Default worker name prefix.
fn default_name_prefix() -> String {
    PoolOptions::default().name_prefix
}

/// Resolves the config path from an explicit path or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    validate_path(Path::new(trimmed))
        .map_err(|_| ConfigError::Invalid(format!("{field} exceeds path limits")))
}

/// Validates an identifier-like name.
fn validate_name(field: &str, value: &str, max_len: usize) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > max_len {
        return Err(ConfigError::Invalid(format!("{field} exceeds {max_len} bytes")));
    }
    if value.chars().any(char::is_control) {
        return Err(ConfigError::Invalid(format!("{field} must not contain control characters")));
    }
    Ok(())
}
