//! Config loading and policy construction tests for thread-guard-config.
// crates/thread-guard-config/tests/config_load.rs
// =============================================================================
// Module: Config Loading Tests
// Description: Load configs from disk and build guard policies from them.
// Purpose: Ensure file limits are enforced and loaded configs drive the guard.
// =============================================================================

use std::fs;

use thread_guard_config::ConfigError;
use thread_guard_config::ThreadGuardConfig;
use thread_guard_core::AuthoritySlot;
use thread_guard_core::EntryPoint;
use thread_guard_core::PermissionRequest;
use thread_guard_core::run_protected;

mod common;

use common::assert_invalid;

type TestResult = Result<(), String>;

#[test]
fn load_reads_explicit_path() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("thread-guard.toml");
    fs::write(
        &path,
        "[guard.trusted_entry_point]\ncomponent = \"server::Acceptor\"\nmethod = \"spawn_worker\"\n\n[pool]\nmax_threads = 2\n",
    )
    .map_err(|err| err.to_string())?;

    let config = ThreadGuardConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.guard.trusted_entry_point.component() != "server::Acceptor" {
        return Err("trusted entry point component not loaded".to_string());
    }
    if config.pool_options().max_threads != 2 {
        return Err("pool max_threads not loaded".to_string());
    }
    Ok(())
}

#[test]
fn load_missing_file_is_io_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    match ThreadGuardConfig::load(Some(&path)) {
        Err(ConfigError::Io(_)) => Ok(()),
        Err(other) => Err(format!("expected io error, got {other}")),
        Ok(_) => Err("expected io error".to_string()),
    }
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[guard\n").map_err(|err| err.to_string())?;
    match ThreadGuardConfig::load(Some(&path)) {
        Err(ConfigError::Parse(_)) => Ok(()),
        Err(other) => Err(format!("expected parse error, got {other}")),
        Ok(_) => Err("expected parse error".to_string()),
    }
}

#[test]
fn load_rejects_non_utf8() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("binary.toml");
    fs::write(&path, [0xff, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    assert_invalid(ThreadGuardConfig::load(Some(&path)), "config file must be utf-8")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("large.toml");
    let padding = format!("# {}\n", "x".repeat(70 * 1024));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    assert_invalid(ThreadGuardConfig::load(Some(&path)), "config file exceeds size limit")
}

#[test]
fn load_rejects_long_path_component() -> TestResult {
    let path = std::env::temp_dir().join("p".repeat(300));
    assert_invalid(ThreadGuardConfig::load(Some(&path)), "config path component too long")
}

#[test]
fn load_validates_contents() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("zero.toml");
    fs::write(&path, "[pool]\nmax_threads = 0\n").map_err(|err| err.to_string())?;
    assert_invalid(ThreadGuardConfig::load(Some(&path)), "pool.max_threads")
}

#[test]
fn built_policy_trusts_configured_entry_point() -> TestResult {
    let config = common::config_from_toml(
        "[guard.trusted_entry_point]\ncomponent = \"server::Acceptor\"\nmethod = \"spawn_worker\"\n\n[audit]\nsink = \"none\"\n",
    )
    .map_err(|err| err.to_string())?;
    let policy = config.build_policy().map_err(|err| err.to_string())?;
    let capability = policy.grant_spawn_capability();
    let slot = AuthoritySlot::new();
    let trusted = [EntryPoint::new("server::Acceptor", "spawn_worker")];
    let other = [EntryPoint::new("server::Handler", "handle")];

    let (trusted_ok, other_ok) = run_protected(&slot, &policy, || {
        let trusted_ok =
            slot.check(&PermissionRequest::modify_thread_group(&trusted, Some(&capability))).is_ok();
        let other_ok =
            slot.check(&PermissionRequest::modify_thread_group(&other, Some(&capability))).is_ok();
        (trusted_ok, other_ok)
    })
    .map_err(|err| err.to_string())?;
    if !trusted_ok || other_ok {
        return Err(format!("unexpected decisions: trusted={trusted_ok} other={other_ok}"));
    }
    Ok(())
}

#[test]
fn file_audit_sink_receives_guard_events() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let log_path = dir.path().join("audit.jsonl");
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.audit.sink = thread_guard_config::AuditSinkKind::File;
    config.audit.path = Some(log_path.to_string_lossy().into_owned());

    let policy = config.build_policy().map_err(|err| err.to_string())?;
    let slot = AuthoritySlot::new();
    run_protected(&slot, &policy, || ()).map_err(|err| err.to_string())?;

    let content = fs::read_to_string(&log_path).map_err(|err| err.to_string())?;
    if content.lines().count() != 3 || !content.contains("\"kind\":\"installed\"") {
        return Err(format!("unexpected audit log: {content}"));
    }
    Ok(())
}
