//! Config load validation tests for authz-gate-config.
// crates/authz-gate-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use authz_gate_config::AuthzConfig;
use authz_gate_config::ConfigError;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<AuthzConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(contents: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(contents).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(AuthzConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        AuthzConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    assert_invalid(
        AuthzConfig::load(Some(Path::new("/nonexistent/authz-gate.toml"))),
        "config io error",
    )
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_config(&vec![b'a'; 1_048_577])?;
    assert_invalid(AuthzConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = write_config(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(AuthzConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let file = write_config(b"policy_root = [")?;
    assert_invalid(AuthzConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_validates_required_options() -> TestResult {
    let file = write_config(b"policy_root = \"peoplefinder\"\n")?;
    assert_invalid(AuthzConfig::load(Some(file.path())), "Missing required option: tenant_id")
}

#[test]
fn load_accepts_complete_file() -> TestResult {
    let file = write_config(
        b"authorizer_api_key = \"key\"\ntenant_id = \"tenant\"\npolicy_root = \"peoplefinder\"\n",
    )?;
    let config = AuthzConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    assert_eq!(config.policy_root, "peoplefinder");
    Ok(())
}
