// crates/bucket-gate-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config and credential tests.
// Purpose: Reduce duplication across integration tests for bucket-gate-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use bucket_gate_config::ConfigError;

/// Result type used by test functions.
pub type TestResult = Result<(), String>;

/// Asserts an error message contains `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

/// Writes `content` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf, String> {
    let path = dir.join(name);
    fs::write(&path, content).map_err(|err| err.to_string())?;
    Ok(path)
}

/// Returns a minimal valid credential document.
pub fn credential_json() -> &'static str {
    r#"{"access_key_id":"GOOG1EXAMPLE","secret_access_key":"c2VjcmV0"}"#
}
