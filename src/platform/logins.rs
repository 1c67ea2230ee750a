// Copyright (c) 2025 - Cowboy AI, Inc.
//! Platform Login Configuration
//!
//! Connection credentials loaded from a JSON login file. Both long and short
//! key spellings are accepted (`user`/`username`, `pass`/`password`,
//! `host`/`hostname`). Credentials are never logged: the `Debug`
//! representation redacts the password.

use std::fmt;
use std::path::Path;

use crate::errors::{OrchestratorError, OrchestratorResult};
use crate::spec::document::read_json_file;

/// Password wrapper that never appears in log output
#[derive(Clone, PartialEq, Eq)]
struct Secret(String);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Credentials and endpoint for a platform connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginConfig {
    pub username: String,
    password: Secret,
    pub host: String,
    pub port: u16,
}

impl LoginConfig {
    /// Load a login file
    ///
    /// An unreadable or incomplete file is a configuration fatal: nothing
    /// downstream can proceed without connection information.
    pub fn from_file(path: impl AsRef<Path>) -> OrchestratorResult<Self> {
        let path = path.as_ref();
        let doc = read_json_file(path).map_err(|err| {
            OrchestratorError::Configuration(format!(
                "Could not read login file {}: {err}",
                path.display()
            ))
        })?;

        let obj = doc.as_object().ok_or_else(|| {
            OrchestratorError::Configuration(format!(
                "Login file {} must be a JSON object",
                path.display()
            ))
        })?;

        let field = |keys: [&str; 2]| -> OrchestratorResult<String> {
            keys.iter()
                .find_map(|key| obj.get(*key))
                .and_then(|v| v.as_str().map(str::to_string))
                .ok_or_else(|| {
                    OrchestratorError::Configuration(format!(
                        "Login file {} is missing {}",
                        path.display(),
                        keys[0]
                    ))
                })
        };

        let port = obj
            .get("port")
            .and_then(|v| {
                v.as_u64()
                    .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            })
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| {
                OrchestratorError::Configuration(format!(
                    "Login file {} is missing a valid port",
                    path.display()
                ))
            })?;

        Ok(Self {
            username: field(["user", "username"])?,
            password: Secret(field(["pass", "password"])?),
            host: field(["host", "hostname"])?,
            port,
        })
    }

    /// The password, for handing to a platform constructor
    pub fn password(&self) -> &str {
        &self.password.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_login(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_short_key_spellings() {
        let file = write_login(r#"{"user": "admin", "pass": "hunter2", "host": "vc.lab", "port": 443}"#);
        let login = LoginConfig::from_file(file.path()).unwrap();
        assert_eq!(login.username, "admin");
        assert_eq!(login.password(), "hunter2");
        assert_eq!(login.port, 443);
    }

    #[test]
    fn test_long_key_spellings_and_string_port() {
        let file = write_login(
            r#"{"username": "admin", "password": "hunter2", "hostname": "vc.lab", "port": "902"}"#,
        );
        let login = LoginConfig::from_file(file.path()).unwrap();
        assert_eq!(login.host, "vc.lab");
        assert_eq!(login.port, 902);
    }

    #[test]
    fn test_missing_field_is_fatal() {
        let file = write_login(r#"{"user": "admin", "port": 443}"#);
        assert!(matches!(
            LoginConfig::from_file(file.path()),
            Err(OrchestratorError::Configuration(_))
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let file = write_login(r#"{"user": "admin", "pass": "hunter2", "host": "vc.lab", "port": 443}"#);
        let login = LoginConfig::from_file(file.path()).unwrap();
        let debug = format!("{login:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
