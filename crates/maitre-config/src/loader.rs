// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./maitre.toml` > `~/.config/maitre/maitre.toml`
//! > `/etc/maitre/maitre.toml` with environment variable overrides via the
//! `MAITRE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MaitreConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/maitre/maitre.toml` (system-wide)
/// 3. `~/.config/maitre/maitre.toml` (user XDG config)
/// 4. `./maitre.toml` (local directory)
/// 5. `MAITRE_*` environment variables
pub fn load_config() -> Result<MaitreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MaitreConfig::default()))
        .merge(Toml::file("/etc/maitre/maitre.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("maitre/maitre.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("maitre.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MaitreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MaitreConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MaitreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MaitreConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `MAITRE_TWILIO_AUTH_TOKEN` must map to
/// `twilio.auth_token`, not `twilio.auth.token`.
fn env_provider() -> Env {
    Env::prefixed("MAITRE_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        // Example: MAITRE_TWILIO_AUTH_TOKEN -> "twilio_auth_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("engine_", "engine.", 1)
            .replacen("server_", "server.", 1)
            .replacen("twilio_", "twilio.", 1)
            .replacen("gemini_", "gemini.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("draft_", "draft.", 1)
            .replacen("retry_", "retry.", 1)
            .replacen("guidelines_", "guidelines.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_overrides_twilio_auth_token() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MAITRE_TWILIO_AUTH_TOKEN", "tok-from-env");
            jail.set_env("MAITRE_ENGINE_APPROVAL_TIMEOUT_SECS", "120");
            let config = load_config().expect("config should load");
            assert_eq!(config.twilio.auth_token.as_deref(), Some("tok-from-env"));
            assert_eq!(config.engine.approval_timeout_secs, 120);
            Ok(())
        });
    }

    #[test]
    fn toml_string_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[engine]
approval_timeout_secs = 3600

[storage]
database_path = "/tmp/x.db"
"#,
        )
        .unwrap();
        assert_eq!(config.engine.approval_timeout_secs, 3600);
        assert_eq!(config.storage.database_path, "/tmp/x.db");
        // Untouched sections keep their defaults.
        assert_eq!(config.engine.sweep_interval_secs, 60);
    }
}
