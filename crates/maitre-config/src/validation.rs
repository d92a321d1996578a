// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths, sane timeouts, and complete
//! Twilio credential sets.

use crate::diagnostic::ConfigError;
use crate::model::MaitreConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MaitreConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.server.bind_address.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.bind_address must not be empty".to_string(),
        });
    } else if config.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.bind_address `{}` is not a valid socket address",
                config.server.bind_address
            ),
        });
    }

    if config.engine.approval_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.approval_timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.engine.sweep_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.sweep_interval_secs must be greater than zero".to_string(),
        });
    }

    if config.draft.min_sentences == 0 {
        errors.push(ConfigError::Validation {
            message: "draft.min_sentences must be at least 1".to_string(),
        });
    }

    if config.draft.max_sentences < config.draft.min_sentences {
        errors.push(ConfigError::Validation {
            message: format!(
                "draft.max_sentences ({}) must be >= draft.min_sentences ({})",
                config.draft.max_sentences, config.draft.min_sentences
            ),
        });
    }

    if config.retry.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "retry.max_attempts must be at least 1".to_string(),
        });
    }

    if config.guidelines.occasion_terms.iter().any(|t| t.trim().is_empty()) {
        errors.push(ConfigError::Validation {
            message: "guidelines.occasion_terms must not contain empty terms".to_string(),
        });
    }

    // Twilio credentials are all-or-nothing: a partially configured
    // transport fails at startup instead of at the first send.
    let twilio = &config.twilio;
    let any_set = twilio.account_sid.is_some()
        || twilio.auth_token.is_some()
        || twilio.from_number.is_some()
        || twilio.manager_number.is_some();
    if any_set {
        for (field, value) in [
            ("twilio.account_sid", &twilio.account_sid),
            ("twilio.auth_token", &twilio.auth_token),
            ("twilio.from_number", &twilio.from_number),
            ("twilio.manager_number", &twilio.manager_number),
        ] {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                errors.push(ConfigError::Validation {
                    message: format!("{field} is required when any twilio key is set"),
                });
            }
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
