// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Maitre review approval engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Maitre configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MaitreConfig {
    /// Workflow engine timing and identity settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Webhook server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Twilio WhatsApp transport settings.
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// Gemini model API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Draft generation bounds.
    #[serde(default)]
    pub draft: DraftConfig,

    /// Shared retry/backoff policy for transient failures.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Guideline rule overrides.
    #[serde(default)]
    pub guidelines: GuidelinesConfig,
}

/// Workflow engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Display name used in logs.
    #[serde(default = "default_engine_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long a review waits in AwaitingApproval before the sweep
    /// abandons it, in seconds.
    #[serde(default = "default_approval_timeout_secs")]
    pub approval_timeout_secs: u64,

    /// Interval between deadline sweep passes, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_engine_name(),
            log_level: default_log_level(),
            approval_timeout_secs: default_approval_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_engine_name() -> String {
    "maitre".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_approval_timeout_secs() -> u64 {
    86_400
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Webhook server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the webhook server binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Externally visible URL of the webhook endpoint, as Twilio sees it.
    /// Required for signature validation when behind a proxy.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            public_url: None,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

/// Twilio WhatsApp transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TwilioConfig {
    /// Twilio account SID. `None` disables the transport (tests use mocks).
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Twilio auth token, also the webhook signature key.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sender identity, e.g. `whatsapp:+14155238886`.
    #[serde(default)]
    pub from_number: Option<String>,

    /// The manager's number; the single trusted inbound sender.
    #[serde(default)]
    pub manager_number: Option<String>,

    /// Verify `X-Twilio-Signature` on inbound webhooks.
    #[serde(default = "default_true")]
    pub validate_signatures: bool,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            manager_number: None,
            validate_signatures: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Gemini model API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` requires the environment variable override.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier for draft generation.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    "maitre.db".to_string()
}

/// Draft generation bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DraftConfig {
    /// Minimum sentence count for an accepted draft.
    #[serde(default = "default_min_sentences")]
    pub min_sentences: usize,

    /// Maximum sentence count for an accepted draft.
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            min_sentences: default_min_sentences(),
            max_sentences: default_max_sentences(),
        }
    }
}

fn default_min_sentences() -> usize {
    2
}

fn default_max_sentences() -> usize {
    8
}

/// Shared retry policy for transient failures (model calls, sends, publish).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Attempt bound, counting the initial call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Multiplier applied to the delay after each retry.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_backoff_factor() -> u32 {
    2
}

/// Guideline rule overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GuidelinesConfig {
    /// Keyword list for special-occasion detection.
    #[serde(default = "default_occasion_terms")]
    pub occasion_terms: Vec<String>,

    /// Manager contact line required in 1-star responses.
    #[serde(default = "default_manager_contact")]
    pub manager_contact: String,

    /// The complimentary item offered for special occasions.
    #[serde(default = "default_complimentary_item")]
    pub complimentary_item: String,
}

impl Default for GuidelinesConfig {
    fn default() -> Self {
        Self {
            occasion_terms: default_occasion_terms(),
            manager_contact: default_manager_contact(),
            complimentary_item: default_complimentary_item(),
        }
    }
}

fn default_occasion_terms() -> Vec<String> {
    vec![
        "birthday".to_string(),
        "anniversary".to_string(),
        "special event".to_string(),
        "celebration".to_string(),
    ]
}

fn default_manager_contact() -> String {
    "+1 (555) 010-4872".to_string()
}

fn default_complimentary_item() -> String {
    "complimentary dessert on your next visit".to_string()
}
