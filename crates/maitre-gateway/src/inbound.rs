// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook normalization.
//!
//! Turns the raw Twilio form parameters into an [`InboundMessage`], or a
//! [`MaitreError::MalformedEvent`] the engine acknowledges and drops. A
//! malformed event is never an outage, only a log line.

use maitre_core::MaitreError;
use maitre_core::types::InboundMessage;

/// Normalizes Twilio webhook form parameters.
///
/// Requires `MessageSid`, `From`, and a non-empty `Body`. When
/// `manager_number` is set, any other sender is rejected; managers are the
/// only trusted party in this conversation.
pub fn normalize_inbound(
    params: &[(String, String)],
    manager_number: Option<&str>,
) -> Result<InboundMessage, MaitreError> {
    let get = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    let message_sid = get("MessageSid")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MaitreError::MalformedEvent("missing MessageSid".to_string()))?;
    let sender = get("From")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MaitreError::MalformedEvent("missing From".to_string()))?;
    let body = get("Body")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MaitreError::MalformedEvent("empty Body".to_string()))?;

    if let Some(manager) = manager_number {
        if sender != manager {
            return Err(MaitreError::MalformedEvent(format!(
                "sender {sender} is not the configured manager"
            )));
        }
    }

    Ok(InboundMessage {
        transport_message_id: message_sid.to_string(),
        sender_id: sender.to_string(),
        text: body.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(sid: &str, from: &str, body: &str) -> Vec<(String, String)> {
        vec![
            ("MessageSid".to_string(), sid.to_string()),
            ("From".to_string(), from.to_string()),
            ("Body".to_string(), body.to_string()),
            ("AccountSid".to_string(), "AC999".to_string()),
        ]
    }

    #[test]
    fn well_formed_event_normalizes() {
        let message = normalize_inbound(&form("SM1", "whatsapp:+15550001111", "approve"), None)
            .unwrap();
        assert_eq!(message.transport_message_id, "SM1");
        assert_eq!(message.sender_id, "whatsapp:+15550001111");
        assert_eq!(message.text, "approve");
    }

    #[test]
    fn body_is_trimmed() {
        let message =
            normalize_inbound(&form("SM1", "whatsapp:+15550001111", "  looks good  "), None)
                .unwrap();
        assert_eq!(message.text, "looks good");
    }

    #[test]
    fn missing_sid_is_malformed() {
        let params = vec![
            ("From".to_string(), "whatsapp:+15550001111".to_string()),
            ("Body".to_string(), "approve".to_string()),
        ];
        let err = normalize_inbound(&params, None).unwrap_err();
        assert!(matches!(err, MaitreError::MalformedEvent(_)));
    }

    #[test]
    fn whitespace_body_is_malformed() {
        let err = normalize_inbound(&form("SM1", "whatsapp:+15550001111", "   "), None)
            .unwrap_err();
        assert!(matches!(err, MaitreError::MalformedEvent(_)));
    }

    #[test]
    fn foreign_sender_is_rejected_when_manager_is_configured() {
        let err = normalize_inbound(
            &form("SM1", "whatsapp:+15559999999", "approve"),
            Some("whatsapp:+15550001111"),
        )
        .unwrap_err();
        assert!(matches!(err, MaitreError::MalformedEvent(_)));
    }

    #[test]
    fn manager_sender_is_accepted() {
        let message = normalize_inbound(
            &form("SM1", "whatsapp:+15550001111", "approve"),
            Some("whatsapp:+15550001111"),
        )
        .unwrap();
        assert_eq!(message.sender_id, "whatsapp:+15550001111");
    }
}
