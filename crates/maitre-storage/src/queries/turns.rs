// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation turn log operations.
//!
//! The turn log is append-only and unique-indexed on the transport message
//! id. Inserting a turn is therefore the deduplication gate for inbound
//! events: an `INSERT OR IGNORE` that changes no rows means the event was
//! already seen and must not reach the state machine.

use maitre_core::MaitreError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{ConversationTurn, Direction};

/// Append a turn to the log.
///
/// Returns `true` when the turn was recorded, `false` when a turn with the
/// same transport message id already exists (duplicate delivery).
pub async fn record_turn(db: &Database, turn: &ConversationTurn) -> Result<bool, MaitreError> {
    let turn = turn.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO turns
                     (review_id, direction, transport_message_id, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    turn.review_id,
                    turn.direction.to_string(),
                    turn.transport_message_id,
                    turn.payload,
                    turn.created_at,
                ],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get all turns for a review in insertion order.
pub async fn turns_for_review(
    db: &Database,
    review_id: &str,
) -> Result<Vec<ConversationTurn>, MaitreError> {
    let review_id = review_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT review_id, direction, transport_message_id, payload, created_at
                 FROM turns WHERE review_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![review_id], |row| {
                let direction_text: String = row.get(1)?;
                let direction: Direction = direction_text.parse().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(ConversationTurn {
                    review_id: row.get(0)?,
                    direction,
                    transport_message_id: row.get(2)?,
                    payload: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            let mut turns = Vec::new();
            for row in rows {
                turns.push(row?);
            }
            Ok(turns)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
