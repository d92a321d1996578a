// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Revision history operations. Append-only by construction: there is no
//! update or delete path.

use maitre_core::MaitreError;
use rusqlite::params;

use crate::database::Database;
use crate::models::Revision;

/// Append a (superseded draft, manager instruction) pair.
pub async fn append_revision(
    db: &Database,
    review_id: &str,
    draft: &str,
    instruction: &str,
    created_at: &str,
) -> Result<(), MaitreError> {
    let review_id = review_id.to_string();
    let draft = draft.to_string();
    let instruction = instruction.to_string();
    let created_at = created_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO revisions (review_id, draft, instruction, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![review_id, draft, instruction, created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a review's revision history in insertion order.
pub async fn revisions_for_review(
    db: &Database,
    review_id: &str,
) -> Result<Vec<Revision>, MaitreError> {
    let review_id = review_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT review_id, draft, instruction, created_at
                 FROM revisions WHERE review_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![review_id], |row| {
                Ok(Revision {
                    review_id: row.get(0)?,
                    draft: row.get(1)?,
                    instruction: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?;
            let mut revisions = Vec::new();
            for row in rows {
                revisions.push(row?);
            }
            Ok(revisions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
