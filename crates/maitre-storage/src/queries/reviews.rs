// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Review CRUD and state queries, including the versioned compare-and-swap
//! update that backs the engine's atomic transitions.

use maitre_core::MaitreError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Review, ReviewState};

const REVIEW_COLUMNS: &str = "id, rating, body, customer_name, special_occasion, state, \
     current_draft, last_outbound_message_id, needs_attention, approval_deadline, \
     version, created_at, updated_at";

fn review_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Review> {
    let state_text: String = row.get(5)?;
    let state: ReviewState = state_text.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;
    Ok(Review {
        id: row.get(0)?,
        rating: row.get::<_, i64>(1)? as u8,
        body: row.get(2)?,
        customer_name: row.get(3)?,
        special_occasion: row.get(4)?,
        state,
        current_draft: row.get(6)?,
        last_outbound_message_id: row.get(7)?,
        needs_attention: row.get::<_, i64>(8)? != 0,
        approval_deadline: row.get(9)?,
        version: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Persist a freshly ingested review.
pub async fn create_review(db: &Database, review: &Review) -> Result<(), MaitreError> {
    let review = review.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO reviews (id, rating, body, customer_name, special_occasion,
                     state, current_draft, last_outbound_message_id, needs_attention,
                     approval_deadline, version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    review.id,
                    review.rating as i64,
                    review.body,
                    review.customer_name,
                    review.special_occasion,
                    review.state.to_string(),
                    review.current_draft,
                    review.last_outbound_message_id,
                    review.needs_attention as i64,
                    review.approval_deadline,
                    review.version,
                    review.created_at,
                    review.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a review by ID.
pub async fn get_review(db: &Database, id: &str) -> Result<Option<Review>, MaitreError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], review_from_row);
            match result {
                Ok(review) => Ok(Some(review)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Conditionally write the review back, keyed on the version field.
///
/// Bumps the version by one on success. Returns [`MaitreError::Conflict`]
/// when the stored version no longer matches `expected_version`.
pub async fn update_review(
    db: &Database,
    review: &Review,
    expected_version: i64,
) -> Result<(), MaitreError> {
    let review = review.clone();
    let review_id = review.id.clone();
    let (changed, exists) = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE reviews SET
                     special_occasion = ?1, state = ?2, current_draft = ?3,
                     last_outbound_message_id = ?4, needs_attention = ?5,
                     approval_deadline = ?6, version = version + 1,
                     updated_at = ?7
                 WHERE id = ?8 AND version = ?9",
                params![
                    review.special_occasion,
                    review.state.to_string(),
                    review.current_draft,
                    review.last_outbound_message_id,
                    review.needs_attention as i64,
                    review.approval_deadline,
                    review.updated_at,
                    review.id,
                    expected_version,
                ],
            )?;
            let exists: bool = if changed == 0 {
                let mut stmt = conn.prepare("SELECT 1 FROM reviews WHERE id = ?1")?;
                stmt.exists(params![review.id])?
            } else {
                true
            };
            Ok((changed, exists))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match (changed, exists) {
        (0, true) => Err(MaitreError::Conflict {
            review_id,
        }),
        (0, false) => Err(MaitreError::Internal(format!(
            "review {review_id} does not exist"
        ))),
        _ => Ok(()),
    }
}

/// Reviews awaiting approval whose deadline is at or before `now`.
pub async fn expired_awaiting(db: &Database, now: &str) -> Result<Vec<Review>, MaitreError> {
    let now = now.to_string();
    let state = ReviewState::AwaitingApproval.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REVIEW_COLUMNS} FROM reviews
                 WHERE state = ?1 AND approval_deadline IS NOT NULL
                   AND approval_deadline <= ?2
                 ORDER BY approval_deadline ASC"
            ))?;
            let rows = stmt.query_map(params![state, now], review_from_row)?;
            let mut reviews = Vec::new();
            for row in rows {
                reviews.push(row?);
            }
            Ok(reviews)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The oldest review a manager reply can act on, if any.
///
/// Reviews flagged for attention are excluded so an
/// approved-but-unpublished review is never re-surfaced for approval.
pub async fn oldest_actionable(db: &Database) -> Result<Option<Review>, MaitreError> {
    let awaiting = ReviewState::AwaitingApproval.to_string();
    let revising = ReviewState::Revising.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REVIEW_COLUMNS} FROM reviews
                 WHERE state IN (?1, ?2) AND needs_attention = 0
                 ORDER BY created_at ASC LIMIT 1"
            ))?;
            let result = stmt.query_row(params![awaiting, revising], review_from_row);
            match result {
                Ok(review) => Ok(Some(review)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Review counts grouped by state.
pub async fn count_by_state(db: &Database) -> Result<Vec<(ReviewState, i64)>, MaitreError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT state, COUNT(*) FROM reviews GROUP BY state ORDER BY state",
            )?;
            let rows = stmt.query_map([], |row| {
                let state_text: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((state_text, count))
            })?;
            let mut counts = Vec::new();
            for row in rows {
                counts.push(row?);
            }
            Ok(counts)
        })
        .await
        .map_err(crate::database::map_tr_err)
        .map(|counts| {
            counts
                .into_iter()
                .filter_map(|(s, n)| s.parse::<ReviewState>().ok().map(|st| (st, n)))
                .collect()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_review(id: &str) -> Review {
        Review {
            id: id.to_string(),
            rating: 4,
            body: "Great pasta".to_string(),
            customer_name: "Dana".to_string(),
            special_occasion: None,
            state: ReviewState::Ingested,
            current_draft: None,
            last_outbound_message_id: None,
            needs_attention: false,
            approval_deadline: None,
            version: 0,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_get_review_round_trips() {
        let (db, _dir) = setup_db().await;
        let review = make_review("r1");

        create_review(&db, &review).await.unwrap();
        let retrieved = get_review(&db, "r1").await.unwrap().unwrap();
        assert_eq!(retrieved.id, "r1");
        assert_eq!(retrieved.rating, 4);
        assert_eq!(retrieved.state, ReviewState::Ingested);
        assert_eq!(retrieved.version, 0);
        assert!(!retrieved.needs_attention);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_review_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_review(&db, "missing").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_with_matching_version_bumps_version() {
        let (db, _dir) = setup_db().await;
        let mut review = make_review("r-cas");
        create_review(&db, &review).await.unwrap();

        review.state = ReviewState::Drafted;
        review.current_draft = Some("Dear Dana, ...".to_string());
        update_review(&db, &review, 0).await.unwrap();

        let updated = get_review(&db, "r-cas").await.unwrap().unwrap();
        assert_eq!(updated.state, ReviewState::Drafted);
        assert_eq!(updated.version, 1);
        assert_eq!(updated.current_draft.as_deref(), Some("Dear Dana, ..."));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_with_stale_version_is_a_conflict() {
        let (db, _dir) = setup_db().await;
        let mut review = make_review("r-stale");
        create_review(&db, &review).await.unwrap();

        review.state = ReviewState::Drafted;
        update_review(&db, &review, 0).await.unwrap();

        // A second writer holding the old version loses the race.
        review.state = ReviewState::Abandoned;
        let err = update_review(&db, &review, 0).await.unwrap_err();
        assert!(matches!(err, MaitreError::Conflict { .. }));

        // The first write stands.
        let current = get_review(&db, "r-stale").await.unwrap().unwrap();
        assert_eq!(current.state, ReviewState::Drafted);
        assert_eq!(current.version, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_of_missing_review_is_not_a_conflict() {
        let (db, _dir) = setup_db().await;
        let review = make_review("ghost");
        let err = update_review(&db, &review, 0).await.unwrap_err();
        assert!(matches!(err, MaitreError::Internal(_)));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn expired_awaiting_filters_by_deadline() {
        let (db, _dir) = setup_db().await;

        let mut expired = make_review("r-old");
        expired.state = ReviewState::AwaitingApproval;
        expired.approval_deadline = Some("2026-01-01T00:00:00.000Z".to_string());
        create_review(&db, &expired).await.unwrap();

        let mut fresh = make_review("r-new");
        fresh.state = ReviewState::AwaitingApproval;
        fresh.approval_deadline = Some("2026-12-31T00:00:00.000Z".to_string());
        create_review(&db, &fresh).await.unwrap();

        let due = expired_awaiting(&db, "2026-06-01T00:00:00.000Z").await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "r-old");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn oldest_actionable_skips_flagged_and_terminal_reviews() {
        let (db, _dir) = setup_db().await;

        let mut published = make_review("r-done");
        published.state = ReviewState::Published;
        published.created_at = "2026-01-01T00:00:00.000Z".to_string();
        create_review(&db, &published).await.unwrap();

        let mut flagged = make_review("r-flagged");
        flagged.state = ReviewState::AwaitingApproval;
        flagged.needs_attention = true;
        flagged.created_at = "2026-01-02T00:00:00.000Z".to_string();
        create_review(&db, &flagged).await.unwrap();

        let mut awaiting = make_review("r-waiting");
        awaiting.state = ReviewState::AwaitingApproval;
        awaiting.created_at = "2026-01-03T00:00:00.000Z".to_string();
        create_review(&db, &awaiting).await.unwrap();

        let actionable = oldest_actionable(&db).await.unwrap().unwrap();
        assert_eq!(actionable.id, "r-waiting");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn count_by_state_groups_correctly() {
        let (db, _dir) = setup_db().await;

        create_review(&db, &make_review("a")).await.unwrap();
        create_review(&db, &make_review("b")).await.unwrap();
        let mut done = make_review("c");
        done.state = ReviewState::Published;
        create_review(&db, &done).await.unwrap();

        let counts = count_by_state(&db).await.unwrap();
        let ingested = counts
            .iter()
            .find(|(s, _)| *s == ReviewState::Ingested)
            .map(|(_, n)| *n);
        let published = counts
            .iter()
            .find(|(s, _)| *s == ReviewState::Published)
            .map(|(_, n)| *n);
        assert_eq!(ingested, Some(2));
        assert_eq!(published, Some(1));

        db.close().await.unwrap();
    }
}
