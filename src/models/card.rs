use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use validator::Validate;

use super::Language;
use crate::error::AppError;

/// A user's named collection of cards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct CardSet {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Language the default card notes are written in.
    pub language: Option<Language>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /card/set`.
#[derive(Debug, Deserialize, Validate)]
pub struct CardSetInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    pub description: Option<String>,
    pub language: Option<Language>,
}

/// Payload for `PATCH /card/set/{id}`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CardSetUpdate {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<Language>,
}

/// Query parameters for `GET /card/set`.
#[derive(Debug, Deserialize)]
pub struct CardSetQuery {
    pub name: Option<String>,
}

/// A term saved into a card set, with a personal note.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Card {
    pub id: i32,
    pub cardset_id: i32,
    pub term: String,
    pub origin_language: Language,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /card`.
#[derive(Debug, Deserialize, Validate)]
pub struct CardInput {
    pub cardset_id: i32,
    #[validate(length(min = 1))]
    pub term: String,
    pub origin_language: Language,
    pub note: Option<String>,
}

/// Payload for `PATCH /card/{id}`.
#[derive(Debug, Deserialize)]
pub struct CardUpdate {
    pub note: Option<String>,
}

/// Query parameters for `GET /card/set/{cardset_id}/card`.
#[derive(Debug, Deserialize)]
pub struct CardQuery {
    pub term: Option<String>,
    pub note: Option<String>,
}

pub(crate) const CARDSET_COLUMNS: &str =
    "id, user_id, name, description, language, created_at, updated_at";

pub(crate) const CARD_COLUMNS: &str =
    "id, cardset_id, term, origin_language, note, created_at, updated_at";

impl CardSet {
    /// Loads a card set owned by `user_id`. Other users' sets are reported as
    /// missing.
    pub async fn find_owned<'e, E>(executor: E, id: i32, user_id: i32) -> Result<CardSet, AppError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, CardSet>(&format!(
            "SELECT {} FROM cardsets WHERE id = $1 AND user_id = $2",
            CARDSET_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("CardSet"))
    }
}

impl Card {
    /// Loads a card whose set is owned by `user_id`.
    pub async fn find_owned<'e, E>(executor: E, id: i32, user_id: i32) -> Result<Card, AppError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Card>(
            "SELECT c.id, c.cardset_id, c.term, c.origin_language, c.note, c.created_at, c.updated_at
             FROM cards c
             JOIN cardsets s ON s.id = c.cardset_id
             WHERE c.id = $1 AND s.user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Card"))
    }
}

/// Builds the default note of a card from its term's meanings.
pub fn default_note(meanings: &[String]) -> Option<String> {
    if meanings.is_empty() {
        None
    } else {
        Some(meanings.join(","))
    }
}
