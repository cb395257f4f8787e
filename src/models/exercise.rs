use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use validator::Validate;

use super::{ExerciseType, Language, TermLevel};
use crate::error::AppError;

/// A generated exercise. Which reference columns are set depends on `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Exercise {
    pub id: i32,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: ExerciseType,
    pub language: Language,
    pub translation_language: Option<Language>,
    pub term: Option<String>,
    pub origin_language: Option<Language>,
    pub term_example_id: Option<i32>,
    pub term_definition_id: Option<i32>,
    pub term_lexical_id: Option<i32>,
    pub pronunciation_id: Option<i32>,
}

/// An exercise that is not stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub kind: ExerciseType,
    pub language: Language,
    pub translation_language: Option<Language>,
    pub term: Option<String>,
    pub origin_language: Option<Language>,
    pub term_example_id: Option<i32>,
    pub term_definition_id: Option<i32>,
    pub term_lexical_id: Option<i32>,
    pub pronunciation_id: Option<i32>,
}

impl NewExercise {
    /// An exercise about `term`, with every other reference unset.
    pub fn for_term(kind: ExerciseType, term: &str, origin_language: Language) -> Self {
        NewExercise {
            kind,
            language: origin_language,
            translation_language: None,
            term: Some(term.to_string()),
            origin_language: Some(origin_language),
            term_example_id: None,
            term_definition_id: None,
            term_lexical_id: None,
            pronunciation_id: None,
        }
    }
}

pub(crate) const EXERCISE_COLUMNS: &str = "id, type, language, translation_language, term, \
     origin_language, term_example_id, term_definition_id, term_lexical_id, pronunciation_id";

impl Exercise {
    pub async fn find<'e, E>(executor: E, id: i32) -> Result<Exercise, AppError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Exercise>(&format!(
            "SELECT {} FROM exercises WHERE id = $1",
            EXERCISE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Exercise"))
    }
}

pub const DEFAULT_EXERCISE_AMOUNT: i64 = 10;

/// Query parameters for `GET /exercise`.
#[derive(Debug, Deserialize, Validate)]
pub struct ExerciseQuery {
    #[serde(rename = "type")]
    pub kind: ExerciseType,
    pub language: Language,
    pub translation_language: Option<Language>,
    pub term_level: Option<TermLevel>,
    pub cardset_id: Option<i32>,
    #[validate(range(min = 1, max = 256))]
    pub amount: Option<i64>,
}

/// Entry of an exercise listing; `url` points at the exercise payload.
#[derive(Debug, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ExerciseLink {
    pub id: i32,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: ExerciseType,
    #[sqlx(default)]
    pub url: String,
}

/// Response of `GET /exercise`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExerciseList {
    /// How many exercises were actually found.
    pub amount: usize,
    pub exercises: Vec<ExerciseLink>,
}

/// What a client needs to present an exercise.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ExercisePayload {
    OrderSentence {
        sentence: String,
        shuffled_sentence: Vec<String>,
    },
    ListenTerm {
        text: String,
        audio_link: String,
    },
    ListenSentence {
        text: String,
        audio_link: String,
    },
    SpeakTerm {
        text: String,
        phonetic: Option<String>,
    },
    SpeakSentence {
        text: String,
        phonetic: Option<String>,
    },
    MchoiceTerm {
        header: String,
        choices: Vec<String>,
    },
    MchoiceTermTranslation {
        header: String,
        choices: Vec<String>,
    },
}

/// Payload for `POST /exercise/{id}/check`.
#[derive(Debug, Deserialize, Validate)]
pub struct ExerciseAnswer {
    #[validate(length(max = 4096))]
    pub response: String,
}

/// Result of checking an answer.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseCheck {
    pub correct: bool,
    pub expected: String,
}

/// One attempt of a user at an exercise.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ExerciseHistory {
    pub id: i32,
    pub exercise_id: i32,
    pub user_id: i32,
    pub created: DateTime<Utc>,
    pub correct: bool,
    pub text_request: Option<String>,
    pub text_response: Option<String>,
}

/// Payload for `POST /exercise/history`.
#[derive(Debug, Deserialize, Validate)]
pub struct ExerciseHistoryInput {
    pub exercise_id: i32,
    pub correct: bool,
    #[validate(length(max = 4096))]
    pub text_request: Option<String>,
    #[validate(length(max = 4096))]
    pub text_response: Option<String>,
}

/// Query parameters for `GET /exercise/history`.
#[derive(Debug, Deserialize)]
pub struct ExerciseHistoryQuery {
    pub exercise_id: Option<i32>,
}

pub(crate) const HISTORY_COLUMNS: &str =
    "id, exercise_id, user_id, created, correct, text_request, text_response";

impl ExerciseHistory {
    pub async fn create<'e, E>(
        executor: E,
        user_id: i32,
        input: &ExerciseHistoryInput,
    ) -> Result<ExerciseHistory, AppError>
    where
        E: PgExecutor<'e>,
    {
        let history = sqlx::query_as::<_, ExerciseHistory>(&format!(
            "INSERT INTO exercise_history (exercise_id, user_id, correct, text_request, text_response)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            HISTORY_COLUMNS
        ))
        .bind(input.exercise_id)
        .bind(user_id)
        .bind(input.correct)
        .bind(&input.text_request)
        .bind(&input.text_response)
        .fetch_one(executor)
        .await?;
        Ok(history)
    }
}
