use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use validator::Validate;

use super::{Language, Term, TermExample, TermLexical};
use crate::error::AppError;
use crate::text::strip_highlight;

/// How a text is pronounced, with an optional recording.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Pronunciation {
    pub id: i32,
    pub language: Language,
    pub text: String,
    pub phonetic: String,
    pub description: Option<String>,
    /// URL of the recording.
    pub audio_file: Option<String>,
}

/// Attaches a pronunciation to exactly one term, example or lexical entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct PronunciationLink {
    pub id: i32,
    pub pronunciation_id: i32,
    pub term: Option<String>,
    pub origin_language: Option<Language>,
    pub term_example_id: Option<i32>,
    pub term_lexical_id: Option<i32>,
}

/// The model fields a client sends to point at a pronounced item.
///
/// Exactly one of `term` (with `origin_language`), `term_example_id` or
/// `term_lexical_id` must be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelRef {
    pub term: Option<String>,
    pub origin_language: Option<Language>,
    pub term_example_id: Option<i32>,
    pub term_lexical_id: Option<i32>,
}

/// A validated `ModelRef`.
#[derive(Debug, Clone, PartialEq)]
pub enum PronunciationModel {
    Term {
        term: String,
        origin_language: Language,
    },
    Example(i32),
    Lexical(i32),
}

/// A model row resolved from the database: its language, the text to
/// pronounce and the link columns to store.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModel {
    pub language: Language,
    pub text: String,
    pub link: ModelRef,
}

impl ModelRef {
    pub fn model(&self) -> Result<PronunciationModel, AppError> {
        let term = match (&self.term, self.origin_language) {
            (Some(term), Some(origin_language)) => Some(PronunciationModel::Term {
                term: term.clone(),
                origin_language,
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::ValidationError(
                    "term and origin_language must be given together.".into(),
                ))
            }
        };
        let example = self.term_example_id.map(PronunciationModel::Example);
        let lexical = self.term_lexical_id.map(PronunciationModel::Lexical);

        let mut models = [term, example, lexical].into_iter().flatten();
        match (models.next(), models.next()) {
            (Some(model), None) => Ok(model),
            _ => Err(AppError::ValidationError(
                "you need to provide exactly one model.".into(),
            )),
        }
    }
}

impl PronunciationModel {
    /// Loads the referenced row, or 404 when it doesn't exist.
    pub async fn resolve<'e, E>(&self, executor: E) -> Result<ResolvedModel, AppError>
    where
        E: PgExecutor<'e>,
    {
        match self {
            PronunciationModel::Term {
                term,
                origin_language,
            } => {
                let term = Term::find(executor, term, *origin_language).await?;
                Ok(ResolvedModel {
                    language: term.origin_language,
                    text: term.term.clone(),
                    link: ModelRef {
                        term: Some(term.term),
                        origin_language: Some(term.origin_language),
                        ..Default::default()
                    },
                })
            }
            PronunciationModel::Example(id) => {
                let example = TermExample::find(executor, *id).await?;
                Ok(ResolvedModel {
                    language: example.origin_language,
                    text: strip_highlight(&example.example),
                    link: ModelRef {
                        term_example_id: Some(example.id),
                        ..Default::default()
                    },
                })
            }
            PronunciationModel::Lexical(id) => {
                let lexical = TermLexical::find(executor, *id).await?;
                Ok(ResolvedModel {
                    language: lexical.origin_language,
                    text: lexical.value,
                    link: ModelRef {
                        term_lexical_id: Some(lexical.id),
                        ..Default::default()
                    },
                })
            }
        }
    }
}

/// Payload for `POST /term/pronunciation`.
#[derive(Debug, Deserialize, Validate)]
pub struct PronunciationInput {
    #[validate(length(min = 1, max = 256))]
    pub phonetic: String,
    pub description: Option<String>,
    #[validate(url)]
    pub audio_file: Option<String>,
    #[serde(flatten)]
    pub model: ModelRef,
}

/// Payload for `POST /term/pronunciation/link`.
#[derive(Debug, Deserialize)]
pub struct PronunciationLinkInput {
    pub pronunciation_id: i32,
    #[serde(flatten)]
    pub model: ModelRef,
}

/// Payload for `PATCH /term/pronunciation/{id}`.
///
/// `audio_file` distinguishes an absent field (unchanged) from `null`
/// (recording removed).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PronunciationUpdate {
    #[validate(length(min = 1, max = 256))]
    pub phonetic: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub audio_file: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// A pronunciation together with the model it is linked to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct PronunciationView {
    pub id: i32,
    pub language: Language,
    pub text: String,
    pub phonetic: String,
    pub description: Option<String>,
    pub audio_file: Option<String>,
    pub term: Option<String>,
    pub origin_language: Option<Language>,
    pub term_example_id: Option<i32>,
    pub term_lexical_id: Option<i32>,
}

pub(crate) const PRONUNCIATION_COLUMNS: &str =
    "id, language, text, phonetic, description, audio_file";

pub(crate) const PRONUNCIATION_VIEW_SELECT: &str =
    "SELECT p.id, p.language, p.text, p.phonetic, p.description, p.audio_file,
            l.term, l.origin_language, l.term_example_id, l.term_lexical_id
     FROM pronunciations p
     JOIN pronunciation_links l ON l.pronunciation_id = p.id";

impl Pronunciation {
    pub async fn find<'e, E>(executor: E, id: i32) -> Result<Pronunciation, AppError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Pronunciation>(&format!(
            "SELECT {} FROM pronunciations WHERE id = $1",
            PRONUNCIATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Pronunciation"))
    }

    pub fn view(&self, link: &PronunciationLink) -> PronunciationView {
        PronunciationView {
            id: self.id,
            language: self.language,
            text: self.text.clone(),
            phonetic: self.phonetic.clone(),
            description: self.description.clone(),
            audio_file: self.audio_file.clone(),
            term: link.term.clone(),
            origin_language: link.origin_language,
            term_example_id: link.term_example_id,
            term_lexical_id: link.term_lexical_id,
        }
    }
}

impl PronunciationLink {
    pub async fn create<'e, E>(
        executor: E,
        pronunciation_id: i32,
        link: &ModelRef,
    ) -> Result<PronunciationLink, AppError>
    where
        E: PgExecutor<'e>,
    {
        let link = sqlx::query_as::<_, PronunciationLink>(
            "INSERT INTO pronunciation_links
                 (pronunciation_id, term, origin_language, term_example_id, term_lexical_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, pronunciation_id, term, origin_language, term_example_id, term_lexical_id",
        )
        .bind(pronunciation_id)
        .bind(&link.term)
        .bind(link.origin_language)
        .bind(link.term_example_id)
        .bind(link.term_lexical_id)
        .fetch_one(executor)
        .await?;
        Ok(link)
    }
}
