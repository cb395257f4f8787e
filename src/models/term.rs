use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use validator::Validate;

use super::{Language, PartOfSpeech, PronunciationView, TermLevel, TermLexicalType};
use crate::error::AppError;

/// A dictionary entry, identified by its text and origin language.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Term {
    pub term: String,
    pub origin_language: Language,
}

/// Payload for `POST /term`.
#[derive(Debug, Deserialize, Validate)]
pub struct TermInput {
    #[validate(length(min = 1, max = 256))]
    pub term: String,
    pub origin_language: Language,
}

/// Query parameters for `GET /term`.
#[derive(Debug, Deserialize)]
pub struct TermQuery {
    pub term: String,
    pub origin_language: Language,
    pub translation_language: Option<Language>,
    #[serde(default)]
    pub lexical: bool,
    #[serde(default)]
    pub pronunciation: bool,
}

/// A term with the meanings, lexical entries and pronunciations requested.
#[derive(Debug, Serialize, Deserialize)]
pub struct TermView {
    pub term: String,
    pub origin_language: Language,
    pub meanings: Vec<String>,
    pub lexical: Vec<TermLexical>,
    pub pronunciations: Vec<PronunciationView>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Query parameters for `GET /term/search`.
#[derive(Debug, Deserialize, Validate)]
pub struct TermSearchQuery {
    #[validate(length(min = 1))]
    pub text: String,
    pub origin_language: Language,
    #[validate(range(min = 1))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub size: Option<i64>,
}

/// Query parameters for `GET /term/search-meaning`.
#[derive(Debug, Deserialize, Validate)]
pub struct TermMeaningSearchQuery {
    #[validate(length(min = 1))]
    pub text: String,
    pub origin_language: Language,
    pub translation_language: Language,
    #[validate(range(min = 1))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub size: Option<i64>,
}

/// Converts optional 1-based `page`/`size` into a `(limit, offset)` pair.
///
/// A page too far out to address is rejected instead of wrapping around.
pub fn limit_offset(page: Option<i64>, size: Option<i64>) -> Result<(i64, i64), AppError> {
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE);
    let page = page.unwrap_or(1);
    let offset = page
        .checked_sub(1)
        .and_then(|skipped| skipped.checked_mul(size))
        .ok_or_else(|| AppError::ValidationError("page is out of range".into()))?;
    Ok((size, offset))
}

impl Term {
    /// Finds a term whose cleaned text matches `term` in `origin_language`.
    ///
    /// An exact match wins over other rows sharing the same cleaned text.
    pub async fn find<'e, E>(
        executor: E,
        term: &str,
        origin_language: Language,
    ) -> Result<Term, AppError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Term>(
            "SELECT term, origin_language FROM terms
             WHERE clean_text(term) = clean_text($1) AND origin_language = $2
             ORDER BY term = $1 DESC, term
             LIMIT 1",
        )
        .bind(term)
        .bind(origin_language)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Term"))
    }

    /// Resolves `term` like `find`, falling back to the base term of a lexical
    /// `form` whose cleaned value matches.
    pub async fn find_by_form<'e, E>(
        executor: E,
        term: &str,
        origin_language: Language,
    ) -> Result<Term, AppError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Term>(
            "SELECT term, origin_language FROM (
                 SELECT term, origin_language, 0 AS rank FROM terms
                 WHERE clean_text(term) = clean_text($1) AND origin_language = $2
                 UNION ALL
                 SELECT term, origin_language, 1 AS rank FROM term_lexicals
                 WHERE clean_text(value) = clean_text($1) AND origin_language = $2
                   AND type = 'form'
             ) AS candidates
             ORDER BY rank, term
             LIMIT 1",
        )
        .bind(term)
        .bind(origin_language)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Term"))
    }

    /// Meanings of the term's definition translations into `language`.
    pub async fn meanings<'e, E>(&self, executor: E, language: Language) -> Result<Vec<String>, AppError>
    where
        E: PgExecutor<'e>,
    {
        let meanings = sqlx::query_scalar::<_, String>(
            "SELECT t.meaning FROM term_definition_translations t
             JOIN term_definitions d ON d.id = t.term_definition_id
             WHERE d.term = $1 AND d.origin_language = $2 AND t.language = $3
             ORDER BY d.id",
        )
        .bind(&self.term)
        .bind(self.origin_language)
        .bind(language)
        .fetch_all(executor)
        .await?;
        Ok(meanings)
    }
}

/// A lexical relation of a term: synonym, antonym, inflected form or idiom.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TermLexical {
    pub id: i32,
    pub term: String,
    pub origin_language: Language,
    pub value: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: TermLexicalType,
    pub description: Option<String>,
}

/// Payload for `POST /term/lexical`.
#[derive(Debug, Deserialize, Validate)]
pub struct TermLexicalInput {
    pub term: String,
    pub origin_language: Language,
    #[validate(length(min = 1, max = 256))]
    pub value: String,
    #[serde(rename = "type")]
    pub kind: TermLexicalType,
    pub description: Option<String>,
}

/// Query parameters for `GET /term/lexical`.
#[derive(Debug, Deserialize)]
pub struct TermLexicalQuery {
    pub term: String,
    pub origin_language: Language,
    #[serde(rename = "type")]
    pub kind: Option<TermLexicalType>,
}

pub(crate) const LEXICAL_COLUMNS: &str = "id, term, origin_language, value, type, description";

impl TermLexical {
    pub async fn find<'e, E>(executor: E, id: i32) -> Result<TermLexical, AppError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TermLexical>(&format!(
            "SELECT {} FROM term_lexicals WHERE id = $1",
            LEXICAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("TermLexical"))
    }

    pub async fn list_for<'e, E>(
        executor: E,
        term: &Term,
        kind: Option<TermLexicalType>,
    ) -> Result<Vec<TermLexical>, AppError>
    where
        E: PgExecutor<'e>,
    {
        let lexicals = sqlx::query_as::<_, TermLexical>(&format!(
            "SELECT {} FROM term_lexicals
             WHERE term = $1 AND origin_language = $2 AND ($3::term_lexical_type IS NULL OR type = $3)
             ORDER BY id",
            LEXICAL_COLUMNS
        ))
        .bind(&term.term)
        .bind(term.origin_language)
        .bind(kind)
        .fetch_all(executor)
        .await?;
        Ok(lexicals)
    }
}

/// One sense of a term.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TermDefinition {
    pub id: i32,
    pub term: String,
    pub origin_language: Language,
    pub term_level: Option<TermLevel>,
    pub part_of_speech: PartOfSpeech,
    pub definition: String,
}

/// Payload for `POST /term/definition`.
#[derive(Debug, Deserialize, Validate)]
pub struct TermDefinitionInput {
    pub term: String,
    pub origin_language: Language,
    pub term_level: Option<TermLevel>,
    pub part_of_speech: PartOfSpeech,
    #[validate(length(min = 1))]
    pub definition: String,
}

/// Payload for `PATCH /term/definition/{id}`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TermDefinitionUpdate {
    pub term_level: Option<TermLevel>,
    pub part_of_speech: Option<PartOfSpeech>,
    #[validate(length(min = 1))]
    pub definition: Option<String>,
}

/// Query parameters for `GET /term/definition`.
#[derive(Debug, Deserialize)]
pub struct TermDefinitionQuery {
    pub term: String,
    pub origin_language: Language,
    pub translation_language: Option<Language>,
    pub part_of_speech: Option<PartOfSpeech>,
    pub term_level: Option<TermLevel>,
}

/// A definition, with its translation when one was requested.
#[derive(Debug, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TermDefinitionView {
    pub id: i32,
    pub term: String,
    pub origin_language: Language,
    pub term_level: Option<TermLevel>,
    pub part_of_speech: PartOfSpeech,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub translation_language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub translation_meaning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub translation_definition: Option<String>,
}

pub(crate) const DEFINITION_COLUMNS: &str =
    "id, term, origin_language, term_level, part_of_speech, definition";

impl TermDefinition {
    pub async fn find<'e, E>(executor: E, id: i32) -> Result<TermDefinition, AppError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TermDefinition>(&format!(
            "SELECT {} FROM term_definitions WHERE id = $1",
            DEFINITION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("TermDefinition"))
    }
}

/// A definition translated into another language.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TermDefinitionTranslation {
    pub term_definition_id: i32,
    pub language: Language,
    /// The definition text, translated.
    pub translation: String,
    /// Short equivalent of the term in `language`.
    pub meaning: String,
}

/// Payload for `POST /term/definition/translation`.
#[derive(Debug, Deserialize, Validate)]
pub struct TermDefinitionTranslationInput {
    pub term_definition_id: i32,
    pub language: Language,
    #[validate(length(min = 1))]
    pub translation: String,
    #[validate(length(min = 1, max = 256))]
    pub meaning: String,
}

/// Payload for `PATCH /term/definition/{id}/{language}`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TermDefinitionTranslationUpdate {
    #[validate(length(min = 1))]
    pub translation: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub meaning: Option<String>,
}

/// A sentence showing a term in use, with the term `*highlighted*`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TermExample {
    pub id: i32,
    pub term: String,
    pub origin_language: Language,
    pub term_definition_id: Option<i32>,
    pub term_lexical_id: Option<i32>,
    pub example: String,
}

/// Payload for `POST /term/example`.
#[derive(Debug, Deserialize, Validate)]
pub struct TermExampleInput {
    pub term: String,
    pub origin_language: Language,
    pub term_definition_id: Option<i32>,
    pub term_lexical_id: Option<i32>,
    #[validate(length(min = 1))]
    pub example: String,
}

/// Payload for `PATCH /term/example/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct TermExampleUpdate {
    #[validate(length(min = 1))]
    pub example: String,
}

/// Query parameters for `GET /term/example`.
#[derive(Debug, Deserialize)]
pub struct TermExampleQuery {
    pub term: String,
    pub origin_language: Language,
    pub translation_language: Option<Language>,
    pub term_definition_id: Option<i32>,
    pub term_lexical_id: Option<i32>,
}

/// An example, with its translation when one was requested.
#[derive(Debug, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TermExampleView {
    pub id: i32,
    pub term: String,
    pub origin_language: Language,
    pub term_definition_id: Option<i32>,
    pub term_lexical_id: Option<i32>,
    pub example: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub translation_language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub translation_example: Option<String>,
}

pub(crate) const EXAMPLE_COLUMNS: &str =
    "id, term, origin_language, term_definition_id, term_lexical_id, example";

impl TermExample {
    pub async fn find<'e, E>(executor: E, id: i32) -> Result<TermExample, AppError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TermExample>(&format!(
            "SELECT {} FROM term_examples WHERE id = $1",
            EXAMPLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("TermExample"))
    }
}

/// An example sentence translated into another language.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TermExampleTranslation {
    pub term_example_id: i32,
    pub language: Language,
    pub translation: String,
}

/// Payload for `POST /term/example/translation`.
#[derive(Debug, Deserialize, Validate)]
pub struct TermExampleTranslationInput {
    pub term_example_id: i32,
    pub language: Language,
    #[validate(length(min = 1))]
    pub translation: String,
}

/// Payload for `PATCH /term/example/{id}/{language}`.
#[derive(Debug, Deserialize, Validate)]
pub struct TermExampleTranslationUpdate {
    #[validate(length(min = 1))]
    pub translation: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_limit_offset() {
        assert_eq!(limit_offset(None, None).unwrap(), (DEFAULT_PAGE_SIZE, 0));
        assert_eq!(limit_offset(Some(3), Some(10)).unwrap(), (10, 20));
        assert_eq!(limit_offset(Some(1), Some(5)).unwrap(), (5, 0));

        let err = limit_offset(Some(i64::MAX), Some(100)).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_search_query_validation() {
        let query = TermSearchQuery {
            text: "tes".into(),
            origin_language: Language::Portuguese,
            page: Some(0),
            size: None,
        };
        assert!(query.validate().is_err());

        let query = TermSearchQuery {
            page: Some(2),
            size: Some(101),
            ..query
        };
        assert!(query.validate().is_err());

        let query = TermSearchQuery {
            size: Some(100),
            ..query
        };
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_lexical_type_field_name() {
        let lexical = TermLexical {
            id: 1,
            term: "casa".into(),
            origin_language: Language::Portuguese,
            value: "lar".into(),
            kind: TermLexicalType::Synonym,
            description: None,
        };
        let json = serde_json::to_value(&lexical).unwrap();
        assert_eq!(json["type"], "synonym");

        let input: TermLexicalInput = serde_json::from_value(serde_json::json!({
            "term": "casa",
            "origin_language": "pt",
            "value": "casas",
            "type": "form"
        }))
        .unwrap();
        assert_eq!(input.kind, TermLexicalType::Form);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_definition_view_hides_missing_translation() {
        let view = TermDefinitionView {
            id: 1,
            term: "house".into(),
            origin_language: Language::English,
            term_level: Some(TermLevel::Beginner),
            part_of_speech: PartOfSpeech::Noun,
            definition: "A building for people to live in.".into(),
            translation_language: None,
            translation_meaning: None,
            translation_definition: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("translation_meaning").is_none());
        assert_eq!(json["term_level"], "A1");
    }
}
