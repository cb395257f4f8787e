use crate::{
    auth::AdminUser,
    error::AppError,
    events,
    models::term::EXAMPLE_COLUMNS,
    models::{
        Language, Term, TermDefinition, TermExample, TermExampleInput, TermExampleQuery,
        TermExampleTranslation, TermExampleTranslationInput, TermExampleTranslationUpdate,
        TermExampleUpdate, TermExampleView, TermLexical,
    },
    text::is_highlighted,
};
use actix_web::{get, patch, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

fn require_highlight(text: &str) -> Result<(), AppError> {
    if is_highlighted(text) {
        Ok(())
    } else {
        Err(AppError::ValidationError(
            "the term must be highlighted with '*'.".into(),
        ))
    }
}

/// Add an example sentence to a term
///
/// The example must highlight the term, e.g. `I live in a *house*`.
/// Creating an example also creates its `speak-sentence` exercise.
///
/// ## Responses:
/// - `201 Created`: The new `TermExample`.
/// - `200 OK`: The same example (ignoring case, accents and punctuation)
///   already exists for the term; it is returned.
/// - `404 Not Found`: The term does not exist, or the definition or lexical entry
///   does not exist or belongs to another term.
/// - `422 Unprocessable Entity`: The example is not highlighted.
#[post("/example")]
pub async fn create_example(
    pool: web::Data<PgPool>,
    example_data: web::Json<TermExampleInput>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    example_data.validate()?;
    require_highlight(&example_data.example)?;

    let existing = sqlx::query_as::<_, TermExample>(&format!(
        "SELECT {} FROM term_examples
         WHERE clean_text(term) = clean_text($1)
           AND origin_language = $2
           AND clean_text(example) = clean_text($3)
         ORDER BY id
         LIMIT 1",
        EXAMPLE_COLUMNS
    ))
    .bind(&example_data.term)
    .bind(example_data.origin_language)
    .bind(&example_data.example)
    .fetch_optional(&**pool)
    .await?;

    if let Some(example) = existing {
        return Ok(HttpResponse::Ok().json(example));
    }

    let mut tx = pool.begin().await?;
    let term = Term::find(&mut *tx, &example_data.term, example_data.origin_language).await?;
    // Both links must point at entries of the same term
    if let Some(definition_id) = example_data.term_definition_id {
        let definition = TermDefinition::find(&mut *tx, definition_id).await?;
        if definition.term != term.term || definition.origin_language != term.origin_language {
            return Err(AppError::not_found("TermDefinition"));
        }
    }
    if let Some(lexical_id) = example_data.term_lexical_id {
        let lexical = TermLexical::find(&mut *tx, lexical_id).await?;
        if lexical.term != term.term || lexical.origin_language != term.origin_language {
            return Err(AppError::not_found("TermLexical"));
        }
    }

    let example = sqlx::query_as::<_, TermExample>(&format!(
        "INSERT INTO term_examples (term, origin_language, term_definition_id, term_lexical_id, example)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        EXAMPLE_COLUMNS
    ))
    .bind(&term.term)
    .bind(term.origin_language)
    .bind(example_data.term_definition_id)
    .bind(example_data.term_lexical_id)
    .bind(&example_data.example)
    .fetch_one(&mut *tx)
    .await?;
    events::example_created(&mut tx, &example).await?;
    tx.commit().await?;

    Ok(HttpResponse::Created().json(example))
}

/// List a term's examples
///
/// ## Query Parameters:
/// - `term`, `origin_language`: The term.
/// - `translation_language` (optional): Only examples translated into this
///   language, with `translation_example` filled.
/// - `term_definition_id` (optional), `term_lexical_id` (optional): Filters.
///
/// ## Responses:
/// - `200 OK`: A JSON array of `TermExampleView`, empty for an unknown term.
#[get("/example")]
pub async fn list_examples(
    pool: web::Data<PgPool>,
    query: web::Query<TermExampleQuery>,
) -> Result<impl Responder, AppError> {
    let mut sql = String::from(
        "SELECT e.id, e.term, e.origin_language, e.term_definition_id, e.term_lexical_id, e.example, ",
    );
    let mut param_count = 3;

    if query.translation_language.is_some() {
        sql.push_str(
            "t.language AS translation_language, t.translation AS translation_example \
             FROM term_examples e \
             JOIN term_example_translations t ON t.term_example_id = e.id AND t.language = $3",
        );
        param_count += 1;
    } else {
        sql.push_str(
            "NULL::language AS translation_language, NULL::text AS translation_example \
             FROM term_examples e",
        );
    }

    sql.push_str(" WHERE clean_text(e.term) = clean_text($1) AND e.origin_language = $2");

    if query.term_definition_id.is_some() {
        sql.push_str(&format!(" AND e.term_definition_id = ${}", param_count));
        param_count += 1;
    }
    if query.term_lexical_id.is_some() {
        sql.push_str(&format!(" AND e.term_lexical_id = ${}", param_count));
    }
    sql.push_str(" ORDER BY e.id");

    let mut query_builder = sqlx::query_as::<_, TermExampleView>(&sql)
        .bind(&query.term)
        .bind(query.origin_language);

    if let Some(language) = query.translation_language {
        query_builder = query_builder.bind(language);
    }
    if let Some(definition_id) = query.term_definition_id {
        query_builder = query_builder.bind(definition_id);
    }
    if let Some(lexical_id) = query.term_lexical_id {
        query_builder = query_builder.bind(lexical_id);
    }

    let examples = query_builder.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(examples))
}

/// Replace an example's sentence
///
/// ## Responses:
/// - `200 OK`: The updated `TermExample`.
/// - `404 Not Found`: No such example.
/// - `422 Unprocessable Entity`: The new sentence is not highlighted.
#[patch("/example/{example_id}")]
pub async fn update_example(
    pool: web::Data<PgPool>,
    example_id: web::Path<i32>,
    example_data: web::Json<TermExampleUpdate>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    example_data.validate()?;
    require_highlight(&example_data.example)?;

    let example = sqlx::query_as::<_, TermExample>(&format!(
        "UPDATE term_examples SET example = $1 WHERE id = $2 RETURNING {}",
        EXAMPLE_COLUMNS
    ))
    .bind(&example_data.example)
    .bind(example_id.into_inner())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::not_found("TermExample"))?;

    Ok(HttpResponse::Ok().json(example))
}

/// Translate an example
///
/// The translation must highlight the translated term. Creating it also
/// creates the `order-sentence` exercise for that language.
///
/// ## Responses:
/// - `201 Created`: The new `TermExampleTranslation`.
/// - `404 Not Found`: No such example.
/// - `409 Conflict`: The example already has a translation in that language.
/// - `422 Unprocessable Entity`: The translation is not highlighted.
#[post("/example/translation")]
pub async fn create_example_translation(
    pool: web::Data<PgPool>,
    translation_data: web::Json<TermExampleTranslationInput>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    translation_data.validate()?;
    require_highlight(&translation_data.translation)?;

    let mut tx = pool.begin().await?;
    let example = TermExample::find(&mut *tx, translation_data.term_example_id).await?;

    let translation = sqlx::query_as::<_, TermExampleTranslation>(
        "INSERT INTO term_example_translations (term_example_id, language, translation)
         VALUES ($1, $2, $3)
         RETURNING term_example_id, language, translation",
    )
    .bind(example.id)
    .bind(translation_data.language)
    .bind(&translation_data.translation)
    .fetch_one(&mut *tx)
    .await?;
    events::example_translation_created(&mut tx, &example, &translation).await?;
    tx.commit().await?;

    Ok(HttpResponse::Created().json(translation))
}

/// Replace an example translation
///
/// ## Responses:
/// - `200 OK`: The updated `TermExampleTranslation`.
/// - `404 Not Found`: No translation of that example in that language.
/// - `422 Unprocessable Entity`: The translation is not highlighted.
#[patch("/example/{example_id}/{language}")]
pub async fn update_example_translation(
    pool: web::Data<PgPool>,
    path: web::Path<(i32, Language)>,
    translation_data: web::Json<TermExampleTranslationUpdate>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    translation_data.validate()?;
    require_highlight(&translation_data.translation)?;
    let (example_id, language) = path.into_inner();

    let translation = sqlx::query_as::<_, TermExampleTranslation>(
        "UPDATE term_example_translations SET translation = $1
         WHERE term_example_id = $2 AND language = $3
         RETURNING term_example_id, language, translation",
    )
    .bind(&translation_data.translation)
    .bind(example_id)
    .bind(language)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::not_found("TermExampleTranslation"))?;

    Ok(HttpResponse::Ok().json(translation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_highlight() {
        assert!(require_highlight("I live in a *house*.").is_ok());
        assert!(matches!(
            require_highlight("I live in a house."),
            Err(AppError::ValidationError(_))
        ));
    }
}
