use crate::{
    auth::AdminUser,
    error::AppError,
    events,
    models::term::DEFINITION_COLUMNS,
    models::{
        Language, Term, TermDefinition, TermDefinitionInput, TermDefinitionQuery,
        TermDefinitionTranslation, TermDefinitionTranslationInput, TermDefinitionTranslationUpdate,
        TermDefinitionUpdate, TermDefinitionView,
    },
};
use actix_web::{get, patch, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Add a definition to a term
///
/// A definition matching an existing one of the same term (ignoring case,
/// accents and punctuation), with the same part of speech and level, is not
/// duplicated.
///
/// ## Responses:
/// - `201 Created`: The new `TermDefinition`.
/// - `200 OK`: The matching existing definition.
/// - `401 Unauthorized` / `403 Forbidden`: Not an administrator.
/// - `404 Not Found`: The term does not exist.
#[post("/definition")]
pub async fn create_definition(
    pool: web::Data<PgPool>,
    definition_data: web::Json<TermDefinitionInput>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    definition_data.validate()?;

    let existing = sqlx::query_as::<_, TermDefinition>(&format!(
        "SELECT {} FROM term_definitions
         WHERE clean_text(term) = clean_text($1)
           AND origin_language = $2
           AND clean_text(definition) = clean_text($3)
           AND part_of_speech = $4
           AND term_level IS NOT DISTINCT FROM $5
         ORDER BY id
         LIMIT 1",
        DEFINITION_COLUMNS
    ))
    .bind(&definition_data.term)
    .bind(definition_data.origin_language)
    .bind(&definition_data.definition)
    .bind(definition_data.part_of_speech)
    .bind(definition_data.term_level)
    .fetch_optional(&**pool)
    .await?;

    if let Some(definition) = existing {
        return Ok(HttpResponse::Ok().json(definition));
    }

    let term = Term::find(&**pool, &definition_data.term, definition_data.origin_language).await?;

    let definition = sqlx::query_as::<_, TermDefinition>(&format!(
        "INSERT INTO term_definitions (term, origin_language, term_level, part_of_speech, definition)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        DEFINITION_COLUMNS
    ))
    .bind(&term.term)
    .bind(term.origin_language)
    .bind(definition_data.term_level)
    .bind(definition_data.part_of_speech)
    .bind(&definition_data.definition)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(definition))
}

/// List a term's definitions
///
/// ## Query Parameters:
/// - `term`, `origin_language`: The term.
/// - `translation_language` (optional): Only definitions translated into this
///   language, with `translation_meaning` and `translation_definition` filled.
/// - `part_of_speech` (optional), `term_level` (optional): Filters.
///
/// ## Responses:
/// - `200 OK`: A JSON array of `TermDefinitionView`, empty for an unknown term.
#[get("/definition")]
pub async fn list_definitions(
    pool: web::Data<PgPool>,
    query: web::Query<TermDefinitionQuery>,
) -> Result<impl Responder, AppError> {
    let mut sql = String::from(
        "SELECT d.id, d.term, d.origin_language, d.term_level, d.part_of_speech, d.definition, ",
    );
    let mut param_count = 3;

    if query.translation_language.is_some() {
        sql.push_str(
            "t.language AS translation_language, t.meaning AS translation_meaning, \
             t.translation AS translation_definition \
             FROM term_definitions d \
             JOIN term_definition_translations t \
               ON t.term_definition_id = d.id AND t.language = $3",
        );
        param_count += 1;
    } else {
        sql.push_str(
            "NULL::language AS translation_language, NULL::text AS translation_meaning, \
             NULL::text AS translation_definition \
             FROM term_definitions d",
        );
    }

    sql.push_str(" WHERE clean_text(d.term) = clean_text($1) AND d.origin_language = $2");

    if query.part_of_speech.is_some() {
        sql.push_str(&format!(" AND d.part_of_speech = ${}", param_count));
        param_count += 1;
    }
    if query.term_level.is_some() {
        sql.push_str(&format!(" AND d.term_level = ${}", param_count));
    }
    sql.push_str(" ORDER BY d.id");

    let mut query_builder = sqlx::query_as::<_, TermDefinitionView>(&sql)
        .bind(&query.term)
        .bind(query.origin_language);

    if let Some(language) = query.translation_language {
        query_builder = query_builder.bind(language);
    }
    if let Some(part_of_speech) = query.part_of_speech {
        query_builder = query_builder.bind(part_of_speech);
    }
    if let Some(term_level) = query.term_level {
        query_builder = query_builder.bind(term_level);
    }

    let definitions = query_builder.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(definitions))
}

/// Partially update a definition
///
/// ## Responses:
/// - `200 OK`: The updated `TermDefinition`.
/// - `404 Not Found`: No such definition.
#[patch("/definition/{definition_id}")]
pub async fn update_definition(
    pool: web::Data<PgPool>,
    definition_id: web::Path<i32>,
    definition_data: web::Json<TermDefinitionUpdate>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    definition_data.validate()?;

    let definition = sqlx::query_as::<_, TermDefinition>(&format!(
        "UPDATE term_definitions
         SET term_level = COALESCE($1, term_level),
             part_of_speech = COALESCE($2, part_of_speech),
             definition = COALESCE($3, definition)
         WHERE id = $4
         RETURNING {}",
        DEFINITION_COLUMNS
    ))
    .bind(definition_data.term_level)
    .bind(definition_data.part_of_speech)
    .bind(&definition_data.definition)
    .bind(definition_id.into_inner())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::not_found("TermDefinition"))?;

    Ok(HttpResponse::Ok().json(definition))
}

/// Translate a definition
///
/// ## Responses:
/// - `201 Created`: The new `TermDefinitionTranslation`.
/// - `404 Not Found`: No such definition.
/// - `409 Conflict`: The definition already has a translation in that language.
#[post("/definition/translation")]
pub async fn create_definition_translation(
    pool: web::Data<PgPool>,
    translation_data: web::Json<TermDefinitionTranslationInput>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    translation_data.validate()?;

    let mut tx = pool.begin().await?;
    let definition = TermDefinition::find(&mut *tx, translation_data.term_definition_id).await?;

    let translation = sqlx::query_as::<_, TermDefinitionTranslation>(
        "INSERT INTO term_definition_translations (term_definition_id, language, translation, meaning)
         VALUES ($1, $2, $3, $4)
         RETURNING term_definition_id, language, translation, meaning",
    )
    .bind(definition.id)
    .bind(translation_data.language)
    .bind(&translation_data.translation)
    .bind(&translation_data.meaning)
    .fetch_one(&mut *tx)
    .await?;
    events::definition_translation_created(&mut tx, &definition, &translation).await?;
    tx.commit().await?;

    Ok(HttpResponse::Created().json(translation))
}

/// Partially update a definition translation
///
/// ## Responses:
/// - `200 OK`: The updated `TermDefinitionTranslation`.
/// - `404 Not Found`: No translation of that definition in that language.
#[patch("/definition/{definition_id}/{language}")]
pub async fn update_definition_translation(
    pool: web::Data<PgPool>,
    path: web::Path<(i32, Language)>,
    translation_data: web::Json<TermDefinitionTranslationUpdate>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    translation_data.validate()?;
    let (definition_id, language) = path.into_inner();

    let translation = sqlx::query_as::<_, TermDefinitionTranslation>(
        "UPDATE term_definition_translations
         SET translation = COALESCE($1, translation),
             meaning = COALESCE($2, meaning)
         WHERE term_definition_id = $3 AND language = $4
         RETURNING term_definition_id, language, translation, meaning",
    )
    .bind(&translation_data.translation)
    .bind(&translation_data.meaning)
    .bind(definition_id)
    .bind(language)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::not_found("TermDefinitionTranslation"))?;

    Ok(HttpResponse::Ok().json(translation))
}
