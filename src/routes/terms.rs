use crate::{
    auth::AdminUser,
    error::AppError,
    events,
    models::pronunciation::PRONUNCIATION_VIEW_SELECT,
    models::term::{limit_offset, LEXICAL_COLUMNS},
    models::{
        PronunciationView, Term, TermInput, TermLexical, TermLexicalInput, TermLexicalQuery,
        TermMeaningSearchQuery, TermQuery, TermSearchQuery, TermView,
    },
};
use actix_web::{get, post, web, HttpResponse, Responder};
use log::info;
use sqlx::PgPool;
use validator::Validate;

/// Add a term to the dictionary
///
/// Creating a term also creates its `speak-term` exercise.
///
/// ## Responses:
/// - `201 Created`: The new `Term`.
/// - `200 OK`: The term already existed; it is returned unchanged.
/// - `401 Unauthorized` / `403 Forbidden`: Not an administrator.
#[post("")]
pub async fn create_term(
    pool: web::Data<PgPool>,
    term_data: web::Json<TermInput>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    term_data.validate()?;

    let mut tx = pool.begin().await?;
    let inserted = sqlx::query_as::<_, Term>(
        "INSERT INTO terms (term, origin_language) VALUES ($1, $2)
         ON CONFLICT (term, origin_language) DO NOTHING
         RETURNING term, origin_language",
    )
    .bind(&term_data.term)
    .bind(term_data.origin_language)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(term) = inserted else {
        let existing = sqlx::query_as::<_, Term>(
            "SELECT term, origin_language FROM terms WHERE term = $1 AND origin_language = $2",
        )
        .bind(&term_data.term)
        .bind(term_data.origin_language)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        return Ok(HttpResponse::Ok().json(existing));
    };

    events::term_created(&mut tx, &term).await?;
    tx.commit().await?;

    info!("created term {:?} ({})", term.term, term.origin_language.code());
    Ok(HttpResponse::Created().json(term))
}

/// Look up a term
///
/// The term is matched ignoring case, accents and punctuation.
///
/// ## Query Parameters:
/// - `term`, `origin_language`: The term to find.
/// - `translation_language` (optional): Fill `meanings` with the meanings of the
///   term's definitions in this language.
/// - `lexical` (optional): Include the lexical entries.
/// - `pronunciation` (optional): Include the pronunciations.
///
/// ## Responses:
/// - `200 OK`: A `TermView`.
/// - `404 Not Found`: No such term.
#[get("")]
pub async fn get_term(
    pool: web::Data<PgPool>,
    query: web::Query<TermQuery>,
) -> Result<impl Responder, AppError> {
    let term = Term::find(&**pool, &query.term, query.origin_language).await?;

    let meanings = match query.translation_language {
        Some(language) => term.meanings(&**pool, language).await?,
        None => Vec::new(),
    };

    let lexical = if query.lexical {
        TermLexical::list_for(&**pool, &term, None).await?
    } else {
        Vec::new()
    };

    let pronunciations = if query.pronunciation {
        sqlx::query_as::<_, PronunciationView>(&format!(
            "{} WHERE l.term = $1 AND l.origin_language = $2 ORDER BY p.id",
            PRONUNCIATION_VIEW_SELECT
        ))
        .bind(&term.term)
        .bind(term.origin_language)
        .fetch_all(&**pool)
        .await?
    } else {
        Vec::new()
    };

    Ok(HttpResponse::Ok().json(TermView {
        term: term.term,
        origin_language: term.origin_language,
        meanings,
        lexical,
        pronunciations,
    }))
}

/// Search terms by prefix
///
/// ## Query Parameters:
/// - `text`: Prefix to look for, compared on cleaned text.
/// - `origin_language`: Language of the terms.
/// - `page` (optional): 1-based page, default 1.
/// - `size` (optional): Page size between 1 and 100, default 50.
#[get("/search")]
pub async fn search_term(
    pool: web::Data<PgPool>,
    query: web::Query<TermSearchQuery>,
) -> Result<impl Responder, AppError> {
    query.validate()?;
    let (limit, offset) = limit_offset(query.page, query.size)?;

    let terms = sqlx::query_as::<_, Term>(
        "SELECT term, origin_language FROM terms
         WHERE origin_language = $1 AND clean_text(term) LIKE clean_text($2) || '%'
         ORDER BY term
         LIMIT $3 OFFSET $4",
    )
    .bind(query.origin_language)
    .bind(&query.text)
    .bind(limit)
    .bind(offset)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(terms))
}

/// Search terms by the prefix of one of their translated meanings
///
/// ## Query Parameters:
/// - `text`: Prefix of the meaning, compared on cleaned text.
/// - `origin_language`: Language of the terms.
/// - `translation_language`: Language of the meanings.
/// - `page`, `size` (optional): As in `/term/search`.
#[get("/search-meaning")]
pub async fn search_term_meaning(
    pool: web::Data<PgPool>,
    query: web::Query<TermMeaningSearchQuery>,
) -> Result<impl Responder, AppError> {
    query.validate()?;
    let (limit, offset) = limit_offset(query.page, query.size)?;

    let terms = sqlx::query_as::<_, Term>(
        "SELECT DISTINCT d.term, d.origin_language
         FROM term_definitions d
         JOIN term_definition_translations t ON t.term_definition_id = d.id
         WHERE d.origin_language = $1
           AND t.language = $2
           AND clean_text(t.meaning) LIKE clean_text($3) || '%'
         ORDER BY d.term
         LIMIT $4 OFFSET $5",
    )
    .bind(query.origin_language)
    .bind(query.translation_language)
    .bind(&query.text)
    .bind(limit)
    .bind(offset)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(terms))
}

/// Add a lexical entry to a term
///
/// Once a term has three non-form lexical entries its multiple choice
/// exercises are created.
///
/// ## Responses:
/// - `201 Created`: The new `TermLexical`.
/// - `401 Unauthorized` / `403 Forbidden`: Not an administrator.
/// - `404 Not Found`: The term does not exist.
#[post("/lexical")]
pub async fn create_lexical(
    pool: web::Data<PgPool>,
    lexical_data: web::Json<TermLexicalInput>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    lexical_data.validate()?;

    let mut tx = pool.begin().await?;
    let term = Term::find(&mut *tx, &lexical_data.term, lexical_data.origin_language).await?;

    let lexical = sqlx::query_as::<_, TermLexical>(&format!(
        "INSERT INTO term_lexicals (term, origin_language, value, type, description)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        LEXICAL_COLUMNS
    ))
    .bind(&term.term)
    .bind(term.origin_language)
    .bind(&lexical_data.value)
    .bind(lexical_data.kind)
    .bind(&lexical_data.description)
    .fetch_one(&mut *tx)
    .await?;
    events::lexical_created(&mut tx, &lexical).await?;
    tx.commit().await?;

    Ok(HttpResponse::Created().json(lexical))
}

/// List a term's lexical entries
///
/// An unknown term yields an empty list.
#[get("/lexical")]
pub async fn list_lexical(
    pool: web::Data<PgPool>,
    query: web::Query<TermLexicalQuery>,
) -> Result<impl Responder, AppError> {
    let lexicals = sqlx::query_as::<_, TermLexical>(&format!(
        "SELECT {} FROM term_lexicals
         WHERE clean_text(term) = clean_text($1)
           AND origin_language = $2
           AND ($3::term_lexical_type IS NULL OR type = $3)
         ORDER BY id",
        LEXICAL_COLUMNS
    ))
    .bind(&query.term)
    .bind(query.origin_language)
    .bind(query.kind)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(lexicals))
}
