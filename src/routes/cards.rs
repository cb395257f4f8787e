use crate::{
    auth::CurrentUser,
    error::AppError,
    models::card::{default_note, CARDSET_COLUMNS, CARD_COLUMNS},
    models::{
        Card, CardInput, CardQuery, CardSet, CardSetInput, CardSetQuery, CardSetUpdate, CardUpdate,
        Term,
    },
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use log::info;
use sqlx::PgPool;
use validator::Validate;

/// Create a card set for the authenticated user
///
/// ## Responses:
/// - `201 Created`: The new `CardSet`.
/// - `401 Unauthorized`: Not authenticated.
/// - `422 Unprocessable Entity`: Validation failed.
#[post("/set")]
pub async fn create_cardset(
    pool: web::Data<PgPool>,
    cardset_data: web::Json<CardSetInput>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    cardset_data.validate()?;

    let cardset = sqlx::query_as::<_, CardSet>(&format!(
        "INSERT INTO cardsets (user_id, name, description, language)
         VALUES ($1, $2, $3, $4)
         RETURNING {}",
        CARDSET_COLUMNS
    ))
    .bind(user.id)
    .bind(&cardset_data.name)
    .bind(&cardset_data.description)
    .bind(cardset_data.language)
    .fetch_one(&**pool)
    .await?;

    info!("user {} created cardset {}", user.id, cardset.id);
    Ok(HttpResponse::Created().json(cardset))
}

/// List the authenticated user's card sets
///
/// ## Query Parameters:
/// - `name` (optional): Keep sets whose name contains this text, ignoring
///   case, accents and punctuation.
#[get("/set")]
pub async fn list_cardsets(
    pool: web::Data<PgPool>,
    query: web::Query<CardSetQuery>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let cardsets = sqlx::query_as::<_, CardSet>(&format!(
        "SELECT {} FROM cardsets
         WHERE user_id = $1
           AND ($2::text IS NULL OR clean_text(name) LIKE '%' || clean_text($2) || '%')
         ORDER BY id",
        CARDSET_COLUMNS
    ))
    .bind(user.id)
    .bind(&query.name)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(cardsets))
}

/// Retrieve one of the authenticated user's card sets
///
/// ## Responses:
/// - `200 OK`: The `CardSet`.
/// - `404 Not Found`: No such set, or it belongs to another user.
#[get("/set/{cardset_id}")]
pub async fn get_cardset(
    pool: web::Data<PgPool>,
    cardset_id: web::Path<i32>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let cardset = CardSet::find_owned(&**pool, cardset_id.into_inner(), user.id).await?;
    Ok(HttpResponse::Ok().json(cardset))
}

/// Partially update a card set
///
/// ## Responses:
/// - `200 OK`: The updated `CardSet`, with `updated_at` set.
/// - `404 Not Found`: No such set, or it belongs to another user.
#[patch("/set/{cardset_id}")]
pub async fn update_cardset(
    pool: web::Data<PgPool>,
    cardset_id: web::Path<i32>,
    cardset_data: web::Json<CardSetUpdate>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    cardset_data.validate()?;

    let cardset = sqlx::query_as::<_, CardSet>(&format!(
        "UPDATE cardsets
         SET name = COALESCE($1, name),
             description = COALESCE($2, description),
             language = COALESCE($3, language),
             updated_at = NOW()
         WHERE id = $4 AND user_id = $5
         RETURNING {}",
        CARDSET_COLUMNS
    ))
    .bind(&cardset_data.name)
    .bind(&cardset_data.description)
    .bind(cardset_data.language)
    .bind(cardset_id.into_inner())
    .bind(user.id)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::not_found("CardSet"))?;

    Ok(HttpResponse::Ok().json(cardset))
}

/// Delete a card set and its cards
///
/// ## Responses:
/// - `204 No Content`: Deleted.
/// - `404 Not Found`: No such set, or it belongs to another user.
#[delete("/set/{cardset_id}")]
pub async fn delete_cardset(
    pool: web::Data<PgPool>,
    cardset_id: web::Path<i32>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM cardsets WHERE id = $1 AND user_id = $2")
        .bind(cardset_id.into_inner())
        .bind(user.id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("CardSet"));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Add a term to one of the authenticated user's card sets
///
/// The term is looked up ignoring case, accents and punctuation; an inflected
/// form (a `form` lexical entry) resolves to its base term. Without a `note`,
/// and when the set has a language, the note is filled with the term's meanings
/// in that language.
///
/// ## Responses:
/// - `201 Created`: The new `Card`.
/// - `404 Not Found`: The set or the term does not exist.
#[post("")]
pub async fn create_card(
    pool: web::Data<PgPool>,
    card_data: web::Json<CardInput>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    card_data.validate()?;

    let cardset = CardSet::find_owned(&**pool, card_data.cardset_id, user.id).await?;
    let term = Term::find_by_form(&**pool, &card_data.term, card_data.origin_language).await?;

    let note = match (&card_data.note, cardset.language) {
        (Some(note), _) => Some(note.clone()),
        (None, Some(language)) => default_note(&term.meanings(&**pool, language).await?),
        (None, None) => None,
    };

    let card = sqlx::query_as::<_, Card>(&format!(
        "INSERT INTO cards (cardset_id, term, origin_language, note)
         VALUES ($1, $2, $3, $4)
         RETURNING {}",
        CARD_COLUMNS
    ))
    .bind(cardset.id)
    .bind(&term.term)
    .bind(term.origin_language)
    .bind(note)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(card))
}

/// List the cards of one of the authenticated user's card sets
///
/// ## Query Parameters:
/// - `term` (optional), `note` (optional): Keep cards whose term or note
///   contains this text, ignoring case, accents and punctuation.
///
/// ## Responses:
/// - `200 OK`: A JSON array of `Card`.
/// - `404 Not Found`: No such set, or it belongs to another user.
#[get("/set/{cardset_id}/card")]
pub async fn list_cards(
    pool: web::Data<PgPool>,
    cardset_id: web::Path<i32>,
    query: web::Query<CardQuery>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let cardset = CardSet::find_owned(&**pool, cardset_id.into_inner(), user.id).await?;

    let cards = sqlx::query_as::<_, Card>(&format!(
        "SELECT {} FROM cards
         WHERE cardset_id = $1
           AND ($2::text IS NULL OR clean_text(term) LIKE '%' || clean_text($2) || '%')
           AND ($3::text IS NULL OR clean_text(note) LIKE '%' || clean_text($3) || '%')
         ORDER BY id",
        CARD_COLUMNS
    ))
    .bind(cardset.id)
    .bind(&query.term)
    .bind(&query.note)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(cards))
}

/// Retrieve a card
///
/// ## Responses:
/// - `200 OK`: The `Card`.
/// - `404 Not Found`: No such card, or its set belongs to another user.
#[get("/{card_id}")]
pub async fn get_card(
    pool: web::Data<PgPool>,
    card_id: web::Path<i32>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let card = Card::find_owned(&**pool, card_id.into_inner(), user.id).await?;
    Ok(HttpResponse::Ok().json(card))
}

/// Update a card's note
///
/// ## Responses:
/// - `200 OK`: The updated `Card`, with `updated_at` set.
/// - `404 Not Found`: No such card, or its set belongs to another user.
#[patch("/{card_id}")]
pub async fn update_card(
    pool: web::Data<PgPool>,
    card_id: web::Path<i32>,
    card_data: web::Json<CardUpdate>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let card = Card::find_owned(&**pool, card_id.into_inner(), user.id).await?;

    let card = sqlx::query_as::<_, Card>(&format!(
        "UPDATE cards SET note = COALESCE($1, note), updated_at = NOW()
         WHERE id = $2
         RETURNING {}",
        CARD_COLUMNS
    ))
    .bind(&card_data.note)
    .bind(card.id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(card))
}

/// Delete a card
///
/// ## Responses:
/// - `204 No Content`: Deleted.
/// - `404 Not Found`: No such card, or its set belongs to another user.
#[delete("/{card_id}")]
pub async fn delete_card(
    pool: web::Data<PgPool>,
    card_id: web::Path<i32>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let card = Card::find_owned(&**pool, card_id.into_inner(), user.id).await?;

    sqlx::query("DELETE FROM cards WHERE id = $1")
        .bind(card.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
