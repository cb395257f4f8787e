use crate::{
    auth::AdminUser,
    error::AppError,
    events,
    models::pronunciation::{PRONUNCIATION_COLUMNS, PRONUNCIATION_VIEW_SELECT},
    models::{
        ModelRef, Pronunciation, PronunciationInput, PronunciationLink, PronunciationLinkInput,
        PronunciationModel, PronunciationUpdate, PronunciationView,
    },
};
use actix_web::{get, patch, post, web, HttpResponse, Responder};
use log::info;
use sqlx::PgPool;
use validator::{validate_url, Validate};

/// Create a pronunciation for a term, example or lexical entry
///
/// Exactly one model must be given: `term` with `origin_language`,
/// `term_example_id` or `term_lexical_id`. The pronunciation takes its
/// `language` and `text` from that model. When `audio_file` is set, the
/// matching listen exercise is created.
///
/// ## Responses:
/// - `201 Created`: A `PronunciationView`.
/// - `404 Not Found`: The model does not exist.
/// - `422 Unprocessable Entity`: No model, several models, or an invalid URL.
#[post("/pronunciation")]
pub async fn create_pronunciation(
    pool: web::Data<PgPool>,
    pronunciation_data: web::Json<PronunciationInput>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    pronunciation_data.validate()?;
    let model = pronunciation_data.model.model()?;

    let mut tx = pool.begin().await?;
    let resolved = model.resolve(&mut *tx).await?;

    let pronunciation = sqlx::query_as::<_, Pronunciation>(&format!(
        "INSERT INTO pronunciations (language, text, phonetic, description, audio_file)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        PRONUNCIATION_COLUMNS
    ))
    .bind(resolved.language)
    .bind(&resolved.text)
    .bind(&pronunciation_data.phonetic)
    .bind(&pronunciation_data.description)
    .bind(&pronunciation_data.audio_file)
    .fetch_one(&mut *tx)
    .await?;

    let link = PronunciationLink::create(&mut *tx, pronunciation.id, &resolved.link).await?;
    events::pronunciation_linked(&mut tx, &pronunciation, &link).await?;
    tx.commit().await?;

    info!("created pronunciation {}", pronunciation.id);
    Ok(HttpResponse::Created().json(pronunciation.view(&link)))
}

/// Link an existing pronunciation to another model
///
/// ## Responses:
/// - `201 Created`: A `PronunciationView` for the new link.
/// - `404 Not Found`: The pronunciation or the model does not exist.
/// - `422 Unprocessable Entity`: No model or several models.
#[post("/pronunciation/link")]
pub async fn link_pronunciation(
    pool: web::Data<PgPool>,
    link_data: web::Json<PronunciationLinkInput>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let model = link_data.model.model()?;

    let mut tx = pool.begin().await?;
    let pronunciation = Pronunciation::find(&mut *tx, link_data.pronunciation_id).await?;
    let resolved = model.resolve(&mut *tx).await?;

    let link = PronunciationLink::create(&mut *tx, pronunciation.id, &resolved.link).await?;
    events::pronunciation_linked(&mut tx, &pronunciation, &link).await?;
    tx.commit().await?;

    Ok(HttpResponse::Created().json(pronunciation.view(&link)))
}

/// List the pronunciations of a term, example or lexical entry
///
/// ## Query Parameters:
/// Exactly one model: `term` with `origin_language`, `term_example_id` or
/// `term_lexical_id`. Terms are matched ignoring case, accents and punctuation.
///
/// ## Responses:
/// - `200 OK`: A JSON array of `PronunciationView`.
/// - `422 Unprocessable Entity`: No model or several models.
#[get("/pronunciation")]
pub async fn list_pronunciations(
    pool: web::Data<PgPool>,
    query: web::Query<ModelRef>,
) -> Result<impl Responder, AppError> {
    let pronunciations = match query.model()? {
        PronunciationModel::Term {
            term,
            origin_language,
        } => {
            sqlx::query_as::<_, PronunciationView>(&format!(
                "{} WHERE clean_text(l.term) = clean_text($1) AND l.origin_language = $2 ORDER BY p.id",
                PRONUNCIATION_VIEW_SELECT
            ))
            .bind(term)
            .bind(origin_language)
            .fetch_all(&**pool)
            .await?
        }
        PronunciationModel::Example(example_id) => {
            sqlx::query_as::<_, PronunciationView>(&format!(
                "{} WHERE l.term_example_id = $1 ORDER BY p.id",
                PRONUNCIATION_VIEW_SELECT
            ))
            .bind(example_id)
            .fetch_all(&**pool)
            .await?
        }
        PronunciationModel::Lexical(lexical_id) => {
            sqlx::query_as::<_, PronunciationView>(&format!(
                "{} WHERE l.term_lexical_id = $1 ORDER BY p.id",
                PRONUNCIATION_VIEW_SELECT
            ))
            .bind(lexical_id)
            .fetch_all(&**pool)
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(pronunciations))
}

/// Partially update a pronunciation
///
/// Setting `audio_file` creates the listen exercises of every link; setting
/// it to `null` removes them.
///
/// ## Responses:
/// - `200 OK`: The updated `Pronunciation`.
/// - `404 Not Found`: No such pronunciation.
/// - `422 Unprocessable Entity`: Invalid `audio_file` URL.
#[patch("/pronunciation/{pronunciation_id}")]
pub async fn update_pronunciation(
    pool: web::Data<PgPool>,
    pronunciation_id: web::Path<i32>,
    pronunciation_data: web::Json<PronunciationUpdate>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    pronunciation_data.validate()?;
    if let Some(Some(audio_file)) = &pronunciation_data.audio_file {
        if !validate_url(audio_file.as_str()) {
            return Err(AppError::ValidationError("audio_file must be a URL.".into()));
        }
    }

    let mut tx = pool.begin().await?;
    let current = Pronunciation::find(&mut *tx, pronunciation_id.into_inner()).await?;
    let audio_file = match &pronunciation_data.audio_file {
        Some(audio_file) => audio_file.clone(),
        None => current.audio_file.clone(),
    };

    let pronunciation = sqlx::query_as::<_, Pronunciation>(&format!(
        "UPDATE pronunciations
         SET phonetic = COALESCE($1, phonetic),
             description = COALESCE($2, description),
             audio_file = $3
         WHERE id = $4
         RETURNING {}",
        PRONUNCIATION_COLUMNS
    ))
    .bind(&pronunciation_data.phonetic)
    .bind(&pronunciation_data.description)
    .bind(&audio_file)
    .bind(current.id)
    .fetch_one(&mut *tx)
    .await?;

    if pronunciation.audio_file != current.audio_file {
        events::audio_changed(&mut tx, &pronunciation).await?;
    }
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(pronunciation))
}
