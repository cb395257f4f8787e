use crate::{
    auth::CurrentUser,
    error::AppError,
    models::exercise::{DEFAULT_EXERCISE_AMOUNT, HISTORY_COLUMNS},
    models::{
        CardSet, Exercise, ExerciseAnswer, ExerciseCheck, ExerciseHistory, ExerciseHistoryInput,
        ExerciseHistoryQuery, ExerciseLink, ExerciseList, ExercisePayload, ExerciseQuery,
        ExerciseType, Language, Pronunciation, TermExample,
    },
    text::{blank_highlight, strip_highlight, words},
};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use log::debug;
use rand::seq::SliceRandom;
use sqlx::PgPool;
use validator::Validate;

/// Wrong choices offered next to the right one in multiple choice exercises.
const WRONG_CHOICES: i64 = 3;

/// Pick random exercises
///
/// ## Query Parameters:
/// - `type`: Exercise type, or `random` for any type.
/// - `language`: Language being learned.
/// - `translation_language` (optional): Language of translation based exercises.
/// - `term_level` (optional): Only terms having a definition of this level.
/// - `cardset_id` (optional): Only terms of one of the authenticated user's
///   card sets.
/// - `amount` (optional): Between 1 and 256, default 10.
///
/// ## Responses:
/// - `200 OK`: `{amount, exercises: [{id, type, url}]}`; `amount` is the number
///   actually found.
/// - `401 Unauthorized`: `cardset_id` given without authentication.
/// - `404 Not Found`: The card set does not exist or belongs to another user.
#[get("")]
pub async fn list_exercises(
    pool: web::Data<PgPool>,
    query: web::Query<ExerciseQuery>,
    user: Option<CurrentUser>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    query.validate()?;

    let cardset = match query.cardset_id {
        Some(cardset_id) => {
            let CurrentUser(user) =
                user.ok_or_else(|| AppError::Unauthorized("not authenticated".into()))?;
            Some(CardSet::find_owned(&**pool, cardset_id, user.id).await?)
        }
        None => None,
    };

    let mut sql = String::from("SELECT e.id, e.type FROM exercises e WHERE e.language = $1");
    let mut param_count = 2;

    if query.kind != ExerciseType::Random {
        sql.push_str(&format!(" AND e.type = ${}", param_count));
        param_count += 1;
    }
    if query.translation_language.is_some() {
        sql.push_str(&format!(
            " AND (e.translation_language IS NULL OR e.translation_language = ${})",
            param_count
        ));
        param_count += 1;
    }
    if query.term_level.is_some() {
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM term_definitions d \
             WHERE d.term = e.term AND d.origin_language = e.origin_language AND d.term_level = ${})",
            param_count
        ));
        param_count += 1;
    }
    if cardset.is_some() {
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM cards c \
             WHERE c.cardset_id = ${} AND c.term = e.term AND c.origin_language = e.origin_language)",
            param_count
        ));
        param_count += 1;
    }
    sql.push_str(&format!(" ORDER BY random() LIMIT ${}", param_count));

    let mut query_builder = sqlx::query_as::<_, ExerciseLink>(&sql).bind(query.language);

    if query.kind != ExerciseType::Random {
        query_builder = query_builder.bind(query.kind);
    }
    if let Some(translation_language) = query.translation_language {
        query_builder = query_builder.bind(translation_language);
    }
    if let Some(term_level) = query.term_level {
        query_builder = query_builder.bind(term_level);
    }
    if let Some(cardset) = &cardset {
        query_builder = query_builder.bind(cardset.id);
    }
    query_builder = query_builder.bind(query.amount.unwrap_or(DEFAULT_EXERCISE_AMOUNT));

    let mut exercises = query_builder.fetch_all(&**pool).await?;
    for exercise in exercises.iter_mut() {
        exercise.url = req
            .url_for("get_exercise", [exercise.id.to_string()])
            .map_err(|e| AppError::InternalServerError(format!("Failed to build url: {}", e)))?
            .to_string();
    }

    Ok(HttpResponse::Ok().json(ExerciseList {
        amount: exercises.len(),
        exercises,
    }))
}

fn missing(column: &str) -> AppError {
    AppError::InternalServerError(format!("exercise without {}", column))
}

fn exercise_term(exercise: &Exercise) -> Result<(&str, Language), AppError> {
    match (&exercise.term, exercise.origin_language) {
        (Some(term), Some(origin_language)) => Ok((term.as_str(), origin_language)),
        _ => Err(missing("term")),
    }
}

async fn exercise_example(pool: &PgPool, exercise: &Exercise) -> Result<TermExample, AppError> {
    let example_id = exercise.term_example_id.ok_or_else(|| missing("term_example_id"))?;
    TermExample::find(pool, example_id).await
}

async fn example_translation(pool: &PgPool, exercise: &Exercise) -> Result<String, AppError> {
    let example_id = exercise.term_example_id.ok_or_else(|| missing("term_example_id"))?;
    sqlx::query_scalar::<_, String>(
        "SELECT translation FROM term_example_translations
         WHERE term_example_id = $1 AND language = $2",
    )
    .bind(example_id)
    .bind(exercise.translation_language)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("TermExampleTranslation"))
}

async fn exercise_pronunciation(pool: &PgPool, exercise: &Exercise) -> Result<Pronunciation, AppError> {
    let pronunciation_id = exercise.pronunciation_id.ok_or_else(|| missing("pronunciation_id"))?;
    Pronunciation::find(pool, pronunciation_id).await
}

/// Phonetic transcription of the first pronunciation linked to the term or
/// example of a speak exercise.
async fn speak_phonetic(pool: &PgPool, exercise: &Exercise) -> Result<Option<String>, AppError> {
    let phonetic = match exercise.term_example_id {
        Some(example_id) => {
            sqlx::query_scalar::<_, String>(
                "SELECT p.phonetic FROM pronunciations p
                 JOIN pronunciation_links l ON l.pronunciation_id = p.id
                 WHERE l.term_example_id = $1
                 ORDER BY p.id LIMIT 1",
            )
            .bind(example_id)
            .fetch_optional(pool)
            .await?
        }
        None => {
            let (term, origin_language) = exercise_term(exercise)?;
            sqlx::query_scalar::<_, String>(
                "SELECT p.phonetic FROM pronunciations p
                 JOIN pronunciation_links l ON l.pronunciation_id = p.id
                 WHERE l.term = $1 AND l.origin_language = $2
                 ORDER BY p.id LIMIT 1",
            )
            .bind(term)
            .bind(origin_language)
            .fetch_optional(pool)
            .await?
        }
    };
    Ok(phonetic)
}

/// The term plus random lexical values of it, shuffled.
async fn choices(pool: &PgPool, exercise: &Exercise) -> Result<Vec<String>, AppError> {
    let (term, origin_language) = exercise_term(exercise)?;
    let mut choices = sqlx::query_scalar::<_, String>(
        "SELECT value FROM term_lexicals
         WHERE term = $1 AND origin_language = $2 AND type <> 'form'
         ORDER BY random()
         LIMIT $3",
    )
    .bind(term)
    .bind(origin_language)
    .bind(WRONG_CHOICES)
    .fetch_all(pool)
    .await?;

    choices.push(term.to_string());
    choices.shuffle(&mut rand::thread_rng());
    Ok(choices)
}

/// A random example of the term with the term blanked out, or its first
/// definition when it has no example.
async fn mchoice_term_header(pool: &PgPool, exercise: &Exercise) -> Result<String, AppError> {
    let (term, origin_language) = exercise_term(exercise)?;

    let example = sqlx::query_scalar::<_, String>(
        "SELECT example FROM term_examples
         WHERE term = $1 AND origin_language = $2
         ORDER BY random() LIMIT 1",
    )
    .bind(term)
    .bind(origin_language)
    .fetch_optional(pool)
    .await?;

    if let Some(example) = example {
        return Ok(blank_highlight(&example));
    }

    sqlx::query_scalar::<_, String>(
        "SELECT definition FROM term_definitions
         WHERE term = $1 AND origin_language = $2
         ORDER BY id LIMIT 1",
    )
    .bind(term)
    .bind(origin_language)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("TermDefinition"))
}

async fn definition_meaning(pool: &PgPool, exercise: &Exercise) -> Result<String, AppError> {
    let definition_id = exercise
        .term_definition_id
        .ok_or_else(|| missing("term_definition_id"))?;
    sqlx::query_scalar::<_, String>(
        "SELECT meaning FROM term_definition_translations
         WHERE term_definition_id = $1 AND language = $2",
    )
    .bind(definition_id)
    .bind(exercise.translation_language)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("TermDefinitionTranslation"))
}

fn audio_link(pronunciation: &Pronunciation) -> Result<String, AppError> {
    pronunciation
        .audio_file
        .clone()
        .ok_or_else(|| AppError::NotFound("pronunciation has no audio.".into()))
}

async fn build_payload(pool: &PgPool, exercise: &Exercise) -> Result<ExercisePayload, AppError> {
    let payload = match exercise.kind {
        ExerciseType::OrderSentence => {
            let example = exercise_example(pool, exercise).await?;
            let mut shuffled_sentence = words(&example_translation(pool, exercise).await?);
            shuffled_sentence.shuffle(&mut rand::thread_rng());
            ExercisePayload::OrderSentence {
                sentence: strip_highlight(&example.example),
                shuffled_sentence,
            }
        }
        ExerciseType::ListenTerm => {
            let pronunciation = exercise_pronunciation(pool, exercise).await?;
            ExercisePayload::ListenTerm {
                audio_link: audio_link(&pronunciation)?,
                text: pronunciation.text,
            }
        }
        ExerciseType::ListenSentence => {
            let pronunciation = exercise_pronunciation(pool, exercise).await?;
            ExercisePayload::ListenSentence {
                audio_link: audio_link(&pronunciation)?,
                text: pronunciation.text,
            }
        }
        ExerciseType::SpeakTerm => {
            let (term, _) = exercise_term(exercise)?;
            ExercisePayload::SpeakTerm {
                text: term.to_string(),
                phonetic: speak_phonetic(pool, exercise).await?,
            }
        }
        ExerciseType::SpeakSentence => {
            let example = exercise_example(pool, exercise).await?;
            ExercisePayload::SpeakSentence {
                text: strip_highlight(&example.example),
                phonetic: speak_phonetic(pool, exercise).await?,
            }
        }
        ExerciseType::MchoiceTerm => ExercisePayload::MchoiceTerm {
            header: mchoice_term_header(pool, exercise).await?,
            choices: choices(pool, exercise).await?,
        },
        ExerciseType::MchoiceTermTranslation => ExercisePayload::MchoiceTermTranslation {
            header: definition_meaning(pool, exercise).await?,
            choices: choices(pool, exercise).await?,
        },
        ExerciseType::Random => return Err(missing("a concrete type")),
    };
    Ok(payload)
}

/// The answer an exercise expects.
async fn expected_answer(pool: &PgPool, exercise: &Exercise) -> Result<String, AppError> {
    match exercise.kind {
        ExerciseType::OrderSentence => Ok(strip_highlight(&example_translation(pool, exercise).await?)),
        ExerciseType::ListenTerm | ExerciseType::ListenSentence => {
            Ok(exercise_pronunciation(pool, exercise).await?.text)
        }
        ExerciseType::SpeakSentence => Ok(strip_highlight(&exercise_example(pool, exercise).await?.example)),
        ExerciseType::SpeakTerm | ExerciseType::MchoiceTerm | ExerciseType::MchoiceTermTranslation => {
            Ok(exercise_term(exercise)?.0.to_string())
        }
        ExerciseType::Random => Err(missing("a concrete type")),
    }
}

/// Retrieve what is needed to present an exercise
///
/// ## Responses:
/// - `200 OK`: An `ExercisePayload`, tagged by `type`.
/// - `404 Not Found`: No such exercise, or the content it is built from is gone.
#[get("/{exercise_id}", name = "get_exercise")]
pub async fn get_exercise(
    pool: web::Data<PgPool>,
    exercise_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let exercise = Exercise::find(&**pool, exercise_id.into_inner()).await?;
    let payload = build_payload(&pool, &exercise).await?;
    Ok(HttpResponse::Ok().json(payload))
}

/// Check an answer and record it in the user's history
///
/// The answer is compared with the expected one ignoring case, accents,
/// punctuation and spacing.
///
/// ## Responses:
/// - `200 OK`: `{correct, expected}`.
/// - `401 Unauthorized`: Not authenticated.
/// - `404 Not Found`: No such exercise.
#[post("/{exercise_id}/check")]
pub async fn check_exercise(
    pool: web::Data<PgPool>,
    exercise_id: web::Path<i32>,
    answer: web::Json<ExerciseAnswer>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    answer.validate()?;

    let exercise = Exercise::find(&**pool, exercise_id.into_inner()).await?;
    let expected = expected_answer(&pool, &exercise).await?;

    let correct = sqlx::query_scalar::<_, bool>("SELECT clean_text($1) = clean_text($2)")
        .bind(&answer.response)
        .bind(&expected)
        .fetch_one(&**pool)
        .await?;

    let history = ExerciseHistoryInput {
        exercise_id: exercise.id,
        correct,
        text_request: Some(expected.clone()),
        text_response: Some(answer.response.clone()),
    };
    ExerciseHistory::create(&**pool, user.id, &history).await?;
    debug!("user {} answered exercise {}: {}", user.id, exercise.id, correct);

    Ok(HttpResponse::Ok().json(ExerciseCheck { correct, expected }))
}

/// Record the result of an exercise done by the authenticated user
///
/// ## Responses:
/// - `201 Created`: The new `ExerciseHistory` entry.
/// - `401 Unauthorized`: Not authenticated.
/// - `404 Not Found`: No such exercise.
#[post("/history")]
pub async fn create_history(
    pool: web::Data<PgPool>,
    history_data: web::Json<ExerciseHistoryInput>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    history_data.validate()?;
    Exercise::find(&**pool, history_data.exercise_id).await?;

    let history = ExerciseHistory::create(&**pool, user.id, &history_data).await?;
    Ok(HttpResponse::Created().json(history))
}

/// The authenticated user's exercise history, newest first
///
/// ## Query Parameters:
/// - `exercise_id` (optional): Only attempts at this exercise.
#[get("/history")]
pub async fn list_history(
    pool: web::Data<PgPool>,
    query: web::Query<ExerciseHistoryQuery>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let history = sqlx::query_as::<_, ExerciseHistory>(&format!(
        "SELECT {} FROM exercise_history
         WHERE user_id = $1 AND ($2::integer IS NULL OR exercise_id = $2)
         ORDER BY created DESC, id DESC",
        HISTORY_COLUMNS
    ))
    .bind(user.id)
    .bind(query.exercise_id)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(history))
}
