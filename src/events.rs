//! Exercise generation.
//!
//! Each function here is called by the handler that writes the dictionary row
//! it reacts to, on the same transaction, so an exercise never outlives or
//! precedes the content it is built from. Creation is get-or-create: calling a
//! function twice for the same row yields one exercise.

use log::debug;
use sqlx::PgConnection;

use crate::error::AppError;
use crate::models::exercise::EXERCISE_COLUMNS;
use crate::models::{
    Exercise, ExerciseType, Language, NewExercise, Pronunciation, PronunciationLink, Term,
    TermDefinition, TermDefinitionTranslation, TermExample, TermExampleTranslation, TermLexical,
};

/// Non-form lexical entries a term needs before multiple choice exercises
/// can offer three wrong choices.
pub const MCHOICE_MIN_LEXICALS: i64 = 3;

pub fn reaches_mchoice(lexical_count: i64) -> bool {
    lexical_count >= MCHOICE_MIN_LEXICALS
}

/// Listen exercise kind for a pronunciation linked through `link`.
pub fn listen_type(link: &PronunciationLink) -> ExerciseType {
    if link.term_example_id.is_some() {
        ExerciseType::ListenSentence
    } else {
        ExerciseType::ListenTerm
    }
}

/// Returns the stored exercise equal to `new`, inserting it first if needed.
pub async fn get_or_create(conn: &mut PgConnection, new: &NewExercise) -> Result<Exercise, AppError> {
    let existing = sqlx::query_as::<_, Exercise>(&format!(
        "SELECT {} FROM exercises
         WHERE type = $1
           AND language = $2
           AND translation_language IS NOT DISTINCT FROM $3
           AND term IS NOT DISTINCT FROM $4
           AND origin_language IS NOT DISTINCT FROM $5
           AND term_example_id IS NOT DISTINCT FROM $6
           AND term_definition_id IS NOT DISTINCT FROM $7
           AND term_lexical_id IS NOT DISTINCT FROM $8
           AND pronunciation_id IS NOT DISTINCT FROM $9
         LIMIT 1",
        EXERCISE_COLUMNS
    ))
    .bind(new.kind)
    .bind(new.language)
    .bind(new.translation_language)
    .bind(&new.term)
    .bind(new.origin_language)
    .bind(new.term_example_id)
    .bind(new.term_definition_id)
    .bind(new.term_lexical_id)
    .bind(new.pronunciation_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(exercise) = existing {
        return Ok(exercise);
    }

    let exercise = sqlx::query_as::<_, Exercise>(&format!(
        "INSERT INTO exercises (type, language, translation_language, term, origin_language,
             term_example_id, term_definition_id, term_lexical_id, pronunciation_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {}",
        EXERCISE_COLUMNS
    ))
    .bind(new.kind)
    .bind(new.language)
    .bind(new.translation_language)
    .bind(&new.term)
    .bind(new.origin_language)
    .bind(new.term_example_id)
    .bind(new.term_definition_id)
    .bind(new.term_lexical_id)
    .bind(new.pronunciation_id)
    .fetch_one(&mut *conn)
    .await?;

    debug!("created {:?} exercise {}", exercise.kind, exercise.id);
    Ok(exercise)
}

pub async fn term_created(conn: &mut PgConnection, term: &Term) -> Result<(), AppError> {
    let new = NewExercise::for_term(ExerciseType::SpeakTerm, &term.term, term.origin_language);
    get_or_create(conn, &new).await?;
    Ok(())
}

pub async fn example_created(conn: &mut PgConnection, example: &TermExample) -> Result<(), AppError> {
    let new = NewExercise {
        term_example_id: Some(example.id),
        ..NewExercise::for_term(ExerciseType::SpeakSentence, &example.term, example.origin_language)
    };
    get_or_create(conn, &new).await?;
    Ok(())
}

pub async fn example_translation_created(
    conn: &mut PgConnection,
    example: &TermExample,
    translation: &TermExampleTranslation,
) -> Result<(), AppError> {
    let new = NewExercise {
        translation_language: Some(translation.language),
        term_example_id: Some(example.id),
        ..NewExercise::for_term(ExerciseType::OrderSentence, &example.term, example.origin_language)
    };
    get_or_create(conn, &new).await?;
    Ok(())
}

/// Creates the listen exercise of a link, when its pronunciation has audio.
pub async fn pronunciation_linked(
    conn: &mut PgConnection,
    pronunciation: &Pronunciation,
    link: &PronunciationLink,
) -> Result<(), AppError> {
    if pronunciation.audio_file.is_none() {
        return Ok(());
    }

    let (term, origin_language) = match (&link.term, link.origin_language) {
        (Some(term), Some(origin_language)) => (term.clone(), origin_language),
        _ => {
            if let Some(example_id) = link.term_example_id {
                let example = TermExample::find(&mut *conn, example_id).await?;
                (example.term, example.origin_language)
            } else if let Some(lexical_id) = link.term_lexical_id {
                let lexical = TermLexical::find(&mut *conn, lexical_id).await?;
                (lexical.term, lexical.origin_language)
            } else {
                return Ok(());
            }
        }
    };

    let new = NewExercise {
        language: pronunciation.language,
        term_example_id: link.term_example_id,
        term_lexical_id: link.term_lexical_id,
        pronunciation_id: Some(pronunciation.id),
        ..NewExercise::for_term(listen_type(link), &term, origin_language)
    };
    get_or_create(conn, &new).await?;
    Ok(())
}

/// Keeps listen exercises in step with the pronunciation's `audio_file`.
pub async fn audio_changed(conn: &mut PgConnection, pronunciation: &Pronunciation) -> Result<(), AppError> {
    if pronunciation.audio_file.is_none() {
        let removed = sqlx::query(
            "DELETE FROM exercises
             WHERE pronunciation_id = $1 AND type IN ('listen-term', 'listen-sentence')",
        )
        .bind(pronunciation.id)
        .execute(&mut *conn)
        .await?;
        debug!(
            "removed {} listen exercises of pronunciation {}",
            removed.rows_affected(),
            pronunciation.id
        );
        return Ok(());
    }

    let links = sqlx::query_as::<_, PronunciationLink>(
        "SELECT id, pronunciation_id, term, origin_language, term_example_id, term_lexical_id
         FROM pronunciation_links WHERE pronunciation_id = $1 ORDER BY id",
    )
    .bind(pronunciation.id)
    .fetch_all(&mut *conn)
    .await?;

    for link in &links {
        pronunciation_linked(conn, pronunciation, link).await?;
    }
    Ok(())
}

async fn mchoice_lexical_count(
    conn: &mut PgConnection,
    term: &str,
    origin_language: Language,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM term_lexicals
         WHERE term = $1 AND origin_language = $2 AND type <> 'form'",
    )
    .bind(term)
    .bind(origin_language)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

fn mchoice_translation(
    term: &str,
    origin_language: Language,
    definition_id: i32,
    language: Language,
) -> NewExercise {
    NewExercise {
        translation_language: Some(language),
        term_definition_id: Some(definition_id),
        ..NewExercise::for_term(ExerciseType::MchoiceTermTranslation, term, origin_language)
    }
}

/// Creates the multiple choice exercises of a term once it has enough
/// lexical entries.
pub async fn lexical_created(conn: &mut PgConnection, lexical: &TermLexical) -> Result<(), AppError> {
    let count = mchoice_lexical_count(conn, &lexical.term, lexical.origin_language).await?;
    if !reaches_mchoice(count) {
        return Ok(());
    }

    let new = NewExercise::for_term(ExerciseType::MchoiceTerm, &lexical.term, lexical.origin_language);
    get_or_create(conn, &new).await?;

    let translated = sqlx::query_as::<_, (i32, Language)>(
        "SELECT t.term_definition_id, t.language
         FROM term_definition_translations t
         JOIN term_definitions d ON d.id = t.term_definition_id
         WHERE d.term = $1 AND d.origin_language = $2
         ORDER BY t.term_definition_id",
    )
    .bind(&lexical.term)
    .bind(lexical.origin_language)
    .fetch_all(&mut *conn)
    .await?;

    for (definition_id, language) in translated {
        let new = mchoice_translation(&lexical.term, lexical.origin_language, definition_id, language);
        get_or_create(conn, &new).await?;
    }
    Ok(())
}

pub async fn definition_translation_created(
    conn: &mut PgConnection,
    definition: &TermDefinition,
    translation: &TermDefinitionTranslation,
) -> Result<(), AppError> {
    let count = mchoice_lexical_count(conn, &definition.term, definition.origin_language).await?;
    if reaches_mchoice(count) {
        let new = mchoice_translation(
            &definition.term,
            definition.origin_language,
            definition.id,
            translation.language,
        );
        get_or_create(conn, &new).await?;
    }
    Ok(())
}
