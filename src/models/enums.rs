use serde::{Deserialize, Serialize};

/// Languages supported by the dictionary.
/// Corresponds to the `language` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "language")]
pub enum Language {
    #[sqlx(rename = "pt")]
    #[serde(rename = "pt")]
    Portuguese,
    #[sqlx(rename = "en")]
    #[serde(rename = "en")]
    English,
    #[sqlx(rename = "de")]
    #[serde(rename = "de")]
    Deutsch,
    #[sqlx(rename = "fr")]
    #[serde(rename = "fr")]
    French,
    #[sqlx(rename = "es")]
    #[serde(rename = "es")]
    Spanish,
    #[sqlx(rename = "it")]
    #[serde(rename = "it")]
    Italian,
    #[sqlx(rename = "zh")]
    #[serde(rename = "zh")]
    Chinese,
    #[sqlx(rename = "ja")]
    #[serde(rename = "ja")]
    Japanese,
    #[sqlx(rename = "ru")]
    #[serde(rename = "ru")]
    Russian,
}

impl Language {
    /// ISO 639-1 code, as used in URLs and the database.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Portuguese => "pt",
            Language::English => "en",
            Language::Deutsch => "de",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::Italian => "it",
            Language::Chinese => "zh",
            Language::Japanese => "ja",
            Language::Russian => "ru",
        }
    }
}

/// CEFR level of a term definition.
/// Corresponds to the `term_level` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "term_level")]
pub enum TermLevel {
    #[sqlx(rename = "A1")]
    #[serde(rename = "A1")]
    Beginner,
    #[sqlx(rename = "A2")]
    #[serde(rename = "A2")]
    Elementary,
    #[sqlx(rename = "B1")]
    #[serde(rename = "B1")]
    Intermediate,
    #[sqlx(rename = "B2")]
    #[serde(rename = "B2")]
    UpperIntermediate,
    #[sqlx(rename = "C1")]
    #[serde(rename = "C1")]
    Advanced,
    #[sqlx(rename = "C2")]
    #[serde(rename = "C2")]
    Master,
}

/// Grammatical class of a definition.
/// Corresponds to the `part_of_speech` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "part_of_speech", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Adjective,
    Noun,
    Verb,
    Adverb,
    Conjunction,
    Preposition,
    Pronoun,
    Determiner,
    Number,
    Predeterminer,
    Prefix,
    Suffix,
    Slang,
    Lexical,
}

/// Kind of relation between a term and one of its lexical entries.
/// Corresponds to the `term_lexical_type` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "term_lexical_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TermLexicalType {
    Synonym,
    Antonym,
    /// An inflected form (plural, conjugation...) of the term.
    Form,
    Idiom,
}

/// Exercise kinds. `Random` is only accepted as a query filter and never stored.
/// Corresponds to the `exercise_type` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "exercise_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseType {
    /// Reorder the shuffled words of a translated sentence.
    OrderSentence,
    /// Listen to a term and write it.
    ListenTerm,
    /// Listen to an example sentence and write it.
    ListenSentence,
    /// Pronounce a term.
    SpeakTerm,
    /// Pronounce an example sentence.
    SpeakSentence,
    /// Pick the term that fills the gap of an example.
    MchoiceTerm,
    /// Pick the term matching a translated meaning.
    MchoiceTermTranslation,
    Random,
}
