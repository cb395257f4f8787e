pub mod card;
pub mod enums;
pub mod exercise;
pub mod pronunciation;
pub mod term;
pub mod user;

pub use card::{Card, CardInput, CardQuery, CardSet, CardSetInput, CardSetQuery, CardSetUpdate, CardUpdate};
pub use enums::{ExerciseType, Language, PartOfSpeech, TermLevel, TermLexicalType};
pub use exercise::{
    Exercise, ExerciseAnswer, ExerciseCheck, ExerciseHistory, ExerciseHistoryInput,
    ExerciseHistoryQuery, ExerciseLink, ExerciseList, ExercisePayload, ExerciseQuery, NewExercise,
};
pub use pronunciation::{
    ModelRef, Pronunciation, PronunciationInput, PronunciationLink, PronunciationLinkInput,
    PronunciationModel, PronunciationUpdate, PronunciationView,
};
pub use term::{
    Term, TermDefinition, TermDefinitionInput, TermDefinitionQuery, TermDefinitionTranslation,
    TermDefinitionTranslationInput, TermDefinitionTranslationUpdate, TermDefinitionUpdate,
    TermDefinitionView, TermExample, TermExampleInput, TermExampleQuery, TermExampleTranslation,
    TermExampleTranslationInput, TermExampleTranslationUpdate, TermExampleUpdate, TermExampleView,
    TermInput, TermLexical, TermLexicalInput, TermLexicalQuery, TermMeaningSearchQuery, TermQuery,
    TermSearchQuery, TermView,
};
pub use user::{User, UserInput, UserUpdate, UserView};
