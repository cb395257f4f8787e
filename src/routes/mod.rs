pub mod auth;
pub mod cards;
pub mod definitions;
pub mod examples;
pub mod exercises;
pub mod health;
pub mod pronunciations;
pub mod terms;
pub mod users;

use actix_web::web;

/// Registers every API scope.
///
/// Literal segments (`/set`, `/history`) are registered before the
/// `/{id}` patterns they would otherwise be captured by.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .service(users::create_user)
            .service(users::me)
            .service(users::update_user),
    )
    .service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::refresh_token),
    )
    .service(
        web::scope("/term")
            .service(terms::create_term)
            .service(terms::get_term)
            .service(terms::search_term)
            .service(terms::search_term_meaning)
            .service(terms::create_lexical)
            .service(terms::list_lexical)
            .service(definitions::create_definition)
            .service(definitions::list_definitions)
            .service(definitions::create_definition_translation)
            .service(definitions::update_definition)
            .service(definitions::update_definition_translation)
            .service(examples::create_example)
            .service(examples::list_examples)
            .service(examples::create_example_translation)
            .service(examples::update_example)
            .service(examples::update_example_translation)
            .service(pronunciations::create_pronunciation)
            .service(pronunciations::list_pronunciations)
            .service(pronunciations::link_pronunciation)
            .service(pronunciations::update_pronunciation),
    )
    .service(
        web::scope("/card")
            .service(cards::create_cardset)
            .service(cards::list_cardsets)
            .service(cards::get_cardset)
            .service(cards::update_cardset)
            .service(cards::delete_cardset)
            .service(cards::list_cards)
            .service(cards::create_card)
            .service(cards::get_card)
            .service(cards::update_card)
            .service(cards::delete_card),
    )
    .service(
        web::scope("/exercise")
            .service(exercises::list_exercises)
            .service(exercises::create_history)
            .service(exercises::list_history)
            .service(exercises::get_exercise)
            .service(exercises::check_exercise),
    );
}
