#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use common::{
    cleanup_term, cleanup_user, create_term, create_user, get_json, patch_json, post_json,
    read_response, test_config, test_pool, unique,
};
use fluentia::models::{Card, CardSet};
use serde_json::json;

#[actix_rt::test]
async fn test_cardset_crud_flow() {
    let pool = test_pool().await;
    let config = test_config();
    let app = test_app!(pool, config);

    let user = create_user(&pool, &config, false).await;
    let intruder = create_user(&pool, &config, false).await;

    // 1. Create
    let (status, body) = post_json(
        &app,
        "/card/set",
        &user,
        json!({ "name": "Viagem à Lisboa", "description": "Words for the trip", "language": "en" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Create cardset failed: {}", body);
    let cardset: CardSet = serde_json::from_value(body).unwrap();
    assert_eq!(cardset.user_id, user.id);
    assert!(cardset.updated_at.is_none());

    let (status, _) = post_json(&app, "/card/set", &user, json!({ "name": "" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // 2. List, filtered by a name fragment without the accent
    let (status, body) = get_json(&app, "/card/set?name=a%20lisboa", Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
    let sets: Vec<CardSet> = serde_json::from_value(body).unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].id, cardset.id);

    let (_, body) = get_json(&app, "/card/set", Some(&intruder)).await;
    assert!(body.as_array().unwrap().is_empty());

    // 3. Get, only for the owner
    let (status, _) = get_json(&app, &format!("/card/set/{}", cardset.id), Some(&user)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(&app, &format!("/card/set/{}", cardset.id), Some(&intruder)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "CardSet object does not exists.");

    let (status, _) = get_json(&app, &format!("/card/set/{}", cardset.id), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 4. Update
    let (status, body) = patch_json(
        &app,
        &format!("/card/set/{}", cardset.id),
        &user,
        json!({ "name": "Lisboa" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated: CardSet = serde_json::from_value(body).unwrap();
    assert_eq!(updated.name, "Lisboa");
    assert_eq!(updated.description.as_deref(), Some("Words for the trip"));
    assert!(updated.updated_at.is_some());

    let (status, _) = patch_json(
        &app,
        &format!("/card/set/{}", cardset.id),
        &intruder,
        json!({ "name": "Mine now" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 5. Delete
    let req = test::TestRequest::delete()
        .uri(&format!("/card/set/{}", cardset.id))
        .append_header(intruder.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/card/set/{}", cardset.id))
        .append_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (status, _) = get_json(&app, &format!("/card/set/{}", cardset.id), Some(&user)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    cleanup_user(&pool, &user.email).await;
    cleanup_user(&pool, &intruder.email).await;
}

#[actix_rt::test]
async fn test_card_flow() {
    let pool = test_pool().await;
    let config = test_config();
    let app = test_app!(pool, config);

    let admin = create_user(&pool, &config, true).await;
    let user = create_user(&pool, &config, false).await;
    let intruder = create_user(&pool, &config, false).await;

    let suffix = unique();
    let term = format!("banco{}", suffix);
    let form = format!("bancos{}", suffix);
    create_term(&app, &admin, &term).await;
    post_json(
        &app,
        "/term/lexical",
        &admin,
        json!({ "term": term, "origin_language": "pt", "value": form, "type": "form" }),
    )
    .await;
    let (_, definition) = post_json(
        &app,
        "/term/definition",
        &admin,
        json!({ "term": term, "origin_language": "pt", "part_of_speech": "noun", "definition": "Instituição financeira." }),
    )
    .await;
    post_json(
        &app,
        "/term/definition/translation",
        &admin,
        json!({ "term_definition_id": definition["id"], "language": "en", "translation": "Financial institution.", "meaning": "bank" }),
    )
    .await;
    // Untranslated definitions add nothing to the note
    let (status, _) = post_json(
        &app,
        "/term/definition",
        &admin,
        json!({ "term": term, "origin_language": "pt", "part_of_speech": "noun", "definition": "Assento comprido." }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, cardset) = post_json(&app, "/card/set", &user, json!({ "name": "Money", "language": "en" })).await;
    let cardset_id = cardset["id"].as_i64().unwrap();

    // An inflected form resolves to its term; the note defaults to the meanings
    let (status, body) = post_json(
        &app,
        "/card",
        &user,
        json!({ "cardset_id": cardset_id, "term": form.to_uppercase(), "origin_language": "pt" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Create card failed: {}", body);
    let card: Card = serde_json::from_value(body).unwrap();
    assert_eq!(card.term, term);
    assert_eq!(card.note.as_deref(), Some("bank"));

    // Another user's set
    let (status, _) = post_json(
        &app,
        "/card",
        &intruder,
        json!({ "cardset_id": cardset_id, "term": term, "origin_language": "pt" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Unknown term
    let (status, body) = post_json(
        &app,
        "/card",
        &user,
        json!({ "cardset_id": cardset_id, "term": format!("nada{}", suffix), "origin_language": "pt" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Term object does not exists.");

    // Listing
    let (status, body) = get_json(&app, &format!("/card/set/{}/card", cardset_id), Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = get_json(&app, &format!("/card/set/{}/card?note=BANK", cardset_id), Some(&user)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = get_json(&app, &format!("/card/set/{}/card?note=river", cardset_id), Some(&user)).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = get_json(&app, &format!("/card/set/{}/card", cardset_id), Some(&intruder)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Get, update, delete
    let (status, _) = get_json(&app, &format!("/card/{}", card.id), Some(&intruder)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = patch_json(
        &app,
        &format!("/card/{}", card.id),
        &user,
        json!({ "note": "where the money sleeps" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated: Card = serde_json::from_value(body).unwrap();
    assert_eq!(updated.note.as_deref(), Some("where the money sleeps"));
    assert!(updated.updated_at.is_some());

    let req = test::TestRequest::delete()
        .uri(&format!("/card/{}", card.id))
        .append_header(user.bearer())
        .to_request();
    let (status, body) = read_response(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = get_json(&app, &format!("/card/{}", card.id), Some(&user)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    cleanup_term(&pool, &term).await;
    cleanup_user(&pool, &admin.email).await;
    cleanup_user(&pool, &user.email).await;
    cleanup_user(&pool, &intruder.email).await;
}
