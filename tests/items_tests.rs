mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{Auth, spawn_app};

#[tokio::test]
async fn items_require_an_api_key() {
    let app = spawn_app().await;

    let (status, body) = app.get("/items/", Auth::None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "API key missing");

    let (status, body) = app.get("/items/", Auth::ApiKey("made-up-secret")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Invalid API key");
}

#[tokio::test]
async fn bearer_tokens_do_not_open_items() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let (status, body) = app.get("/items/", Auth::Bearer(&admin)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "API key missing");
}

#[tokio::test]
async fn item_crud_round_trip() {
    let app = spawn_app().await;
    let key = app.api_key().await;

    let (status, created) = app
        .json(
            "POST",
            "/items/",
            Auth::ApiKey(&key),
            json!({ "title": "Widget", "description": "A small widget" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Widget");
    assert_eq!(created["description"], "A small widget");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = app.get(&format!("/items/{id}"), Auth::ApiKey(&key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = app
        .json(
            "PUT",
            &format!("/items/{id}"),
            Auth::ApiKey(&key),
            json!({ "title": "Gadget" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Gadget");
    assert_eq!(updated["description"], "A small widget");
    assert_eq!(updated["created_at"], created["created_at"]);

    let (status, body) = app.delete(&format!("/items/{id}"), Auth::ApiKey(&key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item deleted successfully");

    let (status, body) = app.get(&format!("/items/{id}"), Auth::ApiKey(&key)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Item not found");
}

#[tokio::test]
async fn put_can_clear_description() {
    let app = spawn_app().await;
    let key = app.api_key().await;

    let (_, created) = app
        .json(
            "POST",
            "/items/",
            Auth::ApiKey(&key),
            json!({ "title": "Lamp", "description": "Bright" }),
        )
        .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = app
        .json(
            "PUT",
            &format!("/items/{id}"),
            Auth::ApiKey(&key),
            json!({ "description": null }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Lamp");
    assert!(updated["description"].is_null());
}

#[tokio::test]
async fn missing_items_are_404() {
    let app = spawn_app().await;
    let key = app.api_key().await;
    let missing = uuid::Uuid::new_v4();

    let (status, _) = app
        .json(
            "PUT",
            &format!("/items/{missing}"),
            Auth::ApiKey(&key),
            json!({ "title": "Nothing" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .delete(&format!("/items/{missing}"), Auth::ApiKey(&key))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Item not found");
}

#[tokio::test]
async fn item_input_is_validated() {
    let app = spawn_app().await;
    let key = app.api_key().await;

    let (status, body) = app
        .json("POST", "/items/", Auth::ApiKey(&key), json!({ "title": "" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "title");

    let (status, body) = app
        .json(
            "POST",
            "/items/",
            Auth::ApiKey(&key),
            json!({ "title": "ok", "description": "d".repeat(256) }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "description");

    let (status, _) = app
        .json("POST", "/items/", Auth::ApiKey(&key), json!({ "description": "no title" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn list_counts_all_and_filters_by_title() {
    let app = spawn_app().await;
    let key = app.api_key().await;

    for title in ["Bolt", "Nut", "Bolt", "Washer"] {
        let (status, _) = app
            .json("POST", "/items/", Auth::ApiKey(&key), json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.get("/items/?limit=2", Auth::ApiKey(&key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = app.get("/items/?title=Bolt", Auth::ApiKey(&key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|item| item["title"] == "Bolt")
    );

    let (_, body) = app.get("/items/?title=Gear", Auth::ApiKey(&key)).await;
    assert_eq!(body["count"], 0);
}
