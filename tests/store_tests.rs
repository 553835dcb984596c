mod common;

use stockroom::db::{Creatable, Deletable, Readable, Updatable, is_unique_violation};
use stockroom::models::{ItemCreate, ItemUpdate, UserCreate, UserUpdate};

use common::spawn_app;

#[tokio::test]
async fn created_user_never_holds_plaintext() {
    let app = spawn_app().await;
    let users = app.store().users();

    let user = users
        .create(UserCreate::regular("hash@b.com", "password123"))
        .await
        .unwrap();

    assert_ne!(user.hashed_password, "password123");
    assert!(!user.hashed_password.contains("password123"));
    assert!(user.hashed_password.starts_with("$argon2id$"));
}

#[tokio::test]
async fn authenticate_fails_the_same_way_for_both_causes() {
    let app = spawn_app().await;
    let users = app.store().users();
    let created = users
        .create(UserCreate::regular("auth@b.com", "password123"))
        .await
        .unwrap();

    let ok = users.authenticate("auth@b.com", "password123").await.unwrap();
    assert_eq!(ok.map(|u| u.id), Some(created.id));

    let wrong = users.authenticate("auth@b.com", "password999").await.unwrap();
    let unknown = users.authenticate("nobody@b.com", "password123").await.unwrap();
    assert!(wrong.is_none());
    assert!(unknown.is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_unique_violation() {
    let app = spawn_app().await;
    let users = app.store().users();

    users
        .create(UserCreate::regular("dup@b.com", "password123"))
        .await
        .unwrap();
    let err = users
        .create(UserCreate::regular("dup@b.com", "password456"))
        .await
        .unwrap_err();

    assert!(is_unique_violation(&err));
    assert!(users.get_by_email("dup@b.com").await.unwrap().is_some());
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let app = spawn_app().await;
    let users = app.store().users();
    let input = UserCreate {
        full_name: Some("Round Trip".to_string()),
        is_active: false,
        ..UserCreate::regular("rt@b.com", "password123")
    };

    let created = users.create(input).await.unwrap();
    let fetched = users.get(created.id).await.unwrap().unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.email, "rt@b.com");
    assert_eq!(fetched.full_name.as_deref(), Some("Round Trip"));
    assert!(!fetched.is_active);
    assert!(!fetched.is_superuser);
    assert_eq!(fetched.created_at, fetched.updated_at);
}

#[tokio::test]
async fn partial_update_touches_only_given_fields() {
    let app = spawn_app().await;
    let users = app.store().users();
    let created = users
        .create(UserCreate::regular("partial@b.com", "password123"))
        .await
        .unwrap();

    let patch = UserUpdate {
        full_name: Some(Some("Only Name".to_string())),
        ..UserUpdate::default()
    };
    let updated = users.update(created.clone(), patch).await.unwrap();

    assert_eq!(updated.full_name.as_deref(), Some("Only Name"));
    assert_eq!(updated.email, created.email);
    assert_eq!(updated.is_active, created.is_active);
    assert_eq!(updated.hashed_password, created.hashed_password);
    assert!(updated.updated_at >= updated.created_at);
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn password_update_rehashes() {
    let app = spawn_app().await;
    let users = app.store().users();
    let created = users
        .create(UserCreate::regular("rehash@b.com", "password123"))
        .await
        .unwrap();

    let updated = users.set_password(created.clone(), "password456").await.unwrap();

    assert_ne!(updated.hashed_password, created.hashed_password);
    assert!(users.verify_password(&updated, "password456").await.unwrap());
    assert!(!users.verify_password(&updated, "password123").await.unwrap());
}

#[tokio::test]
async fn remove_returns_row_then_nothing() {
    let app = spawn_app().await;
    let items = app.store().items();
    let item = items
        .create(ItemCreate {
            title: "Temporary".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let removed = items.remove(item.id).await.unwrap();
    assert_eq!(removed.map(|i| i.id), Some(item.id));

    assert!(items.remove(item.id).await.unwrap().is_none());
    assert!(items.get(item.id).await.unwrap().is_none());
}

#[tokio::test]
async fn items_by_title_and_stable_listing() {
    let app = spawn_app().await;
    let items = app.store().items();

    let mut ids = Vec::new();
    for title in ["Cog", "Spring", "Cog"] {
        let item = items
            .create(ItemCreate {
                title: title.to_string(),
                description: None,
            })
            .await
            .unwrap();
        ids.push(item.id);
    }

    let cogs = items.get_by_title("Cog").await.unwrap();
    assert_eq!(cogs.len(), 2);
    assert!(items.get_by_title("cog").await.unwrap().is_empty());

    let first = items.list(0, 10).await.unwrap();
    let again = items.list(0, 10).await.unwrap();
    assert_eq!(first, again);
    assert_eq!(items.count().await.unwrap(), 3);
    assert_eq!(items.list(1, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn item_update_distinguishes_absent_from_null() {
    let app = spawn_app().await;
    let items = app.store().items();
    let item = items
        .create(ItemCreate {
            title: "Valve".to_string(),
            description: Some("Brass".to_string()),
        })
        .await
        .unwrap();

    let kept = items
        .update(
            item,
            ItemUpdate {
                title: Some("Valve v2".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(kept.description.as_deref(), Some("Brass"));

    let cleared = items
        .update(
            kept,
            ItemUpdate {
                title: None,
                description: Some(None),
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.title, "Valve v2");
    assert!(cleared.description.is_none());
}

#[tokio::test]
async fn bootstrap_superuser_is_idempotent() {
    let app = spawn_app().await;

    app.store()
        .init_superuser(&app.state.config().bootstrap)
        .await
        .unwrap();

    let admin = app
        .store()
        .users()
        .get_by_email(common::ADMIN_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert!(admin.is_superuser);
    assert!(admin.is_active);
    assert_eq!(admin.full_name.as_deref(), Some(stockroom::db::SUPERUSER_NAME));
    assert_eq!(app.store().users().count().await.unwrap(), 1);
}
