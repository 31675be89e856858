use chrono::TimeDelta;
use latch_auth::{
    config::TokenSettings,
    error::{Error, ErrorKind},
    token::{Token, TokenManager, TokenScope},
};
use latch_models::{auth::token::TokenRecord, store::PgTokenStore};
use serial_test::serial;

mod common;
use common::{create_user, db_test_context::DBTestContext, pool};

fn manager() -> TokenManager<PgTokenStore> {
    TokenManager::new(PgTokenStore::new(pool()), TokenSettings::default())
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL pointing at a disposable PostgreSQL database"]
async fn login_then_resolve() {
    let _ctx = DBTestContext::from_env();
    let manager = manager();
    let user = create_user(manager.store().connection(), "jane@example.com", "pw");

    let token = manager.login(user.id).await.unwrap();
    let principal = manager.resolve(&token.plain_text).await.unwrap();
    assert_eq!(principal.id, user.id);
    assert_eq!(principal.email, "jane@example.com");

    let rows = TokenRecord::fetch_by_user(user.id, manager.store().connection()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].token_hash, token.hash.to_vec());
    assert_eq!(rows[0].scope, "authentication");
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL pointing at a disposable PostgreSQL database"]
async fn second_login_invalidates_first() {
    let _ctx = DBTestContext::from_env();
    let manager = manager();
    let user = create_user(manager.store().connection(), "jane@example.com", "pw");

    let first = manager.login(user.id).await.unwrap();
    let second = manager.login(user.id).await.unwrap();

    let err = manager.resolve(&first.plain_text).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthFailure);
    assert_eq!(manager.resolve(&second.plain_text).await.unwrap().id, user.id);
    assert_eq!(
        TokenRecord::fetch_by_user(user.id, manager.store().connection())
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL pointing at a disposable PostgreSQL database"]
async fn expired_and_unknown_tokens_are_unauthenticated() {
    let _ctx = DBTestContext::from_env();
    let manager = manager();
    let user = create_user(manager.store().connection(), "jane@example.com", "pw");

    let token = manager.login(user.id).await.unwrap();
    let later = token.expiry + TimeDelta::minutes(1);
    assert!(matches!(
        manager.resolve_at(&token.plain_text, later).await,
        Err(Error::Unauthenticated)
    ));

    let stranger = Token::generate(user.id, TimeDelta::hours(1), TokenScope::Authentication).unwrap();
    assert!(matches!(
        manager.resolve(&stranger.plain_text).await,
        Err(Error::Unauthenticated)
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL pointing at a disposable PostgreSQL database"]
async fn purge_drops_expired_rows() {
    let _ctx = DBTestContext::from_env();
    let manager = manager();
    let db = manager.store().connection().clone();
    let stale_user = create_user(&db, "stale@example.com", "pw");
    let live_user = create_user(&db, "live@example.com", "pw");

    let stale = Token::generate(stale_user.id, TimeDelta::seconds(-1), TokenScope::Authentication)
        .unwrap();
    manager.issue(&stale).await.unwrap();
    manager.login(live_user.id).await.unwrap();

    assert_eq!(manager.purge_expired().await.unwrap(), 1);
    assert!(TokenRecord::fetch_by_user(stale_user.id, &db).unwrap().is_empty());
    assert_eq!(TokenRecord::fetch_by_user(live_user.id, &db).unwrap().len(), 1);
}
