use latch_models::{auth::user::User, error::Error};
use serial_test::serial;

mod common;
use common::{create_user, db_test_context::DBTestContext, pool};

#[test]
#[serial]
#[ignore = "requires DATABASE_URL pointing at a disposable PostgreSQL database"]
fn create_and_authenticate() {
    let _ctx = DBTestContext::from_env();
    let db = pool();

    let user = create_user(&db, "Jane@Example.com", "correct horse");
    assert_eq!(user.email, "jane@example.com");
    assert_ne!(user.password, "correct horse");

    let found = User::authenticate("JANE@example.com", "correct horse", &db).unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(User::fetch_by_id(user.id, &db).unwrap().email, user.email);
}

#[test]
#[serial]
#[ignore = "requires DATABASE_URL pointing at a disposable PostgreSQL database"]
fn wrong_password_and_unknown_email_look_the_same() {
    let _ctx = DBTestContext::from_env();
    let db = pool();
    create_user(&db, "jane@example.com", "correct horse");

    let wrong_password = User::authenticate("jane@example.com", "battery staple", &db);
    let unknown_email = User::authenticate("john@example.com", "correct horse", &db);
    assert!(matches!(wrong_password, Err(Error::WrongCredentials)));
    assert!(matches!(unknown_email, Err(Error::WrongCredentials)));
}

#[test]
#[serial]
#[ignore = "requires DATABASE_URL pointing at a disposable PostgreSQL database"]
fn update_password_replaces_hash() {
    let _ctx = DBTestContext::from_env();
    let db = pool();
    let user = create_user(&db, "jane@example.com", "old password");

    user.update_password("new password", &db).unwrap();
    assert!(User::authenticate("jane@example.com", "old password", &db).is_err());
    assert!(User::authenticate("jane@example.com", "new password", &db).is_ok());
}
