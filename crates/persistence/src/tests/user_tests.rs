// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use localmarket_domain::{EntityId, PageRequest, Role, User};

use super::{create_test_persistence, create_test_user};
use crate::{NewUserData, PageSlice, Persistence, PersistenceError, SessionData, UserFilter};

#[test]
fn test_create_user_normalizes_email_and_hashes_password() {
    let mut persistence: Persistence = create_test_persistence();

    let user: User = create_test_user(&mut persistence, "  Alice@Example.COM ", Role::User);

    assert_eq!(user.email, "alice@example.com");
    assert_ne!(user.password_hash, "Correct-Horse-42");
    assert!(
        persistence
            .verify_password("Correct-Horse-42", &user.password_hash)
            .unwrap()
    );
    assert!(
        !persistence
            .verify_password("wrong-password", &user.password_hash)
            .unwrap()
    );
}

#[test]
fn test_duplicate_email_differing_in_case_is_rejected() {
    let mut persistence: Persistence = create_test_persistence();
    create_test_user(&mut persistence, "bob@example.com", Role::User);

    let result: Result<User, PersistenceError> = persistence.create_user(&NewUserData {
        email: String::from("BOB@example.com"),
        password: String::from("Another-Pass-7"),
        first_name: String::from("Bob"),
        last_name: String::from("Again"),
        phone: None,
        role: Role::User,
        payment_customer_id: None,
    });

    assert!(matches!(result, Err(PersistenceError::UniqueViolation(_))));
}

#[test]
fn test_get_user_by_email_is_case_insensitive() {
    let mut persistence: Persistence = create_test_persistence();
    let user: User = create_test_user(&mut persistence, "carol@example.com", Role::Admin);

    let found: Option<User> = persistence.get_user_by_email("CAROL@EXAMPLE.COM").unwrap();

    assert_eq!(found.map(|u| u.id), Some(user.id));
}

#[test]
fn test_get_unknown_user_returns_none() {
    let mut persistence: Persistence = create_test_persistence();

    assert!(
        persistence
            .get_user_by_id(&EntityId::generate())
            .unwrap()
            .is_none()
    );
    assert!(
        persistence
            .get_user_by_email("nobody@example.com")
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_update_user_changes_profile_and_password() {
    let mut persistence: Persistence = create_test_persistence();
    let mut user: User = create_test_user(&mut persistence, "dave@example.com", Role::User);

    user.first_name = String::from("David");
    user.phone = Some(String::from("0600000000"));
    persistence
        .update_user(&user, Some("Brand-New-Pass-9"))
        .unwrap();

    let stored: User = persistence.get_user_by_id(&user.id).unwrap().unwrap();
    assert_eq!(stored.first_name, "David");
    assert_eq!(stored.phone.as_deref(), Some("0600000000"));
    assert!(
        persistence
            .verify_password("Brand-New-Pass-9", &stored.password_hash)
            .unwrap()
    );
}

#[test]
fn test_update_unknown_user_fails() {
    let mut persistence: Persistence = create_test_persistence();
    let mut user: User = create_test_user(&mut persistence, "erin@example.com", Role::User);
    user.id = EntityId::generate();

    let result: Result<(), PersistenceError> = persistence.update_user(&user, None);

    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
}

#[test]
fn test_list_users_filters_by_role_and_pages() {
    let mut persistence: Persistence = create_test_persistence();
    create_test_user(&mut persistence, "a@example.com", Role::User);
    create_test_user(&mut persistence, "b@example.com", Role::Storekeeper);
    create_test_user(&mut persistence, "c@example.com", Role::User);
    create_test_user(&mut persistence, "d@example.com", Role::User);

    let filter: UserFilter = UserFilter {
        role: Some(Role::User),
    };
    let first_page: PageSlice<User> = persistence
        .list_users(&filter, &PageRequest::new(Some(2), None).unwrap())
        .unwrap();

    assert_eq!(first_page.total_count, 3);
    assert_eq!(first_page.items.len(), 3, "one extra row signals more pages");

    let after: String = localmarket_domain::encode_cursor(&first_page.items[1].id);
    let second_page: PageSlice<User> = persistence
        .list_users(&filter, &PageRequest::new(Some(2), Some(&after)).unwrap())
        .unwrap();

    assert_eq!(second_page.total_count, 3);
    assert_eq!(second_page.items.len(), 1);
    assert_eq!(second_page.items[0].email, "d@example.com");
}

#[test]
fn test_session_lifecycle() {
    let mut persistence: Persistence = create_test_persistence();
    let user: User = create_test_user(&mut persistence, "frank@example.com", Role::User);

    persistence
        .create_session("session_token_1", &user.id, "2099-01-01T00:00:00Z")
        .unwrap();
    persistence.update_session_activity("session_token_1").unwrap();

    let session: SessionData = persistence
        .get_session_by_token("session_token_1")
        .unwrap()
        .unwrap();
    assert_eq!(session.user_id, user.id);
    assert_eq!(session.expires_at, "2099-01-01T00:00:00Z");

    persistence.delete_session("session_token_1").unwrap();
    assert!(
        persistence
            .get_session_by_token("session_token_1")
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_delete_expired_sessions_keeps_live_ones() {
    let mut persistence: Persistence = create_test_persistence();
    let user: User = create_test_user(&mut persistence, "grace@example.com", Role::User);

    persistence
        .create_session("expired", &user.id, "2000-01-01T00:00:00Z")
        .unwrap();
    persistence
        .create_session("live", &user.id, "2099-01-01T00:00:00Z")
        .unwrap();

    assert_eq!(persistence.delete_expired_sessions().unwrap(), 1);
    assert!(persistence.get_session_by_token("expired").unwrap().is_none());
    assert!(persistence.get_session_by_token("live").unwrap().is_some());
}

#[test]
fn test_delete_sessions_for_user() {
    let mut persistence: Persistence = create_test_persistence();
    let user: User = create_test_user(&mut persistence, "heidi@example.com", Role::User);
    let other: User = create_test_user(&mut persistence, "ivan@example.com", Role::User);

    persistence
        .create_session("h1", &user.id, "2099-01-01T00:00:00Z")
        .unwrap();
    persistence
        .create_session("h2", &user.id, "2099-01-01T00:00:00Z")
        .unwrap();
    persistence
        .create_session("i1", &other.id, "2099-01-01T00:00:00Z")
        .unwrap();

    assert_eq!(persistence.delete_sessions_for_user(&user.id).unwrap(), 2);
    assert!(persistence.get_session_by_token("i1").unwrap().is_some());
}
