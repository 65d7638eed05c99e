// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use localmarket_domain::{Role, UserPatch};
use localmarket_persistence::Persistence;

use super::{
    TEST_PASSWORD, create_test_admin, create_test_persistence, create_test_user,
    create_test_user_request,
};
use crate::{
    ApiConfig, ApiError, AuthenticatedUser, AuthenticationService, EmailTemplate, GetUserRequest,
    Integrations, ListUsersRequest, LoginRequest, LoginResponse, PageArgs, RecordedCall,
    Recorder, UpdateUserRequest, UserConnection, UserView, create_user, get_user, list_users,
    login, logout, update_user,
};

fn login_as(
    persistence: &mut Persistence,
    email: &str,
    password: &str,
) -> Result<LoginResponse, ApiError> {
    login(
        persistence,
        &ApiConfig::default(),
        &LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        },
    )
}

#[test]
fn test_create_user_registers_payment_customer_and_sends_welcome() {
    let mut persistence: Persistence = create_test_persistence();
    let recorder: Recorder = Recorder::new();

    let view: UserView = create_user(
        &mut persistence,
        &recorder.integrations(),
        &ApiConfig::default(),
        None,
        create_test_user_request("  Camille@Example.COM ", None),
    )
    .unwrap();

    assert_eq!(view.email, "camille@example.com");
    assert_eq!(view.role, Role::User);
    assert_eq!(
        recorder.calls(),
        vec![
            RecordedCall::CreateCustomer {
                email: String::from("camille@example.com")
            },
            RecordedCall::Email {
                to: String::from("camille@example.com"),
                template: EmailTemplate::Welcome
            },
        ]
    );
}

#[test]
fn test_duplicate_email_is_rejected_case_insensitively() {
    let mut persistence: Persistence = create_test_persistence();
    let integrations: Integrations = Recorder::new().integrations();
    create_test_user(&mut persistence, &integrations, "camille@example.com");

    let result = create_user(
        &mut persistence,
        &integrations,
        &ApiConfig::default(),
        None,
        create_test_user_request("CAMILLE@example.com", None),
    );

    assert!(matches!(result, Err(ApiError::AlreadyExists { .. })));
}

#[test]
fn test_anonymous_caller_cannot_create_storekeeper() {
    let mut persistence: Persistence = create_test_persistence();
    let recorder: Recorder = Recorder::new();

    let result = create_user(
        &mut persistence,
        &recorder.integrations(),
        &ApiConfig::default(),
        None,
        create_test_user_request("shop@example.com", Some(Role::Storekeeper)),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_weak_password_is_rejected() {
    let mut persistence: Persistence = create_test_persistence();
    let mut request = create_test_user_request("camille@example.com", None);
    request.password = String::from("short");

    let result = create_user(
        &mut persistence,
        &Recorder::new().integrations(),
        &ApiConfig::default(),
        None,
        request,
    );

    let err: ApiError = result.unwrap_err();
    assert!(matches!(err, ApiError::PasswordPolicyViolation { .. }));
    assert_eq!(err.kind(), "InvalidInput");
}

#[test]
fn test_login_creates_valid_session() {
    let mut persistence: Persistence = create_test_persistence();
    let integrations: Integrations = Recorder::new().integrations();
    let user: AuthenticatedUser =
        create_test_user(&mut persistence, &integrations, "camille@example.com");

    let response: LoginResponse =
        login_as(&mut persistence, "Camille@Example.com", TEST_PASSWORD).unwrap();
    assert!(response.token.starts_with("session_"));
    assert_eq!(response.user.id, user.id.to_string());

    let session: AuthenticatedUser =
        AuthenticationService::validate_session(&mut persistence, &response.token).unwrap();
    assert_eq!(session, user);

    logout(&mut persistence, &response.token).unwrap();
    assert!(AuthenticationService::validate_session(&mut persistence, &response.token).is_err());
}

#[test]
fn test_login_failures_share_one_message() {
    let mut persistence: Persistence = create_test_persistence();
    let integrations: Integrations = Recorder::new().integrations();
    create_test_user(&mut persistence, &integrations, "camille@example.com");

    let wrong_password: ApiError =
        login_as(&mut persistence, "camille@example.com", "Wrong-Horse-42").unwrap_err();
    let unknown_email: ApiError =
        login_as(&mut persistence, "nobody@example.com", TEST_PASSWORD).unwrap_err();

    assert_eq!(wrong_password.kind(), "AuthenticationFailed");
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[test]
fn test_user_cannot_promote_themselves() {
    let mut persistence: Persistence = create_test_persistence();
    let integrations: Integrations = Recorder::new().integrations();
    let user: AuthenticatedUser =
        create_test_user(&mut persistence, &integrations, "camille@example.com");

    let result = update_user(
        &mut persistence,
        &ApiConfig::default(),
        Some(&user),
        &UpdateUserRequest {
            id: None,
            patch: UserPatch {
                role: Some(Role::Admin),
                ..UserPatch::default()
            },
        },
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_password_change_ends_existing_sessions() {
    let mut persistence: Persistence = create_test_persistence();
    let integrations: Integrations = Recorder::new().integrations();
    let user: AuthenticatedUser =
        create_test_user(&mut persistence, &integrations, "camille@example.com");
    let session: LoginResponse =
        login_as(&mut persistence, "camille@example.com", TEST_PASSWORD).unwrap();

    update_user(
        &mut persistence,
        &ApiConfig::default(),
        Some(&user),
        &UpdateUserRequest {
            id: None,
            patch: UserPatch {
                password: Some(String::from("Battery-Staple-77")),
                ..UserPatch::default()
            },
        },
    )
    .unwrap();

    assert!(AuthenticationService::validate_session(&mut persistence, &session.token).is_err());
    assert!(login_as(&mut persistence, "camille@example.com", TEST_PASSWORD).is_err());
    assert!(login_as(&mut persistence, "camille@example.com", "Battery-Staple-77").is_ok());
}

#[test]
fn test_user_cannot_read_another_user() {
    let mut persistence: Persistence = create_test_persistence();
    let integrations: Integrations = Recorder::new().integrations();
    let first: AuthenticatedUser =
        create_test_user(&mut persistence, &integrations, "first@example.com");
    let second: AuthenticatedUser =
        create_test_user(&mut persistence, &integrations, "second@example.com");

    let result = get_user(
        &mut persistence,
        Some(&first),
        &GetUserRequest {
            id: Some(second.id.to_string()),
        },
    );
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));

    let own: UserView =
        get_user(&mut persistence, Some(&first), &GetUserRequest { id: None }).unwrap();
    assert_eq!(own.email, "first@example.com");
}

#[test]
fn test_list_users_pages_with_cursor() {
    let mut persistence: Persistence = create_test_persistence();
    let integrations: Integrations = Recorder::new().integrations();
    let admin: AuthenticatedUser = create_test_admin(&mut persistence);
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        create_test_user(&mut persistence, &integrations, email);
    }

    let request = |after: Option<String>| ListUsersRequest {
        role: Some(Role::User),
        page: PageArgs {
            first: Some(2),
            after,
        },
    };

    let first: UserConnection = list_users(&mut persistence, Some(&admin), &request(None)).unwrap();
    assert_eq!(first.total_count, 3);
    assert_eq!(first.edges.len(), 2);
    assert!(first.page_info.has_next_page);

    let second: UserConnection = list_users(
        &mut persistence,
        Some(&admin),
        &request(Some(first.page_info.end_cursor.clone())),
    )
    .unwrap();
    assert_eq!(second.edges.len(), 1);
    assert!(!second.page_info.has_next_page);
}

#[test]
fn test_list_users_requires_admin() {
    let mut persistence: Persistence = create_test_persistence();
    let integrations: Integrations = Recorder::new().integrations();
    let user: AuthenticatedUser =
        create_test_user(&mut persistence, &integrations, "camille@example.com");

    let result = list_users(
        &mut persistence,
        Some(&user),
        &ListUsersRequest {
            role: None,
            page: PageArgs::default(),
        },
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}
