use super::*;

// =============================================================================
// ErrorKind::classify
// =============================================================================

#[test]
fn classify_invalid_credentials_code() {
    assert_eq!(ErrorKind::classify(Some("user_invalid_credentials"), Some(401)), ErrorKind::InvalidCredentials);
}

#[test]
fn classify_existing_user_code() {
    assert_eq!(ErrorKind::classify(Some("user_already_exists"), Some(409)), ErrorKind::UserExists);
}

#[test]
fn classify_code_wins_over_status() {
    assert_eq!(ErrorKind::classify(Some("general_rate_limit_exceeded"), Some(500)), ErrorKind::RateLimited);
}

#[test]
fn classify_missing_scope_as_unauthorized() {
    assert_eq!(ErrorKind::classify(Some("general_unauthorized_scope"), Some(401)), ErrorKind::Unauthorized);
}

#[test]
fn classify_disabled_provider_as_oauth_misconfigured() {
    assert_eq!(ErrorKind::classify(Some("project_provider_disabled"), Some(412)), ErrorKind::OAuthMisconfigured);
}

#[test]
fn classify_falls_back_to_status() {
    assert_eq!(ErrorKind::classify(Some("something_new"), Some(401)), ErrorKind::Unauthorized);
    assert_eq!(ErrorKind::classify(None, Some(409)), ErrorKind::UserExists);
    assert_eq!(ErrorKind::classify(None, Some(429)), ErrorKind::RateLimited);
    assert_eq!(ErrorKind::classify(None, Some(503)), ErrorKind::Server);
}

#[test]
fn classify_unknown_is_other() {
    assert_eq!(ErrorKind::classify(None, None), ErrorKind::Other);
    assert_eq!(ErrorKind::classify(None, Some(400)), ErrorKind::Other);
}

// =============================================================================
// AuthFailure
// =============================================================================

#[test]
fn failure_displays_provider_message() {
    let failure = AuthFailure::new(ErrorKind::InvalidCredentials, "Invalid credentials");
    assert_eq!(failure.to_string(), "Invalid credentials");
}

#[test]
fn friendly_message_network() {
    let failure = AuthFailure::network("error sending request");
    assert_eq!(failure.friendly_message(), "Network error. Please check your connection.");
}

#[test]
fn friendly_message_cancelled() {
    let failure = AuthFailure::new(ErrorKind::Cancelled, "user closed window");
    assert_eq!(failure.friendly_message(), "Sign-in was cancelled.");
}

#[test]
fn friendly_message_passes_through_provider_text() {
    let failure = AuthFailure::new(ErrorKind::UserExists, "A user with the same email already exists.");
    assert_eq!(failure.friendly_message(), "A user with the same email already exists.");
}

#[test]
fn friendly_message_appends_scope_troubleshooting() {
    let failure = AuthFailure::new(ErrorKind::OAuthMisconfigured, "missing scope")
        .with_details(serde_json::json!({ "type": "general_unauthorized_scope" }));
    let text = failure.friendly_message();
    assert!(text.starts_with("OAuth setup is incomplete."));
    assert!(text.contains("Verify callback URLs"));
}

// =============================================================================
// User
// =============================================================================

#[test]
fn user_deserializes_provider_account() {
    let json = serde_json::json!({
        "$id": "64f1c0",
        "$createdAt": "2024-01-01T00:00:00.000+00:00",
        "name": "Ann",
        "email": "a@b.com",
        "emailVerification": false,
        "registration": "2024-01-01T00:00:00.000+00:00",
        "prefs": {}
    });
    let user: User = serde_json::from_value(json).unwrap();
    assert_eq!(user.id, "64f1c0");
    assert_eq!(user.name, "Ann");
    assert_eq!(user.email, "a@b.com");
    assert_eq!(user.email_verification, Some(false));
}

#[test]
fn user_display_name_falls_back_to_email() {
    let user = User {
        id: "u1".into(),
        email: "a@b.com".into(),
        name: "  ".into(),
        email_verification: None,
        registration: None,
    };
    assert_eq!(user.display_name(), "a@b.com");
}

#[test]
fn session_info_deserializes() {
    let json = serde_json::json!({ "$id": "s1", "userId": "u1", "provider": "email", "expire": "2030-01-01" });
    let session: SessionInfo = serde_json::from_value(json).unwrap();
    assert_eq!(session.user_id, "u1");
    assert_eq!(session.provider, "email");
}
