use super::*;

#[test]
fn provider_error_prints_friendly_message() {
    let failure = AuthFailure::new(ErrorKind::Network, "error sending request");
    let err = CliError::from(SessionError::Provider(failure));
    assert_eq!(err.to_string(), "Network error. Please check your connection.");
}

#[test]
fn busy_session_maps_to_busy() {
    let err = CliError::from(SessionError::Busy);
    assert!(matches!(err, CliError::Busy));
    assert_eq!(err.to_string(), "another auth operation is already in progress");
}

#[test]
fn credential_error_prints_form_copy() {
    let err = CliError::from(CredentialError::InvalidEmail);
    assert_eq!(err.to_string(), "Please enter a valid email address");
}

#[test]
fn flags_override_project() {
    let cli = Cli::try_parse_from(["bus-tracker", "--project", "from-flag", "--platform", "ios", "ping"]).unwrap();
    let config = load_config(&cli).unwrap();
    assert_eq!(config.project_id, "from-flag");
    assert_eq!(config.platform.as_str(), "ios");
}

#[test]
fn login_accepts_email_flag() {
    let cli = Cli::try_parse_from(["bus-tracker", "login", "--email", "a@b.com", "--password", "pw"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Login { email: Some(ref e), password: Some(ref p) } if e == "a@b.com" && p == "pw"
    ));
}

#[tokio::test]
async fn supplied_password_skips_prompt() {
    let prompt = Prompt::new();
    assert_eq!(prompt.secret_or_ask(Some("longpassword"), "password: ").await.unwrap(), "longpassword");
}

#[test]
fn locate_unknown_stop_is_error() {
    let err = run_locate("Rispana").unwrap_err();
    assert_eq!(err.to_string(), "no bus is currently assigned to 'Rispana'");
}
