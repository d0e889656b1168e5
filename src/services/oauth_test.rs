use super::*;

fn web_callbacks() -> CallbackUrls {
    Platform::Web.callback_urls(Platform::Web.default_callback_url())
}

fn android_callbacks() -> CallbackUrls {
    Platform::Android.callback_urls(Platform::Android.default_callback_url())
}

// =============================================================================
// Platform
// =============================================================================

#[test]
fn default_callback_urls_per_platform() {
    assert_eq!(Platform::Web.default_callback_url(), "http://localhost:19006");
    assert_eq!(Platform::Android.default_callback_url(), "https://auth.bustracker.app/oauth2redirect");
    assert_eq!(Platform::Ios.default_callback_url(), "exp://127.0.0.1:19000/--/");
}

#[test]
fn android_uses_distinct_success_and_failure_paths() {
    let urls = android_callbacks();
    assert_eq!(urls.success, "https://auth.bustracker.app/oauth2redirect/success");
    assert_eq!(urls.failure, "https://auth.bustracker.app/oauth2redirect/failure");
}

#[test]
fn web_uses_same_url_for_both_outcomes() {
    let urls = web_callbacks();
    assert_eq!(urls.success, urls.failure);
}

#[test]
fn platform_display() {
    assert_eq!(Platform::Android.to_string(), "android");
}

// =============================================================================
// authorize_url
// =============================================================================

#[test]
fn authorize_url_carries_project_and_callbacks() {
    let url = authorize_url("https://fra.cloud.appwrite.io/v1/", "proj", GOOGLE_PROVIDER, &android_callbacks()).unwrap();
    assert_eq!(url.path(), "/v1/account/tokens/oauth2/google");
    let pairs: Vec<(String, String)> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
    assert!(pairs.contains(&("project".into(), "proj".into())));
    assert!(pairs.contains(&("success".into(), "https://auth.bustracker.app/oauth2redirect/success".into())));
    assert!(pairs.contains(&("failure".into(), "https://auth.bustracker.app/oauth2redirect/failure".into())));
}

#[test]
fn authorize_url_rejects_relative_endpoint() {
    let err = authorize_url("not a url", "proj", GOOGLE_PROVIDER, &web_callbacks()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::OAuthMisconfigured);
    assert!(err.message.contains("OAuth configuration incomplete"));
}

// =============================================================================
// parse_callback
// =============================================================================

#[test]
fn parse_callback_extracts_token() {
    let token = parse_callback("http://localhost:19006/?secret=abc123&userId=u42", &web_callbacks()).unwrap();
    assert_eq!(token, OAuthToken { user_id: "u42".into(), secret: "abc123".into() });
}

#[test]
fn parse_callback_trims_pasted_whitespace() {
    let token = parse_callback("  http://localhost:19006/?userId=u1&secret=s1\n", &web_callbacks()).unwrap();
    assert_eq!(token.user_id, "u1");
}

#[test]
fn parse_callback_classifies_error_payload() {
    let payload = r#"{"message":"Missing scope","code":401,"type":"general_unauthorized_scope"}"#;
    let mut url = Url::parse("http://localhost:19006/").unwrap();
    url.query_pairs_mut().append_pair("error", payload);

    let err = parse_callback(url.as_str(), &web_callbacks()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
    assert_eq!(err.message, "Missing scope");
    assert_eq!(err.details.as_ref().unwrap()["type"], "general_unauthorized_scope");

    let shown = err.friendly_message();
    assert!(shown.starts_with("Authorization failed."));
    assert!(shown.contains("Troubleshooting"));
    assert!(!shown.contains("cancelled"));
}

#[test]
fn parse_callback_unknown_error_type_is_cancelled() {
    let payload = r#"{"message":"Something odd","code":400,"type":"general_unknown"}"#;
    let mut url = Url::parse("http://localhost:19006/").unwrap();
    url.query_pairs_mut().append_pair("error", payload);

    let err = parse_callback(url.as_str(), &web_callbacks()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cancelled);
}

#[test]
fn parse_callback_disabled_provider_is_misconfigured() {
    let payload = r#"{"message":"This provider is disabled","code":412,"type":"project_provider_disabled"}"#;
    let mut url = Url::parse("http://localhost:19006/").unwrap();
    url.query_pairs_mut().append_pair("error", payload);

    let err = parse_callback(url.as_str(), &web_callbacks()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::OAuthMisconfigured);
}

#[test]
fn parse_callback_unstructured_error_is_cancelled() {
    let err = parse_callback("http://localhost:19006/?error=access_denied", &web_callbacks()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cancelled);
    assert_eq!(err.message, "access_denied");
}

#[test]
fn parse_callback_failure_path_is_cancelled() {
    let err = parse_callback("https://auth.bustracker.app/oauth2redirect/failure", &android_callbacks()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cancelled);
}

#[test]
fn parse_callback_missing_token_is_misconfigured() {
    let err = parse_callback("http://localhost:19006/?userId=u1", &web_callbacks()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::OAuthMisconfigured);
}

#[test]
fn parse_callback_rejects_garbage() {
    let err = parse_callback("definitely not a url", &web_callbacks()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Other);
}

// =============================================================================
// oauth_details
// =============================================================================

#[test]
fn oauth_details_includes_platform_and_callback() {
    let details = oauth_details(Platform::Android, "https://cb", Some("user_oauth2_unauthorized"));
    assert_eq!(details["platform"], "android");
    assert_eq!(details["callbackUrl"], "https://cb");
    assert_eq!(details["type"], "user_oauth2_unauthorized");
}

#[test]
fn oauth_details_omits_absent_type() {
    let details = oauth_details(Platform::Web, "http://localhost:19006", None);
    assert!(details.get("type").is_none());
}
