use std::collections::HashMap;

use assert_matches::assert_matches;

use super::*;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn it_rejects_a_missing_api_key() {
    let res = Config::from_vars(vars(&[(USERNAME_VAR, "alice")]));
    assert_matches!(res, Err(BeeminderError::Configuration(msg)) if msg.contains(API_KEY_VAR));
}

#[test]
fn it_rejects_a_blank_api_key() {
    assert_matches!(
        Config::new("   ", None),
        Err(BeeminderError::Configuration(_))
    );
}

#[test]
fn it_reads_all_variables() {
    let config = Config::from_vars(vars(&[
        (API_KEY_VAR, "secret"),
        (USERNAME_VAR, "alice"),
        (BASE_URL_VAR, "http://localhost:1234/api/"),
    ]))
    .unwrap();

    assert_eq!(config.api_key(), "secret");
    assert_eq!(config.username(), Some("alice"));
    assert_eq!(config.base_url(), "http://localhost:1234/api");
    assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
}

#[test]
fn it_treats_a_blank_username_as_absent() {
    let config = Config::new("secret", Some(" ".to_string())).unwrap();
    assert_eq!(config.username(), None);
    assert_eq!(config.base_url(), DEFAULT_BASE_URL);
}

#[test]
fn it_resolves_the_user_for_a_call() {
    let with_default = Config::new("secret", Some("alice".to_string())).unwrap();
    assert_eq!(with_default.resolve_user(Some("bob")), "bob");
    assert_eq!(with_default.resolve_user(None), "alice");
    assert_eq!(with_default.resolve_user(Some("")), "alice");

    let without_default = Config::new("secret", None).unwrap();
    assert_eq!(without_default.resolve_user(None), SELF_ALIAS);
}

#[test]
fn it_builds_profile_urls() {
    let config = Config::new("secret", None)
        .unwrap()
        .with_web_url("https://example.com/");
    assert_eq!(config.profile_url("alice", None), "https://example.com/alice");
    assert_eq!(
        config.profile_url("alice", Some("read")),
        "https://example.com/alice/read"
    );
}
