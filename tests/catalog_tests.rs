use magpie_rs_recon::core::catalog::{ACCOUNT_PLACEHOLDER, DetectionRule, SiteCatalog};

#[test]
fn builtin_catalog_loads_and_is_non_empty() {
    let catalog = SiteCatalog::builtin().expect("builtin catalog parses");
    assert!(!catalog.is_empty());
    let github = catalog.get("GitHub").expect("GitHub entry present");
    assert!(github.url.contains(ACCOUNT_PLACEHOLDER));
    assert_eq!(github.rule, DetectionRule::StatusCode);
}

#[test]
fn entries_parse_with_defaults_and_overrides() {
    let raw = r#"{
        "Plain": { "url": "https://plain.example/{account}" },
        "Tuned": {
            "url": "https://tuned.example/u/{account}",
            "rule": { "kind": "message", "absence_text": "no such user" },
            "head_only": true,
            "headers": { "Accept-Language": "en" }
        }
    }"#;
    let catalog = SiteCatalog::from_json(raw).expect("valid catalog");
    assert_eq!(catalog.len(), 2);

    let plain = catalog.get("Plain").unwrap();
    assert_eq!(plain.rule, DetectionRule::StatusCode);
    assert!(!plain.head_only);
    assert!(plain.headers.is_empty());

    let tuned = catalog.get("Tuned").unwrap();
    assert_eq!(
        tuned.rule,
        DetectionRule::Message {
            absence_text: "no such user".to_string()
        }
    );
    assert!(tuned.head_only);
    assert_eq!(tuned.headers.get("Accept-Language").map(String::as_str), Some("en"));
}

#[test]
fn probe_url_substitutes_the_placeholder() {
    let raw = r#"{ "Site": { "url": "https://example.com/{account}/profile" } }"#;
    let catalog = SiteCatalog::from_json(raw).unwrap();
    let entry = catalog.get("Site").unwrap();
    assert_eq!(entry.probe_url("alice"), "https://example.com/alice/profile");
}

#[test]
fn malformed_entries_are_skipped_not_fatal() {
    let raw = r#"{
        "Good": { "url": "https://good.example/{account}" },
        "NoPlaceholder": { "url": "https://bad.example/static" },
        "BadUrl": { "url": "not a url at all {account}" },
        "BadPattern": {
            "url": "https://regex.example/{account}",
            "rule": { "kind": "regex", "pattern": "(unclosed" }
        }
    }"#;
    let catalog = SiteCatalog::from_json(raw).expect("catalog still loads");
    assert_eq!(catalog.len(), 1);
    assert!(catalog.get("Good").is_some());
    assert!(catalog.get("NoPlaceholder").is_none());
    assert!(catalog.get("BadUrl").is_none());
    assert!(catalog.get("BadPattern").is_none());
}

#[test]
fn invalid_json_is_a_fatal_error() {
    assert!(SiteCatalog::from_json("not json").is_err());
    assert!(SiteCatalog::from_json(r#"["a", "list"]"#).is_err());
}

#[test]
fn only_body_inspecting_rules_request_the_body() {
    assert!(!DetectionRule::StatusCode.needs_body());
    assert!(!DetectionRule::ResponseUrl.needs_body());
    assert!(
        DetectionRule::Message {
            absence_text: "gone".to_string()
        }
        .needs_body()
    );
    assert!(
        DetectionRule::Regex {
            pattern: "found".to_string()
        }
        .needs_body()
    );
}
