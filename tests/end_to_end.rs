use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use responder_core::{
    LocaleProfile, OccasionCalendar, Responder, ResponderConfig, ResponderError, Strategy,
    Vocabulary,
};
use tempfile::TempDir;

const BASE: &str = r#"{"intents":[
    {"name":"greet","patterns":["hello there","hi cat"],"responses":["hi!"]},
    {"name":"food","patterns":["are you hungry"],"responses":["always"]},
    {"name":"default","responses":["?"]}
]}"#;

const XMAS: &str = r#"{"intents":[
    {"name":"gifts","patterns":["merry christmas"],"responses":["presents!"]},
    {"name":"default","responses":["ho ho?"]}
]}"#;

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

fn responder(vocabulary: Vocabulary) -> Responder {
    let config = ResponderConfig::new(LocaleProfile::english(), Strategy::Sequence);
    Responder::with_vocabulary(config, vocabulary).unwrap()
}

#[test]
fn test_vocabulary_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "base.json", BASE);

    let vocabulary = Vocabulary::from_file(&path).unwrap();
    assert_eq!(vocabulary.len(), 3);
    assert_eq!(vocabulary.default_responses(), Some(&["?".to_string()][..]));

    let r = responder(vocabulary);
    assert_eq!(r.generate_response("Hello there!"), "hi!");
    assert_eq!(r.generate_response("are you hungry?"), "always");
    assert_eq!(r.generate_response("qwerty"), "?");
}

#[test]
fn test_missing_and_malformed_files() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");
    assert!(matches!(Vocabulary::from_file(&missing), Err(ResponderError::Io(_))));

    let broken = write(&dir, "broken.json", r#"{"intents":[{"name":"x","patterns":["a"]}]}"#);
    assert!(matches!(
        Vocabulary::from_file(&broken),
        Err(ResponderError::MalformedVocabulary(_))
    ));

    let garbage = write(&dir, "garbage.json", "{");
    assert!(matches!(Vocabulary::from_file(&garbage), Err(ResponderError::Json(_))));
}

#[test]
fn test_occasion_overlay_from_directory() {
    let dir = TempDir::new().unwrap();
    let base = Vocabulary::from_file(write(&dir, "base.json", BASE)).unwrap();
    write(&dir, "xmas.json", XMAS);
    let r = responder(base);

    let christmas = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
    for occasion in OccasionCalendar::default().due(christmas) {
        let overlay = Vocabulary::from_file(dir.path().join(format!("{}.json", occasion.name)))
            .unwrap();
        r.apply_overlay(&occasion.name, &overlay, occasion.priority);
    }

    assert_eq!(r.generate_response("merry christmas"), "presents!");
    assert_eq!(r.generate_response("hello there"), "hi!");
    assert_eq!(r.generate_response("qwerty"), "ho ho?");
    assert_eq!(r.info().overlays, vec!["xmas"]);
}

#[test]
fn test_reload_replaces_overlays() {
    let r = responder(Vocabulary::from_json(BASE).unwrap());
    r.apply_overlay("xmas", &Vocabulary::from_json(XMAS).unwrap(), 2);
    assert_eq!(r.info().intents, 4);

    r.load_json(BASE).unwrap();
    let info = r.info();
    assert_eq!(info.intents, 3);
    assert!(info.overlays.is_empty());
    assert_eq!(r.generate_response("qwerty"), "?");
}

#[test]
fn test_debug_match_reports_every_intent() {
    let r = responder(Vocabulary::from_json(BASE).unwrap());
    let diagnostics = r.debug_match("hello there");
    assert_eq!(diagnostics.len(), 3);

    let greet = diagnostics.iter().find(|d| d.intent == "greet").unwrap();
    assert_eq!(greet.patterns.len(), 2);
    assert_eq!(greet.patterns[0].score, 100.0);

    let json = serde_json::to_string(&diagnostics).unwrap();
    assert!(json.contains("\"greet\""));
}
