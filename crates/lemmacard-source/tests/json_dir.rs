use std::fs;

use lemmacard_source::{DictionarySource, JsonDirSource, SourceError};

const IDTI: &str = r#"[{
    "etymology": "From Old East Slavic идти",
    "definitions": [{
        "partOfSpeech": "verb",
        "text": ["идти́ • (idtí) impf", "to go", "to walk"],
        "relatedWords": [],
        "examples": []
    }],
    "pronunciations": {"text": [], "audio": []}
}]"#;

#[test]
fn reads_payload_files_by_word() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("идти.json"), IDTI).unwrap();

    let source = JsonDirSource::open(dir.path()).unwrap();
    let payload = source.fetch("идти", "russian").unwrap();
    assert_eq!(payload.entries().len(), 1);
    assert_eq!(
        payload.entries()[0].definitions[0]
            .text
            .as_ref()
            .map(Vec::len),
        Some(3)
    );
}

#[test]
fn missing_file_is_not_found_rather_than_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = JsonDirSource::open(dir.path()).unwrap();
    let payload = source.fetch("измочить", "russian").unwrap();
    assert!(payload.is_empty());
}

#[test]
fn prefers_language_subdirectory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("russian")).unwrap();
    fs::write(dir.path().join("russian").join("идти.json"), IDTI).unwrap();
    fs::write(dir.path().join("идти.json"), "[]").unwrap();

    let source = JsonDirSource::open(dir.path()).unwrap();
    assert!(!source.fetch("идти", "russian").unwrap().is_empty());
    assert!(source.fetch("идти", "ukrainian").unwrap().is_empty());
}

#[test]
fn corrupt_json_is_a_transport_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("ход.json"), "{ not json").unwrap();

    let source = JsonDirSource::open(dir.path()).unwrap();
    let err = source.fetch("ход", "russian").unwrap_err();
    assert!(matches!(err, SourceError::Json { .. }));
    assert!(err.to_string().contains("ход.json"));
}

#[test]
fn opening_a_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(matches!(
        JsonDirSource::open(&missing),
        Err(SourceError::Io { .. })
    ));
}
