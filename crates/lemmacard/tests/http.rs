use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use lemmacard_morph::MatchMode;
use tempfile::TempDir;
use tower::util::ServiceExt;

use lemmacard::handlers::{AppState, router};
use lemmacard::open_engine;

const ENTRIES: &[(&str, &str)] = &[
    (
        "сказал",
        r#"[{"definitions": [{"partOfSpeech": "verb", "text": [
            "сказа́л • (skazál)",
            "masculine singular past indicative perfective of сказа́ть (skazátʹ)"
        ]}]}]"#,
    ),
    (
        "сказать",
        r#"[{"definitions": [{"partOfSpeech": "verb",
            "text": ["сказа́ть • (skazátʹ) pf", "to say, to tell", "to speak"]}],
           "pronunciations": {"text": [], "audio": ["//upload.wikimedia.org/wikipedia/commons/a/a1/Ru-%D1%81%D0%BA%D0%B0%D0%B7%D0%B0%D1%82%D1%8C.ogg"]}}]"#,
    ),
    (
        "ход",
        r#"[{"definitions": [
            {"partOfSpeech": "noun", "text": ["ход • (xod) m inan", "motion, movement"]},
            {"partOfSpeech": "noun", "text": ["ход • (xod) m inan", "(games) move, turn"]}
        ]}]"#,
    ),
    (
        "пугаться",
        r#"[{"definitions": [{"partOfSpeech": "verb", "text": [
            "пуга́ться • (pugátʹsja) impf",
            "to be frightened (of)",
            "passive of пуга́ть (pugátʹ)"
        ]}]}]"#,
    ),
    (
        "пугать",
        r#"[{"definitions": [{"partOfSpeech": "verb",
            "text": ["пуга́ть • (pugátʹ) impf", "to frighten, to scare"]}]}]"#,
    ),
    (
        "альфа",
        r#"[{"definitions": [{"text": ["а́льфа", "form of бе́та (beta)"]}]}]"#,
    ),
    (
        "бета",
        r#"[{"definitions": [{"text": ["бе́та", "form of а́льфа (alfa)"]}]}]"#,
    ),
];

fn make_state(confirm_default: bool) -> (TempDir, AppState) {
    make_state_with_cache(confirm_default, 1024)
}

fn make_state_with_cache(confirm_default: bool, cache_capacity: usize) -> (TempDir, AppState) {
    let tempdir = tempfile::tempdir().unwrap();
    for (word, json) in ENTRIES {
        std::fs::write(tempdir.path().join(format!("{word}.json")), json).unwrap();
    }
    let engine = open_engine(
        tempdir.path(),
        "russian",
        MatchMode::Substring,
        cache_capacity,
    )
    .unwrap();
    let state = AppState {
        engine: Arc::new(engine),
        confirm_default,
    };
    (tempdir, state)
}

async fn get(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body_bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

fn encoded(word: &str) -> String {
    word.bytes().map(|b| format!("%{b:02X}")).collect()
}

#[tokio::test]
async fn healthz_ok() {
    let (_dir, state) = make_state(true);
    let app = router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn lookup_follows_base_words() {
    let (_dir, state) = make_state(true);
    let (status, body) = get(state, &format!("/v1/lookup?word={}", encoded("сказал"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], true);
    assert_eq!(body["path"], serde_json::json!(["сказал", "сказать"]));
    assert_eq!(body["sense"]["headword"], "сказать");
    assert_eq!(body["sense"]["glosses"][0], "to say, to tell");
    assert!(
        body["sense"]["audio"]["source_url"]
            .as_str()
            .unwrap_or_default()
            .ends_with(".ogg")
    );
}

#[tokio::test]
async fn lookup_uses_requested_sense() {
    let (_dir, state) = make_state(true);
    let uri = format!("/v1/lookup?word={}", encoded("ход"));
    let (status, body) = get(state.clone(), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sense"]["glosses"][0], "motion, movement");

    let (status, body) = get(state, &format!("{uri}&sense=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sense"]["glosses"][0], "(games) move, turn");
}

#[tokio::test]
async fn lookup_honours_confirm_default() {
    let uri = format!("/v1/lookup?word={}", encoded("пугаться"));

    let (_dir, state) = make_state(true);
    let (_, body) = get(state, &uri).await;
    assert_eq!(body["sense"]["headword"], "пугать");

    let (_dir, state) = make_state(false);
    let (_, body) = get(state, &uri).await;
    assert_eq!(body["sense"]["headword"], "пугаться");
    assert_eq!(body["path"], serde_json::json!(["пугаться"]));
}

#[tokio::test]
async fn lookup_reports_unknown_words() {
    let (_dir, state) = make_state(true);
    let (status, body) = get(state, &format!("/v1/lookup?word={}", encoded("измочить"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], false);
    assert!(body["sense"].is_null());
}

#[tokio::test]
async fn lookup_rejects_invalid_params() {
    let (_dir, state) = make_state(true);
    let (status, body) = get(state.clone(), "/v1/lookup?word=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .contains("required")
    );

    let (status, body) = get(state.clone(), &format!("/v1/lookup?word={}&sense=0", encoded("ход"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("sense"));

    let (status, _) = get(state, "/v1/lookup?word=..%2Fsecret").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lookup_reports_reference_cycles() {
    let (_dir, state) = make_state(true);
    let (status, body) = get(state, &format!("/v1/lookup?word={}", encoded("альфа"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .contains("cycle")
    );
}

#[tokio::test]
async fn entries_lists_every_sense() {
    let (_dir, state) = make_state(true);
    let (status, body) = get(state, &format!("/v1/entries?word={}", encoded("ход"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["word"], "ход");
    assert_eq!(body["senses"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["base_words"], serde_json::json!([]));
}

#[tokio::test]
async fn unknown_words_do_not_grow_the_cache_past_its_capacity() {
    let (_dir, state) = make_state_with_cache(true, 16);
    for i in 0..200 {
        let word = format!("{}{i}", encoded("неслово"));
        let (status, body) = get(state.clone(), &format!("/v1/entries?word={word}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["senses"], serde_json::json!([]));
    }

    let stats = state.engine.source().stats();
    assert!(stats.entries <= 16, "{} entries cached", stats.entries);
    assert_eq!(stats.misses, 200);
}
