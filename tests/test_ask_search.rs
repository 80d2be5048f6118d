mod common;

use common::result_ids;

fn sorted(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn misspelled_term_is_corrected() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let response = server
        .get("/api/v1/ask/search")
        .add_query_param("q", "laons")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["search_term"], "loans");
    assert_eq!(body["original_term"], "laons");
    assert_eq!(sorted(result_ids(&body)), vec![101, 301, 401]);
}

#[tokio::test]
async fn correct_zero_keeps_the_typed_term() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let body: serde_json::Value = server
        .get("/api/v1/ask/search")
        .add_query_param("q", "laons")
        .add_query_param("correct", "0")
        .await
        .json();

    assert_eq!(body["search_term"], "laons");
    assert!(body["original_term"].is_null());
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn correction_disabled_by_settings() {
    let env = common::TestEnv::with_typo_correction(false).await;
    let server = env.server();

    let body: serde_json::Value = server
        .get("/api/v1/ask/search")
        .add_query_param("q", "laons")
        .await
        .json();

    assert_eq!(body["search_term"], "laons");
    assert!(body["original_term"].is_null());
}

#[tokio::test]
async fn correctly_spelled_term_is_not_swapped() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let body: serde_json::Value = server
        .get("/api/v1/ask/search")
        .add_query_param("q", "loans")
        .await
        .json();

    assert_eq!(body["search_term"], "loans");
    assert!(body["original_term"].is_null());
    assert_eq!(sorted(result_ids(&body)), vec![101, 301, 401]);
}

#[tokio::test]
async fn capitalized_term_is_not_corrected() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let body: serde_json::Value = server
        .get("/api/v1/ask/search")
        .add_query_param("q", "Mortgage")
        .await
        .json();

    assert_eq!(body["search_term"], "Mortgage");
    assert!(body["original_term"].is_null());
    assert_eq!(sorted(result_ids(&body)), vec![103, 201, 401]);
}

#[tokio::test]
async fn correctly_spelled_phrase_is_not_corrected() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let body: serde_json::Value = server
        .get("/api/v1/ask/search")
        .add_query_param("q", "student loans")
        .await
        .json();

    assert_eq!(body["search_term"], "student loans");
    assert!(body["original_term"].is_null());
    assert_eq!(sorted(result_ids(&body)), vec![101, 301, 401]);
}

#[tokio::test]
async fn misspelled_word_in_phrase_is_corrected() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let body: serde_json::Value = server
        .get("/api/v1/ask/search")
        .add_query_param("q", "student laons")
        .await
        .json();

    assert_eq!(body["search_term"], "student loans");
    assert_eq!(body["original_term"], "student laons");
}

#[tokio::test]
async fn unsafe_characters_are_removed() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let body: serde_json::Value = server
        .get("/api/v1/ask/search")
        .add_query_param("q", " {mortgage}# ")
        .await
        .json();

    assert_eq!(body["search_term"], "mortgage");
    assert!(body["original_term"].is_null());
    assert_eq!(sorted(result_ids(&body)), vec![103, 201, 401]);
}

#[tokio::test]
async fn results_are_limited_to_the_language() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let body: serde_json::Value = server
        .get("/api/v1/ask/search")
        .add_query_param("q", "préstamos")
        .add_query_param("language", "es")
        .await
        .json();

    assert_eq!(body["language"], "es");
    assert_eq!(result_ids(&body), vec![402]);

    let english: serde_json::Value = server
        .get("/api/v1/ask/search")
        .add_query_param("q", "préstamos")
        .await
        .json();
    assert!(result_ids(&english).is_empty());
}

#[tokio::test]
async fn blank_query_returns_nothing() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let body: serde_json::Value = server
        .get("/api/v1/ask/search")
        .add_query_param("q", "#%")
        .await
        .json();

    assert_eq!(body["search_term"], "");
    assert_eq!(body["total"], 0);
}
