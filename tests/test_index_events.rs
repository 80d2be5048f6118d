mod common;

use serde_json::json;

use cfgov_search::db::repository::PageRepository;
use cfgov_search::models::page::{EnforcementStatus, Page, PageKind, PageSpecific};
use cfgov_search::search::backend::SearchBackend;
use cfgov_search::search::request::SearchRequest;
use common::result_ids;

async fn rename(env: &common::TestEnv, id: i64, title: &str) {
    let mut page = env.repo.find_by_id(id).await.unwrap().unwrap();
    page.title = title.to_string();
    env.repo.create_or_update(page).await.unwrap();
}

#[tokio::test]
async fn tag_change_reindexes_exactly_the_tagged_pages() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    // Changed in the CMS; only the event decides what reaches the index.
    rename(&env, 103, "Renamed servicing rule").await;
    rename(&env, 201, "Renamed webinar").await;
    rename(&env, 101, "Renamed loans post").await;

    let response = env
        .send_event(
            &server,
            json!({ "type": "related_saved", "related": { "entity": "tag", "id": 3 } }),
        )
        .await;
    response.assert_status_ok();
    let report: serde_json::Value = response.json();
    assert_eq!(report, json!({ "indexed": 2, "removed": 0, "failed": 0 }));

    let body: serde_json::Value = server
        .get("/api/v1/filterable-pages")
        .add_query_param("title", "renamed")
        .await
        .json();
    assert_eq!(result_ids(&body), vec![201, 103]);
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    let response = server
        .post("/api/v1/index/events")
        .json(&json!({
            "service_token": "wrong-token",
            "event": { "type": "page_deleted", "page_id": 101 }
        }))
        .await;

    response.assert_status_unauthorized();

    // Nothing was removed.
    let body: serde_json::Value = server
        .get("/api/v1/filterable-pages")
        .add_query_param("prefix", "/about-us/blog/")
        .await
        .json();
    assert_eq!(result_ids(&body), vec![101, 102]);
}

#[tokio::test]
async fn unpublished_page_is_removed_on_save() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let mut page = env.repo.find_by_id(102).await.unwrap().unwrap();
    page.live = false;
    env.repo.create_or_update(page).await.unwrap();

    let report: serde_json::Value = env
        .send_event(&server, json!({ "type": "page_saved", "page_id": 102 }))
        .await
        .json();
    assert_eq!(report["removed"], 1);

    let count = env
        .backend
        .count(common::INDEX, &SearchRequest::new())
        .await
        .unwrap();
    assert_eq!(count, 8);
}

#[tokio::test]
async fn deleted_page_leaves_the_index() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    env.send_event(&server, json!({ "type": "page_deleted", "page_id": 301 }))
        .await
        .assert_status_ok();

    let body: serde_json::Value = server
        .get("/api/v1/filterable-pages")
        .add_query_param("category", "enforcement_action")
        .add_query_param("prefix", "/enforcement/")
        .await
        .json();
    assert_eq!(result_ids(&body), vec![302]);
}

#[tokio::test]
async fn new_page_becomes_searchable() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let page = Page::new(
        105,
        PageKind::BlogPage,
        "Budgeting basics",
        "/about-us/blog/budgeting-basics/",
        chrono::NaiveDate::from_ymd_opt(2022, 1, 15).unwrap(),
    );
    env.repo.create_or_update(page).await.unwrap();

    env.send_event(&server, json!({ "type": "page_saved", "page_id": 105 }))
        .await
        .assert_status_ok();

    let body: serde_json::Value = server
        .get("/api/v1/filterable-pages")
        .add_query_param("prefix", "/about-us/blog/")
        .await
        .json();
    assert_eq!(result_ids(&body), vec![105, 101, 102]);
}

#[tokio::test]
async fn reindexing_is_idempotent() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let before: serde_json::Value = server.get("/api/v1/filterable-pages").await.json();

    for _ in 0..2 {
        let report: serde_json::Value = env
            .send_event(&server, json!({ "type": "page_saved", "page_id": 101 }))
            .await
            .json();
        assert_eq!(report, json!({ "indexed": 1, "removed": 0, "failed": 0 }));
    }

    let after: serde_json::Value = server.get("/api/v1/filterable-pages").await.json();
    assert_eq!(before, after);
}

#[tokio::test]
async fn status_link_change_reaches_the_owning_page() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let mut page = env.repo.find_by_id(302).await.unwrap().unwrap();
    page.specific = PageSpecific::EnforcementAction {
        initial_filing_date: chrono::NaiveDate::from_ymd_opt(2019, 6, 1),
        statuses: vec![EnforcementStatus {
            id: 1,
            status: "active".to_string(),
        }],
    };
    env.repo.create_or_update(page).await.unwrap();

    env.send_event(
        &server,
        json!({ "type": "related_saved", "related": { "entity": "status_link", "page_id": 302 } }),
    )
    .await
    .assert_status_ok();

    let body: serde_json::Value = server
        .get("/api/v1/filterable-pages")
        .add_query_param("category", "enforcement_action")
        .add_query_param("statuses", "active")
        .await
        .json();
    assert_eq!(result_ids(&body), vec![301, 302]);
}

#[tokio::test]
async fn malformed_event_is_rejected() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    let response = env
        .send_event(&server, json!({ "type": "page_moved", "page_id": 1 }))
        .await;

    assert!(response.status_code().is_client_error());
}
