//! Contract tests for the MediaWiki client against a mock `api.php`.

use pagewalk::{
    DocumentStore, Error, InspectPage, MediaWikiClient, PageWalker, ResumeMode, WalkerConfig,
    WikiConfig,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/w/api.php";
const CHECKPOINT_PAGE: &str = "MediaWiki:TemplateBotInfo";

fn client(server: &MockServer) -> MediaWikiClient {
    client_in_namespace(server, 0)
}

fn client_in_namespace(server: &MockServer, namespace: i32) -> MediaWikiClient {
    let config = WikiConfig {
        api_url: format!("{}{API_PATH}", server.uri()),
        namespace,
        ..Default::default()
    };
    MediaWikiClient::new(&config).expect("client")
}

fn allpages(titles: &[&str]) -> ResponseTemplate {
    let pages: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| json!({"pageid": i + 1, "ns": 0, "title": t}))
        .collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "batchcomplete": true,
        "query": {"allpages": pages}
    }))
}

fn page_content(title: &str, content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "batchcomplete": true,
        "query": {"pages": [{
            "pageid": 7,
            "ns": 0,
            "title": title,
            "revisions": [{"slots": {"main": {
                "contentmodel": "wikitext",
                "contentformat": "text/x-wiki",
                "content": content
            }}}]
        }]}
    }))
}

fn page_missing(title: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "batchcomplete": true,
        "query": {"pages": [{"ns": 8, "title": title, "missing": true}]}
    }))
}

async fn mount_read(server: &MockServer, title: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("prop", "revisions"))
        .and(query_param("titles", title))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("meta", "tokens"))
        .and(query_param("type", "csrf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchcomplete": true,
            "query": {"tokens": {"csrftoken": "abc123+\\"}}
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn edit_success() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "edit": {"result": "Success", "pageid": 3, "title": CHECKPOINT_PAGE, "newrevid": 12}
    }))
}

async fn posted_bodies(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect()
}

#[tokio::test]
async fn list_pages_queries_allpages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("action", "query"))
        .and(query_param("list", "allpages"))
        .and(query_param("apfrom", "Bravo"))
        .and(query_param("aplimit", "2"))
        .and(query_param("apnamespace", "0"))
        .and(query_param("format", "json"))
        .and(query_param("formatversion", "2"))
        .respond_with(allpages(&["Bravo", "Charlie"]))
        .expect(1)
        .mount(&server)
        .await;

    let titles = client(&server).list_pages("Bravo", 2).await.expect("list");
    assert_eq!(titles, ["Bravo", "Charlie"]);
}

#[tokio::test]
async fn list_pages_from_the_start_sends_empty_apfrom() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("apfrom", ""))
        .respond_with(allpages(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let titles = client(&server).list_pages("", 25).await.expect("list");
    assert!(titles.is_empty());
}

#[tokio::test]
async fn read_page_returns_main_slot_content() {
    let server = MockServer::start().await;
    mount_read(&server, "Alpha", page_content("Alpha", "line one\nline two")).await;

    let text = client(&server).read_page("Alpha").await.expect("read");
    assert_eq!(text.as_deref(), Some("line one\nline two"));
}

#[tokio::test]
async fn read_missing_page_is_none() {
    let server = MockServer::start().await;
    mount_read(&server, CHECKPOINT_PAGE, page_missing(CHECKPOINT_PAGE)).await;

    let text = client(&server).read_page(CHECKPOINT_PAGE).await.expect("read");
    assert!(text.is_none());
}

#[tokio::test]
async fn api_error_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": "readapidenied", "info": "You need read permission to use this module."}
        })))
        .mount(&server)
        .await;

    let err = client(&server).list_pages("", 25).await.unwrap_err();
    match err {
        Error::Api { code, info } => {
            assert_eq!(code, "readapidenied");
            assert!(info.contains("read permission"));
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_error_status_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).list_pages("", 25).await.unwrap_err();
    assert!(matches!(err, Error::Reqwest(_)));
}

#[tokio::test]
async fn write_page_posts_an_edit_with_a_cached_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_string_contains("action=edit"))
        .respond_with(edit_success())
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .write_page(CHECKPOINT_PAGE, "Bravo", "Store new page from last execution.")
        .await
        .expect("first write");
    client
        .write_page(CHECKPOINT_PAGE, "", "Store new page from last execution.")
        .await
        .expect("second write");

    let bodies = posted_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    let first = &bodies[0];
    assert!(first.contains("title=MediaWiki%3ATemplateBotInfo"));
    assert!(first.contains("text=Bravo"));
    assert!(first.contains("summary=Store+new+page+from+last+execution."));
    assert!(first.contains("bot=1"));
    assert!(first.ends_with("token=abc123%2B%5C"));
    assert!(bodies[1].contains("text=&"));
}

#[tokio::test]
async fn rejected_edit_is_an_error() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "edit": {"result": "Failure", "spamblacklist": "example.org"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .write_page("Alpha", "text", "summary")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EditRejected { ref result, .. } if result == "Failure"));
}

#[tokio::test]
async fn walker_run_against_the_api() {
    let server = MockServer::start().await;
    mount_read(&server, CHECKPOINT_PAGE, page_content(CHECKPOINT_PAGE, "Alpha")).await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("list", "allpages"))
        .and(query_param("apfrom", "Alpha"))
        .and(query_param("aplimit", "2"))
        .respond_with(allpages(&["Alpha", "Bravo"]))
        .expect(1)
        .mount(&server)
        .await;
    mount_read(&server, "Alpha", page_content("Alpha", "a\nb")).await;
    mount_read(&server, "Bravo", page_content("Bravo", "c")).await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_string_contains("text=Bravo"))
        .respond_with(edit_success())
        .expect(1)
        .mount(&server)
        .await;

    let config = WalkerConfig {
        batch_size: 2,
        ..Default::default()
    };
    let mut walker =
        PageWalker::new(client(&server), InspectPage::new(), config).expect("walker");
    let report = walker.run().await.expect("run");

    assert_eq!(report.started_from.as_str(), "Alpha");
    assert_eq!(report.processed, ["Alpha", "Bravo"]);
    assert_eq!(report.next.as_str(), "Bravo");
    assert_eq!(walker.action().lines_seen(), 3);
}

#[tokio::test]
async fn failed_listing_leaves_the_checkpoint_alone() {
    let server = MockServer::start().await;
    mount_read(&server, CHECKPOINT_PAGE, page_content(CHECKPOINT_PAGE, "Charlie")).await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("list", "allpages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_token(&server, 0).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(edit_success())
        .expect(0)
        .mount(&server)
        .await;

    let mut walker = PageWalker::new(client(&server), InspectPage::new(), WalkerConfig::default())
        .expect("walker");
    assert!(walker.run().await.is_err());
    assert!(posted_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn resuming_in_another_namespace_sends_the_bare_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("list", "allpages"))
        .and(query_param("apfrom", "Foo"))
        .and(query_param("apnamespace", "12"))
        .respond_with(allpages(&["Help:Foo", "Help:Tables"]))
        .expect(1)
        .mount(&server)
        .await;

    let titles = client_in_namespace(&server, 12)
        .list_pages("Help:Foo", 2)
        .await
        .expect("list");
    assert_eq!(titles, ["Help:Foo", "Help:Tables"]);
}

#[tokio::test]
async fn exclusive_walk_in_another_namespace() {
    let server = MockServer::start().await;
    mount_read(&server, CHECKPOINT_PAGE, page_content(CHECKPOINT_PAGE, "Help:Foo")).await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("list", "allpages"))
        .and(query_param("apfrom", "Foo"))
        .and(query_param("aplimit", "3"))
        .and(query_param("apnamespace", "12"))
        .respond_with(allpages(&["Help:Foo", "Help:Links", "Help:Tables"]))
        .expect(1)
        .mount(&server)
        .await;
    mount_read(&server, "Help:Links", page_content("Help:Links", "")).await;
    mount_read(&server, "Help:Tables", page_content("Help:Tables", "")).await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_string_contains("text=Help%3ATables"))
        .respond_with(edit_success())
        .expect(1)
        .mount(&server)
        .await;

    let config = WalkerConfig {
        batch_size: 2,
        resume: ResumeMode::Exclusive,
        ..Default::default()
    };
    let mut walker = PageWalker::new(client_in_namespace(&server, 12), InspectPage::new(), config)
        .expect("walker");
    let report = walker.run().await.expect("run");

    assert_eq!(report.processed, ["Help:Links", "Help:Tables"]);
    assert_eq!(report.next.as_str(), "Help:Tables");
}

#[tokio::test]
async fn unreadable_checkpoint_starts_from_the_beginning() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("prop", "revisions"))
        .and(query_param("titles", CHECKPOINT_PAGE))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("list", "allpages"))
        .and(query_param("apfrom", ""))
        .and(query_param("aplimit", "2"))
        .respond_with(allpages(&["Alpha", "Bravo"]))
        .expect(1)
        .mount(&server)
        .await;
    mount_read(&server, "Alpha", page_content("Alpha", "a")).await;
    mount_read(&server, "Bravo", page_content("Bravo", "b")).await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_string_contains("text=Bravo"))
        .respond_with(edit_success())
        .expect(1)
        .mount(&server)
        .await;

    let config = WalkerConfig {
        batch_size: 2,
        ..Default::default()
    };
    let mut walker =
        PageWalker::new(client(&server), InspectPage::new(), config).expect("walker");
    let report = walker.run().await.expect("run");

    assert!(report.started_from.is_start());
    assert_eq!(report.processed, ["Alpha", "Bravo"]);
    assert_eq!(report.next.as_str(), "Bravo");
}

#[tokio::test]
async fn failed_checkpoint_write_fails_the_run_after_the_batch() {
    let server = MockServer::start().await;
    mount_read(&server, CHECKPOINT_PAGE, page_content(CHECKPOINT_PAGE, "")).await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("list", "allpages"))
        .respond_with(allpages(&["Alpha", "Bravo"]))
        .mount(&server)
        .await;
    mount_read(&server, "Alpha", page_content("Alpha", "a")).await;
    mount_read(&server, "Bravo", page_content("Bravo", "b")).await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": "protectedpage", "info": "This page has been protected to prevent editing."}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = WalkerConfig {
        batch_size: 2,
        ..Default::default()
    };
    let mut walker =
        PageWalker::new(client(&server), InspectPage::new(), config).expect("walker");
    let err = walker.run().await.unwrap_err();

    assert!(matches!(err, Error::Api { ref code, .. } if code == "protectedpage"));
    assert_eq!(walker.action().pages_seen(), 2);
}
