//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use review_ripple::config::{Config, ThrottleConfig};
use review_ripple::crawler::{crawl, CrawlMode, Coordinator};
use review_ripple::output::ProductOutcome;
use review_ripple::storage::{JsonFileStore, ReviewStore};
use review_ripple::{ProductId, Review, ScraperError};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REVIEW_PATH_SUFFIX: &str = "/ref=cm_cr_arp_d_paging_btm_1";

/// Creates a test configuration pointing at the mock server, without delays
fn create_test_config(base_url: &str, max_ban_retries: u32) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.throttle = ThrottleConfig {
        delay_ms: 0,
        backoff_multiplier: 1.0,
        ban_cooldown_ms: 0,
        max_delay_ms: 0,
        max_ban_retries,
    };
    config
}

fn coordinator(server: &MockServer, dir: &TempDir) -> Coordinator<JsonFileStore> {
    coordinator_with_retries(server, dir, 0)
}

fn coordinator_with_retries(
    server: &MockServer,
    dir: &TempDir,
    max_ban_retries: u32,
) -> Coordinator<JsonFileStore> {
    let config = create_test_config(&server.uri(), max_ban_retries);
    let store = JsonFileStore::open(dir.path()).expect("Failed to open store");
    Coordinator::new(&config, store).expect("Failed to create coordinator")
}

fn old_review(product_id: &str) -> Review {
    Review {
        body: "old".to_string(),
        product_id: id(product_id),
        rating: "3".to_string(),
        review_date: String::new(),
        title: "old".to_string(),
    }
}

fn id(raw: &str) -> ProductId {
    ProductId::parse(raw).expect("valid product id")
}

fn review_entry(title: &str, stars: u32) -> String {
    format!(
        r#"<div data-hook="review">
            <i data-hook="review-star-rating" class="a-icon a-icon-star a-star-{stars} review-rating">
                <span class="a-icon-alt">{stars}.0 out of 5 stars</span>
            </i>
            <a data-hook="review-title"><span>{title}</span></a>
            <span data-hook="review-date">Reviewed in India on 1 May 2021</span>
            <span data-hook="review-body"><span>Body of {title}</span></span>
        </div>"#
    )
}

/// Builds a review page with an optional count marker and the given titles
fn review_page(count_marker: Option<&str>, titles: &[String]) -> String {
    let marker = count_marker
        .map(|text| format!(r#"<span data-hook="total-review-count">{}</span>"#, text))
        .unwrap_or_default();
    let entries: String = titles
        .iter()
        .enumerate()
        .map(|(i, title)| review_entry(title, (i as u32 % 5) + 1))
        .collect();
    format!(
        r#"<html><body>{}<div id="cm_cr-review_list">{}</div></body></html>"#,
        marker, entries
    )
}

fn titles(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    range.map(|i| format!("Review {}", i)).collect()
}

async fn mount_review_page(server: &MockServer, product_id: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/product-reviews/{}{}", product_id, REVIEW_PATH_SUFFIX)))
        .and(query_param("pageNumber", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_untouched_product(server: &MockServer, product_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/product-reviews/{}{}", product_id, REVIEW_PATH_SUFFIX)))
        .respond_with(ResponseTemplate::new(200).set_body_string(review_page(Some("1"), &[])))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_walks_pages_in_order() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_review_page(
        &mock_server,
        "B000000001",
        1,
        review_page(Some("reviews: 15"), &titles(1..=10)),
    )
    .await;
    mount_review_page(
        &mock_server,
        "B000000001",
        2,
        review_page(Some("reviews: 15"), &titles(11..=15)),
    )
    .await;

    let mut coordinator = coordinator(&mock_server, &tmp);
    let reviews = coordinator
        .crawl_product(&id("B000000001"))
        .await
        .expect("Crawl failed");

    assert_eq!(reviews.len(), 15);
    let got: Vec<&str> = reviews.iter().map(|r| r.title.as_str()).collect();
    let expected = titles(1..=15);
    assert_eq!(got, expected.iter().map(String::as_str).collect::<Vec<_>>());
    assert!(reviews.iter().all(|r| r.product_id == id("B000000001")));
    assert_eq!(reviews[0].rating, "1");
    assert_eq!(reviews[4].rating, "5");
    assert_eq!(reviews[0].body, "Body of Review 1");
    assert_eq!(reviews[0].review_date, "Reviewed in India on 1 May 2021");

    mock_server.verify().await;
}

#[tokio::test]
async fn test_requests_carry_configured_user_agent() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let user_agent = "Mozilla/5.0 (X11; Linux x86_64) ReviewRipple/1.0";
    let review_path = format!("/product-reviews/B000000001{}", REVIEW_PATH_SUFFIX);

    Mock::given(method("GET"))
        .and(path(review_path.as_str()))
        .and(header("user-agent", user_agent))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(review_page(Some("2"), &titles(1..=2))),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), 0);
    config.site.user_agent = user_agent.to_string();
    let store = JsonFileStore::open(tmp.path()).unwrap();
    let mut coordinator = Coordinator::new(&config, store).unwrap();

    let reviews = coordinator
        .crawl_product(&id("B000000001"))
        .await
        .expect("Crawl failed");
    assert_eq!(reviews.len(), 2);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_harvest_persists_product() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    let mut names = titles(1..=3);
    names[1] = "Très bien, très rapide".to_string();
    mount_review_page(&mock_server, "B000000001", 1, review_page(Some("3"), &names)).await;

    let mut coordinator = coordinator(&mock_server, &tmp);
    let outcome = coordinator
        .harvest_product(&id("B000000001"))
        .await
        .expect("Harvest failed");
    assert_eq!(outcome, ProductOutcome::Saved { reviews: 3 });

    let saved: Vec<Review> = coordinator
        .store()
        .load(&id("B000000001"))
        .unwrap()
        .expect("review file should exist");
    assert_eq!(saved.len(), 3);

    let raw = std::fs::read_to_string(tmp.path().join("B000000001.json")).unwrap();
    assert!(raw.contains("Très bien, très rapide"));
    assert!(raw.starts_with("[\n    {\n        \"body\""));
}

#[tokio::test]
async fn test_product_without_count_marker() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_review_page(&mock_server, "B000000001", 1, review_page(None, &titles(1..=2))).await;

    let mut coordinator = coordinator(&mock_server, &tmp);
    let outcome = coordinator
        .harvest_product(&id("B000000001"))
        .await
        .expect("Harvest failed");

    assert_eq!(outcome, ProductOutcome::NoReviews);
    assert!(!tmp.path().join("B000000001.json").exists());
    assert_eq!(coordinator.fetcher().requests_made(), 1);
}

#[tokio::test]
async fn test_empty_page_stops_pagination() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_review_page(&mock_server, "B000000001", 1, review_page(Some("30"), &titles(1..=10))).await;
    mount_review_page(&mock_server, "B000000001", 2, review_page(Some("30"), &[])).await;

    let mut coordinator = coordinator(&mock_server, &tmp);
    let reviews = coordinator
        .crawl_product(&id("B000000001"))
        .await
        .expect("Crawl failed");

    assert_eq!(reviews.len(), 10);
    // Page 3 is never requested
    assert_eq!(coordinator.fetcher().requests_made(), 2);
    mock_server.verify().await;
}

#[tokio::test]
async fn test_missing_review_list_stops_pagination() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_review_page(&mock_server, "B000000001", 1, review_page(Some("25"), &titles(1..=10))).await;
    mount_review_page(
        &mock_server,
        "B000000001",
        2,
        "<html><body><p>Something went wrong</p></body></html>".to_string(),
    )
    .await;

    let mut coordinator = coordinator(&mock_server, &tmp);
    let reviews = coordinator
        .crawl_product(&id("B000000001"))
        .await
        .expect("Crawl failed");

    assert_eq!(reviews.len(), 10);
    assert_eq!(coordinator.fetcher().requests_made(), 2);
}

#[tokio::test]
async fn test_batch_skips_already_fetched_products() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    // B000000001 was fetched by an earlier run
    let mut store = JsonFileStore::open(out.path()).unwrap();
    store.persist(&[old_review("B000000001")]).unwrap();
    let before = std::fs::read_to_string(out.path().join("B000000001.json")).unwrap();

    mount_untouched_product(&mock_server, "B000000001").await;
    mount_review_page(&mock_server, "B000000002", 1, review_page(Some("2"), &titles(1..=2))).await;

    let input = tmp.path().join("ids.txt");
    std::fs::write(&input, "B000000001\n\n  B000000002  \nnot-an-id\n").unwrap();

    let mut coordinator = coordinator(&mock_server, &out);
    let stats = crawl(&mut coordinator, &CrawlMode::Batch(input))
        .await
        .expect("Batch run failed");

    assert_eq!(stats.products_seen, 2);
    assert_eq!(stats.products_skipped, 1);
    assert_eq!(stats.products_saved, 1);
    assert_eq!(stats.reviews_saved, 2);
    assert_eq!(stats.invalid_ids, 1);

    let after = std::fs::read_to_string(out.path().join("B000000001.json")).unwrap();
    assert_eq!(before, after);
    assert!(out.path().join("B000000002.json").is_file());

    mock_server.verify().await;
}

#[tokio::test]
async fn test_batch_with_missing_input_file() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    let mut coordinator = coordinator(&mock_server, &tmp);
    let result = coordinator
        .run_batch(&tmp.path().join("does-not-exist.txt"))
        .await;
    assert!(matches!(result, Err(ScraperError::Io(_))));
}

#[tokio::test]
async fn test_search_mode_persists_each_product() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/s/ref=nb_sb_noss_2"))
        .and(query_param("field-keywords", "mobile phone"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <div data-index="0" data-asin="B000000001"></div>
                <div data-index="1" data-asin=""><a href="/Phone/dp/B000000002/ref=sr_1_2">Phone</a></div>
                <div data-index="2" data-asin="B000000003"></div>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_review_page(&mock_server, "B000000001", 1, review_page(Some("2"), &titles(1..=2))).await;
    mount_review_page(&mock_server, "B000000002", 1, review_page(Some("1"), &titles(3..=3))).await;
    mount_review_page(&mock_server, "B000000003", 1, review_page(None, &[])).await;

    let mut coordinator = coordinator(&mock_server, &tmp);
    let stats = crawl(&mut coordinator, &CrawlMode::Search("mobile phone".to_string()))
        .await
        .expect("Search run failed");

    assert_eq!(stats.products_seen, 3);
    assert_eq!(stats.products_saved, 2);
    assert_eq!(stats.products_without_reviews, 1);

    let store = coordinator.store();
    assert_eq!(store.list().unwrap(), vec![id("B000000001"), id("B000000002")]);
    assert_eq!(store.load(&id("B000000001")).unwrap().unwrap().len(), 2);
    assert_eq!(store.load(&id("B000000002")).unwrap().unwrap().len(), 1);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_search_mode_skips_already_fetched_products() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    let mut store = JsonFileStore::open(out.path()).unwrap();
    store.persist(&[old_review("B000000001")]).unwrap();
    let before = std::fs::read_to_string(out.path().join("B000000001.json")).unwrap();

    Mock::given(method("GET"))
        .and(path("/s/ref=nb_sb_noss_2"))
        .and(query_param("field-keywords", "laptop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <div data-index="0" data-asin="B000000001"></div>
                <div data-index="1" data-asin="B000000002"></div>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_untouched_product(&mock_server, "B000000001").await;
    mount_review_page(&mock_server, "B000000002", 1, review_page(Some("2"), &titles(1..=2))).await;

    let mut coordinator = coordinator(&mock_server, &out);
    let stats = crawl(&mut coordinator, &CrawlMode::Search("laptop".to_string()))
        .await
        .expect("Search run failed");

    assert_eq!(stats.products_seen, 2);
    assert_eq!(stats.products_skipped, 1);
    assert_eq!(stats.products_saved, 1);
    assert_eq!(stats.reviews_saved, 2);

    let after = std::fs::read_to_string(out.path().join("B000000001.json")).unwrap();
    assert_eq!(before, after);
    assert_eq!(
        coordinator.store().list().unwrap(),
        vec![id("B000000001"), id("B000000002")]
    );

    mock_server.verify().await;
}

#[tokio::test]
async fn test_ban_without_retries_is_fatal() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_review_page(
        &mock_server,
        "B000000001",
        1,
        r#"<html><body><form action="/errors/validateCaptcha">
            <img src="https://images.example.com/captcha/abc.jpg">
        </form></body></html>"#
            .to_string(),
    )
    .await;

    let mut coordinator = coordinator(&mock_server, &tmp);
    let err = coordinator
        .harvest_product(&id("B000000001"))
        .await
        .unwrap_err();

    assert!(err.is_banned());
    assert!(!tmp.path().join("B000000001.json").exists());
}

#[tokio::test]
async fn test_ban_cooldown_then_retry_recovers() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let review_path = format!("/product-reviews/B000000001{}", REVIEW_PATH_SUFFIX);

    // The first request hits the challenge page, the retry gets through
    Mock::given(method("GET"))
        .and(path(review_path.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>captcha</body></html>"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(review_path.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(review_page(Some("2"), &titles(1..=2))),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut coordinator = coordinator_with_retries(&mock_server, &tmp, 2);
    let reviews = coordinator
        .crawl_product(&id("B000000001"))
        .await
        .expect("Crawl should recover after the cooldown");

    assert_eq!(reviews.len(), 2);
    assert_eq!(coordinator.fetcher().requests_made(), 2);
    mock_server.verify().await;
}

#[tokio::test]
async fn test_ban_retries_exhausted() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>captcha</body></html>"),
        )
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut coordinator = coordinator_with_retries(&mock_server, &tmp, 2);
    let err = coordinator
        .crawl_product(&id("B000000001"))
        .await
        .unwrap_err();

    assert!(matches!(err, ScraperError::Banned { .. }));
    mock_server.verify().await;
}

#[tokio::test]
async fn test_non_200_response_is_fatal() {
    let mock_server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut coordinator = coordinator(&mock_server, &tmp);
    let err = coordinator
        .crawl_product(&id("B000000001"))
        .await
        .unwrap_err();

    match err {
        ScraperError::UnexpectedStatus { status, .. } => assert_eq!(status, 503),
        other => panic!("unexpected error: {other}"),
    }
    mock_server.verify().await;
}
