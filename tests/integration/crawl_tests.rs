//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, reading the CSV output back.

use link_ripple::config::Config;
use link_ripple::crawler::{CompletionSummary, Supervisor};
use link_ripple::output::{CsvSink, ProgressView, ViewExit, CSV_HEADERS};
use link_ripple::state::ProgressAggregator;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing to `csv_path`
fn create_test_config(csv_path: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.max_concurrent_tasks = 4;
    config.crawler.request_timeout_secs = 5;
    config.output.csv_path = csv_path.display().to_string();
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

/// Mounts a GET mock for `route` serving `body`, expecting `times` requests
async fn mount_page(server: &MockServer, route: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Reads data rows (header excluded) from the CSV file
fn read_rows(csv_path: &Path) -> Vec<(String, String, u16)> {
    let mut reader = csv::Reader::from_path(csv_path).expect("Failed to open CSV");
    assert_eq!(
        reader.headers().expect("Missing CSV header"),
        &csv::StringRecord::from(CSV_HEADERS.to_vec())
    );
    reader
        .records()
        .map(|r| {
            let r = r.expect("Malformed CSV row");
            (
                r[0].to_string(),
                r[1].to_string(),
                r[2].parse().expect("Status code is not a number"),
            )
        })
        .collect()
}

async fn run_crawl(config: &Config, seed: &str) -> CompletionSummary {
    let sink = Arc::new(CsvSink::open(&config.output.csv_path).expect("Failed to open CSV sink"));
    let supervisor = Supervisor::new(config, sink).expect("Failed to create supervisor");
    supervisor.run(seed).await.expect("Crawl failed")
}

fn temp_csv() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let csv_path = dir.path().join("urls.csv");
    (dir, csv_path)
}

#[tokio::test]
async fn test_seed_page_scenario() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    // Seed page with a duplicate tracking variant, a fragment, an external
    // link and a sitemap
    mount_page(
        &site,
        "/",
        &format!(
            r##"<a href="/a">A</a>
                <a href="/a?utm_source=x">A again</a>
                <a href="#section">Jump</a>
                <a href="{}/b">Other</a>
                <a href="sitemap.xml">Sitemap</a>"##,
            other.uri()
        ),
        1,
    )
    .await;

    // Checked once, then crawled once
    mount_page(&site, "/a", "<p>leaf</p>", 2).await;
    mount_page(&site, "/sitemap.xml", "", 0).await;

    // External page: checked but never crawled
    mount_page(&other, "/b", r#"<a href="/c">C</a>"#, 1).await;
    mount_page(&other, "/c", "", 0).await;

    let (_dir, csv_path) = temp_csv();
    let config = create_test_config(&csv_path);
    let summary = run_crawl(&config, &seed).await;

    assert_eq!(summary.counters.total, 2);
    assert_eq!(summary.counters.valid + summary.counters.broken, 2);
    assert_eq!(summary.counters.valid, 2);
    assert_eq!(summary.pages_crawled, 2);

    let rows = read_rows(&csv_path);
    assert_eq!(rows.len(), 2);
    assert!(rows.contains(&(seed.clone(), format!("{}/a", site.uri()), 200)));
    assert!(rows.contains(&(seed.clone(), format!("{}/b", other.uri()), 200)));
}

#[tokio::test]
async fn test_page_fetch_failure_records_nothing() {
    let (_dir, csv_path) = temp_csv();
    let config = create_test_config(&csv_path);

    let summary = run_crawl(&config, "http://127.0.0.1:1/").await;

    assert_eq!(summary.pages_crawled, 1);
    assert_eq!(summary.counters.total, 0);
    assert!(read_rows(&csv_path).is_empty());
}

#[tokio::test]
async fn test_cycles_terminate_and_counters_match_rows() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(r#"<a href="/a">A</a><a href="/b">B</a>"#))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page(
            r#"<a href="/">Home</a><a href="/b">B</a><a href="/a">Self</a>"#,
        ))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page(&format!(
            r#"<a href="/a">A</a><a href="/missing">Missing</a><a href="{}/x">Gone</a>"#,
            other.uri()
        )))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&other)
        .await;
    // "/missing" is unmounted and answers 404

    let (_dir, csv_path) = temp_csv();
    let config = create_test_config(&csv_path);
    let summary = run_crawl(&config, &seed).await;

    let rows = read_rows(&csv_path);
    let counters = summary.counters;

    assert_eq!(counters.total, rows.len() as u64);
    assert_eq!(counters.total, counters.valid + counters.broken);
    assert_eq!(counters.total, 5);
    assert_eq!(counters.valid, 3);
    assert_eq!(counters.broken, 2);

    // Every target is recorded exactly once
    let targets: HashSet<&str> = rows.iter().map(|(_, target, _)| target.as_str()).collect();
    assert_eq!(targets.len(), rows.len());
    assert!(rows.contains(&(format!("{}/b", site.uri()), format!("{}/missing", site.uri()), 404)));
    assert!(rows.contains(&(format!("{}/b", site.uri()), format!("{}/x", other.uri()), 404)));
}

#[tokio::test]
async fn test_sitemap_and_fragment_links_never_checked() {
    let site = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    mount_page(
        &site,
        "/",
        r#"<a href="/sitemap_index.html">1</a>
           <a href="/feed.XML">2</a>
           <a href="/robots.txt">3</a>
           <a href="/page#details">4</a>"#,
        1,
    )
    .await;
    mount_page(&site, "/sitemap_index.html", "", 0).await;
    mount_page(&site, "/feed.XML", "", 0).await;
    mount_page(&site, "/robots.txt", "", 0).await;
    mount_page(&site, "/page", "", 0).await;

    let (_dir, csv_path) = temp_csv();
    let config = create_test_config(&csv_path);
    let summary = run_crawl(&config, &seed).await;

    assert_eq!(summary.counters.total, 0);
    assert!(read_rows(&csv_path).is_empty());
}

#[tokio::test]
async fn test_exact_seed_link_is_not_recrawled() {
    let site = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    // The href equals the seed string, so the page is checked but not crawled again
    mount_page(&site, "/", &format!(r#"<a href="{}">Home</a>"#, seed), 2).await;

    let (_dir, csv_path) = temp_csv();
    let config = create_test_config(&csv_path);
    let summary = run_crawl(&config, &seed).await;

    assert_eq!(summary.pages_crawled, 1);
    assert_eq!(summary.counters.valid, 1);
}

#[tokio::test]
async fn test_equivalent_seed_link_is_recrawled_once() {
    let site = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    // The recursion guard compares raw strings: "/" differs from the seed
    // string even though both normalize to the same key, so the seed page is
    // crawled a second time. Dedup still stops it there.
    mount_page(&site, "/", r#"<a href="/">Home</a>"#, 3).await;

    let (_dir, csv_path) = temp_csv();
    let config = create_test_config(&csv_path);
    let summary = run_crawl(&config, &seed).await;

    assert_eq!(summary.pages_crawled, 2);
    assert_eq!(summary.counters.total, 1);
    assert_eq!(read_rows(&csv_path).len(), 1);
}

#[tokio::test]
async fn test_depth_limit_stops_recursion() {
    let site = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    mount_page(&site, "/", r#"<a href="/a">A</a>"#, 1).await;
    // Checked by the seed task, never crawled
    mount_page(&site, "/a", r#"<a href="/deep">Deep</a>"#, 1).await;
    mount_page(&site, "/deep", "", 0).await;

    let (_dir, csv_path) = temp_csv();
    let mut config = create_test_config(&csv_path);
    config.crawler.max_depth = Some(0);
    let summary = run_crawl(&config, &seed).await;

    assert_eq!(summary.pages_crawled, 1);
    assert_eq!(summary.pages_skipped, 1);
    assert_eq!(summary.counters.total, 1);
}

#[tokio::test]
async fn test_page_limit_stops_recursion() {
    let site = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    mount_page(&site, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#, 1).await;
    mount_page(&site, "/a", r#"<a href="/c">C</a>"#, 2).await;
    mount_page(&site, "/b", "", 1).await;
    mount_page(&site, "/c", "", 1).await;

    let (_dir, csv_path) = temp_csv();
    let mut config = create_test_config(&csv_path);
    config.crawler.max_pages = Some(2);
    config.crawler.max_concurrent_tasks = 1;
    let summary = run_crawl(&config, &seed).await;

    // Seed and /a are crawled; /b and /c are still checked but dropped from
    // the queue once the limit is hit.
    assert_eq!(summary.pages_crawled, 2);
    assert_eq!(summary.counters.total, 3);
    assert_eq!(summary.pages_skipped, 2);
}

#[tokio::test]
async fn test_single_task_crawls_whole_chain() {
    let site = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    mount_page(&site, "/", r#"<a href="/p1">1</a>"#, 1).await;
    for i in 1..=5 {
        let next = if i < 5 {
            format!(r#"<a href="/p{}">next</a>"#, i + 1)
        } else {
            String::new()
        };
        // Checked by the previous page, then crawled
        mount_page(&site, &format!("/p{}", i), &next, 2).await;
    }

    let (_dir, csv_path) = temp_csv();
    let mut config = create_test_config(&csv_path);
    config.crawler.max_concurrent_tasks = 1;
    let summary = run_crawl(&config, &seed).await;

    assert_eq!(summary.pages_crawled, 6);
    assert_eq!(summary.counters.total, 5);
    assert_eq!(summary.counters.valid, 5);
}

#[tokio::test]
async fn test_runs_append_to_same_csv() {
    let site = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(r#"<a href="/gone">Gone</a>"#))
        .mount(&site)
        .await;

    let (_dir, csv_path) = temp_csv();
    let config = create_test_config(&csv_path);

    let first = run_crawl(&config, &seed).await;
    let second = run_crawl(&config, &seed).await;

    // Each run starts with an empty registry and zeroed counters
    assert_eq!(first.counters.total, 1);
    assert_eq!(second.counters.total, 1);

    let rows = read_rows(&csv_path);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|(_, _, status)| *status == 404));

    let content = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(content.matches("Current Page URL").count(), 1);
}

#[tokio::test]
async fn test_progress_view_follows_crawl() {
    let site = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    mount_page(&site, "/", r#"<a href="/a">A</a><a href="/nope">N</a>"#, 1).await;
    mount_page(&site, "/a", "", 2).await;

    let (_dir, csv_path) = temp_csv();
    let config = create_test_config(&csv_path);
    let sink = Arc::new(CsvSink::open(&csv_path).unwrap());
    let supervisor = Supervisor::new(&config, sink).unwrap();

    let progress = ProgressAggregator::new();
    let rx = progress.subscribe();
    let view = tokio::spawn(async move {
        let mut view = ProgressView::new(rx, Vec::new());
        let exit = view.run_until(std::future::pending()).await.unwrap();
        (exit, String::from_utf8(view.into_inner()).unwrap())
    });

    let summary = supervisor.run_with_progress(&seed, progress).await.unwrap();
    let (exit, rendered) = view.await.unwrap();

    assert_eq!(exit, ViewExit::Completed);
    assert_eq!(summary.counters.total, 2);
    assert!(rendered.contains("[finished] links: 2 | valid: 1 | broken: 1"));
}

#[tokio::test]
async fn test_overlapping_runs_keep_separate_counters() {
    let first_site = MockServer::start().await;
    let second_site = MockServer::start().await;
    let first_seed = format!("{}/", first_site.uri());
    let second_seed = format!("{}/", second_site.uri());

    mount_page(
        &first_site,
        "/",
        r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#,
        1,
    )
    .await;
    for leaf in ["/a", "/b", "/c"] {
        // Checked, then crawled
        Mock::given(method("GET"))
            .and(path(leaf))
            .respond_with(html_page("<p>leaf</p>").set_delay(Duration::from_millis(100)))
            .expect(2)
            .mount(&first_site)
            .await;
    }
    mount_page(&second_site, "/", r#"<a href="/gone">Gone</a>"#, 1).await;

    let (_dir, csv_path) = temp_csv();
    let config = create_test_config(&csv_path);
    let sink = Arc::new(CsvSink::open(&csv_path).unwrap());
    let supervisor = Supervisor::new(&config, sink).unwrap();

    let (first, second) = tokio::join!(supervisor.run(&first_seed), supervisor.run(&second_seed));
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(first.counters.total, 3);
    assert_eq!(first.counters.valid, 3);
    assert_eq!(first.counters.broken, 0);
    assert_eq!(first.pages_crawled, 4);

    assert_eq!(second.counters.total, 1);
    assert_eq!(second.counters.valid, 0);
    assert_eq!(second.counters.broken, 1);
    assert_eq!(second.pages_crawled, 1);

    // Both runs share the sink, and their rows stay apart by source page
    let rows = read_rows(&csv_path);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows.iter().filter(|(page, _, _)| *page == first_seed).count(), 3);
    assert_eq!(rows.iter().filter(|(page, _, _)| *page == second_seed).count(), 1);
}

#[tokio::test]
async fn test_child_starts_before_parent_finishes_checking() {
    let site = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    mount_page(&site, "/", r#"<a href="/a">A</a><a href="/slow">Slow</a>"#, 1).await;
    mount_page(&site, "/a", r#"<a href="/x">X</a>"#, 2).await;
    mount_page(&site, "/x", "<p>leaf</p>", 2).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_secs(2)))
        .expect(1)
        .mount(&site)
        .await;

    let (_dir, csv_path) = temp_csv();
    let config = create_test_config(&csv_path);
    let summary = run_crawl(&config, &seed).await;

    assert_eq!(summary.counters.total, 3);
    assert_eq!(summary.pages_crawled, 3);

    // "/a" is crawled while the seed still waits on "/slow", so the link
    // found on "/a" is recorded first.
    let targets: Vec<String> = read_rows(&csv_path)
        .into_iter()
        .map(|(_, target, _)| target)
        .collect();
    assert_eq!(
        targets,
        vec![
            format!("{}/a", site.uri()),
            format!("{}/x", site.uri()),
            format!("{}/slow", site.uri()),
        ]
    );
}
