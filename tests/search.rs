//! arXiv search against a loopback fake of the export API.

use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Router};
use rustarxiv::arxiv::{ArxivClient, SearchOptions};
use rustarxiv::ArxivError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn entry(n: usize) -> String {
    format!(
        r#"<entry>
    <id>http://arxiv.org/abs/2401.{n:05}v1</id>
    <published>2024-01-01T00:00:00Z</published>
    <title>Paper {n}</title>
    <summary>Abstract of paper {n}. It has results. And more.</summary>
    <author><name>Author {n}</name></author>
    <link title="pdf" href="http://arxiv.org/pdf/2401.{n:05}v1" rel="related" type="application/pdf"/>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>"#
    )
}

/// Feed page for `start`/`max_results` out of `total` papers.
fn feed(start: usize, max_results: usize, total: usize) -> String {
    let entries: String = (start..(start + max_results).min(total)).map(entry).collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">{total}</opensearch:totalResults>
  {entries}
</feed>"#
    )
}

/// Fake API that fails the first `failures` requests with `fail_status`.
async fn serve_arxiv(total: usize, failures: usize, fail_status: StatusCode) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let app = Router::new().route(
        "/api/query",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < failures {
                    return (fail_status, String::new()).into_response();
                }
                let start = params.get("start").and_then(|s| s.parse().ok()).unwrap_or(0);
                let max = params.get("max_results").and_then(|s| s.parse().ok()).unwrap_or(10);
                (StatusCode::OK, feed(start, max, total)).into_response()
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api/query", addr), hits)
}

fn options(base_url: String, max_results: usize, page_size: usize) -> SearchOptions {
    SearchOptions {
        max_results,
        page_size,
        delay: Duration::ZERO,
        base_url,
        result_pause: (Duration::ZERO, Duration::ZERO),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_search_paginates_up_to_max_results() {
    let (url, hits) = serve_arxiv(20, 0, StatusCode::OK).await;
    let client = ArxivClient::new().unwrap();

    let papers = client.search("agents", &options(url, 5, 2)).await.unwrap();

    assert_eq!(papers.len(), 5);
    assert_eq!(papers[0].title, "Paper 0");
    assert_eq!(papers[4].title, "Paper 4");
    assert_eq!(papers[4].pdf_url, "http://arxiv.org/pdf/2401.00004v1");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_search_stops_when_feed_is_exhausted() {
    let (url, hits) = serve_arxiv(3, 0, StatusCode::OK).await;
    let client = ArxivClient::new().unwrap();

    let papers = client.search("agents", &options(url, 10, 2)).await.unwrap();

    assert_eq!(papers.len(), 3);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_search_pauses_after_each_kept_result() {
    let (url, _hits) = serve_arxiv(10, 0, StatusCode::OK).await;
    let client = ArxivClient::new().unwrap();

    let mut opts = options(url, 3, 10);
    opts.result_pause = (Duration::from_millis(40), Duration::from_millis(40));

    let started = std::time::Instant::now();
    let papers = client.search("agents", &opts).await.unwrap();

    assert_eq!(papers.len(), 3);
    assert!(started.elapsed() >= Duration::from_millis(120));
}

#[tokio::test]
async fn test_search_retries_service_unavailable() {
    let (url, hits) = serve_arxiv(3, 2, StatusCode::SERVICE_UNAVAILABLE).await;
    let client = ArxivClient::new().unwrap();

    let papers = client.search("agents", &options(url, 3, 10)).await.unwrap();

    assert_eq!(papers.len(), 3);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_search_gives_up_after_retries() {
    let (url, hits) = serve_arxiv(3, 100, StatusCode::SERVICE_UNAVAILABLE).await;
    let client = ArxivClient::new().unwrap();

    let mut opts = options(url, 3, 10);
    opts.num_retries = 2;
    let err = client.search("agents", &opts).await.unwrap_err();

    assert!(matches!(err, ArxivError::RateLimited(2)));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_search_does_not_retry_client_errors() {
    let (url, hits) = serve_arxiv(3, 100, StatusCode::BAD_REQUEST).await;
    let client = ArxivClient::new().unwrap();

    let err = client.search("agents", &options(url, 3, 10)).await.unwrap_err();

    assert!(matches!(err, ArxivError::Api { code: 400, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_query_is_rejected() {
    let client = ArxivClient::new().unwrap();
    let err = client.search("   ", &SearchOptions::default()).await.unwrap_err();
    assert!(matches!(err, ArxivError::Validation(_)));
}
