//! arXiv API client.
//!
//! Searches the public arXiv export API and parses its Atom feed into
//! [`Paper`] records. Requests are made one page at a time with a polite
//! delay between pages.
//!
//! API Details:
//! - Endpoint: GET /api/query?search_query=...&start=...&max_results=...
//! - Responses are Atom XML with `opensearch:` paging elements
//! - Errors come back as a feed with a single entry whose id is under `/api/errors`
//! - Heavy use is answered with 503 (and sometimes 429); wait and retry

use crate::error::{ArxivError, OptionExt, Result};
use crate::summarize::SummaryResult;
use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// arXiv export API endpoint
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Upper bound of the random jitter added to retry waits, in milliseconds
const RETRY_JITTER_MS: u64 = 500;

/// A single paper from arXiv
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    /// Abstract page URL, e.g. `http://arxiv.org/abs/2401.00001v1`
    pub entry_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub published: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
    pub pdf_url: String,
    /// Abstract with whitespace collapsed
    pub abstract_text: String,
    pub primary_category: String,
    pub categories: Vec<String>,
    /// Summary attached by the caller after searching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<SummaryResult>,
}

/// Sort criteria for arXiv search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Relevance,
    LastUpdatedDate,
    SubmittedDate,
}

impl SortBy {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
            SortBy::SubmittedDate => "submittedDate",
        }
    }
}

/// Search options for arXiv
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Total papers wanted
    pub max_results: usize,
    /// Papers requested per API call
    pub page_size: usize,
    /// Wait between page requests and before retries
    pub delay: Duration,
    /// Retries for 429/503 and transport errors
    pub num_retries: u32,
    pub sort_by: SortBy,
    /// Endpoint, overridable for mirrors and tests
    pub base_url: String,
    /// Bounds of the random pause taken for each result kept
    pub result_pause: (Duration, Duration),
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 3,
            page_size: 10,
            delay: Duration::from_millis(1500),
            num_retries: 3,
            sort_by: SortBy::SubmittedDate,
            base_url: ARXIV_API_URL.to_string(),
            result_pause: (Duration::from_millis(500), Duration::from_millis(1200)),
        }
    }
}

impl SearchOptions {
    /// Draw a pause from `result_pause`
    pub fn next_result_pause(&self) -> Duration {
        let (min, max) = self.result_pause;
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

/// One parsed page of the Atom feed
#[derive(Debug)]
pub struct FeedPage {
    pub total_results: Option<usize>,
    pub papers: Vec<Paper>,
}

/// arXiv API client
pub struct ArxivClient {
    client: reqwest::Client,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("rustarxiv/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArxivError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Search arXiv, newest submissions first by default.
    ///
    /// # Arguments
    ///
    /// * `query` - Search keywords
    /// * `options` - Paging, pacing and retry settings
    ///
    /// # Returns
    ///
    /// At most `options.max_results` papers
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<Paper>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ArxivError::Validation("search query is empty".to_string()));
        }
        if options.page_size == 0 {
            return Err(ArxivError::Validation("page size must be greater than 0".to_string()));
        }

        info!(
            query = query,
            max_results = options.max_results,
            "Starting arXiv query"
        );

        let mut papers: Vec<Paper> = Vec::new();
        let mut start = 0usize;

        while papers.len() < options.max_results {
            if start > 0 {
                tokio::time::sleep(options.delay).await;
            }

            let wanted = options.page_size.min(options.max_results - papers.len());
            let url = build_search_url(&options.base_url, query, start, wanted, options.sort_by)?;

            debug!(url = %url, start = start, "Fetching arXiv page");

            let body = self.fetch_page(&url, options).await?;
            let page = parse_feed(&body)?;
            let count = page.papers.len();

            info!(start = start, count = count, total = ?page.total_results, "Parsed arXiv page");

            for _ in 0..count.min(options.max_results - papers.len()) {
                tokio::time::sleep(options.next_result_pause()).await;
            }
            papers.extend(page.papers);
            start += count;

            let exhausted = page.total_results.is_some_and(|total| start >= total);
            if count == 0 || exhausted {
                break;
            }
        }

        papers.truncate(options.max_results);
        info!(total = papers.len(), "arXiv query complete");
        Ok(papers)
    }

    /// Fetch one page, retrying 429/503 and transport errors.
    async fn fetch_page(&self, url: &Url, options: &SearchOptions) -> Result<String> {
        let mut retries = 0;

        loop {
            let error = match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response.text().await.map_err(ArxivError::Network);
                    }

                    let retryable = status == reqwest::StatusCode::TOO_MANY_REQUESTS
                        || status == reqwest::StatusCode::SERVICE_UNAVAILABLE;
                    if !retryable {
                        return Err(ArxivError::Api {
                            code: status.as_u16() as i32,
                            message: format!("arXiv API error: {}", status),
                        });
                    }
                    if retries >= options.num_retries {
                        return Err(ArxivError::RateLimited(retries));
                    }
                    format!("HTTP {}", status.as_u16())
                }
                Err(e) => {
                    if retries >= options.num_retries {
                        return Err(ArxivError::Network(e));
                    }
                    e.to_string()
                }
            };

            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=RETRY_JITTER_MS));
            let wait = options.delay + jitter;
            retries += 1;
            warn!(
                retry = retries,
                max_retries = options.num_retries,
                wait_ms = wait.as_millis() as u64,
                error = %error,
                "arXiv request failed, retrying"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

/// Build arXiv API search URL
pub fn build_search_url(
    base_url: &str,
    query: &str,
    start: usize,
    max_results: usize,
    sort_by: SortBy,
) -> Result<Url> {
    let search_query = format!("all:{}", query);
    let start = start.to_string();
    let max_results = max_results.to_string();

    Url::parse_with_params(
        base_url,
        &[
            ("search_query", search_query.as_str()),
            ("start", start.as_str()),
            ("max_results", max_results.as_str()),
            ("sortBy", sort_by.as_api_str()),
            ("sortOrder", "descending"),
        ],
    )
    .map_err(|e| ArxivError::Config(format!("Invalid arXiv URL '{}': {}", base_url, e)))
}

/// Regexes for the parts of the Atom feed we read
struct FeedPatterns {
    entry: Regex,
    total: Regex,
    author: Regex,
    link: Regex,
    attr: Regex,
    category: Regex,
    primary: Regex,
    id: Regex,
    title: Regex,
    summary: Regex,
    published: Regex,
    updated: Regex,
    entity: Regex,
}

impl FeedPatterns {
    fn new() -> Result<Self> {
        let compile = |pattern: &str| Regex::new(pattern).map_err(|e| ArxivError::Parse(e.to_string()));
        let element = |tag: &str| compile(&format!(r"(?s)<{tag}\b[^>]*>(.*?)</{tag}>"));

        Ok(Self {
            entry: compile(r"(?s)<entry\b[^>]*>(.*?)</entry>")?,
            total: compile(r"<opensearch:totalResults[^>]*>\s*(\d+)\s*</opensearch:totalResults>")?,
            author: compile(r"(?s)<author\b[^>]*>.*?<name>(.*?)</name>.*?</author>")?,
            link: compile(r"<link\b([^>]*)/?>")?,
            attr: compile(r#"([\w:]+)\s*=\s*"([^"]*)""#)?,
            category: compile(r"<category\b([^>]*)/?>")?,
            primary: compile(r#"<arxiv:primary_category\b[^>]*\bterm="([^"]*)""#)?,
            id: element("id")?,
            title: element("title")?,
            summary: element("summary")?,
            published: element("published")?,
            updated: element("updated")?,
            entity: compile(r"&(?:#x([0-9A-Fa-f]+)|#([0-9]+)|(lt|gt|quot|apos|amp));")?,
        })
    }

    /// Text of the first element matched by `element`, whitespace collapsed
    fn tag_text(&self, element: &Regex, xml: &str) -> Option<String> {
        element
            .captures(xml)
            .and_then(|c| c.get(1))
            .map(|m| normalize_whitespace(&self.decode_entities(m.as_str())))
    }

    /// Decode the predefined XML entities and numeric character references
    /// in a single pass. References to invalid code points are left as-is.
    fn decode_entities(&self, text: &str) -> String {
        self.entity
            .replace_all(text, |caps: &regex::Captures| {
                let decoded = if let Some(hex) = caps.get(1) {
                    u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
                } else if let Some(dec) = caps.get(2) {
                    dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
                } else {
                    caps.get(3).map(|name| match name.as_str() {
                        "lt" => '<',
                        "gt" => '>',
                        "quot" => '"',
                        "apos" => '\'',
                        _ => '&',
                    })
                };

                match decoded {
                    Some(c) => c.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn attrs<'a>(&self, raw: &'a str) -> Vec<(&'a str, &'a str)> {
        self.attr
            .captures_iter(raw)
            .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
            .collect()
    }
}

/// Parse one Atom response page.
pub fn parse_feed(xml: &str) -> Result<FeedPage> {
    let patterns = FeedPatterns::new()?;

    let total_results = patterns
        .total
        .captures(xml)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok());

    let mut papers = Vec::new();
    for caps in patterns.entry.captures_iter(xml) {
        let Some(entry) = caps.get(1) else { continue };
        if let Some(paper) = parse_entry(&patterns, entry.as_str())? {
            papers.push(paper);
        }
    }

    Ok(FeedPage {
        total_results,
        papers,
    })
}

/// Parse a single `<entry>` body. `Ok(None)` skips entries without a title.
fn parse_entry(patterns: &FeedPatterns, entry: &str) -> Result<Option<Paper>> {
    let entry_id = patterns.tag_text(&patterns.id, entry).ok_or_parse("arXiv entry without id")?;
    let abstract_text = patterns.tag_text(&patterns.summary, entry).unwrap_or_default();

    if entry_id.contains("/api/errors") {
        return Err(ArxivError::Api {
            code: 400,
            message: format!("arXiv rejected the query: {}", abstract_text),
        });
    }

    let title = patterns.tag_text(&patterns.title, entry).unwrap_or_default();
    if title.is_empty() {
        debug!(entry_id = %entry_id, "Skipping entry without title");
        return Ok(None);
    }

    let published = patterns
        .tag_text(&patterns.published, entry)
        .ok_or_parse("arXiv entry without published date")
        .and_then(|raw| parse_timestamp(&raw))?;
    let updated = match patterns.tag_text(&patterns.updated, entry) {
        Some(raw) => Some(parse_timestamp(&raw)?),
        None => None,
    };

    let authors = patterns
        .author
        .captures_iter(entry)
        .filter_map(|c| c.get(1))
        .map(|m| normalize_whitespace(&patterns.decode_entities(m.as_str())))
        .filter(|name| !name.is_empty())
        .collect();

    let pdf_url = patterns
        .link
        .captures_iter(entry)
        .filter_map(|c| c.get(1))
        .map(|m| patterns.attrs(m.as_str()))
        .find(|attrs| attrs.iter().any(|(k, v)| *k == "title" && *v == "pdf"))
        .and_then(|attrs| attrs.into_iter().find(|(k, _)| *k == "href").map(|(_, v)| v.to_string()))
        .unwrap_or_else(|| entry_id.replacen("/abs/", "/pdf/", 1));

    let categories: Vec<String> = patterns
        .category
        .captures_iter(entry)
        .filter_map(|c| c.get(1))
        .filter_map(|m| {
            patterns
                .attrs(m.as_str())
                .into_iter()
                .find(|(k, _)| *k == "term")
                .map(|(_, v)| patterns.decode_entities(v))
        })
        .collect();

    let primary_category = patterns
        .primary
        .captures(entry)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .or_else(|| categories.first().cloned())
        .unwrap_or_default();

    Ok(Some(Paper {
        entry_id,
        title,
        authors,
        published,
        updated,
        pdf_url,
        abstract_text,
        primary_category,
        categories,
        digest: None,
    }))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ArxivError::Parse(format!("Invalid timestamp '{}': {}", raw, e)))
}

/// Collapse runs of whitespace (including newlines) into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:LLM agents</title>
  <id>http://arxiv.org/api/abc</id>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">2</opensearch:totalResults>
  <opensearch:startIndex xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">0</opensearch:startIndex>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <updated>2024-01-02T10:00:00Z</updated>
    <published>2024-01-01T18:59:59Z</published>
    <title>Agents That
      Plan &amp; Act</title>
    <summary>  We study planning agents.
Results are strong. More follows.
    </summary>
    <author>
      <name>Ada Lovelace</name>
    </author>
    <author>
      <name>Alan Turing</name>
      <arxiv:affiliation xmlns:arxiv="http://arxiv.org/schemas/atom">Cambridge</arxiv:affiliation>
    </author>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00002v2</id>
    <published>2024-01-01T09:00:00Z</published>
    <title>No PDF Link</title>
    <summary>Short.</summary>
    <author><name>Grace Hopper</name></author>
    <category term="math.CO" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    #[test]
    fn test_build_search_url() {
        let url = build_search_url(ARXIV_API_URL, "LLM agents", 10, 5, SortBy::SubmittedDate).unwrap();
        let s = url.as_str();
        assert!(s.starts_with("http://export.arxiv.org/api/query?"));
        assert!(s.contains("search_query=all%3ALLM+agents"));
        assert!(s.contains("start=10"));
        assert!(s.contains("max_results=5"));
        assert!(s.contains("sortBy=submittedDate"));
        assert!(s.contains("sortOrder=descending"));
    }

    #[test]
    fn test_next_result_pause() {
        let options = SearchOptions::default();
        for _ in 0..50 {
            let pause = options.next_result_pause();
            assert!(pause >= Duration::from_millis(500));
            assert!(pause <= Duration::from_millis(1200));
        }

        let off = SearchOptions {
            result_pause: (Duration::ZERO, Duration::ZERO),
            ..Default::default()
        };
        assert_eq!(off.next_result_pause(), Duration::ZERO);
    }

    #[test]
    fn test_parse_feed() {
        let page = parse_feed(FEED).unwrap();
        assert_eq!(page.total_results, Some(2));
        assert_eq!(page.papers.len(), 2);

        let first = &page.papers[0];
        assert_eq!(first.entry_id, "http://arxiv.org/abs/2401.00001v1");
        assert_eq!(first.title, "Agents That Plan & Act");
        assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(first.published.format("%Y-%m-%d").to_string(), "2024-01-01");
        assert!(first.updated.is_some());
        assert_eq!(first.pdf_url, "http://arxiv.org/pdf/2401.00001v1");
        assert_eq!(
            first.abstract_text,
            "We study planning agents. Results are strong. More follows."
        );
        assert_eq!(first.primary_category, "cs.AI");
        assert_eq!(first.categories, vec!["cs.AI", "cs.LG"]);
        assert!(first.digest.is_none());

        let second = &page.papers[1];
        assert_eq!(second.pdf_url, "http://arxiv.org/pdf/2401.00002v2");
        assert_eq!(second.primary_category, "math.CO");
        assert!(second.updated.is_none());
    }

    #[test]
    fn test_parse_empty_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><opensearch:totalResults>0</opensearch:totalResults></feed>"#;
        let page = parse_feed(xml).unwrap();
        assert_eq!(page.total_results, Some(0));
        assert!(page.papers.is_empty());
    }

    #[test]
    fn test_parse_error_entry() {
        let xml = r#"<feed><entry>
            <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
            <title>Error</title>
            <summary>incorrect id format for 1234</summary>
        </entry></feed>"#;
        match parse_feed(xml) {
            Err(ArxivError::Api { code, message }) => {
                assert_eq!(code, 400);
                assert!(message.contains("incorrect id format"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a\n  b\tc  "), "a b c");
    }

    #[test]
    fn test_decode_entities() {
        let patterns = FeedPatterns::new().unwrap();
        assert_eq!(
            patterns.decode_entities("a &lt;b&gt; &amp;amp; &quot;c&quot; &apos;d&apos;"),
            "a <b> &amp; \"c\" 'd'"
        );
        assert_eq!(patterns.decode_entities("&#945; &#x3B2; &#X;"), "α β &#X;");
        // escaped references stay literal
        assert_eq!(patterns.decode_entities("&amp;#945;"), "&#945;");
        assert_eq!(patterns.decode_entities("&#xD800; &#99999999;"), "&#xD800; &#99999999;");
    }

    #[test]
    fn test_parse_numeric_character_references() {
        let xml = r#"<feed><entry>
            <id>http://arxiv.org/abs/2402.00003v1</id>
            <published>2024-02-01T00:00:00Z</published>
            <title>&#945;-helix folding in Schr&#xF6;dinger models</title>
            <summary>Energy &#8804; 5 eV.</summary>
            <author><name>Erwin Schr&#246;dinger</name></author>
        </entry></feed>"#;

        let page = parse_feed(xml).unwrap();
        let paper = &page.papers[0];
        assert_eq!(paper.title, "α-helix folding in Schrödinger models");
        assert_eq!(paper.authors, vec!["Erwin Schrödinger"]);
        assert_eq!(paper.abstract_text, "Energy ≤ 5 eV.");
    }
}
