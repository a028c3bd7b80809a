use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use html5ever::driver;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;

/// Plenty of sites serve bot-shaped requests an empty shell; a browser
/// user agent gets the real page.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Elements that never contribute readable article text.
const STRIPPED_TAGS: [&str; 6] = ["script", "style", "nav", "header", "footer", "aside"];

/// Class names commonly wrapping the article body, tried in order.
const CONTENT_CLASSES: [&str; 4] = ["post-content", "article-content", "entry-content", "content"];

/// A candidate container below this many characters of text is assumed to
/// be chrome, not the article.
const MIN_CONTENT_LEN: usize = 200;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    pub url: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub url: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("failed to fetch url: status {0}")]
    FailedRequest(reqwest::StatusCode),

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Fetches third-party pages and digs structured data out of their HTML.
#[derive(Debug)]
pub struct Scraper {
    http_client: Client,
}

impl Scraper {
    pub fn new(timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .unwrap();

        Self { http_client }
    }

    /// Fetch an article and extract its metadata and readable text.
    pub async fn fetch_article(&self, url: &str) -> Result<ArticleMetadata, ScrapeError> {
        let response = self.http_client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ScrapeError::FailedRequest(response.status()));
        }

        let html = response.text().await?;
        Ok(extract_article(url, &html))
    }

    /// Fetch the configured job board and harvest its job posting links.
    /// An empty list is a valid outcome.
    pub async fn fetch_job_listings(&self, board_url: &str) -> Result<Vec<JobListing>, ScrapeError> {
        let board_url = Url::parse(board_url)?;

        let response = self.http_client.get(board_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(ScrapeError::FailedRequest(response.status()));
        }

        let html = response.text().await?;
        Ok(extract_job_listings(&board_url, &html))
    }

    /// Fetch an image and inline it as a base64 data URI.
    ///
    /// Any failure degrades to an empty string: a missing thumbnail must
    /// never fail the item it belongs to.
    pub async fn image_to_data_uri(&self, image_url: &str) -> String {
        if image_url.is_empty() {
            return String::new();
        }

        // Protocol-relative URLs are common in og:image tags
        let absolute_url = if let Some(rest) = image_url.strip_prefix("//") {
            format!("https://{rest}")
        } else {
            image_url.to_string()
        };

        let response = match self.http_client.get(&absolute_url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, url = %absolute_url, "Failed to fetch image");
                return String::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), url = %absolute_url, "Failed to fetch image");
            return String::new();
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            tracing::warn!(content_type = %content_type, url = %absolute_url, "URL is not an image");
            return String::new();
        }

        match response.bytes().await {
            Ok(bytes) => format!("data:{content_type};base64,{}", BASE64.encode(&bytes)),
            Err(e) => {
                tracing::warn!(error = %e, url = %absolute_url, "Failed to read image body");
                String::new()
            }
        }
    }
}

pub fn extract_article(url: &str, html: &str) -> ArticleMetadata {
    let dom = driver::parse_document(RcDom::default(), Default::default()).one(html);
    let root = &dom.document;

    let title = page_title(root);
    let description = meta_content(root, "description")
        .or_else(|| meta_content(root, "og:description"))
        .unwrap_or_default()
        .trim()
        .to_string();
    let image_url = meta_content(root, "og:image")
        .or_else(|| meta_content(root, "twitter:image"))
        .unwrap_or_default()
        .trim()
        .to_string();
    let content = readable_text(root);

    ArticleMetadata {
        url: url.to_string(),
        title,
        description,
        image_url,
        content,
    }
}

pub fn extract_job_listings(board_url: &Url, html: &str) -> Vec<JobListing> {
    let dom = driver::parse_document(RcDom::default(), Default::default()).one(html);

    let mut anchors = Vec::new();
    collect_anchors(&dom.document, &mut anchors);

    let mut jobs: Vec<JobListing> = Vec::new();
    for (href, text) in anchors {
        if !href.contains("/jobs/") {
            continue;
        }

        let title = collapse_whitespace(&text);
        if title.is_empty() {
            continue;
        }

        let lowered = title.to_lowercase();
        if !lowered.contains("developer") && !lowered.contains("market") {
            continue;
        }

        let url = match board_url.join(&href) {
            Ok(absolute) => absolute.to_string(),
            Err(_) => continue,
        };
        if jobs.iter().any(|job| job.url == url) {
            continue;
        }

        jobs.push(JobListing {
            title,
            company: "See posting for details".to_string(),
            url,
        });
    }

    jobs
}

fn page_title(root: &Handle) -> String {
    if let Some(node) = find_element(root, &|n| has_tag(n, "title")) {
        let title = collapse_whitespace(&node_text(&node));
        if !title.is_empty() {
            return title;
        }
    }
    if let Some(title) = meta_content(root, "og:title") {
        let title = collapse_whitespace(&title);
        if !title.is_empty() {
            return title;
        }
    }
    if let Some(node) = find_element(root, &|n| has_tag(n, "h1")) {
        let title = collapse_whitespace(&node_text(&node));
        if !title.is_empty() {
            return title;
        }
    }
    String::new()
}

/// First sufficiently large article container, or the whole body.
fn readable_text(root: &Handle) -> String {
    let candidates = [
        find_element(root, &|n| has_tag(n, "article")),
        find_element(root, &|n| attr(n, "role").as_deref() == Some("main")),
        find_element(root, &|n| has_tag(n, "main")),
        find_element(root, &|n| has_any_class(n, &CONTENT_CLASSES)),
        find_element(root, &|n| attr(n, "id").as_deref() == Some("content")),
    ];

    for candidate in candidates.into_iter().flatten() {
        let text = clean_text(&candidate);
        if text.len() > MIN_CONTENT_LEN {
            return text;
        }
    }

    match find_element(root, &|n| has_tag(n, "body")) {
        Some(body) => clean_text(&body),
        None => String::new(),
    }
}

fn parse_fragment_text(node: &Handle, out: &mut String) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => {
                let text = contents.borrow();
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push(' ');
                    }
                    out.push_str(trimmed);
                }
            }
            NodeData::Element { name, .. } => {
                if STRIPPED_TAGS.contains(&name.local.as_ref()) {
                    continue;
                }
                let block = matches!(
                    name.local.as_ref(),
                    "p" | "div"
                        | "li"
                        | "h1"
                        | "h2"
                        | "h3"
                        | "h4"
                        | "h5"
                        | "h6"
                        | "br"
                        | "section"
                        | "blockquote"
                        | "pre"
                        | "tr"
                );
                parse_fragment_text(child, out);
                if block && !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => parse_fragment_text(child, out),
        }
    }
}

fn clean_text(node: &Handle) -> String {
    let mut raw = String::new();
    parse_fragment_text(node, &mut raw);
    raw.trim().to_string()
}

/// Concatenated text beneath a node, stripped tags included.
fn node_text(node: &Handle) -> String {
    let mut out = String::new();
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            _ => out.push_str(&node_text(child)),
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn find_element(node: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if matches!(child.data, NodeData::Element { .. }) && pred(child) {
            return Some(child.clone());
        }
        if let Some(found) = find_element(child, pred) {
            return Some(found);
        }
    }
    None
}

fn has_tag(node: &Handle, tag: &str) -> bool {
    match &node.data {
        NodeData::Element { name, .. } => name.local.as_ref() == tag,
        _ => false,
    }
}

fn attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == attr_name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn has_any_class(node: &Handle, classes: &[&str]) -> bool {
    attr(node, "class")
        .is_some_and(|value| value.split_whitespace().any(|c| classes.contains(&c)))
}

fn meta_content(root: &Handle, key: &str) -> Option<String> {
    find_element(root, &|n| {
        has_tag(n, "meta")
            && (attr(n, "name").as_deref() == Some(key)
                || attr(n, "property").as_deref() == Some(key))
    })
    .and_then(|node| attr(&node, "content"))
}

fn collect_anchors(node: &Handle, out: &mut Vec<(String, String)>) {
    for child in node.children.borrow().iter() {
        if has_tag(child, "a") {
            if let Some(href) = attr(child, "href") {
                out.push((href, node_text(child)));
            }
        }
        collect_anchors(child, out);
    }
}
