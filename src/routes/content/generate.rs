use crate::completion_client::{CompletionClient, CompletionError};
use crate::configuration::ContentConfigs;
use crate::domain::SectionKind;
use crate::scraper::{ScrapeError, Scraper};
use crate::{build_error_response, error_chain_fmt};
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

const INTRO_SYSTEM_PROMPT: &str = "You are a newsletter writer. Your task is to write a newsletter intro based on the user's prompt. The intro should be 2-3 sentences max, casual but purposeful, and set the tone for the newsletter.

CRITICAL: Avoid ALL AI writing patterns. Specifically:
- NO \"Let's explore\", \"In this newsletter\", \"dive into\" openings
- NO empty superlatives like \"game-changing\", \"cutting-edge\", \"exciting\"
- Every sentence must add concrete value
- Sound like a developer in a Slack conversation, not a polished marketing piece
- Write from firsthand experience or accountability";

const SIGNOFF_SYSTEM_PROMPT: &str = "You are a newsletter writer. Your task is to write a newsletter signoff based on the user's prompt. The signoff should be:
- 1-2 sentences max
- Casual and genuine
- Not cheesy or overly friendly
- Can include a call to action or just a simple goodbye

CRITICAL: Avoid ALL AI writing patterns. Specifically:
- NO \"In conclusion\", \"Looking ahead\", \"This represents an exciting future\"
- NO padded conclusions that add nothing
- End with something concrete: a next step, limitation, or simple goodbye
- Sound like how you'd actually sign off a casual email to developers";

const JOB_TITLE_SYSTEM_PROMPT: &str = "Extract just the job title and company name from this job posting.
Format: \"Job Title at Company Name\"
Do not include location, salary, author names, or any other information.";

const PERSON_NAME_SYSTEM_PROMPT: &str = "Extract just the person's name from this profile or article.
Return ONLY the person's name, nothing else. No titles, no descriptions.";

const CLEAN_TITLE_SYSTEM_PROMPT: &str = "Clean this article title by removing author names, publication names, and date suffixes.
Keep the core topic/title only. Do not add any new words.
Examples:
- \"Building Better APIs by John Smith - Dev.to\" -> \"Building Better APIs\"
- \"How We Scaled to 1M Users | Jane Doe\" -> \"How We Scaled to 1M Users\"";

#[derive(thiserror::Error)]
pub enum ContentError {
    #[error("{0}")]
    ValidationError(String),

    #[error("text generation failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("scraping failed: {0}")]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ContentError {
    fn error_response(&self) -> HttpResponse {
        let status_code = match self {
            ContentError::ValidationError(_) => StatusCode::BAD_REQUEST,
            // Upstream providers failing is not this service's fault
            ContentError::Completion(_) | ContentError::Scrape(_) => StatusCode::BAD_GATEWAY,
            ContentError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        build_error_response(status_code, self.to_string())
    }
}

#[derive(Deserialize, Debug)]
pub struct PromptData {
    prompt: Option<String>,
}

impl PromptData {
    fn prompt(self) -> Result<String, ContentError> {
        self.prompt
            .filter(|prompt| !prompt.is_empty())
            .ok_or_else(|| ContentError::ValidationError("Prompt is required".to_string()))
    }
}

#[tracing::instrument(skip_all)]
pub async fn generate_intro(
    payload: web::Json<PromptData>,
    completion_client: web::Data<CompletionClient>,
) -> Result<HttpResponse, ContentError> {
    let prompt = payload.into_inner().prompt()?;

    let content = completion_client
        .complete(
            INTRO_SYSTEM_PROMPT,
            &format!("Write a newsletter intro based on this prompt: {prompt}"),
            0.7,
            300,
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "content": content })))
}

#[tracing::instrument(skip_all)]
pub async fn generate_signoff(
    payload: web::Json<PromptData>,
    completion_client: web::Data<CompletionClient>,
) -> Result<HttpResponse, ContentError> {
    let prompt = payload.into_inner().prompt()?;

    let content = completion_client
        .complete(
            SIGNOFF_SYSTEM_PROMPT,
            &format!("Write a newsletter signoff based on this prompt: {prompt}"),
            0.7,
            200,
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "content": content })))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BlurbData {
    url: Option<String>,
    section_name: Option<String>,
}

/// One round trip for the editor's "add item" flow: scrape the article,
/// clean its title for the target section, write a blurb where the section
/// carries one, and inline the preview image.
#[tracing::instrument(
    skip_all,
    fields(url = tracing::field::Empty, section = tracing::field::Empty)
)]
pub async fn generate_blurb(
    payload: web::Json<BlurbData>,
    completion_client: web::Data<CompletionClient>,
    scraper: web::Data<Scraper>,
) -> Result<HttpResponse, ContentError> {
    let payload = payload.into_inner();
    let url = payload
        .url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ContentError::ValidationError("URL is required".to_string()))?;
    let section_name = payload
        .section_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ContentError::ValidationError("Section name is required".to_string()))?;
    let section = SectionKind::parse(&section_name).map_err(ContentError::ValidationError)?;
    tracing::Span::current().record("url", tracing::field::display(&url));
    tracing::Span::current().record("section", tracing::field::display(&section));

    let article = scraper.fetch_article(&url).await?;

    let title = clean_title(&completion_client, &article.title, &article.content, section).await?;

    let needs_blurb = section.has_blurb();
    let blurb = if needs_blurb {
        let user_prompt = format!(
            "Write a 1-2 sentence blurb for this article:\n\nURL: {url}\n\nArticle Content:\n{}",
            truncate_chars(&article.content, 4000)
        );
        let system_prompt = blurb_system_prompt(section);
        completion_client
            .complete(&system_prompt, &user_prompt, 0.7, 200)
            .await?
    } else {
        String::new()
    };

    // Inlined as a data URI so the thumbnail survives mail clients that
    // block remote images. Failures degrade to no image.
    let image_url = scraper.image_to_data_uri(&article.image_url).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "url": url,
        "title": title,
        "blurb": blurb,
        "imageUrl": image_url,
        "needsBlurb": needs_blurb
    })))
}

#[tracing::instrument(skip(scraper, content))]
pub async fn scrape_jobs(
    scraper: web::Data<Scraper>,
    content: web::Data<ContentConfigs>,
) -> Result<HttpResponse, ContentError> {
    let jobs = scraper.fetch_job_listings(&content.job_board_url).await?;
    tracing::info!(count = jobs.len(), "Collected job listings");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "jobs": jobs })))
}

fn blurb_system_prompt(section: SectionKind) -> String {
    format!(
        "You are a newsletter writer. Your task is to write a 1-2 sentence blurb about an article for the \"{section}\" section of a newsletter. The blurb should be:
- Concise and matter-of-fact
- Highlight what's useful or interesting about the content
- No hype or promotional language
- Include the key takeaway or insight
- Do NOT include the author's name

CRITICAL: Avoid ALL AI writing patterns. Specifically:
- NO vague adverbs (seamlessly, robustly, effortlessly)
- NO empty conclusions that reframe obvious facts
- NO promotional tone or superlatives
- State what the article shows or explains, not what it \"explores\"
- Sound like you're recommending it to a colleague, not selling it

Do NOT include the URL or article title in your response - just write the blurb."
    )
}

/// Section-aware title cleanup. Job postings and profiles need content
/// context to pull out the right name; ordinary articles only need the raw
/// title stripped of author and publication suffixes.
async fn clean_title(
    completion_client: &CompletionClient,
    raw_title: &str,
    content: &str,
    section: SectionKind,
) -> Result<String, CompletionError> {
    match section {
        SectionKind::MarketingJobs => {
            let user_prompt = format!(
                "Raw title: {raw_title}\n\nContent preview:\n{}",
                truncate_chars(content, 500)
            );
            completion_client
                .complete(JOB_TITLE_SYSTEM_PROMPT, &user_prompt, 0.3, 100)
                .await
        }
        SectionKind::FolksToFollow => {
            let user_prompt = format!(
                "Raw title: {raw_title}\n\nContent preview:\n{}",
                truncate_chars(content, 500)
            );
            completion_client
                .complete(PERSON_NAME_SYSTEM_PROMPT, &user_prompt, 0.3, 50)
                .await
        }
        _ => {
            completion_client
                .complete(CLEAN_TITLE_SYSTEM_PROMPT, raw_title, 0.3, 100)
                .await
        }
    }
}

/// Truncate on a character boundary; prompt budgets are approximate anyway.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((index, _)) => &s[..index],
        None => s,
    }
}
