use crate::domain::SubscriberEmail;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

#[derive(Debug)]
pub struct EmailClient {
    http_client: Client,
    base_url: Url,
    sender: SubscriberEmail,
    authorization_token: Secret<String>,
}

/// Metadata label attached to a provider send; echoed back in webhook
/// events so analytics can attribute them to a newsletter.
#[derive(serde::Serialize)]
pub struct EmailTag<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

#[derive(serde::Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [EmailTag<'a>]>,
    #[serde(rename = "trackOpens", skip_serializing_if = "Option::is_none")]
    track_opens: Option<bool>,
    #[serde(rename = "trackClicks", skip_serializing_if = "Option::is_none")]
    track_clicks: Option<bool>,
}

#[derive(thiserror::Error, Debug)]
pub enum EmailError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl EmailClient {
    pub fn new(
        base_url: Url,
        sender: SubscriberEmail,
        authorization_token: Secret<String>,
        timeout: Duration,
    ) -> Self {
        let http_client = Client::builder().timeout(timeout).build().unwrap();

        Self {
            http_client,
            base_url,
            sender,
            authorization_token,
        }
    }

    /// Transactional send without tracking, used for verification emails.
    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> Result<(), EmailError> {
        self.submit(recipient, subject, html_content, None).await
    }

    /// Newsletter-type send: tagged for webhook attribution, with open and
    /// click tracking enabled.
    pub async fn send_tracked_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        tags: &[EmailTag<'_>],
    ) -> Result<(), EmailError> {
        self.submit(recipient, subject, html_content, Some(tags)).await
    }

    async fn submit(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        tags: Option<&[EmailTag<'_>]>,
    ) -> Result<(), EmailError> {
        let url = self.base_url.join("/emails")?;

        let tracked = tags.is_some();
        let request_body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: recipient.as_ref(),
            subject,
            html: html_content,
            tags,
            track_opens: tracked.then_some(true),
            track_clicks: tracked.then_some(true),
        };

        self.http_client
            .post(url)
            .bearer_auth(self.authorization_token.expose_secret())
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
