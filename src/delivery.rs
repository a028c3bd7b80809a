use futures::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{NewsletterRecord, SubscriberEmail, SubscriberRecord};
use crate::email_client::{EmailClient, EmailError, EmailTag};
use crate::render::{EmailRecipient, NewsletterEmail, render_newsletter_html};
use crate::token::UnsubscribeKey;

/// Outcome of one fan-out. `total` counts every eligible recipient, whether
/// or not their copy went through.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Send one newsletter to every given subscriber, all copies in flight at
/// once.
///
/// Each recipient is handled independently: their copy is personalized with
/// their own unsubscribe link, and a failure (bad stored email, provider
/// rejection) costs only that recipient. Newsletter status is not touched
/// here; the caller decides what a completed fan-out means.
#[tracing::instrument(
    skip_all,
    fields(newsletter_id = %newsletter.id, total = subscribers.len())
)]
pub async fn send_newsletter_to_subscribers(
    newsletter: &NewsletterRecord,
    subscribers: &[SubscriberRecord],
    email_client: &EmailClient,
    unsubscribe_key: &UnsubscribeKey,
    base_url: &str,
) -> DeliveryReport {
    let newsletter_id = newsletter.id.to_string();
    let tags = [
        EmailTag {
            name: "newsletter_id",
            value: &newsletter_id,
        },
        EmailTag {
            name: "type",
            value: "newsletter",
        },
    ];
    let email = NewsletterEmail::from_record(newsletter);

    let sends = subscribers.iter().map(|subscriber| {
        let email = &email;
        let tags = &tags;
        async move {
            let recipient = match SubscriberEmail::parse(subscriber.email.clone()) {
                Ok(recipient) => recipient,
                Err(e) => {
                    tracing::error!(
                        error.message = %e,
                        "Skipping a subscriber. Their stored contact details are invalid",
                    );
                    return Err(());
                }
            };

            let token = unsubscribe_key.derive(subscriber.id, recipient.as_ref());
            let html = render_newsletter_html(
                email,
                &EmailRecipient {
                    subscriber_id: subscriber.id,
                    unsubscribe_token: &token,
                },
                base_url,
            );

            email_client
                .send_tracked_email(&recipient, &newsletter.title, &html, tags)
                .await
                .map_err(|e| {
                    tracing::error!(
                        error.cause_chain = ?e,
                        error.message = %e,
                        "Failed to deliver the newsletter to a verified subscriber. \
                        Skipping.",
                    );
                })
        }
    });

    let results = join_all(sends).await;

    let successful = results.iter().filter(|outcome| outcome.is_ok()).count();
    let report = DeliveryReport {
        total: subscribers.len(),
        successful,
        failed: subscribers.len() - successful,
    };

    tracing::info!(
        successful = report.successful,
        failed = report.failed,
        "Newsletter fan-out completed"
    );

    report
}

/// Send a single copy to an ad hoc address, clearly labelled as a test.
///
/// The recipient is not a stored subscriber, so the nil uuid stands in as
/// the identity for unsubscribe token derivation. The send is tagged
/// `type=test` only; it never carries a newsletter id and never changes the
/// newsletter's status.
#[tracing::instrument(
    skip_all,
    fields(newsletter_id = %newsletter.id)
)]
pub async fn send_test_email(
    newsletter: &NewsletterRecord,
    recipient: &SubscriberEmail,
    email_client: &EmailClient,
    unsubscribe_key: &UnsubscribeKey,
    base_url: &str,
) -> Result<(), EmailError> {
    let subject = format!("[TEST] {}", newsletter.title);
    let email = NewsletterEmail {
        title: &subject,
        ..NewsletterEmail::from_record(newsletter)
    };

    let token = unsubscribe_key.derive(Uuid::nil(), recipient.as_ref());
    let html = render_newsletter_html(
        &email,
        &EmailRecipient {
            subscriber_id: Uuid::nil(),
            unsubscribe_token: &token,
        },
        base_url,
    );

    let tags = [EmailTag {
        name: "type",
        value: "test",
    }];
    email_client
        .send_tracked_email(recipient, &subject, &html, &tags)
        .await
}

/// The exact document a subscriber would receive, rendered for a placeholder
/// recipient. Used by the editor's preview pane.
pub fn render_preview(
    newsletter: &NewsletterRecord,
    unsubscribe_key: &UnsubscribeKey,
    base_url: &str,
) -> String {
    let token = unsubscribe_key.derive(Uuid::nil(), "preview@example.com");
    render_newsletter_html(
        &NewsletterEmail::from_record(newsletter),
        &EmailRecipient {
            subscriber_id: Uuid::nil(),
            unsubscribe_token: &token,
        },
        base_url,
    )
}
