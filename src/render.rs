use crate::domain::{NewsletterRecord, Section};
use chrono::{Datelike, Utc};
use std::fmt::Write;
use uuid::Uuid;

const BRAND_NAME: &str = "Letterforge";

/// The content of one issue, flattened for templating.
///
/// Built from a stored record via [`NewsletterEmail::from_record`]; callers
/// that need a different subject line (test sends) override `title` with
/// struct update syntax.
pub struct NewsletterEmail<'a> {
    pub title: &'a str,
    pub month: &'a str,
    pub hero_image_url: Option<&'a str>,
    pub intro_content: Option<&'a str>,
    pub sections: &'a [Section],
    pub signoff_content: Option<&'a str>,
}

impl<'a> NewsletterEmail<'a> {
    pub fn from_record(record: &'a NewsletterRecord) -> Self {
        Self {
            title: &record.title,
            month: record.month.as_deref().unwrap_or(""),
            hero_image_url: record.hero_image_url.as_deref(),
            intro_content: record.intro_content.as_deref(),
            sections: &record.sections.0,
            signoff_content: record.signoff_content.as_deref(),
        }
    }
}

/// Who a personalized copy is addressed to. The token goes into the
/// unsubscribe link in the footer.
pub struct EmailRecipient<'a> {
    pub subscriber_id: Uuid,
    pub unsubscribe_token: &'a str,
}

const NEWSLETTER_STYLES: &str = r#"    body { margin: 0; padding: 20px; background-color: #f3f4f6; font-family: Inter, Arial, sans-serif; }
    .container { max-width: 680px; margin: 0 auto; background-color: #ffffff; border-radius: 8px; overflow: hidden; box-shadow: 0 20px 40px rgba(0,0,0,0.15); }
    .header { padding: 40px 40px 32px 40px; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #ffffff; position: relative; }
    .header::after { content: ''; position: absolute; bottom: 0; left: 0; right: 0; height: 4px; background: linear-gradient(90deg, #60a5fa 0%, #a855f7 100%); }
    .header-title { font-family: 'Fira Code', monospace; font-size: 28px; font-weight: 700; color: #ffffff; margin: 0 0 4px 0; text-shadow: 0 2px 4px rgba(0,0,0,0.1); }
    .header-month { font-size: 14px; color: rgba(255,255,255,0.9); text-transform: uppercase; letter-spacing: 0.1em; margin: 0; }
    .hero-image { width: 100%; max-width: 680px; height: auto; display: block; }
    .section { padding: 32px 40px; }
    .section-header { display: flex; align-items: center; margin-bottom: 24px; position: relative; padding-bottom: 12px; }
    .section-header::after { content: ''; position: absolute; bottom: 0; left: 0; width: 60px; height: 3px; background: linear-gradient(90deg, #60a5fa 0%, #a855f7 100%); border-radius: 2px; }
    .section-title { font-family: 'Fira Code', monospace; font-size: 20px; font-weight: 600; color: #111827; margin: 0; position: relative; }
    .section-title::before { content: '//'; color: #60a5fa; margin-right: 8px; opacity: 0.6; }
    .intro-text { font-size: 16px; line-height: 1.7; color: #374151; margin: 0 0 16px 0; }
    .item { margin-bottom: 28px; padding: 16px; background: #f8fafc; border-radius: 6px; border-left: 3px solid #60a5fa; }
    .item-with-image { display: flex; gap: 16px; align-items: center; }
    .item-thumbnail { width: 160px; height: 80px; object-fit: cover; border-radius: 4px; flex-shrink: 0; }
    .item-content { flex: 1; min-width: 0; }
    .item-title { font-size: 18px; font-weight: 600; line-height: 1.4; margin: 0 0 8px 0; }
    .item-link { color: #4338ca; text-decoration: none; }
    .item-blurb { font-size: 16px; line-height: 1.6; color: #374151; margin: 0; display: block; }
    .item-author { font-size: 13px; color: #6b7280; text-transform: uppercase; letter-spacing: 0.05em; margin: 8px 0 0 0; font-weight: 500; }
    .divider { border: 0; border-top: 1px solid #e5e7eb; margin: 0; }
    .footer { padding: 32px 40px; background: linear-gradient(135deg, #1e293b 0%, #334155 100%); text-align: center; color: #e2e8f0; }
    .footer-text { font-size: 14px; color: #cbd5e1; margin: 0 0 8px 0; line-height: 1.5; }
    .footer-link { color: #60a5fa; text-decoration: none; }

    @media only screen and (max-width: 600px) {
      body { padding: 10px !important; }
      .container { border-radius: 4px !important; }
      .header { padding: 24px 20px 20px 20px !important; }
      .header-title { font-size: 24px !important; }
      .header-month { font-size: 12px !important; }
      .section { padding: 24px 20px !important; }
      .section-title { font-size: 18px !important; }
      .intro-text { font-size: 15px !important; line-height: 1.6 !important; }
      .item { margin-bottom: 20px !important; padding: 12px !important; }
      .item-with-image { flex-direction: column !important; }
      .item-thumbnail { width: 100% !important; height: auto !important; max-height: 200px !important; }
      .item-title { font-size: 16px !important; }
      .item-blurb { font-size: 15px !important; }
      .item-author { font-size: 12px !important; }
      .footer { padding: 24px 20px !important; }
      .footer-text { font-size: 13px !important; }
    }

    @media only screen and (max-width: 400px) {
      .header-title { font-size: 22px !important; }
      .section-title { font-size: 16px !important; }
    }"#;

/// Produce the full HTML document for one recipient's copy of an issue.
///
/// Content fields are authored in the editor and substituted verbatim, so
/// inline markup in blurbs and intros survives. Empty sections are skipped
/// entirely and each section kind carries its own display rules for blurbs,
/// author lines and thumbnails.
pub fn render_newsletter_html(
    newsletter: &NewsletterEmail<'_>,
    recipient: &EmailRecipient<'_>,
    base_url: &str,
) -> String {
    let mut body = String::new();

    write!(
        body,
        r#"    <div class="header">
      <h1 class="header-title">{title}</h1>
      <p class="header-month">{month}</p>
    </div>
"#,
        title = newsletter.title,
        month = newsletter.month,
    )
    .unwrap();

    if let Some(hero) = non_empty(newsletter.hero_image_url) {
        write!(
            body,
            r#"    <img src="{hero}" alt="Newsletter hero" class="hero-image">
    <hr class="divider">
"#
        )
        .unwrap();
    }

    if let Some(intro) = non_empty(newsletter.intro_content) {
        write!(
            body,
            r#"    <div class="section">
      <p class="intro-text">{intro}</p>
    </div>
    <hr class="divider">
"#
        )
        .unwrap();
    }

    let rendered_sections: Vec<String> = newsletter
        .sections
        .iter()
        .filter(|section| !section.items.is_empty())
        .map(|section| render_section(section, base_url))
        .collect();
    body.push_str(&rendered_sections.join("    <hr class=\"divider\">\n"));

    if let Some(signoff) = non_empty(newsletter.signoff_content) {
        write!(
            body,
            r#"    <hr class="divider">
    <div class="section">
      <p class="intro-text">{signoff}</p>
    </div>
"#
        )
        .unwrap();
    }

    let unsubscribe_url = format!(
        "{base_url}/v1/subscribers/unsubscribe?id={id}&token={token}",
        id = recipient.subscriber_id,
        token = recipient.unsubscribe_token,
    );
    write!(
        body,
        r#"    <div class="footer">
      <p class="footer-text">You're receiving this because you subscribed to {BRAND_NAME}.</p>
      <p class="footer-text" style="margin-top: 12px; font-size: 12px; opacity: 0.8;">
        <a href="{unsubscribe_url}" class="footer-link" style="color: #94a3b8;">Unsubscribe</a>
      </p>
    </div>
"#
    )
    .unwrap();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>
{NEWSLETTER_STYLES}
  </style>
</head>
<body>
  <div class="container">
{body}  </div>
</body>
</html>"#
    )
}

fn render_section(section: &Section, base_url: &str) -> String {
    let kind = section.name;
    let mut out = String::new();

    write!(
        out,
        r#"    <div class="section">
      <div class="section-header">
        <h2 class="section-title">{}</h2>
      </div>
"#,
        kind.as_str(),
    )
    .unwrap();

    for item in &section.items {
        let thumbnail = if kind.shows_thumbnails() {
            non_empty(item.image_url.as_deref())
        } else {
            None
        };

        match thumbnail {
            Some(image_url) => write!(
                out,
                r#"      <div class="item item-with-image">
        <img src="{image_url}" alt="{title}" class="item-thumbnail">
        <div class="item-content">
"#,
                title = item.title,
            )
            .unwrap(),
            None => out.push_str(
                r#"      <div class="item">
        <div class="item-content">
"#,
            ),
        }

        write!(
            out,
            r#"          <h3 class="item-title">
            <a href="{url}" class="item-link">{title}</a>
          </h3>
"#,
            url = item.url,
            title = item.title,
        )
        .unwrap();

        if kind.has_blurb() {
            if let Some(blurb) = non_empty(item.blurb.as_deref()) {
                writeln!(out, r#"          <p class="item-blurb">{blurb}</p>"#).unwrap();
            }
        }
        if kind.shows_author() {
            if let Some(author) = non_empty(item.author.as_deref()) {
                writeln!(out, r#"          <p class="item-author">{author}</p>"#).unwrap();
            }
        }

        out.push_str("        </div>\n      </div>\n");
    }

    if kind.has_archive_link() {
        write!(
            out,
            r#"      <div style="margin-top: 24px; text-align: center;">
        <a href="{base_url}/archive" style="display: inline-block; padding: 12px 24px; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #ffffff; text-decoration: none; border-radius: 6px; font-weight: 600; font-size: 14px;">
          More Content &rarr;
        </a>
      </div>
"#
        )
        .unwrap();
    }

    out.push_str("    </div>\n");
    out
}

/// The double-opt-in email sent on every subscribe request.
pub fn render_confirmation_email_html(name: &str, confirmation_link: &str) -> String {
    let year = Utc::now().year();
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>
    body {{ margin: 0; padding: 20px; background-color: #f3f4f6; font-family: Inter, Arial, sans-serif; }}
    .container {{ max-width: 600px; margin: 0 auto; background-color: #ffffff; border-radius: 8px; overflow: hidden; box-shadow: 0 20px 40px rgba(0,0,0,0.15); }}
    .header {{ padding: 32px 32px 24px 32px; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #ffffff; text-align: center; }}
    .header-title {{ font-family: 'Fira Code', monospace; font-size: 24px; font-weight: 700; color: #ffffff; margin: 0; text-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
    .content {{ padding: 32px 32px; }}
    .greeting {{ font-size: 16px; line-height: 1.6; color: #111827; margin: 0 0 16px 0; }}
    .message {{ font-size: 16px; line-height: 1.6; color: #374151; margin: 0 0 24px 0; }}
    .button-container {{ text-align: center; margin: 32px 0; }}
    .confirm-button {{ display: inline-block; padding: 14px 32px; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #ffffff; text-decoration: none; border-radius: 6px; font-weight: 600; font-size: 16px; box-shadow: 0 4px 12px rgba(102, 126, 234, 0.3); }}
    .footer-note {{ font-size: 14px; color: #6b7280; margin: 24px 0 0 0; line-height: 1.5; }}
    .footer {{ padding: 24px 32px; background: #f8fafc; text-align: center; border-top: 1px solid #e5e7eb; }}
    .footer-text {{ font-size: 13px; color: #6b7280; margin: 0; }}

    @media only screen and (max-width: 600px) {{
      body {{ padding: 10px !important; }}
      .header {{ padding: 24px 20px 20px 20px !important; }}
      .header-title {{ font-size: 20px !important; }}
      .content {{ padding: 24px 20px !important; }}
      .greeting, .message {{ font-size: 15px !important; }}
      .confirm-button {{ padding: 12px 24px !important; font-size: 15px !important; }}
      .footer {{ padding: 20px !important; }}
    }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1 class="header-title">{BRAND_NAME}</h1>
    </div>

    <div class="content">
      <p class="greeting">Hi {name},</p>
      <p class="message">Thanks for subscribing to the {BRAND_NAME} newsletter. Click the button below to confirm your subscription:</p>

      <div class="button-container">
        <a href="{confirmation_link}" class="confirm-button">Confirm Subscription</a>
      </div>

      <p class="footer-note">This link expires in 24 hours. If you didn't subscribe, you can safely ignore this email.</p>
    </div>

    <div class="footer">
      <p class="footer-text">{BRAND_NAME} &copy; {year}</p>
    </div>
  </div>
</body>
</html>"#
    )
}

struct StatusPage {
    title: &'static str,
    icon: &'static str,
    heading: &'static str,
    gradient_heading: bool,
    paragraphs: &'static [&'static str],
}

/// Minimal standalone page for links opened from an email client.
fn render_status_page(page: StatusPage) -> String {
    let heading_class = if page.gradient_heading {
        r#" class="gradient-text""#
    } else {
        ""
    };

    let mut paragraphs = String::new();
    for (index, text) in page.paragraphs.iter().enumerate() {
        if index == 0 {
            writeln!(paragraphs, "    <p>{text}</p>").unwrap();
        } else {
            writeln!(
                paragraphs,
                r#"    <p style="margin-top: 16px; color: #6b7280;">{text}</p>"#
            )
            .unwrap();
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
    body {{ margin: 0; padding: 20px; background-color: #f3f4f6; font-family: Inter, Arial, sans-serif; display: flex; align-items: center; justify-content: center; min-height: 100vh; }}
    .container {{ max-width: 500px; background-color: #ffffff; border-radius: 8px; padding: 40px; box-shadow: 0 20px 40px rgba(0,0,0,0.15); text-align: center; }}
    .icon {{ font-size: 48px; margin-bottom: 16px; }}
    h1 {{ font-family: 'Fira Code', monospace; font-size: 24px; color: #111827; margin: 0 0 16px 0; }}
    p {{ font-size: 16px; line-height: 1.6; color: #374151; margin: 0; }}
    .gradient-text {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); -webkit-background-clip: text; -webkit-text-fill-color: transparent; background-clip: text; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="icon">{icon}</div>
    <h1{heading_class}>{heading}</h1>
{paragraphs}  </div>
</body>
</html>"#,
        title = page.title,
        icon = page.icon,
        heading = page.heading,
    )
}

pub fn confirmation_failed_page() -> String {
    render_status_page(StatusPage {
        title: "Confirmation Failed",
        icon: "\u{26A0}\u{FE0F}",
        heading: "Confirmation Failed",
        gradient_heading: false,
        paragraphs: &[
            "This confirmation link is invalid or has expired.",
            "Please subscribe again to receive a fresh link.",
        ],
    })
}

pub fn subscription_confirmed_page() -> String {
    render_status_page(StatusPage {
        title: "Subscription Confirmed",
        icon: "\u{2705}",
        heading: "Thanks for confirming!",
        gradient_heading: true,
        paragraphs: &[
            "You're now subscribed to the Letterforge newsletter.",
            "You'll receive the next edition in your inbox.",
        ],
    })
}

pub fn invalid_unsubscribe_link_page() -> String {
    render_status_page(StatusPage {
        title: "Invalid Unsubscribe Link",
        icon: "\u{26A0}\u{FE0F}",
        heading: "Invalid Link",
        gradient_heading: false,
        paragraphs: &["This unsubscribe link is invalid or incomplete."],
    })
}

pub fn unknown_subscriber_page() -> String {
    render_status_page(StatusPage {
        title: "Subscriber Not Found",
        icon: "\u{2753}",
        heading: "Already Unsubscribed",
        gradient_heading: false,
        paragraphs: &["You've already been unsubscribed or this email was never subscribed."],
    })
}

pub fn invalid_unsubscribe_token_page() -> String {
    render_status_page(StatusPage {
        title: "Invalid Token",
        icon: "\u{1F512}",
        heading: "Invalid Token",
        gradient_heading: false,
        paragraphs: &["This unsubscribe link is invalid or has been tampered with."],
    })
}

pub fn unsubscribed_page() -> String {
    render_status_page(StatusPage {
        title: "Unsubscribed Successfully",
        icon: "\u{1F44B}",
        heading: "Successfully Unsubscribed",
        gradient_heading: false,
        paragraphs: &[
            "You've been unsubscribed from the Letterforge newsletter.",
            "Sorry to see you go! You won't receive any more emails from us.",
        ],
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}
