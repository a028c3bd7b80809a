use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Lifecycle state of a newsletter.
///
/// The state only ever moves through the transitions listed in
/// [`NewsletterStatus::apply`]; content edits never touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsletterStatus {
    Draft,
    Approved,
    Scheduled,
    Sent,
}

/// An action a caller can take against a newsletter's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Approve,
    Schedule,
    Unschedule,
    MarkSent,
}

impl NewsletterStatus {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "draft" => Ok(NewsletterStatus::Draft),
            "approved" => Ok(NewsletterStatus::Approved),
            "scheduled" => Ok(NewsletterStatus::Scheduled),
            "sent" => Ok(NewsletterStatus::Sent),
            other => Err(format!("'{other}' is not a valid newsletter status.")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsletterStatus::Draft => "draft",
            NewsletterStatus::Approved => "approved",
            NewsletterStatus::Scheduled => "scheduled",
            NewsletterStatus::Sent => "sent",
        }
    }

    /// Total transition table for the lifecycle state machine.
    ///
    /// Every (state, action) pair is decided here; pairs that return `Err`
    /// must surface to the caller as a conflict, leaving the row untouched.
    /// Approving an approved newsletter and re-scheduling a scheduled one
    /// are deliberate no-op/refresh transitions. `MarkSent` is reachable
    /// exactly once per newsletter: `Sent` accepts no further actions.
    pub fn apply(self, action: StatusAction) -> Result<NewsletterStatus, String> {
        use NewsletterStatus::*;
        use StatusAction::*;

        match (self, action) {
            (Draft, Approve) => Ok(Approved),
            (Approved, Approve) => Ok(Approved),
            (Scheduled, Approve) => Err("a scheduled newsletter cannot be re-approved; unschedule it first".into()),
            (Sent, Approve) => Err("a sent newsletter cannot be approved".into()),

            (Draft, Schedule) => Err("a draft newsletter cannot be scheduled; approve it first".into()),
            (Approved, Schedule) => Ok(Scheduled),
            (Scheduled, Schedule) => Ok(Scheduled),
            (Sent, Schedule) => Err("a sent newsletter cannot be scheduled".into()),

            (Draft, Unschedule) => Err("a draft newsletter is not scheduled".into()),
            (Approved, Unschedule) => Err("an approved newsletter is not scheduled".into()),
            (Scheduled, Unschedule) => Ok(Approved),
            (Sent, Unschedule) => Err("a sent newsletter cannot be unscheduled".into()),

            (Draft, MarkSent) => Err("a draft newsletter cannot be sent; approve it first".into()),
            (Approved, MarkSent) => Ok(Sent),
            (Scheduled, MarkSent) => Ok(Sent),
            (Sent, MarkSent) => Err("this newsletter has already been sent".into()),
        }
    }
}

impl Display for NewsletterStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
