mod newsletter_title;
mod project_name;
mod section;
mod status;
mod types;

pub use newsletter_title::NewsletterTitle;
pub use project_name::ProjectName;
pub use section::{Item, Section, SectionKind};
pub use status::{NewsletterStatus, StatusAction};
pub use types::*;

/// Validated content of a newsletter, as accepted by the create and update
/// endpoints. Lifecycle state is not part of the draft.
#[derive(Debug)]
pub struct NewsletterDraft {
    pub project_name: ProjectName,
    pub title: NewsletterTitle,
    pub month: Option<String>,
    pub hero_image_url: Option<String>,
    pub intro_prompt: Option<String>,
    pub intro_content: Option<String>,
    pub sections: Vec<Section>,
    pub signoff_prompt: Option<String>,
    pub signoff_content: Option<String>,
}

impl NewsletterDraft {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        project_name: String,
        title: String,
        month: Option<String>,
        hero_image_url: Option<String>,
        intro_prompt: Option<String>,
        intro_content: Option<String>,
        sections: Vec<Section>,
        signoff_prompt: Option<String>,
        signoff_content: Option<String>,
    ) -> Result<Self, String> {
        Ok(Self {
            project_name: ProjectName::parse(project_name)?,
            title: NewsletterTitle::parse(title)?,
            month,
            hero_image_url,
            intro_prompt,
            intro_content,
            sections,
            signoff_prompt,
            signoff_content,
        })
    }
}
