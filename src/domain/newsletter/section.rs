use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The five fixed section kinds a newsletter is assembled from.
///
/// The wire and storage representation is the exact display string, so
/// stored issues round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    #[serde(rename = "Blogs & Projects")]
    BlogsAndProjects,
    #[serde(rename = "Links I like")]
    LinksILike,
    #[serde(rename = "Technology was a mistake")]
    TechnologyWasAMistake,
    #[serde(rename = "Technical & Developer Marketing Jobs")]
    MarketingJobs,
    #[serde(rename = "Folks to follow")]
    FolksToFollow,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::BlogsAndProjects,
        SectionKind::LinksILike,
        SectionKind::TechnologyWasAMistake,
        SectionKind::MarketingJobs,
        SectionKind::FolksToFollow,
    ];

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "Blogs & Projects" => Ok(SectionKind::BlogsAndProjects),
            "Links I like" => Ok(SectionKind::LinksILike),
            "Technology was a mistake" => Ok(SectionKind::TechnologyWasAMistake),
            "Technical & Developer Marketing Jobs" => Ok(SectionKind::MarketingJobs),
            "Folks to follow" => Ok(SectionKind::FolksToFollow),
            other => Err(format!("'{other}' is not a known section name.")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::BlogsAndProjects => "Blogs & Projects",
            SectionKind::LinksILike => "Links I like",
            SectionKind::TechnologyWasAMistake => "Technology was a mistake",
            SectionKind::MarketingJobs => "Technical & Developer Marketing Jobs",
            SectionKind::FolksToFollow => "Folks to follow",
        }
    }

    /// Whether items in this section carry a one-line blurb.
    pub fn has_blurb(&self) -> bool {
        matches!(
            self,
            SectionKind::BlogsAndProjects | SectionKind::LinksILike
        )
    }

    /// Whether the rendered item shows an author line.
    pub fn shows_author(&self) -> bool {
        self.has_blurb() || matches!(self, SectionKind::TechnologyWasAMistake)
    }

    /// Only "Blogs & Projects" renders item thumbnails.
    pub fn shows_thumbnails(&self) -> bool {
        matches!(self, SectionKind::BlogsAndProjects)
    }

    /// "Links I like" gets a call-to-action to the link archive after its items.
    pub fn has_archive_link(&self) -> bool {
        matches!(self, SectionKind::LinksILike)
    }
}

impl Display for SectionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single curated entry within a section.
///
/// `url` doubles as the identity of the item within its section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blurb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// An ordered run of items under one of the fixed section kinds.
///
/// Section order within a newsletter and item order within a section are
/// both display order and are preserved through storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: SectionKind,
    pub items: Vec<Item>,
}

impl Section {
    pub fn new(name: SectionKind) -> Self {
        Self {
            name,
            items: Vec::new(),
        }
    }

    /// Add an item, replacing in place any existing item with the same url.
    ///
    /// Replacement keeps the original position so re-scraping a link does
    /// not shuffle the section.
    pub fn upsert_item(&mut self, item: Item) {
        match self.items.iter().position(|i| i.url == item.url) {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
    }
}
