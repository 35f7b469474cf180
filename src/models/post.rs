use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single search hit. Identified by its URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Canonical URL of the post.
    url: String,

    /// Title including the category path, e.g. `日報/2020/10/01/achiku`.
    full_name: String,

    /// Creation time, in the offset the service reported.
    created_at: DateTime<FixedOffset>,

    /// Last update time.
    updated_at: DateTime<FixedOffset>,

    /// See [`Author`]
    created_by: Author,
}

impl Post {
    /// Returns the canonical URL of the post.
    pub fn url(&self) -> &str {
        &self.url
    }
    /// Returns the title including its category path.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
    /// Returns when the post was created.
    pub fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }
    /// Returns when the post was last updated.
    pub fn updated_at(&self) -> DateTime<FixedOffset> {
        self.updated_at
    }
    /// Returns the member who created the post.
    pub fn created_by(&self) -> &Author {
        &self.created_by
    }

    /// Renders the post as a markdown list item:
    /// `- [<title>](<url>) <YYYY/MM/DD HH:MM>`.
    pub fn to_markdown(&self) -> String {
        format!(
            "- [{}]({}) {}",
            self.full_name,
            self.url,
            self.created_at.format("%Y/%m/%d %H:%M")
        )
    }
}

/// The member who wrote a [`Post`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Handle used in `user:` searches.
    screen_name: String,
    /// Display name.
    name: String,
}

impl Author {
    /// Returns the handle used in `user:` searches.
    pub fn screen_name(&self) -> &str {
        &self.screen_name
    }
    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
