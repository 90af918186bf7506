use chrono::{DateTime, Utc};

/// One headline as shown in the Articles tab. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleSummary {
    /// `None` when the API sent a null title.
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub url: Option<String>,
    pub source_name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}
