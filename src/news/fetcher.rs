use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::ArticleSummary;

/// Title the news API substitutes for retracted articles.
pub const REMOVED_TITLE: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<Option<ApiArticle>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    source: Option<ApiSource>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: Option<String>,
}

pub struct HeadlineFetcher {
    client: Client,
    endpoint: Url,
    country: String,
    category: String,
    api_key: String,
}

impl HeadlineFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("asclepius/1.0")
            .build()?;

        let base = config.news_api_base.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{}/top-headlines", base))
            .map_err(|e| AppError::Config(format!("invalid news_api_base {:?}: {}", base, e)))?;

        Ok(Self {
            client,
            endpoint,
            country: config.news_country.clone(),
            category: config.news_category.clone(),
            api_key: config.news_api_key.clone(),
        })
    }

    pub async fn fetch_headlines(&self) -> Result<Vec<ArticleSummary>> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("country", self.country.as_str()),
                ("category", self.category.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "Failed to fetch headlines: HTTP {}",
                response.status()
            )));
        }

        let body: HeadlinesResponse = response.json().await?;
        let articles = visible_articles(body.articles);
        tracing::debug!("Fetched {} headlines", articles.len());
        Ok(articles)
    }

    /// Like [`fetch_headlines`](Self::fetch_headlines), but any failure yields
    /// an empty list.
    pub async fn fetch_or_empty(&self) -> Vec<ArticleSummary> {
        match self.fetch_headlines().await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!("Headline fetch failed: {}", e);
                Vec::new()
            }
        }
    }
}

fn visible_articles(articles: Vec<Option<ApiArticle>>) -> Vec<ArticleSummary> {
    articles
        .into_iter()
        .flatten()
        .filter(|article| article.title.as_deref() != Some(REMOVED_TITLE))
        .map(|article| ArticleSummary {
            title: article.title,
            description: article.description,
            image_url: article.url_to_image,
            url: article.url,
            source_name: article.source.and_then(|s| s.name),
            published_at: article
                .published_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        })
        .collect()
}
