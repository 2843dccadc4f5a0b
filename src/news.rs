use crate::data::{NewsArticle, NewsResponse};
use crate::error::NewsError;

/// Fetches article lists from the news endpoint, one country at a time.
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: reqwest::Client,
    endpoint: String,
    limit: u32,
}

impl NewsClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, limit: u32) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            limit,
        }
    }

    pub fn request_url(&self, code: &str) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}country={}&limit={}",
            self.endpoint,
            separator,
            urlencoding::encode(code),
            self.limit
        )
    }

    pub async fn fetch(&self, code: &str) -> Result<Vec<NewsArticle>, NewsError> {
        let url = self.request_url(code);
        log::info!("Fetching news from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(NewsError::Status(response.status()));
        }
        let text = response.text().await?;
        parse_news(&text)
    }
}

/// Accepts a bare JSON array or an object with an `articles` field.
pub fn parse_news(text: &str) -> Result<Vec<NewsArticle>, NewsError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Vec<NewsArticle>>(trimmed) {
        Ok(articles) => Ok(articles),
        Err(e) => match serde_json::from_str::<NewsResponse>(trimmed) {
            Ok(data) => Ok(data.articles),
            Err(_) => {
                log::debug!(
                    "News response preview: {}",
                    trimmed.chars().take(200).collect::<String>()
                );
                Err(NewsError::Decode(e))
            }
        },
    }
}
