use serde::{Deserialize, Deserializer};

pub const APP_ID: &str = "com.toasterrepair.Newsglobe";
pub const DEFAULT_NEWS_ENDPOINT: &str = "http://localhost:8000/api/news/country/";
pub const DEFAULT_NEWS_LIMIT: u32 = 10;
pub const DEFAULT_BOUNDARIES_URL: &str =
    "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NewsArticle {
    #[serde(default, deserialize_with = "nullable_text")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "source_label")]
    pub source: String,
    #[serde(default, alias = "publishedAt", deserialize_with = "nullable_text")]
    pub published_date: String,
    /// Articles without a link are still listed, just not clickable.
    #[serde(default, alias = "url")]
    pub link: Option<String>,
    /// Polarity in `-1.0..=1.0` when the backend has scored the article.
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub articles: Vec<NewsArticle>,
}

/// Null reads as an empty string.
fn nullable_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `"source": "BBC"` as well as `"source": { "name": "BBC" }`.
fn source_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Source {
        Label(String),
        Named {
            #[serde(default)]
            name: Option<String>,
        },
        Missing(()),
    }

    Ok(match Source::deserialize(deserializer)? {
        Source::Label(label) => label,
        Source::Named { name } => name.unwrap_or_default(),
        Source::Missing(()) => String::new(),
    })
}
