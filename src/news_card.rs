use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use gtk::prelude::*;
use gtk::{Label, Orientation};

use crate::data::NewsArticle;

/// Display-ready fields of one article.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsCardModel {
    pub title: String,
    pub description: Option<String>,
    pub source: String,
    pub date: String,
    pub link: Option<String>,
    pub sentiment: Option<Sentiment>,
}

impl From<&NewsArticle> for NewsCardModel {
    fn from(article: &NewsArticle) -> Self {
        Self {
            title: article.title.clone(),
            description: non_blank(article.description.as_deref()),
            source: article.source.clone(),
            date: humanize_date(&article.published_date, Utc::now()),
            link: non_blank(article.link.as_deref()),
            sentiment: article.sentiment_score.and_then(Sentiment::from_score),
        }
    }
}

fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Badge shown for a scored article. Scores within 0.1 of zero are neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn from_score(score: f64) -> Option<Sentiment> {
        if !score.is_finite() {
            return None;
        }
        Some(if score > 0.1 {
            Sentiment::Positive
        } else if score < -0.1 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Sentiment::Positive => "sentiment-positive",
            Sentiment::Neutral => "sentiment-neutral",
            Sentiment::Negative => "sentiment-negative",
        }
    }
}

fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Relative age of an article, or the raw text when it is not a known format.
pub fn humanize_date(raw: &str, now: DateTime<Utc>) -> String {
    let Some(published) = parse_published(raw.trim()) else {
        return raw.to_string();
    };
    let age = now.signed_duration_since(published);

    if age.num_days() > 0 {
        plural(age.num_days(), "day")
    } else if age.num_hours() > 0 {
        plural(age.num_hours(), "hour")
    } else if age.num_minutes() > 0 {
        plural(age.num_minutes(), "minute")
    } else {
        "Just now".to_string()
    }
}

/// Builds the clickable card for one article.
pub fn create_news_card(card: &NewsCardModel) -> gtk::Box {
    let row = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(4)
        .margin_top(4)
        .margin_bottom(4)
        .margin_start(6)
        .margin_end(6)
        .build();
    row.add_css_class("news-card");

    let title_label = Label::builder()
        .label(&card.title)
        .wrap(true)
        .wrap_mode(gtk::pango::WrapMode::WordChar)
        .xalign(0.0)
        .lines(3)
        .ellipsize(gtk::pango::EllipsizeMode::End)
        .build();
    title_label.add_css_class("news-title");
    row.append(&title_label);

    if let Some(description) = &card.description {
        let description_label = Label::builder()
            .label(description)
            .wrap(true)
            .wrap_mode(gtk::pango::WrapMode::WordChar)
            .xalign(0.0)
            .lines(2)
            .ellipsize(gtk::pango::EllipsizeMode::End)
            .build();
        description_label.add_css_class("news-description");
        row.append(&description_label);
    }

    let metadata_box = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(6)
        .build();

    if !card.source.is_empty() {
        let source_label = Label::builder()
            .label(&card.source)
            .xalign(0.0)
            .ellipsize(gtk::pango::EllipsizeMode::End)
            .hexpand(true)
            .build();
        source_label.add_css_class("news-meta");
        metadata_box.append(&source_label);
    }

    if let Some(sentiment) = card.sentiment {
        let badge = Label::new(Some(sentiment.label()));
        badge.add_css_class("sentiment-badge");
        badge.add_css_class(sentiment.css_class());
        metadata_box.append(&badge);
    }

    if !card.date.is_empty() {
        let date_label = Label::builder()
            .label(&card.date)
            .xalign(1.0)
            .build();
        date_label.add_css_class("news-date");
        metadata_box.append(&date_label);
    }

    row.append(&metadata_box);

    if let Some(url) = card.link.clone() {
        row.set_tooltip_text(Some(url.as_str()));
        let gesture = gtk::GestureClick::new();
        gesture.connect_released(move |_, _, _, _| {
            if let Err(e) = open::that(&url) {
                log::error!("Failed to open URL {}: {}", url, e);
            }
        });
        row.add_controller(gesture);
        row.add_css_class("activatable");
    }

    row
}
