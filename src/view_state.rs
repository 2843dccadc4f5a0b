use std::rc::Rc;

use crate::boundaries::BoundaryFeature;
use crate::camera::{self, CameraOverrides, PointOfView};
use crate::country_codes::news_code;
use crate::data::NewsArticle;
use crate::error::NewsError;

/// Identifies one news request; only the latest ticket may fill the panel.
pub type Ticket = u64;

/// What the info panel is showing. Every non-idle state names its country.
#[derive(Debug, Clone, PartialEq)]
pub enum NewsPanel {
    Idle,
    Loading { country: usize, ticket: Ticket },
    Loaded { country: usize, articles: Vec<NewsArticle> },
    Empty { country: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewsRequest {
    pub ticket: Ticket,
    pub code: &'static str,
}

/// Result of selecting a country: where to fly and what to fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub camera: PointOfView,
    pub request: Option<NewsRequest>,
}

/// All globe UI state: boundaries, hover, selection and the news panel.
#[derive(Debug)]
pub struct ViewState {
    features: Rc<[BoundaryFeature]>,
    overrides: CameraOverrides,
    active: Option<usize>,
    hovered: Option<usize>,
    panel: NewsPanel,
    last_ticket: Ticket,
    auto_rotate: bool,
    ready: bool,
}

impl ViewState {
    pub fn new(overrides: CameraOverrides, auto_rotate: bool) -> Self {
        Self {
            features: Rc::from(Vec::new()),
            overrides,
            active: None,
            hovered: None,
            panel: NewsPanel::Idle,
            last_ticket: 0,
            auto_rotate,
            ready: false,
        }
    }

    /// Boundaries are loaded once; replacing them resets selection and hover.
    pub fn set_features(&mut self, features: Vec<BoundaryFeature>) {
        self.features = Rc::from(features);
        self.active = None;
        self.hovered = None;
        self.panel = NewsPanel::Idle;
    }

    pub fn features(&self) -> Rc<[BoundaryFeature]> {
        Rc::clone(&self.features)
    }

    pub fn feature(&self, index: usize) -> Option<&BoundaryFeature> {
        self.features.get(index)
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn panel(&self) -> &NewsPanel {
        &self.panel
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.panel, NewsPanel::Loading { .. })
    }

    /// Rotation runs only while nothing is selected.
    pub fn should_auto_rotate(&self) -> bool {
        self.ready && self.auto_rotate && self.active.is_none()
    }

    /// Returns `true` when the hovered feature changed.
    pub fn hover(&mut self, index: Option<usize>) -> bool {
        let index = index.filter(|&i| i < self.features.len());
        if self.hovered == index {
            return false;
        }
        self.hovered = index;
        true
    }

    /// Makes `index` the active country, replacing any previous one.
    pub fn select(&mut self, index: usize) -> Option<Selection> {
        let feature = self.features.get(index)?;
        let camera = camera::point_of_view(feature, &self.overrides);
        let code = feature.id.and_then(news_code);
        log::info!(
            "Selected {} (news code {})",
            feature.name,
            code.unwrap_or("none")
        );

        self.active = Some(index);
        let request = match code {
            Some(code) => {
                self.last_ticket += 1;
                self.panel = NewsPanel::Loading {
                    country: index,
                    ticket: self.last_ticket,
                };
                Some(NewsRequest {
                    ticket: self.last_ticket,
                    code,
                })
            }
            None => {
                self.panel = NewsPanel::Empty { country: index };
                None
            }
        };
        Some(Selection { camera, request })
    }

    /// Clears the selection. Returns `false` if nothing was selected.
    pub fn dismiss(&mut self) -> bool {
        if self.active.is_none() {
            return false;
        }
        self.active = None;
        self.panel = NewsPanel::Idle;
        true
    }

    /// Settles the request with `ticket`. Responses for anything but the
    /// in-flight request are dropped and `false` is returned.
    pub fn apply_news(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<NewsArticle>, NewsError>,
    ) -> bool {
        let country = match self.panel {
            NewsPanel::Loading { country, ticket: current } if current == ticket => country,
            _ => {
                log::debug!("Discarding stale news response #{}", ticket);
                return false;
            }
        };

        self.panel = match result {
            Ok(articles) if !articles.is_empty() => NewsPanel::Loaded { country, articles },
            Ok(_) => NewsPanel::Empty { country },
            Err(e) => {
                log::warn!("Error fetching news: {}", e);
                NewsPanel::Empty { country }
            }
        };
        true
    }

    /// `(name, index)` pairs ordered by name, for the country picker.
    pub fn country_names(&self) -> Vec<(String, usize)> {
        let mut names: Vec<(String, usize)> = self
            .features
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.name.is_empty())
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: Option<u16>, name: &str, lng: f64) -> BoundaryFeature {
        BoundaryFeature {
            id,
            name: name.to_string(),
            polygons: vec![vec![vec![
                (lng, 0.0),
                (lng + 5.0, 0.0),
                (lng + 5.0, 5.0),
                (lng, 5.0),
                (lng, 0.0),
            ]]],
        }
    }

    fn state() -> ViewState {
        let mut state = ViewState::new(CameraOverrides::empty(), true);
        state.set_features(vec![
            square(Some(250), "France", 0.0),
            square(Some(276), "Germany", 10.0),
            square(Some(304), "Greenland", 20.0),
            square(None, "Somaliland", 30.0),
        ]);
        state.mark_ready();
        state
    }

    fn article(title: &str) -> NewsArticle {
        NewsArticle {
            title: title.to_string(),
            description: None,
            source: "Wire".to_string(),
            published_date: String::new(),
            link: Some(format!("https://news.example/{}", title)),
            sentiment_score: None,
        }
    }

    #[test]
    fn unmapped_countries_go_straight_to_empty() {
        let mut state = state();
        for index in [2, 3] {
            let selection = state.select(index).unwrap();
            assert_eq!(selection.request, None);
            assert_eq!(state.panel(), &NewsPanel::Empty { country: index });
            assert!(!state.is_loading());
        }
    }

    #[test]
    fn loading_until_the_response_settles() {
        let mut state = state();
        let request = state.select(0).unwrap().request.unwrap();
        assert_eq!(request.code, "fr");
        assert!(state.is_loading());

        assert!(state.apply_news(request.ticket, Ok(vec![article("a"), article("b")])));
        assert!(!state.is_loading());
        match state.panel() {
            NewsPanel::Loaded { country, articles } => {
                assert_eq!(*country, 0);
                assert_eq!(articles.len(), 2);
            }
            other => panic!("unexpected panel {:?}", other),
        }
    }

    #[test]
    fn errors_settle_to_empty() {
        let mut state = state();
        let request = state.select(1).unwrap().request.unwrap();
        let error = serde_json::from_str::<Vec<NewsArticle>>("x").unwrap_err();
        assert!(state.apply_news(request.ticket, Err(NewsError::Decode(error))));
        assert_eq!(state.panel(), &NewsPanel::Empty { country: 1 });
    }

    #[test]
    fn selecting_replaces_the_active_country() {
        let mut state = state();
        state.select(0);
        state.select(1);
        assert_eq!(state.active(), Some(1));
        assert!(matches!(state.panel(), NewsPanel::Loading { country: 1, .. }));
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut state = state();
        let first = state.select(0).unwrap().request.unwrap();
        let second = state.select(1).unwrap().request.unwrap();
        assert_ne!(first.ticket, second.ticket);

        assert!(!state.apply_news(first.ticket, Ok(vec![article("old")])));
        assert!(state.is_loading());

        assert!(state.apply_news(second.ticket, Ok(vec![article("new")])));
        match state.panel() {
            NewsPanel::Loaded { country, articles } => {
                assert_eq!(*country, 1);
                assert_eq!(articles[0].title, "new");
            }
            other => panic!("unexpected panel {:?}", other),
        }

        // a duplicate delivery after settling is ignored too
        assert!(!state.apply_news(second.ticket, Ok(vec![])));
    }

    #[test]
    fn responses_after_dismiss_are_discarded() {
        let mut state = state();
        let request = state.select(0).unwrap().request.unwrap();
        assert!(state.dismiss());
        assert!(!state.apply_news(request.ticket, Ok(vec![article("late")])));
        assert_eq!(state.panel(), &NewsPanel::Idle);
        assert!(!state.dismiss());
    }

    #[test]
    fn auto_rotation_pauses_while_selected() {
        let mut state = state();
        assert!(state.should_auto_rotate());
        state.select(0);
        assert!(!state.should_auto_rotate());
        state.dismiss();
        assert!(state.should_auto_rotate());

        let idle = ViewState::new(CameraOverrides::empty(), false);
        assert!(!idle.should_auto_rotate());
    }

    #[test]
    fn hover_is_independent_of_selection() {
        let mut state = state();
        state.select(0);
        assert!(state.hover(Some(1)));
        assert!(!state.hover(Some(1)));
        assert_eq!(state.active(), Some(0));
        assert!(state.hover(None));
        assert_eq!(state.hovered(), None);
        assert!(!state.hover(Some(99)));
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let mut state = state();
        assert!(state.select(42).is_none());
        assert_eq!(state.active(), None);
    }

    #[test]
    fn country_names_are_sorted() {
        let names: Vec<String> = state().country_names().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["France", "Germany", "Greenland", "Somaliland"]);
    }
}
