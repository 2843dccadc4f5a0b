use gtk::prelude::*;
use gtk::{glib, Label, ListBox, Orientation, ScrolledWindow};
use libshumate::prelude::LocationExt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::boundaries::{self, feature_at, BoundaryFeature};
use crate::camera::{
    rotate_longitude, zoom_for_altitude, PointOfView, ROTATION_STEP_DEG, ROTATION_TICK_MS,
    TRANSITION_MS,
};
use crate::config::Settings;
use crate::data::NewsArticle;
use crate::debounce::Debouncer;
use crate::error::{BoundaryError, NewsError};
use crate::news::NewsClient;
use crate::news_card::{create_news_card, NewsCardModel};
use crate::surface::{SurfaceConfig, Theme};
use crate::view_state::{NewsPanel, Ticket, ViewState};

type NewsDelivery = (Ticket, Result<Vec<NewsArticle>, NewsError>);

/// Handle to the globe: owns the widgets and the shared view state.
#[derive(Clone)]
pub struct GlobeControl {
    map: libshumate::SimpleMap,
    map_view: libshumate::Map,
    viewport: libshumate::Viewport,
    state: Rc<RefCell<ViewState>>,
    surface: Rc<Cell<SurfaceConfig>>,
    layers: Rc<RefCell<Vec<Vec<libshumate::PathLayer>>>>,
    picker: gtk::DropDown,
    picker_order: Rc<RefCell<Vec<usize>>>,
    panel: gtk::Box,
    panel_title: Label,
    results_list: ListBox,
    rotation_paused_until: Rc<Cell<Instant>>,
    atmosphere: gtk::CssProvider,
    news: NewsClient,
    news_sender: flume::Sender<NewsDelivery>,
}

impl GlobeControl {
    /// Fly-to for the given point of view; rotation waits for the animation.
    fn fly_to(&self, pov: PointOfView) {
        let zoom = zoom_for_altitude(
            pov.altitude,
            f64::from(self.viewport.min_zoom_level()),
            f64::from(self.viewport.max_zoom_level()),
        );
        self.map_view
            .go_to_full_with_duration(pov.lat, pov.lng, zoom, TRANSITION_MS);
        self.rotation_paused_until
            .set(Instant::now() + Duration::from_millis(u64::from(TRANSITION_MS)));
    }

    fn restyle(&self, index: usize) {
        let (hovered, active) = {
            let state = self.state.borrow();
            (state.hovered() == Some(index), state.active() == Some(index))
        };
        let style = self.surface.get().polygon_style(hovered, active);
        if let Some(layers) = self.layers.borrow().get(index) {
            let fill = gdk::RGBA::from(style.fill);
            let stroke = gdk::RGBA::from(style.stroke);
            for layer in layers {
                layer.set_fill_color(Some(&fill));
                layer.set_stroke_color(Some(&stroke));
                layer.set_stroke_width(style.stroke_width());
            }
        }
    }

    fn restyle_all(&self) {
        let count = self.layers.borrow().len();
        for index in 0..count {
            self.restyle(index);
        }
    }

    /// Hover callback, already debounced.
    fn on_hover(&self, index: Option<usize>) {
        let previous = self.state.borrow().hovered();
        if !self.state.borrow_mut().hover(index) {
            return;
        }
        for changed in [previous, index].into_iter().flatten() {
            self.restyle(changed);
        }

        let label = {
            let state = self.state.borrow();
            index
                .and_then(|i| state.feature(i))
                .map(|f| self.surface.get().label(f))
        };
        self.map.set_tooltip_text(label.as_deref());
    }

    /// Click callback: a country selects it, empty space dismisses.
    fn on_click(&self, index: Option<usize>) {
        match index {
            Some(index) => self.select(index),
            None => self.dismiss(),
        }
    }

    /// Ready callback, fired once the boundaries are on the map.
    fn on_ready(&self) {
        self.state.borrow_mut().mark_ready();
        self.fly_to(PointOfView::WORLD);
    }

    pub fn select(&self, index: usize) {
        let previous = self.state.borrow().active();
        let Some(selection) = self.state.borrow_mut().select(index) else {
            return;
        };

        for changed in [previous, Some(index)].into_iter().flatten() {
            self.restyle(changed);
        }
        self.sync_picker(Some(index));
        self.fly_to(selection.camera);
        self.render_panel();

        if let Some(request) = selection.request {
            let news = self.news.clone();
            let sender = self.news_sender.clone();
            tokio::spawn(async move {
                let result = news.fetch(request.code).await;
                if sender.send((request.ticket, result)).is_err() {
                    log::debug!("News receiver closed before delivery");
                }
            });
        }
    }

    pub fn dismiss(&self) {
        let previous = self.state.borrow().active();
        if !self.state.borrow_mut().dismiss() {
            return;
        }
        if let Some(previous) = previous {
            self.restyle(previous);
        }
        self.sync_picker(None);
        self.render_panel();
        self.fly_to(PointOfView::WORLD);
    }

    fn deliver_news(&self, ticket: Ticket, result: Result<Vec<NewsArticle>, NewsError>) {
        if self.state.borrow_mut().apply_news(ticket, result) {
            self.render_panel();
        }
    }

    pub fn set_theme(&self, theme: Theme) {
        let surface = SurfaceConfig::new(theme);
        if self.surface.get() == surface {
            return;
        }
        self.surface.set(surface);
        let source = libshumate::RasterRenderer::from_url(surface.tile_url());
        self.map.set_map_source(Some(&source));
        self.atmosphere.load_from_data(&surface.atmosphere_css());
        self.restyle_all();
    }

    fn sync_picker(&self, index: Option<usize>) {
        let position = index
            .and_then(|i| self.picker_order.borrow().iter().position(|&o| o == i))
            .map(|p| p as u32 + 1)
            .unwrap_or(0);
        if self.picker.selected() != position {
            self.picker.set_selected(position);
        }
    }

    fn render_panel(&self) {
        while let Some(child) = self.results_list.first_child() {
            self.results_list.remove(&child);
        }

        let state = self.state.borrow();
        let country = match state.panel() {
            NewsPanel::Idle => {
                self.panel.set_visible(false);
                return;
            }
            NewsPanel::Loading { country, .. }
            | NewsPanel::Loaded { country, .. }
            | NewsPanel::Empty { country } => *country,
        };
        let name = state
            .feature(country)
            .map(|f| f.name.clone())
            .unwrap_or_default();
        self.panel_title.set_label(&name);
        self.panel.set_visible(true);
        self.panel
            .update_state(&[gtk::accessible::State::Busy(state.is_loading())]);

        match state.panel() {
            NewsPanel::Loading { .. } => {
                let loading_row = gtk::Box::builder()
                    .orientation(Orientation::Horizontal)
                    .spacing(8)
                    .margin_top(12)
                    .margin_bottom(12)
                    .halign(gtk::Align::Center)
                    .build();
                let spinner = gtk::Spinner::builder().spinning(true).build();
                loading_row.append(&spinner);
                loading_row.append(&Label::new(Some("Loading...")));
                self.results_list.append(&loading_row);
            }
            NewsPanel::Empty { .. } => {
                let no_results = Label::builder()
                    .label("No news available")
                    .margin_top(12)
                    .margin_bottom(12)
                    .build();
                no_results.add_css_class("dim-label");
                self.results_list.append(&no_results);
            }
            NewsPanel::Loaded { articles, .. } => {
                for article in articles {
                    self.results_list
                        .append(&create_news_card(&NewsCardModel::from(article)));
                }
            }
            NewsPanel::Idle => {}
        }
    }

    /// Draws every boundary as filled path layers and fills the picker.
    fn install_features(&self, features: Vec<BoundaryFeature>) {
        self.state.borrow_mut().set_features(features);
        let features = self.state.borrow().features();

        let mut layers = self.layers.borrow_mut();
        for old in layers.drain(..).flatten() {
            self.map_view.remove_layer(&old);
        }
        for feature in features.iter() {
            let mut feature_layers = Vec::with_capacity(feature.polygons.len());
            for polygon in &feature.polygons {
                // holes are not drawn
                let Some(outer) = polygon.first() else { continue };
                let layer = libshumate::PathLayer::new(&self.viewport);
                layer.set_closed(true);
                layer.set_fill(true);
                for &(lng, lat) in outer {
                    layer.add_node(&libshumate::Coordinate::new_full(lat, lng));
                }
                self.map_view.add_layer(&layer);
                feature_layers.push(layer);
            }
            layers.push(feature_layers);
        }
        drop(layers);
        self.restyle_all();

        let names = self.state.borrow().country_names();
        let mut labels = vec!["Select a country..."];
        labels.extend(names.iter().map(|(name, _)| name.as_str()));
        self.picker
            .set_model(Some(&gtk::StringList::new(&labels)));
        *self.picker_order.borrow_mut() = names.into_iter().map(|(_, i)| i).collect();
        self.picker.set_selected(0);
    }

    /// The widget under the pointer, mapped to a feature index.
    fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        let (lat, lng) = self
            .viewport
            .widget_coords_to_location(&self.map_view, x, y);
        let features = self.state.borrow().features();
        feature_at(&features, lat, lng)
    }
}

/// Builds the globe view. `on_loaded` fires once with the outcome of the
/// boundary download.
pub fn create_globe_view(
    settings: &Settings,
    client: reqwest::Client,
    theme: Theme,
    on_loaded: impl Fn(Result<(), String>) + 'static,
) -> (gtk::Overlay, GlobeControl) {
    let surface = SurfaceConfig::new(theme);

    let map = libshumate::SimpleMap::new();
    let map_source = libshumate::RasterRenderer::from_url(surface.tile_url());
    map.set_map_source(Some(&map_source));
    map.set_vexpand(true);
    map.set_hexpand(true);
    map.add_css_class("globe-surface");

    let atmosphere = gtk::CssProvider::new();
    atmosphere.load_from_data(&surface.atmosphere_css());
    gtk::style_context_add_provider_for_display(
        &map.display(),
        &atmosphere,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );

    let map_view = map.map().unwrap_or_else(libshumate::Map::new);
    let viewport = map_view.viewport().unwrap_or_else(libshumate::Viewport::new);
    viewport.set_min_zoom_level(1);
    viewport.set_max_zoom_level(6);

    // Country picker, top left
    let picker = gtk::DropDown::from_strings(&["Loading countries..."]);
    picker.set_expression(Some(gtk::PropertyExpression::new(
        gtk::StringObject::static_type(),
        None::<gtk::Expression>,
        "string",
    )));
    picker.set_enable_search(true);
    picker.set_halign(gtk::Align::Start);
    picker.set_valign(gtk::Align::Start);
    picker.set_margin_top(20);
    picker.set_margin_start(20);
    picker.add_css_class("country-picker");

    // Info panel, top right
    let panel = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(8)
        .halign(gtk::Align::End)
        .valign(gtk::Align::Start)
        .margin_top(20)
        .margin_end(20)
        .width_request(320)
        .visible(false)
        .build();
    panel.add_css_class("info-panel");

    let header = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(8)
        .margin_top(10)
        .margin_start(12)
        .margin_end(6)
        .build();
    let panel_title = Label::builder()
        .xalign(0.0)
        .hexpand(true)
        .wrap(true)
        .build();
    panel_title.add_css_class("title-3");
    let close_button = gtk::Button::builder()
        .icon_name("window-close-symbolic")
        .tooltip_text("Clear selection")
        .build();
    close_button.add_css_class("flat");
    header.append(&panel_title);
    header.append(&close_button);
    panel.append(&header);

    let results_list = ListBox::builder()
        .selection_mode(gtk::SelectionMode::None)
        .build();
    results_list.add_css_class("boxed-list");
    let scrolled_window = ScrolledWindow::builder()
        .hscrollbar_policy(gtk::PolicyType::Never)
        .propagate_natural_height(true)
        .max_content_height(480)
        .margin_start(8)
        .margin_end(8)
        .margin_bottom(10)
        .build();
    scrolled_window.set_child(Some(&results_list));
    panel.append(&scrolled_window);

    let overlay = gtk::Overlay::new();
    overlay.set_child(Some(&map));
    overlay.add_overlay(&picker);
    overlay.add_overlay(&panel);

    let (news_sender, news_receiver) = flume::unbounded::<NewsDelivery>();
    let control = GlobeControl {
        map: map.clone(),
        map_view: map_view.clone(),
        viewport: viewport.clone(),
        state: Rc::new(RefCell::new(ViewState::new(
            settings.camera_overrides(),
            settings.auto_rotate,
        ))),
        surface: Rc::new(Cell::new(surface)),
        layers: Rc::new(RefCell::new(Vec::new())),
        picker: picker.clone(),
        picker_order: Rc::new(RefCell::new(Vec::new())),
        panel,
        panel_title,
        results_list,
        rotation_paused_until: Rc::new(Cell::new(Instant::now())),
        atmosphere,
        news: NewsClient::new(client.clone(), settings.news_endpoint.clone(), settings.news_limit),
        news_sender,
    };

    // News responses come back from the tokio runtime
    let control_for_news = control.clone();
    glib::spawn_future_local(async move {
        while let Ok((ticket, result)) = news_receiver.recv_async().await {
            control_for_news.deliver_news(ticket, result);
        }
    });

    // Hover, coalesced
    let hover_window = settings.hover_window();
    let debouncer = Rc::new(RefCell::new(Debouncer::<Option<usize>>::new(hover_window)));
    let observe_hover = {
        let control = control.clone();
        let debouncer = debouncer.clone();
        move |hit: Option<usize>| {
            debouncer.borrow_mut().observe(hit, Instant::now());
            let control = control.clone();
            let debouncer = debouncer.clone();
            glib::timeout_add_local_once(hover_window + Duration::from_millis(1), move || {
                let released = debouncer.borrow_mut().poll(Instant::now());
                if let Some(hit) = released {
                    control.on_hover(hit);
                }
            });
        }
    };
    let motion = gtk::EventControllerMotion::new();
    let control_for_motion = control.clone();
    let observe_motion = observe_hover.clone();
    motion.connect_motion(move |_, x, y| {
        observe_motion(control_for_motion.hit_test(x, y));
    });
    motion.connect_leave(move |_| {
        observe_hover(None);
    });
    map_view.add_controller(motion);

    // Click; a drag cancels the gesture so panning does not select
    let click = gtk::GestureClick::new();
    let control_for_click = control.clone();
    click.connect_released(move |_, _, x, y| {
        control_for_click.on_click(control_for_click.hit_test(x, y));
    });
    map_view.add_controller(click);

    let control_for_picker = control.clone();
    picker.connect_selected_notify(move |picker| {
        let position = picker.selected();
        if position == 0 || position == gtk::INVALID_LIST_POSITION {
            control_for_picker.dismiss();
            return;
        }
        let index = control_for_picker
            .picker_order
            .borrow()
            .get(position as usize - 1)
            .copied();
        if let Some(index) = index {
            if control_for_picker.state.borrow().active() != Some(index) {
                control_for_picker.select(index);
            }
        }
    });

    let control_for_close = control.clone();
    close_button.connect_clicked(move |_| {
        control_for_close.dismiss();
    });

    // Auto-rotation
    let control_for_rotation = control.clone();
    glib::timeout_add_local(Duration::from_millis(ROTATION_TICK_MS), move || {
        let control = &control_for_rotation;
        if control.state.borrow().should_auto_rotate()
            && Instant::now() >= control.rotation_paused_until.get()
        {
            let lat = control.viewport.latitude();
            let lng = rotate_longitude(control.viewport.longitude(), ROTATION_STEP_DEG);
            control.map_view.center_on(lat, lng);
        }
        glib::ControlFlow::Continue
    });

    // One-time boundary download
    let (boundary_sender, boundary_receiver) =
        flume::bounded::<Result<Vec<BoundaryFeature>, BoundaryError>>(1);
    let boundaries_url = settings.boundaries_url.clone();
    tokio::spawn(async move {
        let result = boundaries::fetch_boundaries(&client, &boundaries_url).await;
        if boundary_sender.send(result).is_err() {
            log::debug!("Boundary receiver closed before delivery");
        }
    });

    let control_for_boundaries = control.clone();
    glib::spawn_future_local(async move {
        match boundary_receiver.recv_async().await {
            Ok(Ok(features)) => {
                control_for_boundaries.install_features(features);
                control_for_boundaries.on_ready();
                on_loaded(Ok(()));
            }
            Ok(Err(e)) => {
                log::error!("Error loading boundaries: {}", e);
                on_loaded(Err(e.to_string()));
            }
            Err(e) => {
                log::error!("Boundary loader vanished: {}", e);
                on_loaded(Err(e.to_string()));
            }
        }
    });

    (overlay, control)
}
