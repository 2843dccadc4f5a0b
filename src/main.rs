mod boundaries;
mod camera;
mod config;
mod country_codes;
mod data;
mod debounce;
mod error;
mod globe_view;
mod news;
mod news_card;
mod surface;
mod view_state;

use gtk::prelude::*;
use gtk::{glib, Align, Application, Label, Orientation};
use libadwaita::{prelude::*, ApplicationWindow, ColorScheme, HeaderBar, StyleManager, ToolbarView};

use crate::config::{Settings, ThemePreference};
use crate::data::APP_ID;
use crate::globe_view::create_globe_view;
use crate::surface::Theme;

fn main() -> glib::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            glib::ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<glib::ExitCode> {
    let settings = Settings::load();

    // Initialize Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let client = reqwest::Client::builder()
        .timeout(settings.request_timeout())
        .build()?;

    let app = Application::builder()
        .application_id(APP_ID)
        .build();

    app.connect_activate(move |app| build_ui(app, &settings, client.clone()));

    let exit_code = app.run();

    // Keep runtime alive until app exits
    drop(_guard);
    drop(rt);

    Ok(exit_code)
}

fn color_scheme(preference: ThemePreference) -> ColorScheme {
    match preference {
        ThemePreference::Dark => ColorScheme::PreferDark,
        ThemePreference::Light => ColorScheme::ForceLight,
        ThemePreference::System => ColorScheme::Default,
    }
}

fn current_theme(style_manager: &StyleManager) -> Theme {
    if style_manager.is_dark() {
        Theme::Dark
    } else {
        Theme::Light
    }
}

fn build_ui(app: &Application, settings: &Settings, client: reqwest::Client) {
    let style_manager = StyleManager::default();
    style_manager.set_color_scheme(color_scheme(settings.theme));
    let theme = current_theme(&style_manager);

    // Loading placeholder until the globe reports ready
    let stack = gtk::Stack::builder()
        .transition_type(gtk::StackTransitionType::Crossfade)
        .build();

    let loading_page = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(12)
        .halign(Align::Center)
        .valign(Align::Center)
        .build();
    let spinner = gtk::Spinner::builder()
        .spinning(true)
        .width_request(32)
        .height_request(32)
        .build();
    let loading_label = Label::builder()
        .label("Loading globe...")
        .build();
    loading_label.add_css_class("dim-label");
    loading_page.append(&spinner);
    loading_page.append(&loading_label);
    stack.add_named(&loading_page, Some("loading"));

    let stack_for_ready = stack.clone();
    let (globe, control) = create_globe_view(settings, client, theme, move |outcome| {
        match outcome {
            Ok(()) => stack_for_ready.set_visible_child_name("globe"),
            Err(e) => {
                spinner.set_spinning(false);
                loading_label.set_label(&format!("Could not load country boundaries: {}", e));
            }
        }
    });
    stack.add_named(&globe, Some("globe"));
    stack.set_visible_child_name("loading");

    let control_for_theme = control.clone();
    style_manager.connect_dark_notify(move |style_manager| {
        control_for_theme.set_theme(current_theme(style_manager));
    });

    let header_bar = HeaderBar::builder()
        .title_widget(&libadwaita::WindowTitle::new("Newsglobe", "Interactive News Globe"))
        .build();

    let theme_button = gtk::Button::builder()
        .icon_name("weather-clear-night-symbolic")
        .tooltip_text("Toggle dark mode")
        .build();
    theme_button.connect_clicked(|_| {
        let style_manager = StyleManager::default();
        let scheme = if style_manager.is_dark() {
            ColorScheme::ForceLight
        } else {
            ColorScheme::ForceDark
        };
        style_manager.set_color_scheme(scheme);
    });
    header_bar.pack_end(&theme_button);

    let toolbar_view = ToolbarView::builder()
        .build();
    toolbar_view.add_top_bar(&header_bar);
    toolbar_view.set_content(Some(&stack));

    let window = ApplicationWindow::builder()
        .application(app)
        .title("Newsglobe")
        .default_width(1200)
        .default_height(800)
        .build();

    let css_provider = gtk::CssProvider::new();
    css_provider.load_from_data(
        ".info-panel {
            background-color: alpha(@card_bg_color, 0.95);
            border-radius: 12px;
            box-shadow: 0 2px 8px alpha(black, 0.25);
        }
        .country-picker {
            background-color: alpha(@window_bg_color, 0.85);
            border-radius: 8px;
            box-shadow: 0 2px 6px alpha(black, 0.3);
        }
        .news-card {
            background-color: alpha(@card_bg_color, 0.3);
            border-radius: 6px;
            border: 1px solid alpha(@borders, 0.15);
            padding: 4px 6px;
            transition: all 150ms ease;
        }
        .news-card:hover {
            background-color: alpha(@card_bg_color, 0.6);
            border-color: alpha(@accent_bg_color, 0.3);
        }
        .news-title {
            font-size: 13px;
            font-weight: 600;
            line-height: 1.3;
        }
        .news-meta {
            font-size: 11px;
            color: alpha(@window_fg_color, 0.55);
        }
        .news-date {
            font-size: 10px;
            color: alpha(@window_fg_color, 0.45);
            font-weight: 500;
        }
        .news-description {
            font-size: 11px;
            color: alpha(@window_fg_color, 0.7);
        }
        .sentiment-badge {
            font-size: 10px;
            font-weight: 600;
            padding: 0 6px;
            border-radius: 8px;
        }
        .sentiment-positive {
            color: @success_color;
            background-color: alpha(@success_bg_color, 0.15);
        }
        .sentiment-neutral {
            color: alpha(@window_fg_color, 0.6);
            background-color: alpha(@window_fg_color, 0.08);
        }
        .sentiment-negative {
            color: @error_color;
            background-color: alpha(@error_bg_color, 0.15);
        }"
    );

    gtk::style_context_add_provider_for_display(
        &gtk::prelude::WidgetExt::display(&window),
        &css_provider,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );

    window.set_content(Some(&toolbar_view));
    window.present();
}
