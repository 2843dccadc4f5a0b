use crate::boundaries::BoundaryFeature;
use crate::country_codes::news_code;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

/// Straight-alpha color, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// `rgba(...)` for use in CSS.
    pub fn to_css(self) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            self.a
        )
    }
}

impl From<Rgba> for gdk::RGBA {
    fn from(c: Rgba) -> Self {
        gdk::RGBA::new(c.r, c.g, c.b, c.a)
    }
}

/// How a country polygon should look for a given interaction state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonStyle {
    pub fill: Rgba,
    pub stroke: Rgba,
    /// Raise above the surface in globe radii; drawn as a heavier outline.
    pub altitude: f64,
}

impl PolygonStyle {
    pub fn stroke_width(&self) -> f64 {
        1.0 + self.altitude * 25.0
    }
}

/// Everything the map surface needs, derived from the current theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    pub theme: Theme,
}

impl SurfaceConfig {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn tile_url(&self) -> &'static str {
        match self.theme {
            Theme::Dark => "https://a.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
            Theme::Light => "https://a.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
        }
    }

    pub fn atmosphere_color(&self) -> Rgba {
        match self.theme {
            Theme::Dark => Rgba::new(0.35, 0.6, 1.0, 0.45),
            Theme::Light => Rgba::new(0.55, 0.75, 1.0, 0.6),
        }
    }

    pub fn atmosphere_width(&self) -> u32 {
        18
    }

    pub fn polygon_style(&self, hovered: bool, active: bool) -> PolygonStyle {
        let (fill, stroke) = match (self.theme, active, hovered) {
            (Theme::Dark, true, _) => (Rgba::new(1.0, 0.6, 0.1, 0.55), Rgba::new(1.0, 0.75, 0.3, 1.0)),
            (Theme::Dark, false, true) => (Rgba::new(0.3, 0.65, 1.0, 0.45), Rgba::new(0.6, 0.85, 1.0, 1.0)),
            (Theme::Dark, false, false) => (Rgba::new(0.2, 0.4, 0.7, 0.12), Rgba::new(0.55, 0.7, 0.9, 0.5)),
            (Theme::Light, true, _) => (Rgba::new(0.95, 0.45, 0.05, 0.5), Rgba::new(0.75, 0.3, 0.0, 1.0)),
            (Theme::Light, false, true) => (Rgba::new(0.1, 0.45, 0.85, 0.35), Rgba::new(0.05, 0.3, 0.65, 1.0)),
            (Theme::Light, false, false) => (Rgba::new(0.1, 0.3, 0.6, 0.08), Rgba::new(0.2, 0.3, 0.45, 0.45)),
        };
        let altitude = if active || hovered { 0.06 } else { 0.01 };
        PolygonStyle { fill, stroke, altitude }
    }

    /// Tooltip text for a polygon.
    pub fn label(&self, feature: &BoundaryFeature) -> String {
        match feature.id.and_then(news_code) {
            Some(code) => format!("{} ({})", feature.name, code.to_uppercase()),
            None => format!("{} (no news feed)", feature.name),
        }
    }

    /// Frame around the map that stands in for the globe's atmosphere glow.
    pub fn atmosphere_css(&self) -> String {
        format!(
            ".globe-surface {{ box-shadow: inset 0 0 {}px {}; }}",
            self.atmosphere_width(),
            self.atmosphere_color().to_css()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_and_hover_stand_out() {
        for theme in [Theme::Dark, Theme::Light] {
            let surface = SurfaceConfig::new(theme);
            let base = surface.polygon_style(false, false);
            let hover = surface.polygon_style(true, false);
            let active = surface.polygon_style(true, true);
            assert!(hover.fill.a > base.fill.a);
            assert!(hover.stroke_width() > base.stroke_width());
            assert_ne!(active.fill, hover.fill);
            assert_eq!(active, surface.polygon_style(false, true));
        }
    }

    #[test]
    fn tiles_follow_theme() {
        assert!(SurfaceConfig::new(Theme::Dark).tile_url().contains("dark_all"));
        assert!(SurfaceConfig::new(Theme::Light).tile_url().contains("light_all"));
    }

    #[test]
    fn labels_mention_news_availability() {
        let surface = SurfaceConfig::new(Theme::Dark);
        let mut feature = BoundaryFeature {
            id: Some(840),
            name: "United States of America".to_string(),
            polygons: vec![],
        };
        assert_eq!(surface.label(&feature), "United States of America (US)");
        feature.id = Some(304);
        assert_eq!(surface.label(&feature), "United States of America (no news feed)");
    }

    #[test]
    fn atmosphere_css_uses_theme_color() {
        let css = SurfaceConfig::new(Theme::Dark).atmosphere_css();
        assert!(css.contains("rgba(89, 153, 255, 0.45)"));
    }
}
