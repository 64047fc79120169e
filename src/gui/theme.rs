/// Colour themes for the viewer
///
/// A theme covers the egui chrome (panels, widgets, status bar) and the
/// plot overlay: locators, pointer, tracking line and the curve colour used
/// once the line palette runs out.

use egui::Color32;
use visor_core::{CalcMode, CalcState, LineColor};

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AppTheme {
    Light,
    Dark,
}

impl AppTheme {
    pub fn label(&self) -> &'static str {
        match self {
            AppTheme::Light => "☀ Light",
            AppTheme::Dark => "🌙 Dark",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AppTheme::Light => AppTheme::Dark,
            AppTheme::Dark => AppTheme::Light,
        }
    }
}

/// Overlay colours painted on top of the curves
#[derive(Debug, Clone)]
pub struct PlotColors {
    /// Replaces the black fallback line colour, which vanishes on dark plots
    pub fallback_curve: Color32,
    pub locator: Color32,
    pub locator_label: Color32,
    pub tracking_line: Color32,
    pub pointer: Color32,
    pub pointer_label: Color32,
    pub overlay_text: Color32,
}

impl PlotColors {
    /// Screen colour of a series line or its foci.
    pub fn curve(&self, c: LineColor) -> Color32 {
        if c == LineColor::FALLBACK {
            self.fallback_curve
        } else {
            Color32::from_rgb(c.r, c.g, c.b)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub dark: bool,

    pub panel: Color32,
    pub window: Color32,
    pub faint: Color32,
    pub widget: Color32,
    pub widget_stroke: Color32,
    pub hovered_stroke: Color32,
    pub active: Color32,
    pub selection: Color32,
    pub shadow: Color32,

    pub text: Color32,
    pub text_muted: Color32,
    pub status_bar: Color32,

    /// Slope, ratio, custom band depth, minimum band depth
    pub badges: [Color32; 4],

    pub plot: PlotColors,
}

impl ThemeColors {
    pub fn from_theme(theme: AppTheme) -> Self {
        match theme {
            AppTheme::Light => Self::light(),
            AppTheme::Dark => Self::dark(),
        }
    }

    fn light() -> Self {
        Self {
            dark: false,
            panel: Color32::from_rgb(0xF5, 0xF4, 0xF0),
            window: Color32::from_rgb(0xFD, 0xFC, 0xFA),
            faint: Color32::from_rgb(0xEC, 0xEA, 0xE4),
            widget: Color32::from_rgb(0xE6, 0xE3, 0xDC),
            widget_stroke: Color32::from_rgb(0xC9, 0xC4, 0xB8),
            hovered_stroke: Color32::from_rgb(0x4F, 0x86, 0x7A),
            active: Color32::from_rgb(0x2F, 0x6F, 0x62),
            selection: Color32::from_rgba_unmultiplied(0x2F, 0x6F, 0x62, 0x50),
            shadow: Color32::from_rgba_unmultiplied(0, 0, 0, 30),

            text: Color32::from_rgb(0x2B, 0x2A, 0x27),
            text_muted: Color32::from_rgb(0x85, 0x80, 0x76),
            status_bar: Color32::from_rgb(0xEC, 0xEA, 0xE4),

            badges: [
                Color32::from_rgb(0x1E, 0x8C, 0x5A),
                Color32::from_rgb(0x4A, 0x5F, 0xC1),
                Color32::from_rgb(0xA8, 0x3C, 0x9E),
                Color32::from_rgb(0xC8, 0x6A, 0x10),
            ],

            plot: PlotColors {
                fallback_curve: Color32::BLACK,
                locator: Color32::from_rgb(0x6E, 0x6A, 0x60),
                locator_label: Color32::from_rgb(0x4A, 0x47, 0x40),
                tracking_line: Color32::from_rgb(0xA8, 0xA3, 0x98),
                pointer: Color32::from_rgb(0x2F, 0x6F, 0x62),
                pointer_label: Color32::from_rgb(0x2B, 0x2A, 0x27),
                overlay_text: Color32::from_rgb(0x85, 0x80, 0x76),
            },
        }
    }

    fn dark() -> Self {
        Self {
            dark: true,
            panel: Color32::from_rgb(0x17, 0x19, 0x1D),
            window: Color32::from_rgb(0x1D, 0x20, 0x25),
            faint: Color32::from_rgb(0x22, 0x25, 0x2B),
            widget: Color32::from_rgb(0x2A, 0x2E, 0x35),
            widget_stroke: Color32::from_rgb(0x3C, 0x42, 0x4C),
            hovered_stroke: Color32::from_rgb(0x7F, 0xC8, 0xB8),
            active: Color32::from_rgb(0x3F, 0x9C, 0x88),
            selection: Color32::from_rgba_unmultiplied(0x3F, 0x9C, 0x88, 0x60),
            shadow: Color32::from_rgba_unmultiplied(0, 0, 0, 90),

            text: Color32::from_rgb(0xDD, 0xE1, 0xE6),
            text_muted: Color32::from_rgb(0x80, 0x88, 0x93),
            status_bar: Color32::from_rgb(0x12, 0x14, 0x17),

            badges: [
                Color32::from_rgb(0x4C, 0xD0, 0x8A),
                Color32::from_rgb(0x8E, 0x9F, 0xF0),
                Color32::from_rgb(0xE0, 0x7A, 0xD6),
                Color32::from_rgb(0xF2, 0xA2, 0x4C),
            ],

            plot: PlotColors {
                fallback_curve: Color32::from_rgb(0xE8, 0xE8, 0xE8),
                locator: Color32::from_rgb(0x9A, 0xA2, 0xAD),
                locator_label: Color32::from_rgb(0xC4, 0xCA, 0xD2),
                tracking_line: Color32::from_rgb(0x5E, 0x66, 0x71),
                pointer: Color32::from_rgb(0x7F, 0xC8, 0xB8),
                pointer_label: Color32::from_rgb(0xDD, 0xE1, 0xE6),
                overlay_text: Color32::from_rgb(0x80, 0x88, 0x93),
            },
        }
    }

    /// Status bar badge while a measurement tool is armed: (name, hint, colour)
    pub fn calc_badge(&self, mode: CalcMode, state: CalcState) -> Option<(&'static str, String, Color32)> {
        let (name, color) = match mode {
            CalcMode::Off => return None,
            CalcMode::Slope => ("SLOPE", self.badges[0]),
            CalcMode::Ratio => ("RATIO", self.badges[1]),
            CalcMode::BandDepthCustom => ("BAND DEPTH", self.badges[2]),
            CalcMode::BandDepthMin => ("BAND MIN", self.badges[3]),
        };
        let hint = match state {
            CalcState::Idle => "Click the left shoulder".to_string(),
            CalcState::Partial(1) => "Click the right shoulder".to_string(),
            CalcState::Partial(n) => format!("Click point {} of {}", n + 1, mode.required_foci()),
            CalcState::Complete => "Click again to start over".to_string(),
        };
        Some((name, hint, color))
    }
}

/// Install the theme's chrome colours on the egui context
pub fn apply_theme(ctx: &egui::Context, c: &ThemeColors) {
    let mut visuals = if c.dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };

    visuals.panel_fill = c.panel;
    visuals.window_fill = c.window;
    visuals.faint_bg_color = c.faint;

    let widgets = &mut visuals.widgets;
    widgets.noninteractive.bg_fill = c.widget;
    widgets.noninteractive.bg_stroke = egui::Stroke::new(0.5, c.widget_stroke);
    widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, c.text);
    widgets.inactive.bg_fill = c.widget;
    widgets.inactive.weak_bg_fill = c.widget;
    widgets.inactive.bg_stroke = egui::Stroke::new(0.5, c.widget_stroke);
    widgets.hovered.bg_stroke = egui::Stroke::new(1.0, c.hovered_stroke);
    widgets.active.bg_fill = c.active;
    widgets.active.fg_stroke = egui::Stroke::new(1.5, Color32::WHITE);
    for w in [&mut widgets.noninteractive, &mut widgets.inactive, &mut widgets.hovered] {
        w.corner_radius = egui::CornerRadius::same(3);
    }

    visuals.selection.bg_fill = c.selection;
    visuals.selection.stroke = egui::Stroke::new(1.0, c.active);
    visuals.window_shadow = egui::epaint::Shadow {
        offset: [0, 3],
        blur: 10,
        spread: 0,
        color: c.shadow,
    };

    ctx.set_visuals(visuals);
}
