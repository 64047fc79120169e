/// Main application state and eframe::App implementation
///
/// Ties together the viewer core, the egui panels, the inventory file and
/// the session log.

use std::collections::BTreeMap;
use std::path::PathBuf;

use eframe::egui;
use visor_core::{CalcMode, ClickOutcome, Hit, SeriesKey, ViewState, ViewWindow, WindowError};

use crate::data::inventory::JsonInventory;
use crate::data::samples;
use crate::gui::controls::{self, ControlAction, ControlsState};
use crate::gui::display::DisplayList;
use crate::gui::plot_view::{self, PlotEvent, PlotViewState};
use crate::gui::sample_panel::{self, SampleAction};
use crate::gui::theme::{self, AppTheme, ThemeColors};
use crate::gui::toolbar::{self, ToolbarAction};
use crate::log::session::SessionLog;

/// Plot size assumed until the first frame reports the real one.
const INITIAL_PLOT_SIZE: [f64; 2] = [800.0, 500.0];

/// The main application
pub struct VisorApp {
    /// Viewer core: series, view window, measurements
    view: ViewState,
    /// What the plot paints
    display: DisplayList,

    inventory: JsonInventory,
    session_log: SessionLog,

    /// GUI sub-states
    plot_state: PlotViewState,
    controls_state: ControlsState,

    /// Status messages
    status_message: String,
    show_log_window: bool,
    show_about: bool,

    current_theme: AppTheme,
    theme_colors: ThemeColors,

    /// Dropped files buffer
    dropped_files: Vec<PathBuf>,
}

impl VisorApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let default_theme = AppTheme::Light;
        let theme_colors = ThemeColors::from_theme(default_theme);
        theme::apply_theme(&cc.egui_ctx, &theme_colors);

        let [w, h] = INITIAL_PLOT_SIZE;
        let mut view = ViewState::new(w, h);
        let mut inventory = JsonInventory::default_location();
        view.sync_inventory(&mut inventory);
        log::info!("Inventory file: {}", inventory.path().display());

        Self {
            view,
            display: DisplayList::new(w, h),
            inventory,
            session_log: SessionLog::new(),
            plot_state: PlotViewState::default(),
            controls_state: ControlsState::default(),
            status_message: "Ready. Open a sample file to begin".to_string(),
            show_log_window: false,
            show_about: false,
            current_theme: default_theme,
            theme_colors,
            dropped_files: Vec::new(),
        }
    }

    /// Start with the given sample files already loaded.
    pub fn with_files(cc: &eframe::CreationContext<'_>, files: Vec<PathBuf>) -> Self {
        let mut app = Self::new(cc);
        for path in files {
            app.load_path(path);
        }
        app
    }

    /// Load a sample file and add its samples to the view.
    fn load_path(&mut self, path: PathBuf) {
        match samples::load_samples(&path) {
            Ok(samples) => {
                let count = samples.len();
                let added = self.view.load_samples(samples, &mut self.display);
                self.session_log.add_source(&path.to_string_lossy());
                self.session_log.add_entry(
                    "Load",
                    &format!("{} of {} sample(s) from {}", added, count, path.display()),
                );
                self.status_message = if added < count {
                    format!(
                        "Loaded {} sample(s), {} already in view",
                        added,
                        count - added
                    )
                } else {
                    format!("Loaded {} sample(s) from {}", added, path.display())
                };
            }
            Err(e) => {
                self.status_message = format!("Error loading {}: {}", path.display(), e);
                log::error!("Load error: {}", e);
            }
        }
    }

    fn load_demo(&mut self) {
        let added = self.view.load_samples(samples::demo_samples(), &mut self.display);
        self.session_log.add_source("demo");
        self.session_log
            .add_entry("Load", &format!("{} demo sample(s)", added));
        self.status_message = format!("Loaded {} demo sample(s)", added);
    }

    /// Report a rejected window change in the status bar.
    fn settle_window(&mut self, result: Result<ViewWindow, WindowError>) {
        if let Err(e) = result {
            self.status_message = format!("View not changed: {}", e);
        }
    }

    fn export_log(&mut self) {
        if let Some(path) = toolbar::save_log_dialog() {
            match self.session_log.save(&path) {
                Ok(()) => self.status_message = format!("Log exported: {}", path.display()),
                Err(e) => {
                    self.status_message = format!("Log export failed: {}", e);
                    log::error!("Log export failed: {}", e);
                }
            }
        }
    }

    /// Legend labels for every curve that may be on screen.
    fn curve_labels(&self) -> BTreeMap<SeriesKey, String> {
        let store = self.view.store();
        store
            .iter()
            .flat_map(|s| [SeriesKey::lab(s.id()), SeriesKey::instrument(s.id())])
            .filter_map(|key| store.series_label(key).map(|label| (key, label)))
            .collect()
    }

    fn handle_click(&mut self, hit: Hit, outcome: ClickOutcome) {
        let mode = self.view.calc().mode();
        let name = self
            .view
            .store()
            .series_label(hit.key)
            .unwrap_or_else(|| hit.key.to_string());
        match outcome {
            ClickOutcome::Ignored => {
                self.status_message = format!("{}: {:.0} nm, {:.3}", name, hit.point[0], hit.point[1]);
            }
            ClickOutcome::Rejected => {
                self.status_message =
                    "A measurement is in progress on another sample; finish it or enable apply-to-all"
                        .to_string();
            }
            ClickOutcome::Cleared => {
                self.status_message = "Measurement cleared".to_string();
            }
            ClickOutcome::Placed { index } => {
                self.status_message = format!(
                    "Point {} of {} on {} at {:.0} nm",
                    index + 1,
                    mode.required_foci(),
                    name,
                    hit.point[0]
                );
            }
            ClickOutcome::Completed => {
                let summary = self.view.calc_summary();
                self.session_log
                    .add_measurement(&summary, self.view.store(), mode.display_name());
                self.status_message = match summary.values.first() {
                    Some(value) => format!("{} {}", mode.result_label(), value.text),
                    None => format!("{}: no series could be measured", mode.display_name()),
                };
            }
        }
    }

    fn handle_plot_events(&mut self, events: Vec<PlotEvent>) {
        for event in events {
            match event {
                PlotEvent::Resize { width, height } => {
                    self.view.resize(width, height, &mut self.display);
                }
                PlotEvent::Hover { px, py } => {
                    self.view.pointer_move(px, py, &mut self.display);
                }
                PlotEvent::Leave => self.view.pointer_leave(&mut self.display),
                PlotEvent::Click { px, py } => {
                    if let Some((hit, outcome)) = self.view.pointer_click(px, py, &mut self.display) {
                        self.handle_click(hit, outcome);
                    }
                }
                PlotEvent::Zoom { px, py, factor } => {
                    let result = self.view.wheel_zoom(px, py, factor, &mut self.display);
                    self.settle_window(result);
                }
                PlotEvent::Pan { dx, dy } => {
                    let result = self.view.drag_pan(dx, dy, &mut self.display);
                    self.settle_window(result);
                }
            }
        }
    }

    fn handle_sample_action(&mut self, action: SampleAction) {
        match action {
            SampleAction::Toggle(id, active) => {
                self.view.toggle_sample(id, active, &mut self.display);
            }
            SampleAction::Offset(id, offset) => {
                self.view.set_offset(id, offset, &mut self.display);
            }
            SampleAction::Save(id, saved) => {
                self.view.set_in_inventory(id, saved, &mut self.inventory);
                self.status_message = if saved {
                    format!("Sample {} saved to inventory", id)
                } else {
                    format!("Sample {} removed from inventory", id)
                };
            }
            SampleAction::Remove(id) => {
                if self.view.remove_sample(id, &mut self.display) {
                    self.session_log.add_entry("Remove", &format!("sample {}", id));
                    self.status_message = format!("Removed sample {}", id);
                }
            }
            SampleAction::ShowAll(active) => {
                let ids: Vec<_> = self.view.store().iter().map(|s| s.id()).collect();
                for id in ids {
                    self.view.toggle_sample(id, active, &mut self.display);
                }
            }
            SampleAction::None => {}
        }
    }

    fn handle_control_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::CalcMode(mode) => {
                self.view.set_calc_mode(mode, &mut self.display);
                self.session_log.add_entry("Calc mode", mode.display_name());
                self.session_log
                    .add_recalculation(self.view.calc(), self.view.store());
                self.status_message = match mode {
                    CalcMode::Off => "Measurement off".to_string(),
                    _ => format!("{}: click points on a curve", mode.display_name()),
                };
            }
            ControlAction::ApplyToAll(on) => {
                self.view.set_apply_to_all(on, &mut self.display);
                self.session_log
                    .add_entry("Apply to all", if on { "on" } else { "off" });
                self.session_log
                    .add_recalculation(self.view.calc(), self.view.store());
            }
            ControlAction::PeakNormalization(on) => {
                self.view.toggle_peak_normalization(on, &mut self.display);
                self.session_log
                    .add_entry("Normalize", if on { "peak" } else { "off" });
            }
            ControlAction::WavelengthNormalization(on) => {
                self.view.toggle_wavelength_normalization(on, &mut self.display);
                self.session_log
                    .add_entry("Normalize", if on { "wavelength" } else { "off" });
            }
            ControlAction::NormalizationWavelength(w) => {
                self.view.set_normalization_wavelength(w, &mut self.display);
                self.session_log
                    .add_entry("Normalize", &format!("reference {} nm", w));
            }
            ControlAction::Layers(layers) => self.view.set_layers(layers, &mut self.display),
            ControlAction::FilterSet(name) => {
                self.view.set_filter_set(&name, &mut self.display);
                self.session_log.add_entry("Filter set", &name);
            }
            ControlAction::DropLocator(on) => self.view.toggles.drop_locator = on,
            ControlAction::VerticalLine(on) => {
                self.view.toggles.vertical_line = on;
                self.view.redraw(&mut self.display);
            }
            ControlAction::EraseLocators => self.view.erase_locators(&mut self.display),
            ControlAction::ResetZoom => {
                let result = self.view.reset_zoom(&mut self.display);
                self.settle_window(result);
            }
            ControlAction::Field(widget, value) => {
                let result = self.view.field_changed(widget, value, &mut self.display);
                self.settle_window(result);
            }
            ControlAction::Slider(widget, values) => {
                let result = self.view.slider_changed(widget, values, &mut self.display);
                self.settle_window(result);
            }
            ControlAction::Invalid(text) => {
                self.status_message = format!("Not a number: '{}'", text);
            }
            ControlAction::None => {}
        }
    }

    fn handle_toolbar_action(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::OpenSamples => {
                if let Some(path) = toolbar::open_samples_dialog() {
                    self.load_path(path);
                }
            }
            ToolbarAction::LoadDemo => self.load_demo(),
            ToolbarAction::ExportLog => self.export_log(),
            ToolbarAction::ZoomReset => {
                let result = self.view.reset_zoom(&mut self.display);
                self.settle_window(result);
                self.status_message = "Zoom reset".to_string();
            }
            ToolbarAction::EraseLocators => self.view.erase_locators(&mut self.display),
            ToolbarAction::ThemeToggle => {
                self.current_theme = self.current_theme.next();
                self.theme_colors = ThemeColors::from_theme(self.current_theme);
            }
            ToolbarAction::ShowLog => self.show_log_window = true,
            ToolbarAction::ShowAbout => self.show_about = true,
            ToolbarAction::None => {}
        }
    }
}

impl eframe::App for VisorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Re-apply theme each frame (ensures toggle takes effect) ──
        theme::apply_theme(ctx, &self.theme_colors);

        // Handle drag-and-drop
        ctx.input(|i| {
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    self.dropped_files.push(path.clone());
                }
            }
        });
        while let Some(path) = self.dropped_files.pop() {
            self.load_path(path);
        }

        // ── Toolbar ──
        let toolbar_action = toolbar::show_toolbar(
            ctx,
            self.current_theme.label(),
            !self.view.locators().is_empty(),
        );
        if toolbar_action != ToolbarAction::None {
            self.handle_toolbar_action(toolbar_action);
        }

        // ── Status Bar ──
        let tc = &self.theme_colors;
        let badge = tc.calc_badge(self.view.calc().mode(), self.view.calc().state());
        let sb_bg = tc.status_bar;
        let sb_text = tc.text;
        let sb_muted = tc.text_muted;

        egui::TopBottomPanel::bottom("status_bar")
            .frame(egui::Frame::new()
                .fill(sb_bg)
                .inner_margin(egui::Margin::symmetric(12, 4)))
            .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some((mode_name, mode_hint, mode_color)) = &badge {
                    let badge_bg = mode_color.linear_multiply(0.2);
                    let badge = egui::Button::new(
                        egui::RichText::new(*mode_name)
                            .size(11.5)
                            .strong()
                            .color(*mode_color),
                    )
                    .fill(badge_bg)
                    .stroke(egui::Stroke::new(1.0, *mode_color))
                    .corner_radius(10.0);
                    ui.add(badge);
                    ui.label(
                        egui::RichText::new(mode_hint)
                            .size(11.0)
                            .italics()
                            .color(mode_color.linear_multiply(0.7)),
                    );
                    ui.separator();
                }

                ui.label(
                    egui::RichText::new(&self.status_message)
                        .size(11.5)
                        .color(sb_text),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("📋 Log").clicked() {
                        self.show_log_window = !self.show_log_window;
                    }
                    ui.label(
                        egui::RichText::new(format!("{} entries", self.session_log.len()))
                            .size(11.0)
                            .color(sb_muted),
                    );
                    ui.separator();
                    if let Some(hit) = self.view.pointer() {
                        ui.label(
                            egui::RichText::new(format!("{:.0} nm  {:.4}", hit.point[0], hit.point[1]))
                                .size(11.0)
                                .monospace()
                                .color(sb_muted),
                        );
                    }
                });
            });
        });

        // ── Left Panel: Samples ──
        let mut sample_action = SampleAction::None;
        egui::SidePanel::left("sample_panel")
            .resizable(true)
            .default_width(240.0)
            .min_width(180.0)
            .max_width(400.0)
            .show(ctx, |ui| {
                let view = &self.view;
                sample_action = sample_panel::show_sample_panel(
                    ui,
                    view.store(),
                    &self.theme_colors,
                    |id| view.in_inventory(id),
                );
            });
        self.handle_sample_action(sample_action);

        // ── Right Panel: Measurement & view controls ──
        let mut control_action = ControlAction::None;
        egui::SidePanel::right("controls_panel")
            .resizable(true)
            .default_width(260.0)
            .min_width(200.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    control_action = controls::show_controls(
                        ui,
                        &mut self.controls_state,
                        &self.view,
                        &self.theme_colors,
                    );
                });
            });
        self.handle_control_action(control_action);

        // ── Central: Plot ──
        let labels = self.curve_labels();
        let overlay = self.view.normalization_label();
        let mut events = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            events = plot_view::show_plot(
                ui,
                &mut self.plot_state,
                &self.display,
                &labels,
                overlay.as_deref(),
                &self.theme_colors.plot,
            );
        });
        self.handle_plot_events(events);

        // ── Session Log Window ──
        if self.show_log_window {
            let mut export = false;
            egui::Window::new("📋 Session Log")
                .open(&mut self.show_log_window)
                .default_size([600.0, 400.0])
                .resizable(true)
                .show(ctx, |ui| {
                    if ui.button("💾 Export…").clicked() {
                        export = true;
                    }
                    ui.separator();

                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.style_mut().override_font_id =
                            Some(egui::FontId::monospace(12.0));
                        ui.label(self.session_log.to_text());
                    });
                });
            if export {
                self.export_log();
            }
        }

        // ── About Dialog ──
        if self.show_about {
            egui::Window::new("About")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.heading("🌈 Reflectance Viewer");
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(10.0);
                    ui.label("Built with Rust + egui");
                    ui.add_space(10.0);
                    ui.label("Features:");
                    ui.label("• Lab and instrument-simulated spectra side by side");
                    ui.label("• Slope, ratio and band-depth measurements on the curves");
                    ui.label("• Peak or fixed-wavelength normalization");
                    ui.label("• Linked zoom, sliders and bound fields");
                    ui.label("• Exportable session log");
                });
        }

        // Handle keyboard shortcuts
        let (open, reset) = ctx.input(|i| {
            let cmd = i.modifiers.ctrl || i.modifiers.command;
            (cmd && i.key_pressed(egui::Key::O), cmd && i.key_pressed(egui::Key::R))
        });
        if open {
            self.handle_toolbar_action(ToolbarAction::OpenSamples);
        }
        if reset {
            self.handle_toolbar_action(ToolbarAction::ZoomReset);
        }
    }
}
