/// Toolbar: top menu bar with file operations and quick actions

use std::path::PathBuf;

/// Actions that can be triggered from the toolbar
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    None,
    OpenSamples,
    LoadDemo,
    ExportLog,
    ZoomReset,
    EraseLocators,
    ThemeToggle,
    ShowLog,
    ShowAbout,
}

/// Render the toolbar and return any triggered action
pub fn show_toolbar(ctx: &egui::Context, theme_label: &str, has_locators: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            // File menu
            ui.menu_button("📁 File", |ui| {
                if ui.button("📂 Open Samples…").clicked() {
                    action = ToolbarAction::OpenSamples;
                    ui.close_menu();
                }
                if ui.button("🧪 Load Demo Samples").clicked() {
                    action = ToolbarAction::LoadDemo;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("📋 Export Session Log…").clicked() {
                    action = ToolbarAction::ExportLog;
                    ui.close_menu();
                }
            });

            // View menu
            ui.menu_button("🔍 View", |ui| {
                if ui.button("🔄 Reset Zoom").clicked() {
                    action = ToolbarAction::ZoomReset;
                    ui.close_menu();
                }
                if ui
                    .add_enabled(has_locators, egui::Button::new("🧹 Erase Locators"))
                    .clicked()
                {
                    action = ToolbarAction::EraseLocators;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("📋 Session Log").clicked() {
                    action = ToolbarAction::ShowLog;
                    ui.close_menu();
                }
                if ui.button(format!("🎨 Theme: {}", theme_label)).clicked() {
                    action = ToolbarAction::ThemeToggle;
                    ui.close_menu();
                }
            });

            // Help menu
            ui.menu_button("❓ Help", |ui| {
                if ui.button("ℹ About").clicked() {
                    action = ToolbarAction::ShowAbout;
                    ui.close_menu();
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.add(egui::Button::new(
                    egui::RichText::new(theme_label).size(12.0)
                ).corner_radius(12.0)).clicked() {
                    action = ToolbarAction::ThemeToggle;
                }
                ui.separator();
                ui.label(
                    egui::RichText::new("Reflectance Viewer")
                        .weak()
                        .size(12.0),
                );
            });
        });
    });

    action
}

/// Show file-open dialog for sample files
pub fn open_samples_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open Reflectance Samples")
        .add_filter("Sample JSON", &["json"])
        .add_filter("All Files", &["*"])
        .pick_file()
}

/// Show save dialog for log export
pub fn save_log_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export Session Log")
        .add_filter("Text File", &["txt"])
        .add_filter("JSON", &["json"])
        .save_file()
}
