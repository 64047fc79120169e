/// Sample panel: left sidebar listing loaded samples

use visor_core::{LineColor, SampleId, SeriesStore};

use super::theme::ThemeColors;

/// Actions triggered by the sample panel
#[derive(Debug, Clone, PartialEq)]
pub enum SampleAction {
    None,
    Toggle(SampleId, bool),
    Offset(SampleId, f64),
    Save(SampleId, bool),
    Remove(SampleId),
    ShowAll(bool),
}

fn swatch(colors: &ThemeColors, color: LineColor) -> egui::RichText {
    egui::RichText::new("■").color(colors.plot.curve(color))
}

/// Render the sample list. `saved` reports inventory membership.
pub fn show_sample_panel(
    ui: &mut egui::Ui,
    store: &SeriesStore,
    colors: &ThemeColors,
    saved: impl Fn(SampleId) -> bool,
) -> SampleAction {
    let mut action = SampleAction::None;

    ui.vertical_centered(|ui| {
        ui.heading("🧪 Samples");
    });
    ui.separator();

    if store.is_empty() {
        ui.add_space(12.0);
        ui.label(
            egui::RichText::new("No samples loaded.")
                .size(12.5)
                .color(colors.text_muted),
        );
        ui.add_space(4.0);
        ui.label(
            egui::RichText::new("Drag & drop a JSON file or File → Open")
                .size(12.0)
                .color(colors.text_muted),
        );
        return action;
    }

    ui.horizontal(|ui| {
        if ui.small_button("Show all").clicked() {
            action = SampleAction::ShowAll(true);
        }
        if ui.small_button("Hide all").clicked() {
            action = SampleAction::ShowAll(false);
        }
    });
    ui.add_space(4.0);

    egui::ScrollArea::vertical().show(ui, |ui| {
        for series in store.iter() {
            let id = series.id();
            ui.horizontal(|ui| {
                let mut active = series.active;
                if ui.checkbox(&mut active, "").changed() {
                    action = SampleAction::Toggle(id, active);
                }
                ui.label(swatch(colors, series.color));
                ui.label(swatch(colors, series.instrument_color).size(9.0));
                ui.label(series.sample.sample_name.as_str());

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✖").on_hover_text("Remove from view").clicked() {
                        action = SampleAction::Remove(id);
                    }
                    let mut in_inventory = saved(id);
                    if ui
                        .checkbox(&mut in_inventory, "")
                        .on_hover_text("Saved to inventory")
                        .changed()
                    {
                        action = SampleAction::Save(id, in_inventory);
                    }
                });
            });
            ui.horizontal(|ui| {
                ui.add_space(24.0);
                let mut offset = series.offset;
                let resp = ui.add(
                    egui::DragValue::new(&mut offset)
                        .speed(0.005)
                        .fixed_decimals(3)
                        .prefix("offset "),
                );
                if resp.changed() {
                    action = SampleAction::Offset(id, offset);
                }
                if series.scale() != 1.0 {
                    ui.label(
                        egui::RichText::new(format!("×{:.3}", series.scale()))
                            .size(11.0)
                            .color(colors.text_muted),
                    );
                }
            });
            ui.add_space(2.0);
        }
    });

    action
}
