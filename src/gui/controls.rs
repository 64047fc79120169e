/// Controls panel: right sidebar with measurement, normalization, layer
/// and view-window controls

use visor_core::{CalcMode, LayerVisibility, Normalization, ViewState, Widget};

use super::theme::ThemeColors;

/// Edit buffers for the text inputs.
///
/// A field shows the viewer's text except while it has keyboard focus, so
/// typing is never overwritten by the fan-out of another widget.
#[derive(Debug, Clone, Default)]
pub struct ControlsState {
    fields: [String; 4],
    focused: Option<Widget>,
    norm_input: String,
    norm_focused: bool,
}

/// Actions triggered by the controls panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    None,
    CalcMode(CalcMode),
    ApplyToAll(bool),
    PeakNormalization(bool),
    WavelengthNormalization(bool),
    NormalizationWavelength(f64),
    Layers(LayerVisibility),
    FilterSet(String),
    DropLocator(bool),
    VerticalLine(bool),
    EraseLocators,
    ResetZoom,
    Field(Widget, f64),
    Slider(Widget, [f64; 2]),
    /// Text that does not parse as a number.
    Invalid(String),
}

const FIELDS: [(Widget, &str); 4] = [
    (Widget::MinXField, "min λ"),
    (Widget::MaxXField, "max λ"),
    (Widget::MinYField, "min R"),
    (Widget::MaxYField, "max R"),
];

/// Render the controls panel
pub fn show_controls(
    ui: &mut egui::Ui,
    state: &mut ControlsState,
    view: &ViewState,
    colors: &ThemeColors,
) -> ControlAction {
    let mut action = ControlAction::None;
    let store = view.store();
    let calc = view.calc();

    ui.vertical_centered(|ui| {
        ui.heading("📐 Measure");
    });
    ui.separator();

    // ── Calc ──
    let mut mode = calc.mode();
    for m in CalcMode::ALL {
        if ui.radio_value(&mut mode, m, m.display_name()).changed() {
            action = ControlAction::CalcMode(m);
        }
    }
    let mut all = calc.apply_to_all();
    if ui.checkbox(&mut all, "Apply to all samples").changed() {
        action = ControlAction::ApplyToAll(all);
    }

    let summary = view.calc_summary();
    if !summary.shoulders.is_empty() || summary.heading.is_some() {
        ui.add_space(4.0);
        egui::Frame::group(ui.style()).show(ui, |ui| {
            for line in &summary.shoulders {
                ui.label(egui::RichText::new(line).size(11.5));
            }
            if let Some(heading) = &summary.heading {
                ui.label(egui::RichText::new(heading).strong());
            }
            for value in &summary.values {
                ui.label(
                    egui::RichText::new(value.text.as_str())
                        .monospace()
                        .color(colors.plot.curve(value.color)),
                );
            }
        });
    }

    ui.separator();

    // ── Normalization ──
    ui.collapsing("📈 Normalization", |ui| {
        let current = store.normalization();
        let mut peak = current == Normalization::Peak;
        if ui.checkbox(&mut peak, "Normalize at peak").changed() {
            action = ControlAction::PeakNormalization(peak);
        }
        let mut at_wavelength = matches!(current, Normalization::Wavelength(_));
        if ui.checkbox(&mut at_wavelength, "Normalize at wavelength").changed() {
            action = ControlAction::WavelengthNormalization(at_wavelength);
        }
        if !state.norm_focused {
            state.norm_input = view
                .norm_wavelength()
                .map(|w| w.to_string())
                .unwrap_or_default();
        }
        ui.horizontal(|ui| {
            ui.label("λ (nm)");
            let resp = ui.add(egui::TextEdit::singleline(&mut state.norm_input).desired_width(70.0));
            state.norm_focused = resp.has_focus();
            if resp.lost_focus() && !state.norm_input.trim().is_empty() {
                match state.norm_input.trim().parse::<f64>() {
                    Ok(w) if w.is_finite() => action = ControlAction::NormalizationWavelength(w),
                    _ => action = ControlAction::Invalid(state.norm_input.clone()),
                }
            }
        });
        if let Some(label) = view.normalization_label() {
            ui.label(egui::RichText::new(label).italics().size(11.0));
        }
    });

    // ── Layers ──
    ui.collapsing("🗂 Layers", |ui| {
        let mut layers = store.layers();
        let before = layers;
        ui.checkbox(&mut layers.lab_lines, "Lab lines");
        ui.checkbox(&mut layers.lab_points, "Lab points");
        ui.checkbox(&mut layers.instrument_lines, "Instrument lines");
        ui.checkbox(&mut layers.instrument_points, "Instrument points");
        if layers != before {
            action = ControlAction::Layers(layers);
        }

        let sets = store.filter_sets();
        if !sets.is_empty() {
            let selected = store.filter_set().unwrap_or("").to_string();
            egui::ComboBox::from_label("Filter set")
                .selected_text(selected.as_str())
                .show_ui(ui, |ui| {
                    for name in &sets {
                        if ui.selectable_label(*name == selected, name.as_str()).clicked() && *name != selected {
                            action = ControlAction::FilterSet(name.clone());
                        }
                    }
                });
        }
    });

    // ── Pointer ──
    ui.collapsing("🎯 Pointer", |ui| {
        let mut drop = view.toggles.drop_locator;
        if ui.checkbox(&mut drop, "Drop locator on click").changed() {
            action = ControlAction::DropLocator(drop);
        }
        let mut vline = view.toggles.vertical_line;
        if ui.checkbox(&mut vline, "Vertical tracking line").changed() {
            action = ControlAction::VerticalLine(vline);
        }
        if ui
            .add_enabled(!view.locators().is_empty(), egui::Button::new("🧹 Erase locators"))
            .clicked()
        {
            action = ControlAction::EraseLocators;
        }
    });

    ui.separator();

    // ── Window ──
    ui.label(egui::RichText::new("🔍 View window").strong());
    let widgets = view.view().widgets();
    egui::Grid::new("bound_fields").num_columns(4).show(ui, |ui| {
        for (i, (widget, label)) in FIELDS.iter().enumerate() {
            if state.focused != Some(*widget) {
                if let Some(field) = widgets.field(*widget) {
                    state.fields[i] = field.text.clone();
                }
            }
            ui.label(*label);
            let resp = ui.add(egui::TextEdit::singleline(&mut state.fields[i]).desired_width(60.0));
            if resp.has_focus() {
                state.focused = Some(*widget);
            } else if state.focused == Some(*widget) {
                state.focused = None;
            }
            if resp.lost_focus() {
                if let Some(field) = widgets.field(*widget) {
                    match field_commit(*widget, &state.fields[i], &field.text) {
                        ControlAction::None => {}
                        a => action = a,
                    }
                }
            }
            if i % 2 == 1 {
                ui.end_row();
            }
        }
    });

    for (widget, slider, label, decimals) in [
        (Widget::XSlider, &widgets.x_slider, "λ", 0),
        (Widget::YSlider, &widgets.y_slider, "R", 3),
    ] {
        let [lo_extent, hi_extent] = slider.extent;
        let mut values = slider.values;
        let mut changed = false;
        ui.horizontal(|ui| {
            ui.label(label);
            changed |= ui
                .add(
                    egui::Slider::new(&mut values[0], lo_extent..=hi_extent)
                        .clamping(egui::SliderClamping::Never)
                        .fixed_decimals(decimals),
                )
                .changed();
        });
        ui.horizontal(|ui| {
            ui.label(" ");
            changed |= ui
                .add(
                    egui::Slider::new(&mut values[1], lo_extent..=hi_extent)
                        .clamping(egui::SliderClamping::Never)
                        .fixed_decimals(decimals),
                )
                .changed();
        });
        if changed {
            action = ControlAction::Slider(widget, separated(values, slider.values, slider.margin));
        }
    }

    if ui.button("🔄 Reset zoom").clicked() {
        action = ControlAction::ResetZoom;
    }

    action
}

/// What leaving a bound field commits. Text equal to what the field was
/// showing is not an edit: it is a rounded copy of the window.
fn field_commit(widget: Widget, typed: &str, shown: &str) -> ControlAction {
    let typed = typed.trim();
    if typed == shown.trim() {
        return ControlAction::None;
    }
    match typed.parse::<f64>() {
        Ok(v) => ControlAction::Field(widget, v),
        Err(_) => ControlAction::Invalid(typed.to_string()),
    }
}

/// Keep the handles at least `margin` apart, moving only the one that was
/// dragged.
fn separated(values: [f64; 2], before: [f64; 2], margin: f64) -> [f64; 2] {
    let [mut lo, mut hi] = values;
    if hi - lo < margin {
        if lo != before[0] {
            lo = hi - margin;
        } else {
            hi = lo + margin;
        }
    }
    [lo, hi]
}
