/// Plot view: paints the display list with egui_plot and turns pointer
/// input into viewer events
///
/// egui_plot's own navigation is switched off: the plot always shows the
/// window the viewer core last drew axes for, and wheel/drag/click are
/// reported in pixels relative to the plot frame so the core can map them
/// through its own scale.

use std::collections::BTreeMap;

use egui_plot::{Line, LineStyle, MarkerShape, Plot, PlotBounds, PlotPoints, PlotUi, Points, Text, VLine};
use visor_core::{MarkerKind, SeriesKey};

use super::display::DisplayList;
use super::theme::PlotColors;

/// Pointer input on the plot, in frame pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotEvent {
    Resize { width: f64, height: f64 },
    Hover { px: f64, py: f64 },
    Leave,
    Click { px: f64, py: f64 },
    Zoom { px: f64, py: f64, factor: f64 },
    Pan { dx: f64, dy: f64 },
}

#[derive(Debug, Default)]
pub struct PlotViewState {
    hovering: bool,
}

/// Wheel delta (egui points, up positive) to zoom factor.
pub fn wheel_factor(scroll_y: f32) -> f64 {
    2f64.powf(scroll_y as f64 * 0.002)
}

/// Draw the plot and collect this frame's pointer events.
pub fn show_plot(
    ui: &mut egui::Ui,
    state: &mut PlotViewState,
    display: &DisplayList,
    labels: &BTreeMap<SeriesKey, String>,
    overlay: Option<&str>,
    colors: &PlotColors,
) -> Vec<PlotEvent> {
    let window = display.window();

    let plot = Plot::new("reflectance_plot")
        .height(ui.available_height() - 4.0)
        .x_axis_label("wavelength (nm)")
        .y_axis_label("reflectance")
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .show_x(false)
        .show_y(false)
        .legend(
            egui_plot::Legend::default()
                .position(egui_plot::Corner::RightTop)
                .background_alpha(0.6),
        );

    let plot_resp = plot.show(ui, |plot_ui: &mut PlotUi| {
        if let Some(w) = window {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max([w.min_x, w.min_y], [w.max_x, w.max_y]));
        }

        // ── Curves ──
        for (key, (points, style)) in &display.curves {
            let name = labels.get(key).cloned().unwrap_or_else(|| key.to_string());
            let color = colors.curve(style.color);
            if style.lines {
                let line_style = if style.dashed {
                    LineStyle::dashed_dense()
                } else {
                    LineStyle::Solid
                };
                plot_ui.line(
                    Line::new(PlotPoints::from(points.clone()))
                        .name(&name)
                        .color(color)
                        .width(style.width)
                        .style(line_style),
                );
            }
            if style.points {
                plot_ui.points(
                    Points::new(PlotPoints::from(points.clone()))
                        .name(&name)
                        .color(color)
                        .radius(2.0),
                );
            }
        }

        // ── Markers ──
        let top = window.map(|w| w.max_y).unwrap_or(1.0);
        for locator in display.locators() {
            plot_ui.vline(
                VLine::new(locator.at[0])
                    .color(colors.locator)
                    .width(1.0)
                    .style(LineStyle::dashed_dense()),
            );
            if let Some(label) = &locator.label {
                plot_ui.text(
                    Text::new(
                        [locator.at[0], top].into(),
                        egui::RichText::new(label).size(10.5).color(colors.locator_label),
                    )
                    .anchor(egui::Align2::LEFT_TOP),
                );
            }
        }

        for (key, index, at) in display.foci() {
            let color = display
                .curves
                .get(&key)
                .map(|(_, s)| colors.curve(s.color))
                .unwrap_or(colors.pointer);
            let shape = if index == 2 {
                MarkerShape::Diamond
            } else {
                MarkerShape::Circle
            };
            plot_ui.points(
                Points::new(PlotPoints::from(vec![at]))
                    .color(color)
                    .radius(4.5)
                    .shape(shape)
                    .filled(true),
            );
        }

        if let Some(line) = display.markers.get(&MarkerKind::TrackingLine) {
            plot_ui.vline(VLine::new(line.at[0]).color(colors.tracking_line).width(1.0));
        }
        if let Some(pointer) = display.markers.get(&MarkerKind::Pointer) {
            plot_ui.points(
                Points::new(PlotPoints::from(vec![pointer.at]))
                    .color(colors.pointer)
                    .radius(5.0)
                    .shape(MarkerShape::Circle)
                    .filled(false),
            );
            if let Some(label) = &pointer.label {
                plot_ui.text(
                    Text::new(
                        pointer.at.into(),
                        egui::RichText::new(format!("  {}", label))
                            .size(11.0)
                            .color(colors.pointer_label),
                    )
                    .anchor(egui::Align2::LEFT_BOTTOM),
                );
            }
        }

        if let (Some(text), Some(w)) = (overlay, window) {
            plot_ui.text(
                Text::new(
                    [w.min_x, w.max_y].into(),
                    egui::RichText::new(text).size(11.0).italics().color(colors.overlay_text),
                )
                .anchor(egui::Align2::LEFT_TOP),
            );
        }
    });

    // ── Input ──
    let mut events = Vec::new();
    let frame = *plot_resp.transform.frame();
    let size = [frame.width() as f64, frame.height() as f64];
    if (size[0] - display.size[0]).abs() > 0.5 || (size[1] - display.size[1]).abs() > 0.5 {
        events.push(PlotEvent::Resize {
            width: size[0],
            height: size[1],
        });
    }

    let response = &plot_resp.response;
    match response.hover_pos() {
        Some(pos) => {
            let rel = pos - frame.min;
            let (px, py) = (rel.x as f64, rel.y as f64);
            state.hovering = true;

            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                events.push(PlotEvent::Zoom {
                    px,
                    py,
                    factor: wheel_factor(scroll),
                });
            }
            if response.dragged() {
                let delta = response.drag_delta();
                if delta.x != 0.0 || delta.y != 0.0 {
                    events.push(PlotEvent::Pan {
                        dx: delta.x as f64,
                        dy: delta.y as f64,
                    });
                }
            } else if response.clicked() {
                events.push(PlotEvent::Click { px, py });
            } else {
                events.push(PlotEvent::Hover { px, py });
            }
        }
        None if state.hovering => {
            state.hovering = false;
            events.push(PlotEvent::Leave);
        }
        None => {}
    }
    events
}
