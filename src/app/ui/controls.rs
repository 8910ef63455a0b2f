use std::time::Instant;

use eframe::egui::{self, Align, Key, Layout, Response, RichText, Ui};

use disease_explorer::model::{FilterPatch, InterpretabilityFilter};

use super::super::ExplorerApp;

const SLIDER_KEY_BASE_RATE: f64 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f64 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f64 = 40.0;

const LIMIT_OPTIONS: [usize; 6] = [100, 200, 500, 1000, 2000, 5000];
/// Slider ceiling while the dataset statistics are unknown.
const FALLBACK_WEIGHT_MAX: f64 = 20_000.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f64,
    negative_secs: f64,
}

fn slider_key_accel_multiplier(hold_secs: f64) -> f64 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Accelerates arrow-key adjustment of a focused slider. Returns `true` while
/// an arrow key is held.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f64,
    min: f64,
    max: f64,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            f64::from(input.stable_dt.min(0.1)),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = f64::from(i8::from(increase_down) - i8::from(decrease_down));
    if direction == 0.0 {
        return increase_down || decrease_down;
    }

    let hold_secs = if direction > 0.0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let step = ((max - min) / 200.0).max(0.0005);
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    *value = (*value + direction * step * speed * delta_time).clamp(min, max);

    ui.ctx().request_repaint();
    true
}

impl ExplorerApp {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Explore");
        ui.separator();
        ui.add_space(4.0);

        self.draw_search(ui);
        ui.separator();
        self.draw_weight_filter(ui);
        ui.separator();
        self.draw_interpretability_filter(ui);
        ui.separator();
        self.draw_limit_filter(ui);

        ui.add_space(6.0);
        if ui
            .add_enabled(!self.explorer.is_loading(), egui::Button::new("Reset filters"))
            .on_hover_text("Restore the initial weight, interpretability and limit.")
            .clicked()
        {
            self.weight_draft = None;
            self.explorer.reset_filters(&mut self.canvas);
        }
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Search diseases").strong());
        ui.horizontal(|ui| {
            let response = ui
                .text_edit_singleline(&mut self.search_input)
                .on_hover_text("Type a disease name; pick a suggestion to jump to it.");
            if response.changed() {
                self.explorer.set_query(&self.search_input, Instant::now());
            }
            if self.explorer.is_searching() {
                ui.spinner();
            }
        });

        let mut chosen = None;
        let results = self.explorer.search_results();
        if !results.is_empty() {
            egui::ScrollArea::vertical()
                .id_salt("search_results_scroll")
                .max_height(220.0)
                .auto_shrink([false, true])
                .show_rows(ui, 22.0, results.len(), |ui, row_range| {
                    for candidate in &results[row_range] {
                        ui.horizontal(|ui| {
                            if ui.selectable_label(false, candidate.label.as_str()).clicked() {
                                chosen = Some(candidate.id.clone());
                            }
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                ui.weak(format!("{} relations", candidate.relation_count));
                            });
                        });
                    }
                });
        } else if !self.explorer.query().trim().is_empty() && !self.explorer.is_searching() {
            ui.weak("No matching diseases.");
        }

        if let Some(id) = chosen {
            self.search_input.clear();
            self.explorer.choose_candidate(&id, &mut self.canvas);
        }
    }

    fn draw_weight_filter(&mut self, ui: &mut Ui) {
        let loading = self.explorer.is_loading();
        let active = self.explorer.active_filter().min_weight;
        let statistics = self.explorer.statistics();
        let (min, max) = statistics
            .weight_bounds()
            .unwrap_or((0.0, FALLBACK_WEIGHT_MAX));
        let (min, max) = (min.min(active), max.max(active));
        let summary = statistics.summary();
        let marks = statistics.percentile_marks();

        ui.label(RichText::new("Minimum weight").strong());
        let mut value = self.weight_draft.unwrap_or(active);
        let slider = ui
            .add_enabled(
                !loading,
                egui::Slider::new(&mut value, min..=max)
                    .text("weight")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Hide relations whose weight is below this value.");
        let keys_held = apply_slider_arrow_acceleration(ui, &slider, &mut value, min, max);

        if slider.dragged() || keys_held {
            self.weight_draft = Some(value);
        } else {
            self.weight_draft = None;
            if (value - active).abs() > f64::EPSILON {
                self.explorer
                    .set_filter(FilterPatch::min_weight(value), &mut self.canvas);
            }
        }
        ui.label(format!("Current: {active:.2}"));

        ui.label(format!("Range: {}", summary.weight_range));
        for row in &summary.percentiles {
            ui.horizontal(|ui| {
                ui.label(row.label);
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.label(row.value.as_str());
                });
            });
        }

        let mut quick = None;
        ui.horizontal_wrapped(|ui| {
            if ui
                .add_enabled(!loading, egui::Button::new("All").selected(active == 0.0))
                .clicked()
            {
                quick = Some(0.0);
            }
            for (label, weight) in &marks {
                let button = egui::Button::new(*label).selected((active - weight).abs() < f64::EPSILON);
                if ui
                    .add_enabled(!loading, button)
                    .on_hover_text(format!("{weight:.2}"))
                    .clicked()
                {
                    quick = Some(*weight);
                }
            }
        });
        if let Some(weight) = quick {
            self.weight_draft = None;
            self.explorer
                .set_filter(FilterPatch::min_weight(weight), &mut self.canvas);
        }
    }

    fn draw_interpretability_filter(&mut self, ui: &mut Ui) {
        let active = self.explorer.active_filter().interpretability;
        let mut selected = active;

        ui.label(RichText::new("Interpretability").strong());
        ui.add_enabled_ui(!self.explorer.is_loading(), |ui| {
            egui::ComboBox::from_id_salt("interpretability_filter")
                .selected_text(selected.label())
                .show_ui(ui, |ui| {
                    for option in InterpretabilityFilter::ALL {
                        ui.selectable_value(&mut selected, option, option.label());
                    }
                });
        });

        for share in &self.explorer.statistics().summary().shares {
            ui.horizontal(|ui| {
                ui.label(format!("{} ({})", share.label, share.count));
                ui.add(
                    egui::ProgressBar::new(share.fraction)
                        .desired_width(120.0)
                        .text(share.percentage.as_str()),
                );
            });
        }

        if selected != active {
            self.explorer
                .set_filter(FilterPatch::interpretability(selected), &mut self.canvas);
        }
    }

    fn draw_limit_filter(&mut self, ui: &mut Ui) {
        let active = self.explorer.active_filter().limit;
        let cap = self.explorer.edge_cap();
        let mut selected = active;

        ui.label(RichText::new("Edge limit").strong());
        ui.add_enabled_ui(!self.explorer.is_loading(), |ui| {
            egui::ComboBox::from_id_salt("limit_filter")
                .selected_text(format!("{active} edges"))
                .show_ui(ui, |ui| {
                    for option in LIMIT_OPTIONS.into_iter().filter(|option| *option <= cap) {
                        ui.selectable_value(&mut selected, option, format!("{option} edges"));
                    }
                });
        });
        ui.weak("Fewer edges keep the graph responsive.");

        if selected != active {
            self.explorer
                .set_filter(FilterPatch::limit(selected), &mut self.canvas);
        }
    }

    pub(in crate::app) fn draw_canvas_toolbar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            let active = self.explorer.active_layout().name;
            let mut chosen = None;
            egui::ComboBox::from_id_salt("layout_select")
                .selected_text(self.explorer.active_layout().label)
                .show_ui(ui, |ui| {
                    for entry in self.explorer.layouts().entries() {
                        if ui.selectable_label(entry.name == active, entry.label).clicked() {
                            chosen = Some(entry.name);
                        }
                    }
                });
            if let Some(name) = chosen {
                self.explorer.set_layout(name, &mut self.canvas);
            }

            if ui.button("Fit view").clicked() {
                self.explorer.fit_view(&mut self.canvas);
            }
            if ui.button("Reset zoom").clicked() {
                self.explorer.reset_zoom(&mut self.canvas);
            }

            ui.separator();
            let export = ui
                .add_enabled(!self.export_requested, egui::Button::new("Export"))
                .on_hover_text(format!("Save the canvas as {}", self.export_path.display()));
            if export.clicked() {
                self.request_export(ui.ctx());
            }
            if let Some(status) = &self.export_status {
                ui.weak(status.as_str());
            }
        });
    }
}
