//! Static form schemas and a generic renderer for them.
//!
//! Home and Settings are both tabbed forms described as data; values live
//! in a [`FormState`] keyed by field key.

use crate::theme::Palette;
use eframe::egui;
use egui::RichText;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Line {
        default: &'static str,
        placeholder: &'static str,
    },
    Spin {
        default: i64,
        min: i64,
        max: i64,
    },
    Check {
        default: bool,
    },
    Combo {
        options: &'static [&'static str],
        default: usize,
    },
    Text {
        placeholder: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Line { default, .. } => FieldValue::Text(default.to_string()),
            FieldKind::Spin { default, .. } => FieldValue::Int(default),
            FieldKind::Check { default } => FieldValue::Bool(default),
            FieldKind::Combo { default, .. } => FieldValue::Choice(default),
            FieldKind::Text { .. } => FieldValue::Text(String::new()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FormGroup {
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

#[derive(Debug, Clone, Copy)]
pub struct FormTab {
    pub title: &'static str,
    pub groups: &'static [FormGroup],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Choice(usize),
}

#[derive(Debug, Clone)]
pub struct FormState {
    tabs: &'static [FormTab],
    values: BTreeMap<&'static str, FieldValue>,
    pub active_tab: usize,
}

impl FormState {
    pub fn new(tabs: &'static [FormTab]) -> Self {
        let mut state = Self {
            tabs,
            values: BTreeMap::new(),
            active_tab: 0,
        };
        state.reset();
        state
    }

    /// Put every field back to its schema default.
    pub fn reset(&mut self) {
        self.values = self
            .fields()
            .map(|f| (f.key, f.default_value()))
            .collect();
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.tabs
            .iter()
            .flat_map(|t| t.groups.iter())
            .flat_map(|g| g.fields.iter())
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn choice(&self, key: &str) -> Option<usize> {
        match self.values.get(key) {
            Some(FieldValue::Choice(i)) => Some(*i),
            _ => None,
        }
    }

    /// Set a value. Unknown keys and mismatched types are ignored.
    pub fn set(&mut self, key: &str, value: FieldValue) -> bool {
        match self.values.get_mut(key) {
            Some(slot) if std::mem::discriminant(slot) == std::mem::discriminant(&value) => {
                *slot = value;
                true
            }
            _ => false,
        }
    }

    /// Labels of required fields that are blank
    pub fn missing_required(&self) -> Vec<&'static str> {
        self.fields()
            .filter(|f| f.required)
            .filter(|f| matches!(self.text(f.key), Some(s) if s.trim().is_empty()))
            .map(|f| f.label)
            .collect()
    }

    /// Draw the active tab. Returns keys whose value changed this frame.
    pub fn show(&mut self, ui: &mut egui::Ui, palette: &Palette) -> Vec<&'static str> {
        let mut changed = Vec::new();

        ui.horizontal(|ui| {
            for (i, tab) in self.tabs.iter().enumerate() {
                if ui
                    .selectable_label(self.active_tab == i, RichText::new(tab.title).size(14.0))
                    .clicked()
                {
                    self.active_tab = i;
                }
            }
        });
        ui.add_space(8.0);

        let Some(tab) = self.tabs.get(self.active_tab) else {
            return changed;
        };

        egui::ScrollArea::vertical()
            .id_source(("form_scroll", tab.title))
            .show(ui, |ui| {
                for group in tab.groups {
                    egui::Frame::none()
                        .fill(palette.card_bg)
                        .stroke(egui::Stroke::new(1.0, palette.border))
                        .rounding(egui::Rounding::same(8.0))
                        .inner_margin(egui::Margin::same(16.0))
                        .show(ui, |ui| {
                            ui.set_width(ui.available_width());
                            ui.label(RichText::new(group.title).strong().size(15.0));
                            ui.add_space(6.0);
                            egui::Grid::new(("form_grid", group.title))
                                .num_columns(2)
                                .spacing([16.0, 10.0])
                                .show(ui, |ui| {
                                    for field in group.fields {
                                        let label = if field.required {
                                            format!("{} *", field.label)
                                        } else {
                                            field.label.to_string()
                                        };
                                        ui.label(RichText::new(label).color(palette.text_muted));
                                        if let Some(value) = self.values.get_mut(field.key) {
                                            if show_field(ui, field, value) {
                                                changed.push(field.key);
                                            }
                                        }
                                        ui.end_row();
                                    }
                                });
                        });
                    ui.add_space(10.0);
                }
            });

        changed
    }
}

fn show_field(ui: &mut egui::Ui, field: &FieldSpec, value: &mut FieldValue) -> bool {
    match (&field.kind, value) {
        (FieldKind::Line { placeholder, .. }, FieldValue::Text(s)) => ui
            .add(
                egui::TextEdit::singleline(s)
                    .hint_text(*placeholder)
                    .desired_width(280.0),
            )
            .changed(),
        (FieldKind::Text { placeholder }, FieldValue::Text(s)) => ui
            .add(
                egui::TextEdit::multiline(s)
                    .hint_text(*placeholder)
                    .desired_rows(3)
                    .desired_width(280.0),
            )
            .changed(),
        (FieldKind::Spin { min, max, .. }, FieldValue::Int(n)) => ui
            .add(egui::DragValue::new(n).clamp_range(*min..=*max))
            .changed(),
        (FieldKind::Check { .. }, FieldValue::Bool(b)) => ui.checkbox(b, "").changed(),
        (FieldKind::Combo { options, .. }, FieldValue::Choice(selected)) => {
            let before = *selected;
            egui::ComboBox::from_id_source(("combo", field.key))
                .selected_text(options.get(*selected).copied().unwrap_or_default())
                .width(200.0)
                .show_ui(ui, |ui| {
                    for (i, option) in options.iter().enumerate() {
                        ui.selectable_value(selected, i, *option);
                    }
                });
            *selected != before
        }
        _ => false,
    }
}
