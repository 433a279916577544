//! Control Panel Widget
//! Left side panel with the data source and the report filters.

use crate::data::FilterSelection;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// A multi-select control: every option with its checked state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiSelect {
    pub options: Vec<String>,
    pub checked: Vec<bool>,
}

impl MultiSelect {
    pub fn new(options: Vec<String>, checked_by_default: bool) -> Self {
        let checked = vec![checked_by_default; options.len()];
        Self { options, checked }
    }

    /// Checked options, in option order.
    pub fn selected(&self) -> Vec<String> {
        self.options
            .iter()
            .zip(self.checked.iter())
            .filter(|(_, &checked)| checked)
            .map(|(option, _)| option.clone())
            .collect()
    }

    /// Draw as a column of checkboxes. Returns true when anything changed.
    fn show(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;
        for (option, checked) in self.options.iter().zip(self.checked.iter_mut()) {
            changed |= ui.checkbox(checked, option.as_str()).changed();
        }
        changed
    }
}

/// Left side control panel with file selection and filters.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub months: Vec<String>,
    pub selected_month: usize,
    pub cities: MultiSelect,
    pub genders: MultiSelect,
    pub customer_types: MultiSelect,
    pub status: String,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            csv_path: None,
            months: Vec::new(),
            selected_month: 0,
            cities: MultiSelect::default(),
            genders: MultiSelect::default(),
            customer_types: MultiSelect::default(),
            status: "Ready".to_string(),
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the filter options after a table load.
    ///
    /// Defaults: first month, every city, no gender and no customer type.
    pub fn update_options(
        &mut self,
        months: Vec<String>,
        cities: Vec<String>,
        genders: Vec<String>,
        customer_types: Vec<String>,
    ) {
        self.months = months;
        self.selected_month = 0;
        self.cities = MultiSelect::new(cities, true);
        self.genders = MultiSelect::new(genders, false);
        self.customer_types = MultiSelect::new(customer_types, false);
    }

    /// Current selection, or `None` before any month is available.
    pub fn selection(&self) -> Option<FilterSelection> {
        let month = self.months.get(self.selected_month)?;
        Some(FilterSelection {
            month: month.clone(),
            cities: self.cities.selected(),
            genders: self.genders.selected(),
            customer_types: self.customer_types.selected(),
        })
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📈 Dashboard de Vendas")
                    .size(20.0)
                    .color(Color32::from_rgb(246, 51, 102)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Dados").size(14.0).strong());
        ui.add_space(5.0);

        let path_text = self
            .csv_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "No file selected".to_string());
        ui.label(RichText::new(path_text).size(12.0));

        ui.horizontal(|ui| {
            if ui.button("Browse...").clicked() {
                action = ControlPanelAction::BrowseCsv;
            }
            if ui
                .add_enabled(self.csv_path.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                action = ControlPanelAction::Reload;
            }
        });

        ui.add_space(10.0);
        ui.separator();

        // ===== Filters Section =====
        ui.label(RichText::new("⚙ Configurações").size(14.0).strong());
        ui.add_space(5.0);

        let mut changed = false;

        let current_month = self
            .months
            .get(self.selected_month)
            .cloned()
            .unwrap_or_default();
        ComboBox::from_label("Mês")
            .selected_text(current_month)
            .show_ui(ui, |ui| {
                for (i, month) in self.months.iter().enumerate() {
                    changed |= ui
                        .selectable_value(&mut self.selected_month, i, month.as_str())
                        .changed();
                }
            });

        ui.add_space(8.0);
        ui.label(RichText::new("Filial").strong());
        changed |= self.cities.show(ui);

        ui.add_space(8.0);
        ui.label(RichText::new("Gênero").strong());
        changed |= self.genders.show(ui);

        ui.add_space(8.0);
        ui.label(RichText::new("Tipo de Cliente").strong());
        changed |= self.customer_types.show(ui);

        if changed {
            action = ControlPanelAction::SelectionChanged;
        }

        ui.add_space(10.0);
        ui.separator();

        // ===== Export Section =====
        ui.vertical_centered(|ui| {
            let export_button = egui::Button::new(RichText::new("🖼 Export SVG").size(14.0))
                .min_size(egui::vec2(150.0, 30.0));
            if ui.add_enabled(self.export_enabled, export_button).clicked() {
                action = ControlPanelAction::ExportSvg;
            }
        });

        ui.add_space(10.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    Reload,
    SelectionChanged,
    ExportSvg,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn no_selection_before_load() {
        assert!(ControlPanel::new().selection().is_none());
    }

    #[test]
    fn defaults_after_load() {
        let mut panel = ControlPanel::new();
        panel.update_options(
            strings(&["2019-1", "2019-2"]),
            strings(&["Yangon", "Mandalay"]),
            strings(&["Female", "Male"]),
            strings(&["Member", "Normal"]),
        );

        let selection = panel.selection().unwrap();
        assert_eq!(selection.month, "2019-1");
        assert_eq!(selection.cities, strings(&["Yangon", "Mandalay"]));
        assert!(selection.genders.is_empty());
        assert!(selection.customer_types.is_empty());
    }

    #[test]
    fn selection_follows_checks() {
        let mut panel = ControlPanel::new();
        panel.update_options(
            strings(&["2019-1", "2019-2"]),
            strings(&["Yangon", "Mandalay"]),
            strings(&["Female", "Male"]),
            strings(&["Member", "Normal"]),
        );
        panel.selected_month = 1;
        panel.cities.checked[0] = false;
        panel.genders.checked[1] = true;

        let selection = panel.selection().unwrap();
        assert_eq!(selection.month, "2019-2");
        assert_eq!(selection.cities, strings(&["Mandalay"]));
        assert_eq!(selection.genders, strings(&["Male"]));
    }
}
