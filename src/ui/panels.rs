use eframe::egui::{self, Color32, RichText, Ui};

use mecan::state::{AppState, ProfileSource, ProfileView, Resources};

const INTRO: &str = "Upload your gene expression profile and find out your personalized \
                     sensitivity to the common chemotherapeutic drugs.";

// ---------------------------------------------------------------------------
// Left side panel – upload and example patients
// ---------------------------------------------------------------------------

/// Render the left input panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, resources: &Resources) {
    ui.label(RichText::new(INTRO).size(16.0));
    ui.add_space(8.0);

    ui.vertical_centered_justified(|ui: &mut Ui| {
        if ui.button("Open profiles…").clicked() {
            open_file_dialog(state, resources);
        }
    });
    ui.small("…or drag and drop one or more files onto the window.");
    ui.separator();

    // ---- Example patients ----
    ui.strong("Example patients");
    let current = state
        .selected_example
        .clone()
        .unwrap_or_else(|| "Choose…".to_string());
    let mut picked = None;
    egui::ComboBox::from_id_salt("example_patient")
        .selected_text(current)
        .show_ui(ui, |ui: &mut Ui| {
            for label in resources.catalog.labels() {
                let selected = state.selected_example.as_deref() == Some(label);
                if ui.selectable_label(selected, label).clicked() {
                    picked = Some(label.to_string());
                }
            }
        });
    if let Some(label) = picked {
        state.select_example(&label, resources);
    }
    ui.separator();

    // ---- Loaded profiles ----
    ui.heading("Profiles");
    if state.results.is_empty() {
        ui.label("No profile loaded.");
    }
    for view in &state.results {
        let status = if view.ranking.is_some() {
            format!("{} genes", view.gene_count())
        } else {
            "error".to_string()
        };
        ui.label(format!("{} ({status})", view.title()));
    }
}

/// File name, last modified time, gene count and the zero-fill note of one
/// result block.
pub fn profile_details(ui: &mut Ui, view: &ProfileView) {
    match &view.source {
        ProfileSource::Upload {
            file_name,
            modified,
        } => {
            ui.strong(format!("File name: {file_name}"));
            if let Some(modified) = modified {
                ui.label(format!("Last modified time: {modified}"));
            }
        }
        ProfileSource::Example(label) => {
            ui.strong(format!("Example patient: {label}"));
        }
    }
    if let Some(profile) = &view.profile {
        ui.label(format!(
            "{} genes, {} missing values",
            profile.len(),
            profile.missing_count()
        ));
    }
    if let Some(note) = view.zero_fill_note() {
        ui.label(RichText::new(note).color(Color32::from_rgb(200, 140, 0)));
    }
    ui.add_space(4.0);
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState, resources: &Resources) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state, resources);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(format!("{} drug models loaded", resources.registry.len()));

        if !state.results.is_empty() {
            ui.separator();
            ui.label(format!("{} profiles shown", state.results.len()));
        }

        let failures = state.failures();
        if failures > 0 {
            ui.separator();
            ui.label(
                RichText::new(format!("{failures} could not be ranked")).color(Color32::RED),
            );
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState, resources: &Resources) {
    let files = rfd::FileDialog::new()
        .set_title("Open gene expression profile")
        .add_filter("Supported files", &["csv", "tsv", "xls", "xlsx", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv", "tsv"])
        .add_filter("Excel", &["xls", "xlsx"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_files();

    if let Some(paths) = files {
        state.open_files(paths.as_slice(), resources);
    }
}
