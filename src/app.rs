use eframe::egui;

use mecan::state::{AppState, ProfileView, Resources};

use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct MeCanApp {
    pub resources: Resources,
    pub state: AppState,
}

impl MeCanApp {
    pub fn new(resources: Resources) -> Self {
        Self {
            resources,
            state: AppState::default(),
        }
    }

    /// Files dropped onto the window are treated like one upload, one
    /// result per file.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }

        let results: Vec<ProfileView> = dropped
            .iter()
            .filter_map(|file| {
                if let Some(path) = &file.path {
                    Some(ProfileView::from_path(path, &self.resources))
                } else if let Some(bytes) = &file.bytes {
                    let modified = file.last_modified.map(|t| {
                        chrono::DateTime::<chrono::Local>::from(t)
                            .format("%Y-%m-%d %H:%M:%S")
                            .to_string()
                    });
                    Some(ProfileView::from_bytes(
                        bytes,
                        &file.name,
                        modified,
                        &self.resources,
                    ))
                } else {
                    log::warn!("Dropped item '{}' has neither a path nor contents", file.name);
                    None
                }
            })
            .collect();

        if !results.is_empty() {
            self.state.show_uploads(results);
        }
    }
}

impl eframe::App for MeCanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state, &self.resources);
        });

        // ---- Left side panel: upload + examples ----
        egui::SidePanel::left("input_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state, &self.resources);
            });

        // ---- Central panel: one result block per profile ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Welcome to MeCan!");
            ui.separator();

            if self.state.results.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.heading("Open a profile or pick an example patient");
                });
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                for (i, view) in self.state.results.iter().enumerate() {
                    result_block(ui, i, view);
                    ui.separator();
                }
            });
        });
    }
}

fn result_block(ui: &mut egui::Ui, i: usize, view: &ProfileView) {
    ui.push_id(i, |ui| {
        panels::profile_details(ui, view);

        let Some(ranking) = &view.ranking else {
            if let Some(msg) = &view.status_message {
                ui.label(msg);
            }
            return;
        };

        ui.columns(2, |cols| {
            table::ranking_table(&mut cols[0], ranking);
            if let Some(profile) = &view.profile {
                egui::CollapsingHeader::new("Uploaded profile")
                    .default_open(true)
                    .show(&mut cols[1], |ui| table::profile_table(ui, profile));
            }
        });
        ui.add_space(8.0);
        plot::ic50_chart(ui, ranking);
    });
}
