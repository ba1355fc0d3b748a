use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use mecan::data::profile::Profile;
use mecan::rank::Ranking;

// ---------------------------------------------------------------------------
// Ranking table (central panel)
// ---------------------------------------------------------------------------

/// Render the ranked drugs: Rank, Drug Name, IC50, Ten Most Important Genes.
pub fn ranking_table(ui: &mut Ui, ranking: &Ranking) {
    TableBuilder::new(ui)
        .id_salt("ranking_table")
        .striped(true)
        .resizable(true)
        .vscroll(false)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(40.0))
        .column(Column::auto().at_least(140.0))
        .column(Column::auto().at_least(80.0))
        .column(Column::remainder())
        .header(22.0, |mut header| {
            for title in ["Rank", "Drug Name", "IC50", "Ten Most Important Genes"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for entry in &ranking.entries {
                body.row(20.0, |mut row| {
                    row.col(|ui| {
                        ui.label(entry.rank.to_string());
                    });
                    row.col(|ui| {
                        ui.label(&entry.drug);
                    });
                    row.col(|ui| {
                        ui.monospace(format!("{:.4}", entry.ic50));
                    });
                    row.col(|ui| {
                        ui.label(&entry.important_genes);
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Uploaded profile table
// ---------------------------------------------------------------------------

/// The profile as uploaded: one row per gene, missing values shown as "NA".
pub fn profile_table(ui: &mut Ui, profile: &Profile) {
    let row_height = 18.0;
    TableBuilder::new(ui)
        .id_salt("profile_table")
        .striped(true)
        .vscroll(true)
        .max_scroll_height(240.0)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(100.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["Gene", "Expression"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(row_height, profile.len(), |mut row| {
                let Some((gene, value)) = profile.row(row.index()) else {
                    return;
                };
                row.col(|ui| {
                    ui.label(gene);
                });
                row.col(|ui| match value {
                    Some(v) => {
                        ui.monospace(format!("{v:.4}"));
                    }
                    None => {
                        ui.weak("NA");
                    }
                });
            });
        });
}
