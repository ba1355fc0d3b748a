use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Plot};

use mecan::rank::Ranking;

use crate::color::sensitivity_palette;

// ---------------------------------------------------------------------------
// Predicted IC50 bar chart (central panel, below the table)
// ---------------------------------------------------------------------------

/// One bar per ranked drug, coloured from most (green) to least (red)
/// sensitive.
pub fn ic50_chart(ui: &mut Ui, ranking: &Ranking) {
    let colors = sensitivity_palette(ranking.len());

    let bars: Vec<Bar> = ranking
        .entries
        .iter()
        .zip(colors)
        .map(|(entry, color)| {
            Bar::new(entry.rank as f64, entry.ic50)
                .name(&entry.drug)
                .fill(color)
                .width(0.7)
        })
        .collect();

    Plot::new("ic50_plot")
        .legend(Legend::default())
        .x_axis_label("Rank")
        .y_axis_label("Predicted IC50")
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Predicted IC50"));
        });
}
