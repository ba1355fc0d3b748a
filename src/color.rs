use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Sensitivity colour ramp
// ---------------------------------------------------------------------------

const MOST_SENSITIVE_HUE: f32 = 120.0;
const LEAST_SENSITIVE_HUE: f32 = 0.0;

/// `n` colours running from green (rank 1) to red (rank `n`).
pub fn sensitivity_palette(n: usize) -> Vec<Color32> {
    let span = n.saturating_sub(1).max(1) as f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / span;
            let hue = MOST_SENSITIVE_HUE + (LEAST_SENSITIVE_HUE - MOST_SENSITIVE_HUE) * t;
            let hsl = Hsl::new(hue, 0.65, 0.5);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_runs_green_to_red() {
        let colors = sensitivity_palette(10);
        assert_eq!(colors.len(), 10);
        let first = colors[0];
        let last = colors[9];
        assert!(first.g() > first.r());
        assert!(last.r() > last.g());
    }

    #[test]
    fn single_and_empty() {
        assert!(sensitivity_palette(0).is_empty());
        let one = sensitivity_palette(1);
        assert!(one[0].g() > one[0].r());
    }
}
