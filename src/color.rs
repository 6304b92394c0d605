use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Continuous colour scales for heatmaps
// ---------------------------------------------------------------------------

/// Anchor colours of a viridis-like scale (dark purple → yellow).
const SEQUENTIAL: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Blue → white → red, for values in [-1, 1].
const DIVERGING: [(u8, u8, u8); 3] = [(33, 102, 172), (247, 247, 247), (178, 24, 43)];

/// Piecewise-linear interpolation between anchors in linear RGB.
fn interpolate(anchors: &[(u8, u8, u8)], t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let segments = (anchors.len() - 1) as f32;
    let pos = t * segments;
    let i = (pos.floor() as usize).min(anchors.len() - 2);
    let local = pos - i as f32;

    let lin = |(r, g, b): (u8, u8, u8)| -> LinSrgb {
        Srgb::new(r, g, b).into_format::<f32>().into_linear()
    };
    let mixed = lin(anchors[i]).mix(lin(anchors[i + 1]), local);
    to_color32(Srgb::from_linear(mixed))
}

/// Colour for `value` on a sequential scale spanning `[min, max]`.
///
/// NaN maps to grey; a degenerate range maps everything to the low end.
pub fn sequential(value: f64, min: f64, max: f64) -> Color32 {
    if value.is_nan() {
        return Color32::GRAY;
    }
    let range = max - min;
    let t = if range.abs() < f64::EPSILON {
        0.0
    } else {
        ((value - min) / range) as f32
    };
    interpolate(&SEQUENTIAL, t)
}

/// Colour for a correlation coefficient in `[-1, 1]`; NaN maps to grey.
pub fn diverging(value: f64) -> Color32 {
    if value.is_nan() {
        return Color32::GRAY;
    }
    interpolate(&DIVERGING, ((value + 1.0) / 2.0) as f32)
}

/// Black or white, whichever reads better on `background`.
pub fn text_on(background: Color32) -> Color32 {
    let [r, g, b, _] = background.to_array();
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 140.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        assert_ne!(p[0], p[1]);
    }

    #[test]
    fn test_scale_endpoints() {
        assert_eq!(sequential(0.0, 0.0, 10.0), Color32::from_rgb(68, 1, 84));
        assert_eq!(sequential(10.0, 0.0, 10.0), Color32::from_rgb(253, 231, 37));
        assert_eq!(diverging(-1.0), Color32::from_rgb(33, 102, 172));
        assert_eq!(diverging(1.0), Color32::from_rgb(178, 24, 43));
        assert_eq!(diverging(f64::NAN), Color32::GRAY);
        // out-of-range values clamp
        assert_eq!(sequential(50.0, 0.0, 10.0), sequential(10.0, 0.0, 10.0));
    }

    #[test]
    fn test_text_contrast() {
        assert_eq!(text_on(Color32::from_rgb(253, 231, 37)), Color32::BLACK);
        assert_eq!(text_on(Color32::from_rgb(68, 1, 84)), Color32::WHITE);
    }
}
