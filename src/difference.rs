use image::{Luma, Rgba};
use serde::{Deserialize, Serialize};

/// Color distance between a candidate pixel and the seed color, on a
/// 0..=255 scale.  The fill engine claims a pixel when the distance is at
/// most its threshold, so 0 must mean "identical" for threshold 0 to mean
/// exact match.
pub trait ColorDifference<P> {
    fn difference(&self, pixel: &P, reference: &P) -> u8;
}

impl<P, F> ColorDifference<P> for F
where
    F: Fn(&P, &P) -> u8,
{
    fn difference(&self, pixel: &P, reference: &P) -> u8 {
        self(pixel, reference)
    }
}

/// Built-in distance metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    /// Largest absolute per-channel difference, alpha included.
    #[default]
    MaxChannel,
    /// RGB Euclidean distance rescaled to 0..=255, never below the alpha
    /// difference.
    Euclidean,
}

impl DifferenceKind {
    pub fn all() -> &'static [DifferenceKind] {
        &[DifferenceKind::MaxChannel, DifferenceKind::Euclidean]
    }

    pub fn label(&self) -> &'static str {
        match self {
            DifferenceKind::MaxChannel => "max",
            DifferenceKind::Euclidean => "euclidean",
        }
    }
}

// Longest RGB diagonal: sqrt(3) * 255
const RGB_DIAGONAL: f32 = 441.672_94;

impl ColorDifference<Rgba<u8>> for DifferenceKind {
    fn difference(&self, pixel: &Rgba<u8>, reference: &Rgba<u8>) -> u8 {
        let p = pixel.0;
        let r = reference.0;

        // Both transparent: color channels are meaningless, treat as equal.
        if p[3] == 0 && r[3] == 0 {
            return 0;
        }
        let alpha = p[3].abs_diff(r[3]);
        if p[3] == 0 || r[3] == 0 {
            return alpha;
        }

        match self {
            DifferenceKind::MaxChannel => p[0]
                .abs_diff(r[0])
                .max(p[1].abs_diff(r[1]))
                .max(p[2].abs_diff(r[2]))
                .max(alpha),
            DifferenceKind::Euclidean => {
                let dr = p[0] as f32 - r[0] as f32;
                let dg = p[1] as f32 - r[1] as f32;
                let db = p[2] as f32 - r[2] as f32;
                let dist = (dr * dr + dg * dg + db * db).sqrt();
                let scaled = (dist * 255.0 / RGB_DIAGONAL).round().min(255.0) as u8;
                scaled.max(alpha)
            }
        }
    }
}

impl ColorDifference<Luma<u8>> for DifferenceKind {
    fn difference(&self, pixel: &Luma<u8>, reference: &Luma<u8>) -> u8 {
        pixel.0[0].abs_diff(reference.0[0])
    }
}
