use serde::{Deserialize, Serialize};

use crate::difference::DifferenceKind;

/// User-facing fill settings, as a tool panel or the CLI would keep them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillOptions {
    /// Largest accepted color difference, 0 = exact match.
    pub threshold: u8,
    /// Report a seed outside the bounds as an error instead of filling
    /// nothing.
    pub strict: bool,
    pub difference: DifferenceKind,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            threshold: 0,
            strict: false,
            difference: DifferenceKind::MaxChannel,
        }
    }
}
