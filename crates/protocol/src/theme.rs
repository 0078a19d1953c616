use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    Background,
    Border,

    // Time gauge
    HeaderBackground,
    TickMajor,
    TickMinor,
    TickLabel,

    // Rows
    RowBackground,
    RowBackgroundAlt,
    Stripe,
    StripeBorder,

    // Keyframes
    Keyframe,
    KeyframeSelected,
    KeyframeLocked,
    KeyframeBorder,

    // Overlays
    SelectionFill,
    SelectionBorder,
    TimeCursor,
    TimeCursorHandle,
}
