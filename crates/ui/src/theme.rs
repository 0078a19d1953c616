use keyline_protocol::ThemeToken;

/// Resolved RGBA color for egui rendering.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ResolvedColor {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

pub fn resolve(token: ThemeToken, mode: ThemeMode) -> egui::Color32 {
    match mode {
        ThemeMode::Dark => resolve_dark(token),
        ThemeMode::Light => resolve_light(token),
    }
    .to_color32()
}

fn resolve_dark(token: ThemeToken) -> ResolvedColor {
    // Catppuccin Mocha palette
    use ThemeToken::*;
    match token {
        Background => ResolvedColor::rgb(0x11, 0x11, 0x1b), // Crust
        Border => ResolvedColor::rgb(0x31, 0x32, 0x44),     // Surface0

        HeaderBackground => ResolvedColor::rgb(0x18, 0x18, 0x25), // Mantle
        TickMajor => ResolvedColor::rgba(0x45, 0x47, 0x5a, 200), // Surface1
        TickMinor => ResolvedColor::rgb(0x6c, 0x70, 0x86),       // Overlay0
        TickLabel => ResolvedColor::rgb(0xba, 0xc2, 0xde),       // Subtext1

        // Rows are painted over the gridlines, so they stay translucent.
        RowBackground => ResolvedColor::rgba(0x1e, 0x1e, 0x2e, 90), // Base
        RowBackgroundAlt => ResolvedColor::rgba(0x31, 0x32, 0x44, 90),
        Stripe => ResolvedColor::rgba(0xb4, 0xbe, 0xfe, 70), // Lavender
        StripeBorder => ResolvedColor::rgb(0xb4, 0xbe, 0xfe),

        Keyframe => ResolvedColor::rgb(0xfa, 0xb3, 0x87),         // Peach
        KeyframeSelected => ResolvedColor::rgb(0x89, 0xb4, 0xfa), // Blue
        KeyframeLocked => ResolvedColor::rgb(0x7f, 0x84, 0x9c),   // Overlay1
        KeyframeBorder => ResolvedColor::rgb(0x11, 0x11, 0x1b),

        SelectionFill => ResolvedColor::rgba(0x89, 0xb4, 0xfa, 50),
        SelectionBorder => ResolvedColor::rgb(0x89, 0xb4, 0xfa),

        TimeCursor => ResolvedColor::rgb(0xf3, 0x8b, 0xa8), // Red
        TimeCursorHandle => ResolvedColor::rgb(0xf3, 0x8b, 0xa8),
    }
}

fn resolve_light(token: ThemeToken) -> ResolvedColor {
    use ThemeToken::*;
    match token {
        Background => ResolvedColor::rgb(255, 255, 255),
        Border => ResolvedColor::rgb(210, 210, 220),

        HeaderBackground => ResolvedColor::rgb(240, 240, 245),
        TickMajor => ResolvedColor::rgba(200, 200, 210, 220),
        TickMinor => ResolvedColor::rgb(150, 150, 160),
        TickLabel => ResolvedColor::rgb(40, 40, 50),

        RowBackground => ResolvedColor::rgba(250, 250, 252, 90),
        RowBackgroundAlt => ResolvedColor::rgba(225, 225, 235, 90),
        Stripe => ResolvedColor::rgba(50, 110, 220, 50),
        StripeBorder => ResolvedColor::rgb(50, 110, 220),

        Keyframe => ResolvedColor::rgb(230, 150, 20),
        KeyframeSelected => ResolvedColor::rgb(40, 120, 200),
        KeyframeLocked => ResolvedColor::rgb(160, 160, 170),
        KeyframeBorder => ResolvedColor::rgb(40, 40, 50),

        SelectionFill => ResolvedColor::rgba(66, 135, 245, 40),
        SelectionBorder => ResolvedColor::rgb(66, 135, 245),

        TimeCursor => ResolvedColor::rgb(220, 60, 20),
        TimeCursorHandle => ResolvedColor::rgb(220, 60, 20),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_fills_are_translucent() {
        for mode in [ThemeMode::Dark, ThemeMode::Light] {
            assert!(resolve(ThemeToken::RowBackground, mode).a() < 255);
            assert!(resolve(ThemeToken::RowBackgroundAlt, mode).a() < 255);
            assert_eq!(resolve(ThemeToken::Keyframe, mode).a(), 255);
        }
    }
}
