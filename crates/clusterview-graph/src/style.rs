//! Visual Encoding
//!
//! Maps trade volume to node radius, edge width and edge opacity, and account
//! level to node colour. All tables are immutable values; the free functions
//! use the default tables.

use serde::{Deserialize, Serialize};

/// RGBA color, serialized as `#RRGGBB` / `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_tuple(&self) -> (u8, u8, u8, u8) {
        (self.r, self.g, self.b, self.a)
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let mut it = digits.chars().map(|c| c.to_digit(16).map(|v| (v * 17) as u8));
                Some(Self::rgb(it.next()??, it.next()??, it.next()??))
            }
            6 => Some(Self::rgb(
                channel(digits.get(0..2)?)?,
                channel(digits.get(2..4)?)?,
                channel(digits.get(4..6)?)?,
            )),
            8 => Some(Self::rgba(
                channel(digits.get(0..2)?)?,
                channel(digits.get(2..4)?)?,
                channel(digits.get(4..6)?)?,
                channel(digits.get(6..8)?)?,
            )),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid color {value:?}"))
    }
}

// ============================================================================
// Color Constants
// ============================================================================

/// Level 0, the token holder: deep cherry red.
pub const COLOR_LEVEL_ANCHOR: Color = Color::rgb(0xC2, 0x18, 0x07);
/// Level 1: bright orange.
pub const COLOR_LEVEL_FIRST: Color = Color::rgb(0xFF, 0xA5, 0x00);
/// Level 2: vivid green.
pub const COLOR_LEVEL_SECOND: Color = Color::rgb(0x00, 0xD4, 0x43);
/// Deeper levels and anything unexpected.
pub const COLOR_LEVEL_DEFAULT: Color = Color::rgb(0xFF, 0xFF, 0xFF);

pub const COLOR_EDGE_LINE: Color = Color::rgb(0x94, 0x94, 0x94);
pub const COLOR_LABEL_TEXT: Color = Color::rgb(0xFF, 0xFF, 0xFF);
pub const COLOR_LABEL_OUTLINE: Color = Color::rgb(0x00, 0x00, 0x00);

pub const EDGE_LINE_OPACITY: f32 = 0.3;
pub const EDGE_OPACITY_MIN: f32 = 0.1;
pub const EDGE_OPACITY_MAX: f32 = 1.0;
const EDGE_OPACITY_LOG_SCALE: f64 = 0.2;

// ============================================================================
// Bucket Tables
// ============================================================================

/// Volume thresholds shared by node and edge sizing.
pub const VOLUME_THRESHOLDS: [f64; 6] = [10.0, 100.0, 1_000.0, 10_000.0, 100_000.0, 1_000_000.0];

/// Seven-bucket lookup table keyed on volume.
///
/// Bucket `i` covers `thresholds[i-1] <= v < thresholds[i]`; the last value is
/// returned for `v >= thresholds[5]`. In both default tables that last value
/// wraps back to the smallest size, so a whale at `$1M+` renders like a dust
/// wallet. This is kept as served; see `is_overflow`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBuckets {
    pub thresholds: [f64; 6],
    pub values: [f32; 7],
}

impl VolumeBuckets {
    pub const NODE_SIZES: Self = Self {
        thresholds: VOLUME_THRESHOLDS,
        values: [10.0, 20.0, 30.0, 50.0, 80.0, 130.0, 10.0],
    };

    pub const EDGE_SIZES: Self = Self {
        thresholds: VOLUME_THRESHOLDS,
        values: [2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 2.0],
    };

    pub fn lookup(&self, volume: f64) -> f32 {
        self.thresholds
            .iter()
            .position(|&threshold| volume < threshold)
            .map(|bucket| self.values[bucket])
            .unwrap_or(self.values[self.thresholds.len()])
    }

    /// True when `volume` falls in the top bucket (the wrap-around case).
    pub fn is_overflow(&self, volume: f64) -> bool {
        !self.thresholds.iter().any(|&threshold| volume < threshold)
    }
}

/// Colour per account level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelPalette {
    pub levels: [Color; 3],
    pub fallback: Color,
}

impl Default for LevelPalette {
    fn default() -> Self {
        Self {
            levels: [COLOR_LEVEL_ANCHOR, COLOR_LEVEL_FIRST, COLOR_LEVEL_SECOND],
            fallback: COLOR_LEVEL_DEFAULT,
        }
    }
}

impl LevelPalette {
    pub fn color(&self, level: i64) -> Color {
        usize::try_from(level)
            .ok()
            .and_then(|idx| self.levels.get(idx))
            .copied()
            .unwrap_or(self.fallback)
    }
}

/// The full encoding handed to the element builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualEncoding {
    pub node_sizes: VolumeBuckets,
    pub edge_sizes: VolumeBuckets,
    pub palette: LevelPalette,
}

impl Default for VisualEncoding {
    fn default() -> Self {
        Self {
            node_sizes: VolumeBuckets::NODE_SIZES,
            edge_sizes: VolumeBuckets::EDGE_SIZES,
            palette: LevelPalette::default(),
        }
    }
}

impl VisualEncoding {
    pub fn node_size(&self, volume: f64) -> f32 {
        self.node_sizes.lookup(volume)
    }

    pub fn edge_size(&self, volume: f64) -> f32 {
        self.edge_sizes.lookup(volume)
    }

    pub fn edge_opacity(&self, volume: f64) -> f32 {
        edge_opacity(volume)
    }

    pub fn level_color(&self, level: i64) -> Color {
        self.palette.color(level)
    }
}

// ============================================================================
// Style Functions
// ============================================================================

/// Node diameter for a trade volume.
pub fn node_size(volume: f64) -> f32 {
    VolumeBuckets::NODE_SIZES.lookup(volume)
}

/// Edge width for a link volume.
pub fn edge_size(volume: f64) -> f32 {
    VolumeBuckets::EDGE_SIZES.lookup(volume)
}

/// Larger volume, more opaque edge: `log10(v + 1) * 0.2` clamped to `[0.1, 1]`.
pub fn edge_opacity(volume: f64) -> f32 {
    if !(volume > 0.0) {
        return EDGE_OPACITY_MIN;
    }
    let scaled = (volume + 1.0).log10() * EDGE_OPACITY_LOG_SCALE;
    (scaled as f32).clamp(EDGE_OPACITY_MIN, EDGE_OPACITY_MAX)
}

pub fn level_color(level: i64) -> Color {
    LevelPalette::default().color(level)
}

/// Node label styling, constant across nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelStyle {
    pub color: Color,
    pub outline_color: Color,
    pub outline_width: f32,
    pub font_size: f32,
    pub font_bold: bool,
}

pub const NODE_LABEL_STYLE: LabelStyle = LabelStyle {
    color: COLOR_LABEL_TEXT,
    outline_color: COLOR_LABEL_OUTLINE,
    outline_width: 1.0,
    font_size: 20.0,
    font_bold: true,
};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NODE_SIZE_SET: [f32; 6] = [10.0, 20.0, 30.0, 50.0, 80.0, 130.0];

    #[test]
    fn test_node_size_buckets() {
        assert_eq!(node_size(0.0), 10.0);
        assert_eq!(node_size(9.99), 10.0);
        assert_eq!(node_size(10.0), 20.0);
        assert_eq!(node_size(99.0), 20.0);
        assert_eq!(node_size(100.0), 30.0);
        assert_eq!(node_size(1_000.0), 50.0);
        assert_eq!(node_size(10_000.0), 80.0);
        assert_eq!(node_size(100_000.0), 130.0);
        assert_eq!(node_size(999_999.0), 130.0);
    }

    #[test]
    fn test_top_bucket_wraps_to_smallest() {
        assert_eq!(node_size(1_000_000.0), 10.0);
        assert_eq!(node_size(5e9), 10.0);
        assert_eq!(edge_size(1_000_000.0), 2.0);
        assert!(VolumeBuckets::NODE_SIZES.is_overflow(1_000_000.0));
        assert!(!VolumeBuckets::NODE_SIZES.is_overflow(999_999.0));
    }

    #[test]
    fn test_edge_size_buckets() {
        let expected = [
            (5.0, 2.0),
            (50.0, 3.0),
            (500.0, 5.0),
            (5_000.0, 8.0),
            (50_000.0, 13.0),
            (500_000.0, 21.0),
        ];
        for (volume, size) in expected {
            assert_eq!(edge_size(volume), size, "volume {volume}");
        }
    }

    #[test]
    fn test_edge_opacity_examples() {
        assert_eq!(edge_opacity(0.0), 0.1);
        assert_eq!(edge_opacity(-5.0), 0.1);
        assert_eq!(edge_opacity(f64::NAN), 0.1);
        assert!((edge_opacity(100.0) - 0.4009).abs() < 1e-3);
        assert!((edge_opacity(10_000.0) - 0.8).abs() < 1e-3);
        assert_eq!(edge_opacity(1e12), 1.0);
        assert_eq!(edge_opacity(f64::INFINITY), 1.0);
    }

    #[test]
    fn test_level_colors() {
        assert_eq!(level_color(0).to_hex(), "#C21807");
        assert_eq!(level_color(1).to_hex(), "#FFA500");
        assert_eq!(level_color(2).to_hex(), "#00D443");
        assert_eq!(level_color(3), COLOR_LEVEL_DEFAULT);
        assert_eq!(level_color(-1), COLOR_LEVEL_DEFAULT);
        assert_eq!(level_color(i64::MAX), COLOR_LEVEL_DEFAULT);
    }

    #[test]
    fn test_color_hex_parsing() {
        assert_eq!(Color::from_hex("#949494"), Some(COLOR_EDGE_LINE));
        assert_eq!(Color::from_hex("fff"), Some(COLOR_LEVEL_DEFAULT));
        assert_eq!(
            Color::from_hex("#00000080"),
            Some(Color::rgba(0, 0, 0, 0x80))
        );
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#GGGGGG"), None);
    }

    #[test]
    fn test_color_serializes_as_hex() {
        let json = serde_json::to_string(&COLOR_LEVEL_FIRST).unwrap();
        assert_eq!(json, "\"#FFA500\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, COLOR_LEVEL_FIRST);
    }

    proptest! {
        #[test]
        fn prop_node_size_in_bucket_set(volume in 0.0f64..1e12) {
            prop_assert!(NODE_SIZE_SET.contains(&node_size(volume)));
        }

        #[test]
        fn prop_node_size_monotonic_below_overflow(
            a in 0.0f64..1_000_000.0,
            b in 0.0f64..1_000_000.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(node_size(lo) <= node_size(hi));
        }

        #[test]
        fn prop_node_size_overflow_is_smallest(volume in 1_000_000.0f64..1e15) {
            prop_assert_eq!(node_size(volume), 10.0);
        }

        #[test]
        fn prop_edge_opacity_bounded(volume in 0.0f64..1e15) {
            let opacity = edge_opacity(volume);
            prop_assert!((EDGE_OPACITY_MIN..=EDGE_OPACITY_MAX).contains(&opacity));
        }

        #[test]
        fn prop_edge_opacity_monotonic(a in 0.0f64..1e9, b in 0.0f64..1e9) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(edge_opacity(lo) <= edge_opacity(hi));
        }
    }
}
