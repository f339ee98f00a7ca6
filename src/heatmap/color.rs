//! Color scales and color parsing.

use crate::error::{IobioError, Result};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fill for cells without a finite value.
pub const MISSING_COLOR: RGBColor = RGBColor(211, 211, 211);

/// Continuous color scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorScale {
    /// Perceptually uniform, dark purple to yellow.
    #[default]
    #[serde(rename = "viridis")]
    Viridis,
    /// Perceptually uniform, black to pale yellow.
    #[serde(rename = "magma")]
    Magma,
    /// Diverging blue to red through light gray.
    #[serde(rename = "coolwarm")]
    Coolwarm,
    /// Diverging blue to red through white.
    #[serde(rename = "RdBu_r")]
    RdBuR,
    /// Sequential white to blue.
    #[serde(rename = "Blues")]
    Blues,
    /// Sequential white to red.
    #[serde(rename = "Reds")]
    Reds,
    /// Sequential white to black.
    #[serde(rename = "Greys")]
    Greys,
}

const VIRIDIS: [(u8, u8, u8); 5] = [(68, 1, 84), (59, 82, 139), (33, 145, 140), (94, 201, 98), (253, 231, 37)];
const MAGMA: [(u8, u8, u8); 5] = [(0, 0, 4), (81, 18, 124), (183, 55, 121), (252, 137, 97), (252, 253, 191)];
const COOLWARM: [(u8, u8, u8); 5] = [(59, 76, 192), (141, 176, 254), (221, 221, 221), (244, 154, 123), (180, 4, 38)];
const RDBU_R: [(u8, u8, u8); 5] = [(5, 48, 97), (67, 147, 195), (247, 247, 247), (214, 96, 77), (103, 0, 31)];
const BLUES: [(u8, u8, u8); 5] = [(247, 251, 255), (198, 219, 239), (107, 174, 214), (33, 113, 181), (8, 48, 107)];
const REDS: [(u8, u8, u8); 5] = [(255, 245, 240), (252, 187, 161), (251, 106, 74), (203, 24, 29), (103, 0, 13)];
const GREYS: [(u8, u8, u8); 5] = [(255, 255, 255), (217, 217, 217), (150, 150, 150), (82, 82, 82), (0, 0, 0)];

impl ColorScale {
    fn stops(&self) -> &'static [(u8, u8, u8)] {
        match self {
            ColorScale::Viridis => &VIRIDIS,
            ColorScale::Magma => &MAGMA,
            ColorScale::Coolwarm => &COOLWARM,
            ColorScale::RdBuR => &RDBU_R,
            ColorScale::Blues => &BLUES,
            ColorScale::Reds => &REDS,
            ColorScale::Greys => &GREYS,
        }
    }

    /// Color at position `t` in [0, 1], interpolated linearly between stops.
    pub fn color_at(&self, t: f64) -> RGBColor {
        if t.is_nan() {
            return MISSING_COLOR;
        }
        let stops = self.stops();
        let scaled = t.clamp(0.0, 1.0) * (stops.len() - 1) as f64;
        let lo = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - lo as f64;
        let (a, b) = (stops[lo], stops[lo + 1]);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }

    /// Color for `value` on a scale running from `vmin` to `vmax`.
    pub fn color_for(&self, value: f64, vmin: f64, vmax: f64) -> RGBColor {
        if !value.is_finite() {
            return MISSING_COLOR;
        }
        self.color_at(normalize(value, vmin, vmax))
    }
}

impl fmt::Display for ColorScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorScale::Viridis => "viridis",
            ColorScale::Magma => "magma",
            ColorScale::Coolwarm => "coolwarm",
            ColorScale::RdBuR => "RdBu_r",
            ColorScale::Blues => "Blues",
            ColorScale::Reds => "Reds",
            ColorScale::Greys => "Greys",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ColorScale {
    type Err = IobioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "viridis" => Ok(ColorScale::Viridis),
            "magma" => Ok(ColorScale::Magma),
            "coolwarm" => Ok(ColorScale::Coolwarm),
            "rdbu_r" => Ok(ColorScale::RdBuR),
            "blues" => Ok(ColorScale::Blues),
            "reds" => Ok(ColorScale::Reds),
            "greys" | "grays" => Ok(ColorScale::Greys),
            _ => Err(IobioError::Configuration(format!("Unknown color scale '{}'", s))),
        }
    }
}

/// Position of `value` between `vmin` and `vmax`, clamped to [0, 1].
///
/// A degenerate range puts every value in the middle.
pub fn normalize(value: f64, vmin: f64, vmax: f64) -> f64 {
    if vmax > vmin {
        ((value - vmin) / (vmax - vmin)).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Color limits of the finite values, symmetric around `center` if given.
///
/// Returns `(0, 1)` when nothing is finite.
pub fn color_limits<'a, I>(values: I, center: Option<f64>) -> (f64, f64)
where
    I: IntoIterator<Item = &'a f64>,
{
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return (0.0, 1.0);
    }
    match center {
        Some(c) => {
            let half = (hi - c).abs().max((lo - c).abs());
            (c - half, c + half)
        }
        None => (lo, hi),
    }
}

/// Parse a color given as `#rgb`, `#rrggbb` or a common color name.
pub fn parse_color(text: &str) -> Result<RGBColor> {
    let s = text.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| invalid_color(text));
    }
    named_color(&s.to_ascii_lowercase()).ok_or_else(|| invalid_color(text))
}

fn invalid_color(text: &str) -> IobioError {
    IobioError::Configuration(format!("Cannot parse color '{}'", text))
}

fn parse_hex(hex: &str) -> Option<RGBColor> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
            Some(RGBColor(expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Some(RGBColor(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

fn named_color(name: &str) -> Option<RGBColor> {
    let rgb = match name {
        "black" | "k" => (0, 0, 0),
        "white" | "w" => (255, 255, 255),
        "red" | "r" => (255, 0, 0),
        "green" | "g" => (0, 128, 0),
        "blue" | "b" => (0, 0, 255),
        "yellow" | "y" => (255, 255, 0),
        "cyan" | "c" => (0, 255, 255),
        "magenta" | "m" => (255, 0, 255),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "pink" => (255, 192, 203),
        "brown" => (165, 42, 42),
        "gray" | "grey" => (128, 128, 128),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "silver" => (192, 192, 192),
        "navy" => (0, 0, 128),
        "teal" => (0, 128, 128),
        "olive" => (128, 128, 0),
        "maroon" => (128, 0, 0),
        "lime" => (0, 255, 0),
        "gold" => (255, 215, 0),
        "steelblue" => (70, 130, 180),
        "skyblue" => (135, 206, 235),
        "lightblue" => (173, 216, 230),
        "darkblue" => (0, 0, 139),
        "lightgreen" => (144, 238, 144),
        "darkgreen" => (0, 100, 0),
        "darkred" => (139, 0, 0),
        "salmon" => (250, 128, 114),
        "tomato" => (255, 99, 71),
        "coral" => (255, 127, 80),
        "crimson" => (220, 20, 60),
        "orchid" => (218, 112, 214),
        "violet" => (238, 130, 238),
        "indigo" => (75, 0, 130),
        "turquoise" => (64, 224, 208),
        "tan" => (210, 180, 140),
        "khaki" => (240, 230, 140),
        "beige" => (245, 245, 220),
        "tab:blue" => (31, 119, 180),
        "tab:orange" => (255, 127, 14),
        "tab:green" => (44, 160, 44),
        "tab:red" => (214, 39, 40),
        "tab:purple" => (148, 103, 189),
        "tab:brown" => (140, 86, 75),
        "tab:pink" => (227, 119, 194),
        "tab:gray" | "tab:grey" => (127, 127, 127),
        "tab:olive" => (188, 189, 34),
        "tab:cyan" => (23, 190, 207),
        _ => return None,
    };
    Some(RGBColor(rgb.0, rgb.1, rgb.2))
}
