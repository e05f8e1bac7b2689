use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// A color in canonical `#rrggbb` form (lowercase).
///
/// Hosts report colors in whatever form their style system uses; picker
/// state stays consistent because everything is normalized through here on
/// the way in. Both hex (`#RGB`, `#RRGGBB`, any case) and component
/// triplets (`rgb(255, 0, 0)`) parse losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor {
    r: u8,
    g: u8,
    b: u8,
}

fn rgb_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^rgb\((\d{1,3}),\s*(\d{1,3}),\s*(\d{1,3})\)$").expect("static pattern")
    })
}

impl HexColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a host-reported color string. Returns `None` for anything that
    /// is not a recognizable hex or `rgb()` form.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Some(hex) = input.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        if let Some(caps) = rgb_pattern().captures(input) {
            let component = |i: usize| caps.get(i)?.as_str().parse::<u16>().ok();
            let (r, g, b) = (component(1)?, component(2)?, component(3)?);
            if r > 255 || g > 255 || b > 255 {
                return None;
            }
            return Some(Self::new(r as u8, g as u8, b as u8));
        }
        None
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        let nibble = |c: char| c.to_digit(16).map(|d| d as u8);
        let chars: Vec<u8> = hex.chars().map(nibble).collect::<Option<_>>()?;
        match chars.as_slice() {
            // #rgb shorthand doubles each nibble
            [r, g, b] => Some(Self::new(r * 17, g * 17, b * 17)),
            [r1, r2, g1, g2, b1, b2] => {
                Some(Self::new(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2))
            }
            _ => None,
        }
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
