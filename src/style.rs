//! Style reader – interprets the computed style captured for each element
//! into the handful of properties the default walker paints with.

use crate::dom::ElementNode;

/// The subset of an element's computed style the walker uses.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    pub display: Display,
    pub position: Position,
    pub float: bool,
    pub visibility_hidden: bool,
    /// `None` for `z-index: auto`.
    pub z_index: Option<i32>,
    pub opacity: f64,
    pub overflow: Overflow,

    pub background_color: Option<String>,
    pub border_width: f64,
    pub border_color: String,
    pub border_radius: f64,

    pub color: String,
    pub font_family: Option<String>,
    pub font_size: Option<String>,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Inline,
            position: Position::Static,
            float: false,
            visibility_hidden: false,
            z_index: None,
            opacity: 1.0,
            overflow: Overflow::Visible,
            background_color: None,
            border_width: 0.0,
            border_color: "currentcolor".to_string(),
            border_radius: 0.0,
            color: "rgb(0, 0, 0)".to_string(),
            font_family: None,
            font_size: None,
            font_weight: None,
            font_style: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    InlineBlock,
    Flex,
    Grid,
    None,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    Visible,
    Clip,
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    /// Parse the colour forms a computed style reports: `#rgb`, `#rrggbb`,
    /// `rgb()`/`rgba()` and a few keywords.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "transparent" => return Some(Self::TRANSPARENT),
            "black" => return Some(Self::BLACK),
            "white" => return Some(Self::WHITE),
            _ => {}
        }
        if value.starts_with('#') {
            return Self::from_hex(value);
        }
        let lower = value.to_ascii_lowercase();
        let inner = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: Vec<&str> = inner
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 3 {
            return None;
        }
        let channel = |p: &str| p.parse::<f32>().ok().map(|v| (v / 255.0).clamp(0.0, 1.0));
        let alpha = match parts.get(3) {
            Some(p) => match p.strip_suffix('%') {
                Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                None => p.parse::<f32>().ok()?,
            },
            None => 1.0,
        };
        Some(Self {
            r: channel(parts[0])?,
            g: channel(parts[1])?,
            b: channel(parts[2])?,
            a: alpha.clamp(0.0, 1.0),
        })
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b, a: 1.0 })
        } else if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b, a: 1.0 })
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

impl ComputedStyle {
    /// Whether the element starts a new stacking context.
    pub fn is_stacking_context(&self) -> bool {
        (self.z_index.is_some() && self.position != Position::Static)
            || matches!(self.position, Position::Fixed | Position::Sticky)
            || self.opacity < 1.0
    }

    pub fn is_positioned(&self) -> bool {
        self.position != Position::Static
    }

    pub fn is_inline_level(&self) -> bool {
        matches!(self.display, Display::Inline | Display::InlineBlock)
    }
}

/// Read the computed style captured for `element`.
pub fn resolve_style(element: &ElementNode) -> ComputedStyle {
    let mut s = ComputedStyle::default();
    for (prop, val) in &element.style {
        apply_css_property(&mut s, prop, val.trim());
    }
    s
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    match prop {
        "display" => {
            s.display = match val {
                "block" | "list-item" | "table" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" | "inline-flex" | "inline-grid" => Display::InlineBlock,
                "flex" => Display::Flex,
                "grid" => Display::Grid,
                "none" => Display::None,
                _ => Display::Other,
            }
        }
        "position" => {
            s.position = match val {
                "relative" => Position::Relative,
                "absolute" => Position::Absolute,
                "fixed" => Position::Fixed,
                "sticky" => Position::Sticky,
                _ => Position::Static,
            }
        }
        "float" => s.float = val != "none",
        "visibility" => s.visibility_hidden = matches!(val, "hidden" | "collapse"),
        "z-index" => s.z_index = val.parse().ok(),
        "opacity" => {
            if let Ok(v) = val.parse::<f64>() {
                s.opacity = v.clamp(0.0, 1.0);
            }
        }
        "overflow" | "overflow-x" | "overflow-y" => {
            if val != "visible" {
                s.overflow = Overflow::Clip;
            }
        }
        "background-color" => {
            let transparent = Color::parse(val).map(|c| c.is_transparent()).unwrap_or(false);
            s.background_color = if transparent { None } else { Some(val.to_string()) };
        }
        "border-width" => {
            if let Some(px) = parse_px(val) {
                s.border_width = px;
            }
        }
        "border-color" => s.border_color = val.to_string(),
        "border-radius" => {
            if let Some(px) = parse_px(val) {
                s.border_radius = px;
            }
        }
        "color" => s.color = val.to_string(),
        "font-family" => s.font_family = Some(val.to_string()),
        "font-size" => s.font_size = Some(val.to_string()),
        "font-weight" => s.font_weight = Some(val.to_string()),
        "font-style" => s.font_style = Some(val.to_string()),
        _ => {}
    }
}

/// Parse a `px` length (or a bare number) into pixels.
pub fn parse_px(s: &str) -> Option<f64> {
    let s = s.trim();
    s.strip_suffix("px").unwrap_or(s).trim().parse::<f64>().ok()
}
