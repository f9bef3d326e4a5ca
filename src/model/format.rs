//! Formatting values read from paragraph (`w:pPr`) and run (`w:rPr`) properties.
//!
//! Every field is optional: `None` means the property container did not set
//! it, which is what lets the resolver walk on to the next tier.

use crate::package::xml::Element;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Paragraph alignment (`w:jc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left / start aligned
    Left,
    /// Centered
    Center,
    /// Right / end aligned
    Right,
    /// Justified
    Justify,
    /// Distributed (justified including the last line)
    Distribute,
}

impl Alignment {
    /// Parse a `w:jc/@w:val` value.
    pub fn from_ooxml(val: &str) -> Option<Self> {
        match val {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "justify" => Some(Alignment::Justify),
            "distribute" => Some(Alignment::Distribute),
            _ => None,
        }
    }

    /// The `w:jc/@w:val` value written for this alignment.
    pub fn to_ooxml(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
            Alignment::Distribute => "distribute",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
            Alignment::Distribute => "distribute",
        };
        f.write_str(name)
    }
}

/// A length in points.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Length(pub f32);

impl Length {
    /// From twentieths of a point.
    pub fn from_twips(twips: i32) -> Self {
        Length(twips as f32 / 20.0)
    }

    /// From half-points (`w:sz`).
    pub fn from_half_points(half_points: u32) -> Self {
        Length(half_points as f32 / 2.0)
    }

    /// Value in points.
    pub fn pt(self) -> f32 {
        self.0
    }

    /// Value in twips, rounded.
    pub fn to_twips(self) -> i32 {
        (self.0 * 20.0).round() as i32
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}pt", trim_float(self.0))
    }
}

/// Line spacing, kept in the representation the document used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LineSpacing {
    /// Multiple of single spacing (`w:lineRule="auto"`, 240ths of a line)
    Multiple(f32),
    /// Exact line height
    Exact(Length),
    /// Minimum line height
    AtLeast(Length),
}

impl fmt::Display for LineSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSpacing::Multiple(m) => write!(f, "{} lines", trim_float(*m)),
            LineSpacing::Exact(l) => write!(f, "exactly {l}"),
            LineSpacing::AtLeast(l) => write!(f, "at least {l}"),
        }
    }
}

/// The font slots of `w:rFonts`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontSlots {
    /// `w:ascii`
    pub ascii: Option<String>,
    /// `w:hAnsi`
    pub h_ansi: Option<String>,
    /// `w:eastAsia`
    pub east_asia: Option<String>,
    /// `w:cs`
    pub cs: Option<String>,
}

impl FontSlots {
    /// Read the slots from a `w:rFonts` element.
    pub fn from_rfonts(element: &Element) -> Self {
        let slot = |key: &str| element.attr(key).filter(|v| !v.is_empty()).map(str::to_string);
        Self {
            ascii: slot("w:ascii"),
            h_ansi: slot("w:hAnsi"),
            east_asia: slot("w:eastAsia"),
            cs: slot("w:cs"),
        }
    }

    /// The font that applies to text of the given script class.
    ///
    /// CJK text prefers `eastAsia` then `ascii`; other text prefers `ascii`
    /// then `hAnsi`. The resolver calls this once per formatting tier, so a
    /// run-level `ascii` font decides a CJK run even when a style sets
    /// `eastAsia`; slots are not merged across tiers.
    pub fn pick(&self, cjk: bool) -> Option<&str> {
        let found = if cjk {
            self.east_asia.as_ref().or(self.ascii.as_ref())
        } else {
            self.ascii.as_ref().or(self.h_ansi.as_ref())
        };
        found.map(String::as_str)
    }

    /// True when no slot is set.
    pub fn is_empty(&self) -> bool {
        self.ascii.is_none() && self.h_ansi.is_none() && self.east_asia.is_none() && self.cs.is_none()
    }
}

/// Paragraph-scoped properties of one `w:pPr`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParagraphFormat {
    /// `w:jc`
    pub alignment: Option<Alignment>,
    /// `w:ind/@w:left` (or `w:start`)
    pub left_indent: Option<Length>,
    /// `w:ind/@w:right` (or `w:end`)
    pub right_indent: Option<Length>,
    /// `w:ind/@w:firstLine`, negative for `w:hanging`
    pub first_line_indent: Option<Length>,
    /// `w:spacing/@w:before`
    pub space_before: Option<Length>,
    /// `w:spacing/@w:after`
    pub space_after: Option<Length>,
    /// `w:spacing/@w:line` with its rule
    pub line_spacing: Option<LineSpacing>,
}

impl ParagraphFormat {
    /// Read from a `w:pPr` element.
    pub fn from_ppr(ppr: &Element) -> Self {
        let mut format = ParagraphFormat {
            alignment: ppr.child_val("w:jc").and_then(Alignment::from_ooxml),
            ..Default::default()
        };

        if let Some(ind) = ppr.child("w:ind") {
            format.left_indent = twips_attr(ind, "w:left").or_else(|| twips_attr(ind, "w:start"));
            format.right_indent = twips_attr(ind, "w:right").or_else(|| twips_attr(ind, "w:end"));
            format.first_line_indent = match twips_attr(ind, "w:hanging") {
                Some(hanging) => Some(Length(-hanging.0)),
                None => twips_attr(ind, "w:firstLine"),
            };
        }

        if let Some(spacing) = ppr.child("w:spacing") {
            format.space_before = twips_attr(spacing, "w:before");
            format.space_after = twips_attr(spacing, "w:after");
            format.line_spacing = spacing
                .attr("w:line")
                .and_then(|v| v.parse::<i32>().ok())
                .map(|line| match spacing.attr("w:lineRule").unwrap_or("auto") {
                    "exact" => LineSpacing::Exact(Length::from_twips(line)),
                    "atLeast" => LineSpacing::AtLeast(Length::from_twips(line)),
                    _ => LineSpacing::Multiple(line as f32 / 240.0),
                });
        }

        format
    }
}

/// Character properties of one `w:rPr`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunFormat {
    /// `w:rFonts`
    pub fonts: FontSlots,
    /// `w:sz`
    pub size: Option<Length>,
    /// `w:b`
    pub bold: Option<bool>,
    /// `w:i`
    pub italic: Option<bool>,
}

impl RunFormat {
    /// Read from a `w:rPr` element.
    pub fn from_rpr(rpr: &Element) -> Self {
        Self {
            fonts: rpr.child("w:rFonts").map(FontSlots::from_rfonts).unwrap_or_default(),
            size: rpr
                .child_val("w:sz")
                .and_then(|v| v.parse::<u32>().ok())
                .map(Length::from_half_points),
            bold: rpr.child("w:b").map(toggle_value),
            italic: rpr.child("w:i").map(toggle_value),
        }
    }
}

/// On/off properties are on when present unless `w:val` says otherwise.
fn toggle_value(element: &Element) -> bool {
    !matches!(element.attr("w:val"), Some("0" | "false" | "off"))
}

fn twips_attr(element: &Element, key: &str) -> Option<Length> {
    element
        .attr(key)
        .and_then(|v| v.parse::<f32>().ok())
        .map(|twips| Length(twips / 20.0))
}

fn trim_float(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}
