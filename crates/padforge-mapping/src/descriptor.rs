//! The textual descriptor grammar.
//!
//! A descriptor names one element of a raw input snapshot with optional
//! modifiers. Parsing is strict about token spelling but tolerant about
//! whitespace, including the prefix being glued to the kind (`"IAxis 1"`),
//! which older settings files contain. Display always emits the canonical
//! single-spaced form, so parse → display → parse is the identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors from descriptor parsing and configuration validation.
///
/// These classify as configuration errors at the engine level: the
/// affected binding degrades to "unbound" and the pipeline keeps
/// running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// The descriptor text does not match the grammar.
    #[error("Unparseable descriptor: {0:?}")]
    Parse(String),

    /// A POV descriptor is missing its direction.
    ///
    /// The direction token is what selects the 90° window to test, so a
    /// directionless POV binding has no value to read.
    #[error("POV descriptor needs a direction: {0:?}")]
    PovWithoutDirection(String),

    /// The index does not fit the addressable range.
    #[error("Descriptor index out of range: {0}")]
    IndexOutOfRange(u32),
}

impl From<MappingError> for padforge_errors::PadForgeError {
    fn from(e: MappingError) -> Self {
        padforge_errors::PadForgeError::Config(e.to_string())
    }
}

/// One of the four hat directions a POV descriptor can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PovDirection {
    /// 0°
    Up,
    /// 90°
    Right,
    /// 180°
    Down,
    /// 270°
    Left,
}

impl PovDirection {
    /// The direction's angle in centidegrees, clockwise from up.
    pub fn centidegrees(self) -> i32 {
        match self {
            PovDirection::Up => 0,
            PovDirection::Right => 9_000,
            PovDirection::Down => 18_000,
            PovDirection::Left => 27_000,
        }
    }

    fn token(self) -> &'static str {
        match self {
            PovDirection::Up => "Up",
            PovDirection::Down => "Down",
            PovDirection::Left => "Left",
            PovDirection::Right => "Right",
        }
    }
}

/// Which raw element a descriptor addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Axis by index
    Axis(u8),
    /// Slider by index
    Slider(u8),
    /// Button by index
    Button(u8),
    /// Hat by index, tested against one direction
    Pov(u8, PovDirection),
}

/// A parsed descriptor: source element plus modifiers.
///
/// Modifiers apply in a fixed order: half-axis first, then invert.
///
/// # Examples
///
/// ```
/// use padforge_mapping::SourceRef;
///
/// let d: SourceRef = "IH Axis 2".parse().unwrap();
/// assert!(d.invert);
/// assert!(d.half);
/// assert_eq!(d.to_string(), "IH Axis 2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRef {
    /// Invert the processed value (`v = 65535 − v`)
    pub invert: bool,
    /// Use only the upper half of the range (`v = max(0, 2v − 65535)`)
    pub half: bool,
    /// The addressed raw element
    pub source: SourceKind,
}

impl SourceRef {
    /// A plain, unmodified reference to a source element.
    pub fn plain(source: SourceKind) -> Self {
        Self {
            invert: false,
            half: false,
            source,
        }
    }
}

impl FromStr for SourceRef {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MappingError::Parse(s.to_string()));
        }

        let mut tokens: Vec<&str> = trimmed.split_whitespace().collect();

        let (mut invert, mut half) = (false, false);
        let first = tokens[0];
        if let Some(prefix) = ["IH", "I", "H"].iter().find(|p| first == **p) {
            invert = prefix.contains('I');
            half = prefix.contains('H');
            tokens.remove(0);
        } else {
            // Glued prefix form: "IAxis", "HSlider", "IHButton".
            for prefix in ["IH", "I", "H"] {
                if let Some(rest) = first.strip_prefix(prefix) {
                    if is_kind_token(rest) {
                        invert = prefix.contains('I');
                        half = prefix.contains('H');
                        tokens[0] = rest;
                        break;
                    }
                }
            }
        }

        let (&kind, rest) = tokens
            .split_first()
            .ok_or_else(|| MappingError::Parse(s.to_string()))?;
        if !is_kind_token(kind) {
            return Err(MappingError::Parse(s.to_string()));
        }

        let (&index_token, rest) = rest
            .split_first()
            .ok_or_else(|| MappingError::Parse(s.to_string()))?;
        let index: u32 = index_token
            .parse()
            .map_err(|_| MappingError::Parse(s.to_string()))?;
        let index = u8::try_from(index).map_err(|_| MappingError::IndexOutOfRange(index))?;

        let source = match kind {
            "Axis" | "Slider" | "Button" => {
                if !rest.is_empty() {
                    return Err(MappingError::Parse(s.to_string()));
                }
                match kind {
                    "Axis" => SourceKind::Axis(index),
                    "Slider" => SourceKind::Slider(index),
                    _ => SourceKind::Button(index),
                }
            }
            "POV" => {
                let (&dir_token, tail) = rest
                    .split_first()
                    .ok_or_else(|| MappingError::PovWithoutDirection(s.to_string()))?;
                if !tail.is_empty() {
                    return Err(MappingError::Parse(s.to_string()));
                }
                let direction = match dir_token {
                    "Up" => PovDirection::Up,
                    "Down" => PovDirection::Down,
                    "Left" => PovDirection::Left,
                    "Right" => PovDirection::Right,
                    _ => return Err(MappingError::Parse(s.to_string())),
                };
                SourceKind::Pov(index, direction)
            }
            _ => return Err(MappingError::Parse(s.to_string())),
        };

        Ok(SourceRef {
            invert,
            half,
            source,
        })
    }
}

fn is_kind_token(token: &str) -> bool {
    matches!(token, "Axis" | "Slider" | "Button" | "POV")
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.invert, self.half) {
            (true, true) => write!(f, "IH ")?,
            (true, false) => write!(f, "I ")?,
            (false, true) => write!(f, "H ")?,
            (false, false) => {}
        }
        match self.source {
            SourceKind::Axis(i) => write!(f, "Axis {i}"),
            SourceKind::Slider(i) => write!(f, "Slider {i}"),
            SourceKind::Button(i) => write!(f, "Button {i}"),
            SourceKind::Pov(i, dir) => write!(f, "POV {i} {}", dir.token()),
        }
    }
}

impl Serialize for SourceRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SourceRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a binding field from a settings document.
///
/// Empty or all-whitespace text is the documented "no binding" form and
/// maps to `None`; anything else must parse as a descriptor.
pub fn parse_binding(text: &str) -> Result<Option<SourceRef>, MappingError> {
    if text.trim().is_empty() {
        Ok(None)
    } else {
        text.parse().map(Some)
    }
}
