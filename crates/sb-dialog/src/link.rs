use serde_json::{json, Value};

use crate::RawLink;

/// Button colors a link can request with a `COLOR:` name prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColorName {
    Black,
    Teal,
    Green,
    Red,
    Purple,
    Yellow,
    #[default]
    Blue,
    Pink,
}

/// Hue/saturation/value, stored as the decimal strings scene files use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: &'static str,
    pub s: &'static str,
    pub v: &'static str,
}

impl Hsv {
    pub fn to_value(self) -> Value {
        json!({"h": self.h, "s": self.s, "v": self.v})
    }
}

const SATURATION: &str = "0.6444453";
const VALUE: &str = "0.7410609";

impl ColorName {
    pub const ALL: [ColorName; 8] = [
        ColorName::Black,
        ColorName::Teal,
        ColorName::Green,
        ColorName::Red,
        ColorName::Purple,
        ColorName::Yellow,
        ColorName::Blue,
        ColorName::Pink,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Black => "BLACK",
            Self::Teal => "TEAL",
            Self::Green => "GREEN",
            Self::Red => "RED",
            Self::Purple => "PURPLE",
            Self::Yellow => "YELLOW",
            Self::Blue => "BLUE",
            Self::Pink => "PINK",
        }
    }

    pub fn hsv(self) -> Hsv {
        let hue = match self {
            Self::Black => {
                return Hsv {
                    h: "0.1700005",
                    s: "0",
                    v: "0.2029198",
                }
            }
            Self::Teal => "0.4894297",
            Self::Green => "0.3586576",
            Self::Red => "0",
            Self::Purple => "0.7690026",
            Self::Yellow => "0.1749429",
            Self::Blue => "0.6082565",
            Self::Pink => "0.8668843",
        };
        Hsv {
            h: hue,
            s: SATURATION,
            v: VALUE,
        }
    }

    /// Splits a `COLOR:` prefix off a display name.
    pub fn split_prefix(name: &str) -> Option<(ColorName, &str)> {
        Self::ALL.into_iter().find_map(|color| {
            name.strip_prefix(color.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
                .map(|rest| (color, rest))
        })
    }
}

/// A link reduced to its target passage, display text and button color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub target: String,
    pub name: String,
    pub safe_name: String,
    pub color: ColorName,
}

impl Link {
    /// `a|b` routes to `b` and displays `a`; `a<-b` routes to `a` and
    /// displays `b`.
    pub fn from_raw(raw: &RawLink) -> Self {
        let target = raw
            .link
            .rsplit('|')
            .next()
            .and_then(|part| part.split("<-").next())
            .unwrap_or_default()
            .to_string();
        let name = raw
            .name
            .split('|')
            .next()
            .and_then(|part| part.rsplit("<-").next())
            .unwrap_or_default()
            .to_string();
        let (color, safe_name) = match ColorName::split_prefix(&name) {
            Some((color, rest)) => (color, rest.to_string()),
            None => (ColorName::default(), name.clone()),
        };
        Self {
            target,
            name,
            safe_name,
            color,
        }
    }
}
