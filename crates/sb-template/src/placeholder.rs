use std::sync::OnceLock;

use regex::{Captures, Regex};
use sb_core::{format_decimal, BuildError};

pub const ID_TOKEN: &str = "ID";
pub const POSITION_TOKEN: &str = "POSITION";

/// Values substituted into a template before it is parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placeholders {
    pub id: Option<String>,
    pub position: Option<f64>,
}

impl Placeholders {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            position: None,
        }
    }

    pub fn at_position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }
}

fn token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\$([A-Z][A-Z_]*)").expect("placeholder regex"))
}

/// Replaces `$ID` / `$POSITION` in raw template text. Any token without a
/// value, or any other `$NAME` token, is an error.
pub fn expand_placeholders(
    template_name: &str,
    raw: &str,
    placeholders: &Placeholders,
) -> Result<String, BuildError> {
    let mut failure = None;
    let expanded = token_regex().replace_all(raw, |caps: &Captures| {
        let token = &caps[1];
        let value = match token {
            ID_TOKEN => placeholders.id.clone(),
            POSITION_TOKEN => placeholders.position.map(format_decimal),
            _ => {
                failure.get_or_insert_with(|| {
                    BuildError::new(
                        "TEMPLATE_PLACEHOLDER_UNKNOWN",
                        format!("Template \"{}\" uses unknown placeholder ${}.", template_name, token),
                    )
                });
                return String::new();
            }
        };
        value.unwrap_or_else(|| {
            failure.get_or_insert_with(|| {
                BuildError::new(
                    "TEMPLATE_PLACEHOLDER_UNRESOLVED",
                    format!("Template \"{}\" needs a value for ${}.", template_name, token),
                )
            });
            String::new()
        })
    });

    match failure {
        Some(error) => Err(error),
        None => Ok(expanded.into_owned()),
    }
}
