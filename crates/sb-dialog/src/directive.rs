use sb_core::BuildError;

use crate::Passage;

pub const DEFAULT_DURATION: f64 = 2.0;

const DELAY_TAG: &str = "delay";
const PROMPT_TAG: &str = "prompt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    SpeechBubble,
    ThoughtBubble,
}

impl ReceiverKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SpeechBubble => "SpeechBubble",
            Self::ThoughtBubble => "ThoughtBubble",
        }
    }

    fn from_verb(verb: &str) -> Option<Self> {
        match verb.to_lowercase().as_str() {
            "says" => Some(Self::SpeechBubble),
            "thinks" => Some(Self::ThoughtBubble),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    /// Silent pause.
    Delay,
    /// A line shown in a bubble on the target object.
    Speak { target: String, receiver: ReceiverKind },
}

/// What a passage's tags ask for.
///
/// Tag grammar: `delay [seconds] [prompt]` or
/// `<target> says|thinks [seconds] [prompt]`. A trailing `prompt` tag turns
/// the passage's links into choice buttons; a speaking prompt ignores the
/// seconds tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub cue: Cue,
    pub duration: f64,
    pub prompt: bool,
}

impl Directive {
    pub fn parse(tags: &[String]) -> Result<Self, String> {
        let Some(last) = tags.last() else {
            return Err("passage has no tags".to_string());
        };
        let prompt = last == PROMPT_TAG;
        let first = &tags[0];

        if first.to_lowercase() == DELAY_TAG {
            let duration = match tags.get(1) {
                Some(raw) => parse_duration(raw)?,
                None => DEFAULT_DURATION,
            };
            return Ok(Self {
                cue: Cue::Delay,
                duration,
                prompt,
            });
        }

        let Some(verb) = tags.get(1) else {
            return Err(format!("speaker \"{}\" has no says/thinks tag", first));
        };
        let Some(receiver) = ReceiverKind::from_verb(verb) else {
            return Err(format!("unrecognized verb \"{}\"", verb));
        };
        let duration = match tags.get(2) {
            Some(raw) if !prompt => parse_duration(raw)?,
            _ => DEFAULT_DURATION,
        };
        Ok(Self {
            cue: Cue::Speak {
                target: first.clone(),
                receiver,
            },
            duration,
            prompt,
        })
    }

    pub fn from_passage(passage: &Passage) -> Result<Self, BuildError> {
        Self::parse(&passage.tags).map_err(|reason| {
            BuildError::for_passage(
                "DIALOG_TAGS_MALFORMED",
                format!("Malformed tags in passage \"{}\": {}.", passage.name, reason),
                passage.name.clone(),
            )
        })
    }
}

fn parse_duration(raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("\"{}\" is not a duration", raw))
}
