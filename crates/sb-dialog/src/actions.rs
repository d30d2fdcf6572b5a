use sb_core::format_decimal;
use serde_json::{json, Map, Value};

use crate::{ColorName, Link, ReceiverKind};

/// Generated action and trigger names start with `D:`; anything else on a
/// trigger was added by hand and survives rebuilds.
pub const ACTION_PREFIX: &str = "D";

pub const DIALOG_ID: &str = "Dialog";
pub const CHOICES_PANEL_ID: &str = "Dialog-Choices";
pub const START_BUTTON_ID: &str = "Dialog-StartBtn";
pub const BRANCH_ID_PREFIX: &str = "Dialog-Branch";
pub const CHOICE_ID_PREFIX: &str = "Dialog-Choices-Btn";

const BUTTON_ROUTE_RECEIVER: &str = "plugin#0_JayJayWon.ActionGrouper";
const BUTTON_ROUTE_FIELD: &str = "act1Atom1Name";

/// 1-based, matching scaffold numbering.
pub fn branch_id(index: usize) -> String {
    format!("{}#{}", BRANCH_ID_PREFIX, index)
}

/// 1-based, matching scaffold numbering.
pub fn choice_button_id(index: usize) -> String {
    format!("{}#{}", CHOICE_ID_PREFIX, index)
}

pub fn trigger_display_name(passage_name: &str) -> String {
    format!("{}:{}", ACTION_PREFIX, passage_name)
}

pub fn is_generated_action(action: &Value) -> bool {
    action
        .get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.strip_prefix(ACTION_PREFIX))
        .is_some_and(|rest| rest.starts_with(':'))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionValue {
    Bool(bool),
    Text(String),
    Float(f64),
    Color(ColorName),
}

/// One generated trigger action addressed to `receiver_atom`/`receiver`.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    pub receiver_atom: String,
    pub receiver: String,
    pub receiver_target_name: String,
    pub value: ActionValue,
}

impl Action {
    fn new(
        name_parts: &[&str],
        receiver_atom: &str,
        receiver: &str,
        receiver_target_name: &str,
        value: ActionValue,
    ) -> Self {
        let mut name = ACTION_PREFIX.to_string();
        for part in name_parts {
            name.push(':');
            name.push_str(part);
        }
        Self {
            name,
            receiver_atom: receiver_atom.to_string(),
            receiver: receiver.to_string(),
            receiver_target_name: receiver_target_name.to_string(),
            value,
        }
    }

    fn toggle(receiver_atom: &str, on: bool) -> Self {
        let verb = if on { "Enable" } else { "Disable" };
        Self::new(
            &[receiver_atom, verb],
            receiver_atom,
            "AtomControl",
            "on",
            ActionValue::Bool(on),
        )
    }

    pub fn hide_choices_panel() -> Self {
        Self::toggle(CHOICES_PANEL_ID, false)
    }

    pub fn show_choices_panel() -> Self {
        Self::toggle(CHOICES_PANEL_ID, true)
    }

    pub fn enable_restart() -> Self {
        Self::toggle(START_BUTTON_ID, true)
    }

    pub fn disable_choice(index: usize) -> Self {
        Self::toggle(&choice_button_id(index), false)
    }

    pub fn bubble_lifetime(target: &str, receiver: ReceiverKind, duration: f64) -> Self {
        Self::new(
            &[target, receiver.as_str(), "Lifetime"],
            target,
            receiver.as_str(),
            "bubbleLifetime",
            ActionValue::Float(duration),
        )
    }

    pub fn bubble_text(target: &str, receiver: ReceiverKind, content: &str) -> Self {
        Self::new(
            &[target, receiver.as_str(), "Text"],
            target,
            receiver.as_str(),
            "bubbleText",
            ActionValue::Text(content.to_string()),
        )
    }

    /// Color, label, route and enable actions for choice button `index`
    /// (1-based).
    pub fn choice_button(index: usize, link: &Link, branch: &str) -> [Self; 4] {
        let button = choice_button_id(index);
        [
            Self::new(
                &[button.as_str(), "ButtonColor"],
                &button,
                "ButtonColor",
                "color",
                ActionValue::Color(link.color),
            ),
            Self::new(
                &[button.as_str(), "Text"],
                &button,
                "Text",
                "text",
                ActionValue::Text(link.safe_name.clone()),
            ),
            Self::new(
                &[button.as_str(), "SetBranch"],
                &button,
                BUTTON_ROUTE_RECEIVER,
                BUTTON_ROUTE_FIELD,
                ActionValue::Text(branch.to_string()),
            ),
            Self::toggle(&button, true),
        ]
    }

    pub fn into_value(self) -> Value {
        let mut data = Map::new();
        data.insert("name".to_string(), json!(self.name));
        data.insert("receiverAtom".to_string(), json!(self.receiver_atom));
        data.insert("receiver".to_string(), json!(self.receiver));
        data.insert(
            "receiverTargetName".to_string(),
            json!(self.receiver_target_name),
        );
        let (key, value) = match self.value {
            ActionValue::Bool(on) => ("boolValue", json!(on.to_string())),
            ActionValue::Text(text) => ("stringValue", json!(text)),
            ActionValue::Float(number) => ("floatValue", json!(format_decimal(number))),
            ActionValue::Color(color) => ("color", color.hsv().to_value()),
        };
        data.insert(key.to_string(), value);
        Value::Object(data)
    }
}

#[cfg(test)]
mod actions_tests {
    use super::*;

    #[test]
    fn toggles_use_atom_control() {
        let value = Action::hide_choices_panel().into_value();
        assert_eq!(
            value,
            json!({
                "name": "D:Dialog-Choices:Disable",
                "receiverAtom": "Dialog-Choices",
                "receiver": "AtomControl",
                "receiverTargetName": "on",
                "boolValue": "false"
            })
        );
        assert_eq!(
            Action::enable_restart().into_value()["name"],
            "D:Dialog-StartBtn:Enable"
        );
        assert_eq!(
            Action::disable_choice(2).into_value()["receiverAtom"],
            "Dialog-Choices-Btn#2"
        );
    }

    #[test]
    fn bubble_actions_address_the_speaker() {
        let lifetime = Action::bubble_lifetime("Guard", ReceiverKind::SpeechBubble, 3.0);
        let value = lifetime.into_value();
        assert_eq!(value["name"], "D:Guard:SpeechBubble:Lifetime");
        assert_eq!(value["floatValue"], "3.0");

        let text = Action::bubble_text("Guard", ReceiverKind::ThoughtBubble, "Hmm").into_value();
        assert_eq!(text["receiver"], "ThoughtBubble");
        assert_eq!(text["receiverTargetName"], "bubbleText");
        assert_eq!(text["stringValue"], "Hmm");
    }

    #[test]
    fn choice_button_actions_route_to_branch() {
        let link = Link {
            target: "leave".to_string(),
            name: "RED:Leave".to_string(),
            safe_name: "Leave".to_string(),
            color: ColorName::Red,
        };
        let values = Action::choice_button(1, &link, "Dialog-Branch#4").map(Action::into_value);
        assert_eq!(values[0]["color"], ColorName::Red.hsv().to_value());
        assert_eq!(values[1]["stringValue"], "Leave");
        assert_eq!(values[2]["stringValue"], "Dialog-Branch#4");
        assert_eq!(values[2]["receiver"], "plugin#0_JayJayWon.ActionGrouper");
        assert_eq!(values[3]["name"], "D:Dialog-Choices-Btn#1:Enable");
    }

    #[test]
    fn generated_actions_are_recognized_by_prefix() {
        assert!(is_generated_action(&json!({"name": "D:Guard:SpeechBubble:Text"})));
        assert!(!is_generated_action(&json!({"name": "Door:Open"})));
        assert!(!is_generated_action(&json!({"name": "DX:Other"})));
        assert!(!is_generated_action(&json!({"receiver": "x"})));
    }

    #[test]
    fn ids_are_one_based() {
        assert_eq!(branch_id(1), "Dialog-Branch#1");
        assert_eq!(choice_button_id(3), "Dialog-Choices-Btn#3");
        assert_eq!(trigger_display_name("Intro"), "D:Intro");
    }
}
