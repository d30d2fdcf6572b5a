use sb_core::{BuildError, Container};
use sb_template::{Placeholders, TemplateStore};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{branch_id, choice_button_id, Capacity};

const DIALOG_TEMPLATE: &str = "dialog";
const BRANCH_TEMPLATE: &str = "dialog_branch";
const CHOICE_TEMPLATE: &str = "dialog_choice";
const TRIGGER_TEMPLATE: &str = "trigger";

/// Vertical offset of the top choice button.
pub const CHOICE_STARTING_Y: f64 = 1.22;
pub const CHOICE_GAP: f64 = 0.07;

/// Vertical position of 0-based choice button `index`.
pub fn choice_position(index: usize) -> f64 {
    CHOICE_STARTING_Y - CHOICE_GAP * index as f64
}

/// Dialog root, choices panel and restart button.
pub fn scaffold_dialog_containers(store: &TemplateStore) -> Result<Vec<Container>, BuildError> {
    store.instantiate(DIALOG_TEMPLATE, &Placeholders::none())
}

/// Branch `index` (0-based) and its duration container.
pub fn scaffold_branch(store: &TemplateStore, index: usize) -> Result<Vec<Container>, BuildError> {
    store.instantiate(BRANCH_TEMPLATE, &Placeholders::with_id(branch_id(index + 1)))
}

/// Choice button `index` (0-based), stacked below the previous one.
pub fn scaffold_choice(store: &TemplateStore, index: usize) -> Result<Vec<Container>, BuildError> {
    let placeholders =
        Placeholders::with_id(choice_button_id(index + 1)).at_position(choice_position(index));
    store.instantiate(CHOICE_TEMPLATE, &placeholders)
}

/// Every dialog container a scene set with `capacity` needs. Nothing is
/// produced for a project without dialogs.
pub fn scaffold_dialog_pool(
    store: &TemplateStore,
    capacity: Capacity,
) -> Result<Vec<Container>, BuildError> {
    let mut containers = Vec::new();
    if capacity.max_branches > 0 {
        containers.extend(scaffold_dialog_containers(store)?);
    }
    for index in 0..capacity.max_branches {
        containers.extend(scaffold_branch(store, index)?);
    }
    for index in 0..capacity.max_choices {
        containers.extend(scaffold_choice(store, index)?);
    }
    debug!(
        branches = capacity.max_branches,
        choices = capacity.max_choices,
        containers = containers.len(),
        "scaffolded dialog pool"
    );
    Ok(containers)
}

/// The object every new trigger starts from.
pub fn load_trigger_template(store: &TemplateStore) -> Result<Map<String, Value>, BuildError> {
    match store.load_value(TRIGGER_TEMPLATE, &Placeholders::none())? {
        Value::Object(trigger) => Ok(trigger),
        _ => Err(BuildError::new(
            "TEMPLATE_INVALID",
            format!("Template \"{}\" must be a JSON object.", TRIGGER_TEMPLATE),
        )),
    }
}
