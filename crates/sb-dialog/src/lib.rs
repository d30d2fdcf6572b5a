mod actions;
mod capacity;
mod compiler;
mod directive;
mod graph;
mod link;
mod scaffold;

pub use actions::{
    branch_id, choice_button_id, is_generated_action, trigger_display_name, Action, ActionValue,
    ACTION_PREFIX, BRANCH_ID_PREFIX, CHOICES_PANEL_ID, CHOICE_ID_PREFIX, DIALOG_ID,
    START_BUTTON_ID,
};
pub use capacity::Capacity;
pub use compiler::{
    CompiledDialog, DialogCompiler, MESSAGE_BUFFER, PROMPT_BUFFER, START_TIME,
};
pub use directive::{Cue, Directive, ReceiverKind, DEFAULT_DURATION};
pub use graph::{DialogDocument, DialogGraph, Passage, RawLink};
pub use link::{ColorName, Hsv, Link};
pub use scaffold::{
    choice_position, load_trigger_template, scaffold_branch, scaffold_choice,
    scaffold_dialog_containers, scaffold_dialog_pool, CHOICE_GAP, CHOICE_STARTING_Y,
};
