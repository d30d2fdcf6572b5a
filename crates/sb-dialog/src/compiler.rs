use std::collections::{BTreeMap, HashMap, HashSet};

use sb_core::{format_decimal, BuildError, SceneDocument, SubRecord};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::{
    branch_id, is_generated_action, trigger_display_name, Action, Cue, DialogGraph, Directive,
    Passage,
};

/// Offset of the first trigger in every branch timeline.
pub const START_TIME: f64 = 0.1;
/// Padding after a spoken line before the next trigger starts.
pub const MESSAGE_BUFFER: f64 = 0.4;
/// A prompt waits on the player, so its trigger ends right away.
pub const PROMPT_BUFFER: f64 = 0.2;

const PATTERN_RECORD: &str = "AnimationPattern";
const TRIGGERS_FIELD: &str = "triggers";
const STEP_RECORD: &str = "Step";
const DURATION_FIELD: &str = "transitionToTime";
const DISPLAY_NAME_FIELD: &str = "displayName";
const START_ACTIONS_FIELD: &str = "startActions";

type Trigger = Map<String, Value>;

/// Outcome of one compile pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledDialog {
    /// Passage name to the branch container that plays it.
    pub branches: BTreeMap<String, String>,
    /// Branch container id to its total timeline length.
    pub durations: BTreeMap<String, f64>,
}

impl CompiledDialog {
    pub fn branch_count(&self) -> usize {
        self.durations.len()
    }
}

struct TriggerStep<'g> {
    trigger: Trigger,
    end_time: f64,
    next: Option<&'g Passage>,
}

/// Fills pre-materialized branch containers with trigger timelines.
///
/// Branch numbering and the passage-to-branch memo belong to one compiler
/// and are reset by every [`DialogCompiler::build`] call.
#[derive(Debug)]
pub struct DialogCompiler<'g> {
    graph: &'g DialogGraph,
    trigger_template: Trigger,
    choice_slots: usize,
    next_branch: usize,
    branches: HashMap<&'g str, String>,
    durations: BTreeMap<String, f64>,
}

impl<'g> DialogCompiler<'g> {
    /// `choice_slots` is how many choice buttons exist in the scene; every
    /// prompt clears all of them before showing its own.
    pub fn new(graph: &'g DialogGraph, trigger_template: Trigger, choice_slots: usize) -> Self {
        Self {
            graph,
            trigger_template,
            choice_slots,
            next_branch: 0,
            branches: HashMap::new(),
            durations: BTreeMap::new(),
        }
    }

    pub fn build(&mut self, scene: &mut SceneDocument) -> Result<CompiledDialog, BuildError> {
        self.next_branch = 0;
        self.branches.clear();
        self.durations.clear();

        let graph = self.graph;
        self.build_branch(scene, graph.start())?;

        Ok(CompiledDialog {
            branches: self
                .branches
                .iter()
                .map(|(passage, branch)| (passage.to_string(), branch.clone()))
                .collect(),
            durations: std::mem::take(&mut self.durations),
        })
    }

    fn build_branch(
        &mut self,
        scene: &mut SceneDocument,
        passage: &'g Passage,
    ) -> Result<String, BuildError> {
        if let Some(branch) = self.branches.get(passage.name.as_str()) {
            return Ok(branch.clone());
        }
        self.next_branch += 1;
        let branch = branch_id(self.next_branch);
        // Recorded before descending so prompts that lead back here reuse it.
        self.branches.insert(passage.name.as_str(), branch.clone());

        let mut existing = existing_triggers(scene, &branch)?;
        let (triggers, total_time) = self.build_timeline(scene, passage, &mut existing)?;
        debug!(
            branch = branch.as_str(),
            passage = passage.name.as_str(),
            triggers = triggers.len(),
            duration = total_time,
            "compiled dialog branch"
        );
        write_branch(scene, &branch, triggers, total_time)?;
        self.durations.insert(branch.clone(), total_time);
        Ok(branch)
    }

    /// Straight-line run of triggers from `passage` until a prompt or a dead
    /// end. Returns the triggers and the end time of the last one.
    fn build_timeline(
        &mut self,
        scene: &mut SceneDocument,
        passage: &'g Passage,
        existing: &mut HashMap<String, Trigger>,
    ) -> Result<(Vec<Value>, f64), BuildError> {
        let mut triggers = Vec::new();
        let mut chain = HashSet::new();
        let mut current = passage;
        let mut start_time = START_TIME;

        loop {
            chain.insert(current.name.as_str());
            let entry = triggers.is_empty();
            let step = self.build_trigger(scene, current, existing, start_time, entry)?;
            triggers.push(Value::Object(step.trigger));

            let Some(next) = step.next else {
                return Ok((triggers, step.end_time));
            };
            if chain.contains(next.name.as_str()) {
                return Err(BuildError::for_passage(
                    "DIALOG_CHAIN_CYCLE",
                    format!(
                        "Passage \"{}\" continues into \"{}\", which already plays earlier in the same timeline.",
                        current.name, next.name
                    ),
                    current.name.clone(),
                ));
            }
            current = next;
            start_time = step.end_time;
        }
    }

    fn build_trigger(
        &mut self,
        scene: &mut SceneDocument,
        passage: &'g Passage,
        existing: &mut HashMap<String, Trigger>,
        start_time: f64,
        entry: bool,
    ) -> Result<TriggerStep<'g>, BuildError> {
        let display_name = trigger_display_name(&passage.name);
        let mut trigger = existing.remove(&display_name).unwrap_or_else(|| {
            let mut fresh = self.trigger_template.clone();
            fresh.insert(DISPLAY_NAME_FIELD.to_string(), json!(display_name));
            fresh
        });

        let mut actions = Vec::new();
        if entry {
            actions.push(Action::hide_choices_panel().into_value());
        }
        let previous = trigger.get_mut(START_ACTIONS_FIELD).map(Value::take);
        if let Some(Value::Array(previous)) = previous {
            actions.extend(previous.into_iter().filter(|action| !is_generated_action(action)));
        }

        let directive = Directive::from_passage(passage)?;
        let end_time = if directive.prompt {
            start_time + PROMPT_BUFFER
        } else {
            start_time + directive.duration + MESSAGE_BUFFER
        };
        trigger.insert("startTime".to_string(), json!(format_decimal(start_time)));
        trigger.insert("endTime".to_string(), json!(format_decimal(end_time)));

        let links = passage.normalized_links();
        if let Cue::Speak { target, receiver } = &directive.cue {
            actions.push(Action::bubble_lifetime(target, *receiver, directive.duration).into_value());
            actions.push(Action::bubble_text(target, *receiver, &passage.content()).into_value());
        }

        if links.is_empty() {
            actions.push(Action::enable_restart().into_value());
        } else if directive.prompt {
            for slot in 1..=self.choice_slots {
                actions.push(Action::disable_choice(slot).into_value());
            }
            actions.push(Action::show_choices_panel().into_value());
        }

        let graph = self.graph;
        let mut next = None;
        if directive.prompt {
            for (index, link) in links.iter().enumerate() {
                let target = graph.follow(passage, link)?;
                let branch = self.build_branch(scene, target)?;
                actions.extend(Action::choice_button(index + 1, link, &branch).map(Action::into_value));
            }
        } else if let Some(link) = links.first() {
            next = Some(graph.follow(passage, link)?);
        }

        trigger.insert(START_ACTIONS_FIELD.to_string(), Value::Array(actions));
        Ok(TriggerStep {
            trigger,
            end_time,
            next,
        })
    }
}

fn duration_container_id(branch: &str) -> String {
    format!("{}-Duration", branch)
}

fn missing_branch(container: &str, record: &str) -> BuildError {
    BuildError::new(
        "DIALOG_BRANCH_MISSING",
        format!(
            "Scene has no \"{}\" container with a \"{}\" record; the dialog needs more branches than were scaffolded.",
            container, record
        ),
    )
}

fn branch_record<'s>(
    scene: &'s SceneDocument,
    container: &str,
    record: &str,
) -> Result<&'s SubRecord, BuildError> {
    scene
        .container(container)
        .and_then(|found| found.sub_record(record))
        .ok_or_else(|| missing_branch(container, record))
}

fn branch_record_mut<'s>(
    scene: &'s mut SceneDocument,
    container: &str,
    record: &str,
) -> Result<&'s mut SubRecord, BuildError> {
    scene
        .container_mut(container)
        .and_then(|found| found.sub_record_mut(record))
        .ok_or_else(|| missing_branch(container, record))
}

/// Triggers already in the branch, keyed by display name. Also checks the
/// branch's duration step exists before any work is done.
fn existing_triggers(
    scene: &SceneDocument,
    branch: &str,
) -> Result<HashMap<String, Trigger>, BuildError> {
    branch_record(scene, &duration_container_id(branch), STEP_RECORD)?;
    let pattern = branch_record(scene, branch, PATTERN_RECORD)?;
    let mut triggers = HashMap::new();
    if let Some(Value::Array(items)) = pattern.field(TRIGGERS_FIELD) {
        for item in items {
            let Value::Object(trigger) = item else {
                continue;
            };
            if let Some(name) = trigger.get(DISPLAY_NAME_FIELD).and_then(Value::as_str) {
                triggers.insert(name.to_string(), trigger.clone());
            }
        }
    }
    Ok(triggers)
}

fn write_branch(
    scene: &mut SceneDocument,
    branch: &str,
    triggers: Vec<Value>,
    total_time: f64,
) -> Result<(), BuildError> {
    branch_record_mut(scene, branch, PATTERN_RECORD)?
        .set_field(TRIGGERS_FIELD, Value::Array(triggers));
    branch_record_mut(scene, &duration_container_id(branch), STEP_RECORD)?
        .set_field(DURATION_FIELD, json!(format_decimal(total_time)));
    Ok(())
}
