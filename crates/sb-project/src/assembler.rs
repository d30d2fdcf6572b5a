use std::collections::BTreeMap;

use sb_core::{BuildError, Container, RecordMap, SceneDocument};
use sb_dialog::{Capacity, DialogGraph};
use serde_json::json;

/// Containers whose id prefix (before `#`) matches are never backfilled.
pub const BACKFILL_IGNORED: &[&str] = &["AnimationStep"];

/// One scene of a project, with the dialog it plays if any.
#[derive(Debug, Clone)]
pub struct ProjectScene {
    pub document: SceneDocument,
    pub dialog: Option<DialogGraph>,
}

/// Scenes keyed by their `/`-separated path relative to the build directory.
pub type SceneSet = BTreeMap<String, ProjectScene>;

/// Packs `containers` into every scene; returns how many were inserted
/// across all scenes.
pub fn pack_scenes(scenes: &mut SceneSet, containers: &RecordMap<Container>) -> usize {
    scenes
        .values_mut()
        .map(|scene| scene.document.pack(containers))
        .sum()
}

/// Largest capacity any scene's dialog needs.
pub fn project_capacity(scenes: &SceneSet) -> Result<Capacity, BuildError> {
    let mut capacity = Capacity::default();
    for scene in scenes.values() {
        if let Some(dialog) = &scene.dialog {
            capacity = capacity.max(dialog.estimate_capacity()?);
        }
    }
    Ok(capacity)
}

/// Containers found in some scene but owned by no package, switched off so
/// sibling scenes carry them without showing them. The last scene to
/// supply an id wins.
pub fn backfill_containers(
    scenes: &SceneSet,
    package_containers: &RecordMap<Container>,
) -> RecordMap<Container> {
    let mut backfill = RecordMap::new();
    for scene in scenes.values() {
        for container in scene.document.containers() {
            let id = container.id();
            let prefix = id.split('#').next().unwrap_or(id);
            if package_containers.contains(id) || BACKFILL_IGNORED.contains(&prefix) {
                continue;
            }
            let mut hidden = container.clone();
            hidden.set_field("on", json!("false"));
            backfill.insert(hidden);
        }
    }
    backfill
}
