use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use sb_core::{BuildError, Container, RecordMap, SceneDocument};
use sb_dialog::{load_trigger_template, scaffold_dialog_pool, Capacity, DialogCompiler, DialogGraph};
use sb_template::{Placeholders, TemplateStore};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::{
    backfill_containers, pack_scenes, project_capacity, Blueprint, BuildPaths, ProjectScene,
    SceneSet, BLUEPRINT_FILE,
};

const BUILD_DIR_SUFFIX: &str = "scaffold";
const DEFAULT_TEMPLATE: &str = "default";
const SCENE_TEMPLATE: &str = "scene";
const SCENE_EXTENSION: &str = "json";

/// Counts from one scaffold run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldReport {
    pub scenes: usize,
    pub package_containers: usize,
    pub dialog_containers: usize,
    pub backfill_containers: usize,
    pub capacity: Capacity,
    pub dialogs_compiled: usize,
}

/// A project directory with its blueprint, bound to the scenes directory
/// it builds into.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    project_dir: PathBuf,
    source_dir: PathBuf,
    build_dir: PathBuf,
    blueprint: Blueprint,
    store: TemplateStore,
}

impl Project {
    pub fn open(name: &str, paths: &BuildPaths) -> Result<Self, BuildError> {
        let project_dir = paths.projects.join(name);
        let blueprint = Blueprint::load(&project_dir.join(BLUEPRINT_FILE))?;
        let store = TemplateStore::open(&paths.templates)?;
        Ok(Self {
            name: name.to_string(),
            source_dir: paths.scenes.join(name),
            build_dir: paths
                .scenes
                .join(format!("{}.{}", name, BUILD_DIR_SUFFIX)),
            project_dir,
            blueprint,
            store,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    /// Hand-edited scenes, copied into the build directory before each run.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Rebuilds the project's scene set from scratch in the build directory.
    pub fn scaffold(&self) -> Result<ScaffoldReport, BuildError> {
        let project = self.name.as_str();
        self.prepare_build_dir()?;

        let packages = self.package_containers()?;
        info!(project, count = packages.len(), "found package containers");

        let mut scenes = self.load_scenes()?;
        info!(project, count = scenes.len(), "found scenes");

        let capacity = project_capacity(&scenes)?;
        let dialog = scaffold_dialog_pool(&self.store, capacity)?
            .into_iter()
            .collect::<RecordMap<_>>();
        info!(
            project,
            branches = capacity.max_branches,
            choices = capacity.max_choices,
            count = dialog.len(),
            "scaffolded dialog containers"
        );
        if !dialog.is_empty() {
            pack_scenes(&mut scenes, &dialog);
        }

        let backfill = backfill_containers(&scenes, &packages);
        info!(project, count = backfill.len(), "found containers to backfill");

        let mut dialogs_compiled = 0;
        if !packages.is_empty() {
            pack_scenes(&mut scenes, &packages);
        }
        if !backfill.is_empty() {
            pack_scenes(&mut scenes, &backfill);
        }
        if !packages.is_empty() {
            dialogs_compiled = self.compile_dialogs(&mut scenes, capacity.max_choices)?;
        }

        self.save_scenes(&scenes)?;
        Ok(ScaffoldReport {
            scenes: scenes.len(),
            package_containers: packages.len(),
            dialog_containers: dialog.len(),
            backfill_containers: backfill.len(),
            capacity,
            dialogs_compiled,
        })
    }

    fn prepare_build_dir(&self) -> Result<(), BuildError> {
        if self.build_dir.exists() {
            warn!(path = %self.build_dir.display(), "deleting build directory");
            fs::remove_dir_all(&self.build_dir)
                .map_err(|error| io_error("PROJECT_BUILD_DIR_CLEAR", &self.build_dir, error))?;
        }
        if self.source_dir.is_dir() {
            info!(
                from = %self.source_dir.display(),
                to = %self.build_dir.display(),
                "copying scene files"
            );
            copy_tree(&self.source_dir, &self.build_dir)?;
        }
        Ok(())
    }

    /// `default.json` plus every package instance. A later package replaces
    /// an earlier container with the same id.
    fn package_containers(&self) -> Result<RecordMap<Container>, BuildError> {
        let mut containers = self
            .store
            .instantiate(DEFAULT_TEMPLATE, &Placeholders::none())?
            .into_iter()
            .collect::<RecordMap<_>>();
        for (package, count) in &self.blueprint.packages {
            containers.extend(self.store.package_containers(package, *count)?);
        }
        Ok(containers)
    }

    fn load_scenes(&self) -> Result<SceneSet, BuildError> {
        let existing = self.existing_scene_paths()?;
        let mut planned = BTreeMap::new();
        for entry in &self.blueprint.scenes {
            planned.insert(
                normalize_scene_path(entry.scene_path()),
                entry.dialog_path().map(str::to_string),
            );
        }
        for path in &existing {
            planned.entry(path.clone()).or_insert(None);
        }

        let mut scenes = SceneSet::new();
        for (path, dialog_path) in planned {
            if !path.to_lowercase().ends_with(".json") {
                return Err(BuildError::new(
                    "PROJECT_SCENE_PATH_INVALID",
                    format!(
                        "Scene path \"{}\" in project \"{}\" must end in .json.",
                        path, self.name
                    ),
                ));
            }
            let dialog = dialog_path
                .map(|dialog_path| DialogGraph::load(&self.project_dir.join(dialog_path)))
                .transpose()?;
            let document = if existing.contains(&path) {
                SceneDocument::load(&self.build_dir.join(&path))?
            } else {
                self.scene_template()?
            };
            scenes.insert(path, ProjectScene { document, dialog });
        }
        Ok(scenes)
    }

    fn scene_template(&self) -> Result<SceneDocument, BuildError> {
        SceneDocument::from_value(
            self.store
                .load_value(SCENE_TEMPLATE, &Placeholders::none())?,
        )
    }

    fn existing_scene_paths(&self) -> Result<BTreeSet<String>, BuildError> {
        let mut paths = BTreeSet::new();
        if !self.build_dir.is_dir() {
            return Ok(paths);
        }
        for entry in WalkDir::new(&self.build_dir).follow_links(false) {
            let entry = entry.map_err(|error| BuildError::map("PROJECT_SCAN", error))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(SCENE_EXTENSION)
            {
                continue;
            }
            let relative = path
                .strip_prefix(&self.build_dir)
                .map_err(|error| BuildError::map("PROJECT_SCAN", error))?;
            paths.insert(normalize_scene_path(&relative.to_string_lossy()));
        }
        Ok(paths)
    }

    fn compile_dialogs(&self, scenes: &mut SceneSet, choice_slots: usize) -> Result<usize, BuildError> {
        if scenes.values().all(|scene| scene.dialog.is_none()) {
            return Ok(0);
        }
        let trigger_template = load_trigger_template(&self.store)?;
        let mut compiled = 0;
        for (path, scene) in scenes.iter_mut() {
            let Some(graph) = &scene.dialog else {
                continue;
            };
            let result = DialogCompiler::new(graph, trigger_template.clone(), choice_slots)
                .build(&mut scene.document)?;
            info!(
                project = self.name.as_str(),
                scene = path.as_str(),
                branches = result.branch_count(),
                "compiled dialog"
            );
            compiled += 1;
        }
        Ok(compiled)
    }

    fn save_scenes(&self, scenes: &SceneSet) -> Result<(), BuildError> {
        for (path, scene) in scenes {
            let target = self.build_dir.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|error| io_error("SCENE_WRITE", parent, error))?;
            }
            let payload = serde_json::to_string(&scene.document.build())
                .map_err(|error| BuildError::map("SCENE_WRITE", error))?;
            fs::write(&target, payload).map_err(|error| io_error("SCENE_WRITE", &target, error))?;
            info!(path = %target.display(), "saved scene");
        }
        Ok(())
    }
}

/// Project names under `projects_dir`, sorted.
pub fn discover_projects(projects_dir: &Path) -> Result<Vec<String>, BuildError> {
    let entries =
        fs::read_dir(projects_dir).map_err(|error| io_error("PROJECT_SCAN", projects_dir, error))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| io_error("PROJECT_SCAN", projects_dir, error))?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn normalize_scene_path(path: &str) -> String {
    path.replace('\\', "/")
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), BuildError> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|error| BuildError::map("PROJECT_COPY", error))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|error| BuildError::map("PROJECT_COPY", error))?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|error| io_error("PROJECT_COPY", &target, error))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)
                .map_err(|error| io_error("PROJECT_COPY", &target, error))?;
        }
    }
    Ok(())
}

fn io_error(code: &'static str, path: &Path, error: std::io::Error) -> BuildError {
    BuildError::new(code, format!("{}: {}", path.display(), error))
}

#[cfg(test)]
mod project_tests {
    use super::*;
    use serde_json::{json, Value};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("sb-project-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    fn write_templates(root: &Path) {
        write_file(&root.join("default.json"), r#"[{"id":"CoreControl","storables":[]}]"#);
        write_file(&root.join("scene.json"), r#"{"version":"1.20","atoms":[]}"#);
        write_file(
            &root.join("dialog.json"),
            r#"[{"id":"Dialog","storables":[]},{"id":"Dialog-Choices","storables":[]},{"id":"Dialog-StartBtn","storables":[]}]"#,
        );
        write_file(
            &root.join("dialog_branch.json"),
            r#"[{"id":"$ID","storables":[{"id":"AnimationPattern","triggers":[]}]},
                {"id":"$ID-Duration","storables":[{"id":"Step","transitionToTime":"0"}]}]"#,
        );
        write_file(
            &root.join("dialog_choice.json"),
            r#"[{"id":"$ID","position":{"y":"$POSITION"},"storables":[]}]"#,
        );
        write_file(
            &root.join("trigger.json"),
            r#"{"displayName":"","startTime":"0","endTime":"0","startActions":[],"endActions":[]}"#,
        );
        write_file(
            &root.join("packages").join("Person").join("Female.json"),
            r#"[{"id":"$ID","type":"Person","storables":[]}]"#,
        );
    }

    fn workspace(name: &str, blueprint: Value) -> BuildPaths {
        let root = temp_dir(name);
        let paths = BuildPaths {
            scenes: root.join("vam").join("Saves").join("scene"),
            projects: root.join("projects"),
            templates: root.join("templates"),
        };
        write_templates(&paths.templates);
        write_file(
            &paths.projects.join("Demo").join(BLUEPRINT_FILE),
            &blueprint.to_string(),
        );
        write_file(
            &paths.projects.join("Demo").join("dialog").join("gate.json"),
            &json!({"passages": [
                {"name": "ask", "text": "Who goes there?", "tags": ["Guard", "says", "prompt"], "links": [
                    {"link": "yes", "name": "GREEN:Friend"},
                    {"link": "no", "name": "RED:Foe"}
                ]},
                {"name": "yes", "tags": ["delay"]},
                {"name": "no", "text": "Begone.", "tags": ["Guard", "says"]}
            ]})
            .to_string(),
        );
        write_file(
            &paths.scenes.join("Demo").join("Existing.json"),
            &json!({"atoms": [
                {"id": "Lamp", "on": "true", "storables": []},
                {"id": "AnimationStep#1", "storables": []}
            ]})
            .to_string(),
        );
        fs::create_dir_all(&paths.scenes).expect("scenes dir");
        paths
    }

    fn read_scene(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).expect("scene file")).expect("scene json")
    }

    fn atom<'a>(scene: &'a Value, id: &str) -> Option<&'a Value> {
        scene["atoms"]
            .as_array()
            .expect("atoms")
            .iter()
            .find(|atom| atom["id"] == id)
    }

    fn demo_blueprint() -> Value {
        json!({
            "scenes": [
                "Intro.json",
                {"scene_path": "Talk/Gate.json", "dialog_path": "dialog/gate.json"}
            ],
            "packages": {"Person/Female": 2}
        })
    }

    #[test]
    fn scaffold_builds_packs_and_compiles_every_scene() {
        let paths = workspace("scaffold", demo_blueprint());
        let project = Project::open("Demo", &paths).expect("project");
        let report = project.scaffold().expect("scaffold");

        assert_eq!(report.scenes, 3);
        assert_eq!(report.package_containers, 3);
        assert_eq!(
            report.capacity,
            Capacity {
                max_branches: 3,
                max_choices: 2
            }
        );
        assert_eq!(report.dialog_containers, 11);
        assert_eq!(report.dialogs_compiled, 1);

        let build_dir = paths.scenes.join("Demo.scaffold");
        assert_eq!(project.build_dir(), build_dir.as_path());

        let intro = read_scene(&build_dir.join("Intro.json"));
        assert_eq!(intro["version"], "1.20");
        for id in ["CoreControl", "Person", "Person#2", "Dialog-Branch#3", "Dialog-Choices-Btn#2"] {
            assert!(atom(&intro, id).is_some(), "Intro.json missing {}", id);
        }
        assert_eq!(atom(&intro, "Lamp").expect("backfilled lamp")["on"], "false");
        assert!(atom(&intro, "AnimationStep#1").is_none());

        let existing = read_scene(&build_dir.join("Existing.json"));
        assert_eq!(atom(&existing, "Lamp").expect("own lamp")["on"], "true");
        assert!(atom(&existing, "Person").is_some());

        let gate = read_scene(&build_dir.join("Talk").join("Gate.json"));
        let branch = atom(&gate, "Dialog-Branch#1").expect("first branch");
        let triggers = branch["storables"][0]["triggers"].as_array().expect("triggers");
        assert_eq!(triggers[0]["displayName"], "D:ask");
        let duration = atom(&gate, "Dialog-Branch#3-Duration").expect("third branch duration");
        assert_eq!(duration["storables"][0]["transitionToTime"], "2.5");

        let untouched = atom(&intro, "Dialog-Branch#1").expect("intro branch");
        assert_eq!(untouched["storables"][0]["triggers"], json!([]));
    }

    #[test]
    fn rerunning_starts_from_a_clean_build_directory() {
        let paths = workspace("rerun", demo_blueprint());
        let project = Project::open("Demo", &paths).expect("project");
        project.scaffold().expect("first scaffold");

        let stale = project.build_dir().join("stale.txt");
        fs::write(&stale, "old").expect("stale file");
        let report = project.scaffold().expect("second scaffold");
        assert!(!stale.exists());
        assert_eq!(report.scenes, 3);

        let source = read_scene(&project.source_dir().join("Existing.json"));
        assert!(atom(&source, "Person").is_none());
    }

    #[test]
    fn scene_paths_must_be_json_files() {
        let paths = workspace("invalid", json!({"scenes": ["Intro.txt"]}));
        let error = Project::open("Demo", &paths)
            .expect("project")
            .scaffold()
            .expect_err("bad scene path");
        assert_eq!(error.code, "PROJECT_SCENE_PATH_INVALID");
    }

    #[test]
    fn missing_blueprint_fails_to_open() {
        let paths = workspace("blueprint", demo_blueprint());
        let error = Project::open("Nobody", &paths).expect_err("no blueprint");
        assert_eq!(error.code, "BLUEPRINT_NOT_FOUND");
    }

    #[test]
    fn projects_are_discovered_in_name_order() {
        let root = temp_dir("discover");
        fs::create_dir_all(root.join("b")).expect("b");
        fs::create_dir_all(root.join("a")).expect("a");
        write_file(&root.join("notes.txt"), "not a project");
        assert_eq!(
            discover_projects(&root).expect("projects"),
            vec!["a".to_string(), "b".to_string()]
        );
        let error = discover_projects(&root.join("missing")).expect_err("missing dir");
        assert_eq!(error.code, "PROJECT_SCAN");
    }
}
