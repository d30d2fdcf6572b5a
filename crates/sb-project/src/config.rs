use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sb_core::BuildError;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "config.json";
pub const BLUEPRINT_FILE: &str = "blueprint.json";

fn default_projects_path() -> PathBuf {
    PathBuf::from(".").join("projects")
}

fn default_templates_path() -> PathBuf {
    PathBuf::from(".").join("templates")
}

/// Tool-level `config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuilderConfig {
    #[serde(rename = "VAM_PATH", default)]
    pub vam_path: Option<PathBuf>,
    #[serde(rename = "PROJECTS_PATH", default = "default_projects_path")]
    pub projects_path: PathBuf,
    #[serde(rename = "TEMPLATES_PATH", default = "default_templates_path")]
    pub templates_path: PathBuf,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            vam_path: None,
            projects_path: default_projects_path(),
            templates_path: default_templates_path(),
        }
    }
}

impl BuilderConfig {
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        load_json(path, "CONFIG")
    }

    /// Checks every configured directory exists and derives the scenes
    /// directory from the game install path.
    pub fn resolve(&self) -> Result<BuildPaths, BuildError> {
        let Some(vam_path) = &self.vam_path else {
            return Err(BuildError::new(
                "CONFIG_VAM_PATH_MISSING",
                "VAM_PATH is not set; specify it in config.json or with --vam-path.",
            ));
        };
        require_dir("CONFIG_VAM_PATH_NOT_FOUND", "VAM_PATH", vam_path)?;
        require_dir("CONFIG_PROJECTS_NOT_FOUND", "PROJECTS_PATH", &self.projects_path)?;
        require_dir("TEMPLATE_DIR_NOT_FOUND", "TEMPLATES_PATH", &self.templates_path)?;
        let scenes = vam_path.join("Saves").join("scene");
        require_dir("CONFIG_SCENES_NOT_FOUND", "scene directory", &scenes)?;
        Ok(BuildPaths {
            scenes,
            projects: self.projects_path.clone(),
            templates: self.templates_path.clone(),
        })
    }
}

/// Directories a scaffold run reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    pub scenes: PathBuf,
    pub projects: PathBuf,
    pub templates: PathBuf,
}

/// A blueprint scene: a bare path, or a path with a dialog attached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SceneEntry {
    Path(String),
    Detailed {
        scene_path: String,
        #[serde(default)]
        dialog_path: Option<String>,
    },
}

impl SceneEntry {
    pub fn scene_path(&self) -> &str {
        match self {
            Self::Path(path) => path,
            Self::Detailed { scene_path, .. } => scene_path,
        }
    }

    /// Relative to the project directory.
    pub fn dialog_path(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Detailed { dialog_path, .. } => dialog_path.as_deref().filter(|path| !path.is_empty()),
        }
    }
}

/// Per-project `blueprint.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub scenes: Vec<SceneEntry>,
    /// Package template name to instance count.
    #[serde(default)]
    pub packages: BTreeMap<String, usize>,
}

impl Blueprint {
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        load_json(path, "BLUEPRINT")
    }
}

fn require_dir(code: &'static str, label: &str, path: &Path) -> Result<(), BuildError> {
    if path.is_dir() {
        return Ok(());
    }
    Err(BuildError::new(
        code,
        format!("{} does not exist or is not a directory: {}", label, path.display()),
    ))
}

fn load_json<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T, BuildError> {
    if !path.is_file() {
        return Err(BuildError::new(
            format!("{}_NOT_FOUND", kind),
            format!("File does not exist: {}", path.display()),
        ));
    }
    let raw = fs::read_to_string(path).map_err(|error| {
        BuildError::new(
            format!("{}_READ", kind),
            format!("Failed to read {}: {}", path.display(), error),
        )
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        BuildError::new(
            format!("{}_PARSE", kind),
            format!("Failed to parse {}: {}", path.display(), error),
        )
    })
}
