mod assembler;
mod config;
mod project;

pub use assembler::{
    backfill_containers, pack_scenes, project_capacity, ProjectScene, SceneSet, BACKFILL_IGNORED,
};
pub use config::{Blueprint, BuildPaths, BuilderConfig, SceneEntry, BLUEPRINT_FILE, CONFIG_FILE};
pub use project::{discover_projects, Project, ScaffoldReport};
