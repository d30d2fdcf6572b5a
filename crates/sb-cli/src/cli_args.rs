use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "story-builder")]
#[command(about = "Scaffold scene sets and compile their dialog trees")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Scaffold every project (or the selected ones) into the scenes directory.
    Build(BuildArgs),
    /// Validate one dialog file and report the containers it needs.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub(crate) struct BuildArgs {
    #[arg(long = "config", default_value = "config.json")]
    pub(crate) config: PathBuf,
    #[arg(long = "vam-path")]
    pub(crate) vam_path: Option<PathBuf>,
    #[arg(long = "projects-path")]
    pub(crate) projects_path: Option<PathBuf>,
    #[arg(long = "templates-path")]
    pub(crate) templates_path: Option<PathBuf>,
    /// Restrict the run to these project names.
    #[arg(long = "project")]
    pub(crate) projects: Vec<String>,
    #[arg(long = "log-file")]
    pub(crate) log_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub(crate) struct InspectArgs {
    #[arg(long = "dialog")]
    pub(crate) dialog: PathBuf,
}
