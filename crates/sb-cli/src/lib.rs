use std::ffi::OsString;

use clap::Parser;
use sb_core::BuildError;
use sb_dialog::DialogGraph;
use sb_project::{discover_projects, BuilderConfig, Project, ScaffoldReport};
use tracing::{error, info};

mod cli_args;
mod error_map;
mod logging;

pub(crate) use cli_args::{BuildArgs, Cli, InspectArgs, Mode};
pub(crate) use error_map::{emit_error, map_cli_log_file, print_error_lines};
pub(crate) use logging::init_logging;

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, BuildError> {
    match cli.command {
        Mode::Build(args) => run_build(args),
        Mode::Inspect(args) => run_inspect(args),
    }
}

/// File values first, then command-line overrides. A missing config file is
/// only tolerated when `--vam-path` supplies the one required setting.
fn load_config(args: &BuildArgs) -> Result<BuilderConfig, BuildError> {
    let mut config = if args.config.is_file() || args.vam_path.is_none() {
        BuilderConfig::load(&args.config)?
    } else {
        BuilderConfig::default()
    };
    if let Some(path) = &args.vam_path {
        config.vam_path = Some(path.clone());
    }
    if let Some(path) = &args.projects_path {
        config.projects_path = path.clone();
    }
    if let Some(path) = &args.templates_path {
        config.templates_path = path.clone();
    }
    Ok(config)
}

fn select_projects(available: Vec<String>, wanted: &[String]) -> Result<Vec<String>, BuildError> {
    if wanted.is_empty() {
        return Ok(available);
    }
    if let Some(missing) = wanted.iter().find(|name| !available.contains(*name)) {
        return Err(BuildError::new(
            "CLI_PROJECT_NOT_FOUND",
            format!("No project named \"{}\" under PROJECTS_PATH.", missing),
        ));
    }
    Ok(available
        .into_iter()
        .filter(|name| wanted.contains(name))
        .collect())
}

fn run_build(args: BuildArgs) -> Result<i32, BuildError> {
    init_logging(args.log_file.as_deref())?;
    let config = load_config(&args)?;
    let paths = config.resolve()?;
    let projects = select_projects(discover_projects(&paths.projects)?, &args.projects)?;
    info!(count = projects.len(), "building projects");

    let mut outcomes = Vec::new();
    for name in projects {
        info!(project = name.as_str(), "scaffolding project");
        let outcome = Project::open(&name, &paths).and_then(|project| project.scaffold());
        match &outcome {
            Ok(report) => info!(
                project = name.as_str(),
                scenes = report.scenes,
                dialogs = report.dialogs_compiled,
                "project scaffolded"
            ),
            Err(failure) => error!(
                project = name.as_str(),
                code = failure.code.as_str(),
                message = failure.message.as_str(),
                "project failed"
            ),
        }
        outcomes.push((name, outcome));
    }
    Ok(emit_build(&outcomes))
}

fn emit_build(outcomes: &[(String, Result<ScaffoldReport, BuildError>)]) -> i32 {
    let failed = outcomes.iter().any(|(_, outcome)| outcome.is_err());
    println!("RESULT:{}", if failed { "ERROR" } else { "OK" });
    for (name, outcome) in outcomes {
        match outcome {
            Ok(report) => println!(
                "PROJECT:{}|OK|SCENES:{}|BRANCHES:{}|CHOICES:{}",
                name, report.scenes, report.capacity.max_branches, report.capacity.max_choices
            ),
            Err(failure) => {
                println!("PROJECT:{}|ERROR", name);
                print_error_lines(failure);
            }
        }
    }
    i32::from(failed)
}

fn run_inspect(args: InspectArgs) -> Result<i32, BuildError> {
    let graph = DialogGraph::load(&args.dialog)?;
    let capacity = graph.estimate_capacity()?;
    println!("RESULT:OK");
    println!("START:{}", graph.start().name);
    println!("PASSAGES:{}", graph.passage_count());
    println!("BRANCHES:{}", capacity.max_branches);
    println!("CHOICES:{}", capacity.max_choices);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn build_args(config: &str) -> BuildArgs {
        BuildArgs {
            config: PathBuf::from(config),
            vam_path: None,
            projects_path: None,
            templates_path: None,
            projects: Vec::new(),
            log_file: None,
        }
    }

    #[test]
    fn missing_config_without_overrides_fails() {
        let error = load_config(&build_args("/nonexistent/config.json")).expect_err("no config");
        assert_eq!(error.code, "CONFIG_NOT_FOUND");
    }

    #[test]
    fn command_line_paths_override_defaults() {
        let mut args = build_args("/nonexistent/config.json");
        args.vam_path = Some(PathBuf::from("/games/vam"));
        args.templates_path = Some(PathBuf::from("/srv/templates"));
        let config = load_config(&args).expect("config");
        assert_eq!(config.vam_path, Some(PathBuf::from("/games/vam")));
        assert_eq!(config.templates_path, PathBuf::from("/srv/templates"));
        assert_eq!(config.projects_path, PathBuf::from("./projects"));
    }

    #[test]
    fn project_filter_keeps_order_and_rejects_unknown_names() {
        let available = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let picked = select_projects(available.clone(), &["c".to_string(), "a".to_string()])
            .expect("selection");
        assert_eq!(picked, vec!["a".to_string(), "c".to_string()]);

        let error = select_projects(available, &["z".to_string()]).expect_err("unknown");
        assert_eq!(error.code, "CLI_PROJECT_NOT_FOUND");
    }

    #[test]
    fn build_exit_code_reflects_any_failure() {
        let ok = ("a".to_string(), Ok(ScaffoldReport::default()));
        let failed = ("b".to_string(), Err(BuildError::new("SCENE_WRITE", "disk full")));
        assert_eq!(emit_build(&[ok.clone()]), 0);
        assert_eq!(emit_build(&[ok, failed]), 1);
    }

    #[test]
    fn parse_errors_return_clap_exit_code() {
        assert_eq!(run_cli_from_args(["story-builder", "unknown"]), 2);
    }
}
