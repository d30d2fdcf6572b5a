use std::fs;
use std::path::{Path, PathBuf};

use sb_core::{BuildError, Container};
use serde_json::Value;
use tracing::debug;

use crate::{expand_placeholders, Placeholders};

pub const PACKAGES_DIR: &str = "packages";

/// On-disk object templates, addressed by name relative to the root
/// (`trigger`, `dialog_branch`, `packages/Person`, ...).
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, BuildError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(BuildError::new(
                "TEMPLATE_DIR_NOT_FOUND",
                format!("Template directory not found: {}", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template_path(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        let mut segments = name.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{}.json", segment));
            }
        }
        path
    }

    pub fn read_raw(&self, name: &str) -> Result<String, BuildError> {
        let path = self.template_path(name);
        if !path.is_file() {
            return Err(BuildError::new(
                "TEMPLATE_NOT_FOUND",
                format!("Template \"{}\" not found at {}", name, path.display()),
            ));
        }
        fs::read_to_string(&path).map_err(|error| {
            BuildError::new(
                "TEMPLATE_READ",
                format!("Failed to read template {}: {}", path.display(), error),
            )
        })
    }

    /// Expands placeholders, then parses the result as JSON.
    pub fn load_value(&self, name: &str, placeholders: &Placeholders) -> Result<Value, BuildError> {
        let raw = self.read_raw(name)?;
        let expanded = expand_placeholders(name, &raw, placeholders)?;
        serde_json::from_str(&expanded).map_err(|error| {
            BuildError::new(
                "TEMPLATE_PARSE",
                format!("Template \"{}\" is not valid JSON: {}", name, error),
            )
        })
    }

    /// Loads a template holding a JSON array of container records and returns
    /// freshly keyed containers.
    pub fn instantiate(
        &self,
        name: &str,
        placeholders: &Placeholders,
    ) -> Result<Vec<Container>, BuildError> {
        let Value::Array(items) = self.load_value(name, placeholders)? else {
            return Err(BuildError::new(
                "TEMPLATE_INVALID",
                format!("Template \"{}\" must be a JSON array of containers.", name),
            ));
        };
        let containers = items
            .into_iter()
            .map(Container::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(template = name, count = containers.len(), "instantiated template");
        Ok(containers)
    }

    /// `count` instances of a package. The first instance is keyed by the
    /// package's leading path segment, later ones append `#n`.
    pub fn package_containers(
        &self,
        package: &str,
        count: usize,
    ) -> Result<Vec<Container>, BuildError> {
        let base_id = package.split('/').next().unwrap_or(package);
        let name = format!("{}/{}", PACKAGES_DIR, package);
        let mut containers = Vec::new();
        for index in 0..count {
            let id = if index == 0 {
                base_id.to_string()
            } else {
                format!("{}#{}", base_id, index + 1)
            };
            containers.extend(self.instantiate(&name, &Placeholders::with_id(id))?);
        }
        Ok(containers)
    }
}
