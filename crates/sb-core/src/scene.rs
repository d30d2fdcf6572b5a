use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::record::take_field;
use crate::{BuildError, Container, RecordMap};

pub const CONTAINERS_KEY: &str = "atoms";

/// A scene save file: document-level fields plus its containers by id.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDocument {
    fields: Map<String, Value>,
    containers: RecordMap<Container>,
}

impl SceneDocument {
    pub fn from_value(value: Value) -> Result<Self, BuildError> {
        let Value::Object(mut fields) = value else {
            return Err(BuildError::new(
                "SCENE_INVALID",
                "Scene document must be a JSON object.",
            ));
        };
        let containers = match take_field(&mut fields, CONTAINERS_KEY) {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(Container::from_value)
                .collect::<Result<RecordMap<_>, _>>()?,
            _ => {
                return Err(BuildError::new(
                    "SCENE_INVALID",
                    format!("Scene document needs an \"{}\" array.", CONTAINERS_KEY),
                ))
            }
        };
        Ok(Self { fields, containers })
    }

    pub fn load(path: &Path) -> Result<Self, BuildError> {
        if !path.is_file() {
            return Err(BuildError::new(
                "SCENE_NOT_FOUND",
                format!("Scene file does not exist: {}", path.display()),
            ));
        }
        let raw = fs::read_to_string(path).map_err(|error| BuildError::map("SCENE_READ", error))?;
        let value = serde_json::from_str(&raw).map_err(|error| {
            BuildError::new(
                "SCENE_PARSE",
                format!("Failed to parse scene {}: {}", path.display(), error),
            )
        })?;
        Self::from_value(value)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn containers(&self) -> &RecordMap<Container> {
        &self.containers
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.get(id)
    }

    pub fn container_mut(&mut self, id: &str) -> Option<&mut Container> {
        self.containers.get_mut(id)
    }

    /// First write wins: ids already present in the scene are left untouched.
    /// Returns how many containers were added.
    pub fn pack<'a, I>(&mut self, containers: I) -> usize
    where
        I: IntoIterator<Item = &'a Container>,
    {
        let mut added = 0;
        for container in containers {
            if !self.containers.contains(container.id()) {
                self.containers.insert(container.clone());
                added += 1;
            }
        }
        added
    }

    /// Shallow merge of document-level fields. An `atoms` entry replaces the
    /// containers as a whole.
    pub fn merge(&mut self, data: Map<String, Value>) -> Result<(), BuildError> {
        for (key, value) in data {
            if key == CONTAINERS_KEY {
                let Value::Array(items) = value else {
                    return Err(BuildError::new(
                        "SCENE_INVALID",
                        format!("Scene \"{}\" must be an array.", CONTAINERS_KEY),
                    ));
                };
                self.containers = items
                    .into_iter()
                    .map(Container::from_value)
                    .collect::<Result<RecordMap<_>, _>>()?;
                continue;
            }
            self.fields.insert(key, value);
        }
        Ok(())
    }

    pub fn build(&self) -> Value {
        let mut data = self.fields.clone();
        data.insert(
            CONTAINERS_KEY.to_string(),
            Value::Array(self.containers.iter().map(Container::build).collect()),
        );
        Value::Object(data)
    }
}
