use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::BuildError;

pub const SUB_RECORDS_KEY: &str = "storables";
const ID_KEY: &str = "id";

pub trait Keyed {
    fn key(&self) -> &str;
}

/// Insertion-ordered records addressed by id.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMap<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for RecordMap<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Keyed> RecordMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|position| &self.entries[*position])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        let position = *self.index.get(id)?;
        self.entries.get_mut(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|record| record.key())
    }

    /// Inserts or replaces; a replaced record keeps its original position.
    pub fn insert(&mut self, record: T) -> Option<T> {
        if let Some(&position) = self.index.get(record.key()) {
            return Some(std::mem::replace(&mut self.entries[position], record));
        }
        self.index.insert(record.key().to_string(), self.entries.len());
        self.entries.push(record);
        None
    }
}

impl<T: Keyed> FromIterator<T> for RecordMap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut records = Self::new();
        for record in iter {
            records.insert(record);
        }
        records
    }
}

impl<T: Keyed> Extend<T> for RecordMap<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl<T> IntoIterator for RecordMap<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a RecordMap<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn take_object(value: Value, what: &str) -> Result<Map<String, Value>, BuildError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(BuildError::new(
            "RECORD_INVALID",
            format!("Expected {} to be a JSON object, got {}.", what, other),
        )),
    }
}

/// Takes a field's value but leaves its key in place, so the key keeps its
/// position when `build` writes it back.
pub(crate) fn take_field(fields: &mut Map<String, Value>, key: &str) -> Option<Value> {
    fields.get_mut(key).map(Value::take)
}

fn read_id(fields: &Map<String, Value>, what: &str) -> Result<String, BuildError> {
    match fields.get(ID_KEY) {
        Some(Value::String(id)) => Ok(id.clone()),
        _ => Err(BuildError::new(
            "RECORD_INVALID",
            format!("Expected {} to carry a string \"id\".", what),
        )),
    }
}

/// A property block owned by one container.
#[derive(Debug, Clone, PartialEq)]
pub struct SubRecord {
    id: String,
    fields: Map<String, Value>,
}

impl SubRecord {
    pub fn from_value(value: Value) -> Result<Self, BuildError> {
        let fields = take_object(value, "sub-record")?;
        let id = read_id(&fields, "sub-record")?;
        Ok(Self { id, fields })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Shallow merge: top-level fields are replaced wholesale. The id is fixed.
    pub fn merge(&mut self, data: Map<String, Value>) {
        for (key, value) in data {
            if key != ID_KEY {
                self.fields.insert(key, value);
            }
        }
    }

    pub fn build(&self) -> Value {
        let mut data = self.fields.clone();
        data.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        Value::Object(data)
    }
}

impl Keyed for SubRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

/// A scene object: top-level fields plus the sub-records it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    id: String,
    fields: Map<String, Value>,
    sub_records: RecordMap<SubRecord>,
}

impl Container {
    pub fn from_value(value: Value) -> Result<Self, BuildError> {
        let mut fields = take_object(value, "container")?;
        let id = read_id(&fields, "container")?;
        let sub_records = match take_field(&mut fields, SUB_RECORDS_KEY) {
            Some(raw) => parse_sub_records(raw, &id)?,
            None => RecordMap::new(),
        };
        Ok(Self {
            id,
            fields,
            sub_records,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn sub_records(&self) -> &RecordMap<SubRecord> {
        &self.sub_records
    }

    pub fn sub_record(&self, id: &str) -> Option<&SubRecord> {
        self.sub_records.get(id)
    }

    pub fn sub_record_mut(&mut self, id: &str) -> Option<&mut SubRecord> {
        self.sub_records.get_mut(id)
    }

    /// Shallow merge of top-level fields. A `storables` entry replaces the
    /// owned sub-records as a whole.
    pub fn merge(&mut self, data: Map<String, Value>) -> Result<(), BuildError> {
        for (key, value) in data {
            if key == ID_KEY {
                continue;
            }
            if key == SUB_RECORDS_KEY {
                self.sub_records = parse_sub_records(value, &self.id)?;
                continue;
            }
            self.fields.insert(key, value);
        }
        Ok(())
    }

    /// Independent snapshot; later edits to the container do not leak into it.
    pub fn build(&self) -> Value {
        let mut data = self.fields.clone();
        data.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        data.insert(
            SUB_RECORDS_KEY.to_string(),
            Value::Array(self.sub_records.iter().map(SubRecord::build).collect()),
        );
        Value::Object(data)
    }
}

impl Keyed for Container {
    fn key(&self) -> &str {
        &self.id
    }
}

fn parse_sub_records(raw: Value, owner: &str) -> Result<RecordMap<SubRecord>, BuildError> {
    match raw {
        Value::Array(items) => items.into_iter().map(SubRecord::from_value).collect(),
        _ => Err(BuildError::new(
            "RECORD_INVALID",
            format!("Container \"{}\" has a non-array \"{}\".", owner, SUB_RECORDS_KEY),
        )),
    }
}

#[cfg(test)]
mod record_tests {
    use super::*;
    use serde_json::json;

    fn button() -> Container {
        Container::from_value(json!({
            "id": "Dialog-Choices-Btn#1",
            "on": "false",
            "storables": [
                {"id": "Text", "text": ""},
                {"id": "ButtonColor", "color": {"h": "0", "s": "0", "v": "0"}}
            ]
        }))
        .expect("container should parse")
    }

    #[test]
    fn container_round_trips_fields_and_sub_record_order() {
        let container = button();
        let built = container.build();
        assert_eq!(built["id"], "Dialog-Choices-Btn#1");
        assert_eq!(built["on"], "false");
        let ids = built["storables"]
            .as_array()
            .expect("storables array")
            .iter()
            .map(|item| item["id"].as_str().unwrap_or_default().to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["Text", "ButtonColor"]);
    }

    #[test]
    fn build_keeps_the_source_key_order() {
        let container = Container::from_value(json!({
            "on": "true",
            "id": "Lamp",
            "storables": [{"type": "Light", "id": "Light", "range": "5"}],
            "zeta": "1",
            "alpha": "2"
        }))
        .expect("container");
        let built = container.build();
        let keys = built
            .as_object()
            .expect("object")
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["on", "id", "storables", "zeta", "alpha"]);
        let light_keys = built["storables"][0]
            .as_object()
            .expect("light")
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(light_keys, vec!["type", "id", "range"]);
    }

    #[test]
    fn copies_are_independent() {
        let original = button();
        let mut copy = original.clone();
        copy.set_field("on", json!("true"));
        copy.sub_record_mut("Text")
            .expect("text")
            .set_field("text", json!("Leave"));

        assert_eq!(original.field("on"), Some(&json!("false")));
        assert_eq!(
            original.sub_record("Text").and_then(|text| text.field("text")),
            Some(&json!(""))
        );
    }

    #[test]
    fn merge_is_shallow_and_keeps_identity() {
        let mut container = button();
        let mut data = Map::new();
        data.insert("id".to_string(), json!("Other"));
        data.insert("position".to_string(), json!({"x": "1"}));
        container.merge(data).expect("merge");
        assert_eq!(container.id(), "Dialog-Choices-Btn#1");
        assert_eq!(container.field("position"), Some(&json!({"x": "1"})));

        let mut nested = Map::new();
        nested.insert("position".to_string(), json!({"y": "2"}));
        container.merge(nested).expect("merge");
        assert_eq!(container.field("position"), Some(&json!({"y": "2"})));
    }

    #[test]
    fn merge_replaces_sub_records_when_given() {
        let mut container = button();
        let mut data = Map::new();
        data.insert("storables".to_string(), json!([{"id": "Only"}]));
        container.merge(data).expect("merge");
        assert_eq!(container.sub_records().len(), 1);
        assert!(container.sub_record("Only").is_some());
    }

    #[test]
    fn rejects_records_without_string_id() {
        let error = Container::from_value(json!({"storables": []})).expect_err("no id");
        assert_eq!(error.code, "RECORD_INVALID");

        let error = Container::from_value(json!({"id": "A", "storables": [{"id": 3}]}))
            .expect_err("numeric sub-record id");
        assert_eq!(error.code, "RECORD_INVALID");

        let error = Container::from_value(json!({"id": "A", "storables": {}}))
            .expect_err("object storables");
        assert_eq!(error.code, "RECORD_INVALID");
    }

    #[test]
    fn record_map_replaces_in_place() {
        let mut records = RecordMap::new();
        records.insert(SubRecord::from_value(json!({"id": "a", "v": 1})).expect("a"));
        records.insert(SubRecord::from_value(json!({"id": "b"})).expect("b"));
        let replaced =
            records.insert(SubRecord::from_value(json!({"id": "a", "v": 2})).expect("a2"));
        assert!(replaced.is_some());
        assert_eq!(records.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(records.get("a").and_then(|a| a.field("v")), Some(&json!(2)));
        assert!(records.contains("b"));
        assert!(!records.contains("c"));
    }
}
