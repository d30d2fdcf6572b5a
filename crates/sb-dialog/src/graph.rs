use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use sb_core::BuildError;
use serde::{Deserialize, Serialize};

use crate::Link;

/// A link as exported by the story editor, before routing syntax is reduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLink {
    pub link: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<RawLink>,
}

fn link_markup_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\[\[[^\]]+\]\]").expect("link markup regex"))
}

impl Passage {
    pub fn normalized_links(&self) -> Vec<Link> {
        self.links.iter().map(Link::from_raw).collect()
    }

    /// Passage text with `[[...]]` link markup removed.
    pub fn content(&self) -> String {
        link_markup_regex()
            .replace_all(&self.text, "")
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialogDocument {
    #[serde(default)]
    pub passages: Vec<Passage>,
}

/// Read-only view of an authored dialog: the first passage starts the
/// dialog, the rest are looked up by name.
#[derive(Debug, Clone)]
pub struct DialogGraph {
    start: Passage,
    passages: HashMap<String, Passage>,
}

impl DialogGraph {
    pub fn from_passages(passages: Vec<Passage>) -> Result<Self, BuildError> {
        let mut passages = passages.into_iter();
        let Some(start) = passages.next() else {
            return Err(BuildError::new(
                "DIALOG_EMPTY",
                "Dialog document contains no passages.",
            ));
        };
        let passages = passages
            .map(|passage| (passage.name.clone(), passage))
            .collect();
        Ok(Self { start, passages })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, BuildError> {
        let document: DialogDocument = serde_json::from_str(raw)
            .map_err(|error| BuildError::map("DIALOG_PARSE", error))?;
        Self::from_passages(document.passages)
    }

    pub fn load(path: &Path) -> Result<Self, BuildError> {
        if !path.is_file() {
            return Err(BuildError::new(
                "DIALOG_NOT_FOUND",
                format!("Dialog file does not exist: {}", path.display()),
            ));
        }
        let raw = fs::read_to_string(path).map_err(|error| BuildError::map("DIALOG_READ", error))?;
        Self::from_json_str(&raw).map_err(|error| BuildError {
            message: format!("{} ({})", error.message, path.display()),
            ..error
        })
    }

    pub fn start(&self) -> &Passage {
        &self.start
    }

    pub fn passage_count(&self) -> usize {
        self.passages.len() + 1
    }

    /// Non-start passages shadow the start passage on a name clash.
    pub fn passage(&self, name: &str) -> Option<&Passage> {
        self.passages
            .get(name)
            .or_else(|| (self.start.name == name).then_some(&self.start))
    }

    pub fn follow(&self, from: &Passage, link: &Link) -> Result<&Passage, BuildError> {
        self.passage(&link.target).ok_or_else(|| {
            BuildError::for_passage(
                "DIALOG_LINK_UNRESOLVED",
                format!(
                    "Passage \"{}\" links to unknown passage \"{}\".",
                    from.name, link.target
                ),
                from.name.clone(),
            )
        })
    }
}

#[cfg(test)]
mod graph_tests {
    use super::*;

    #[test]
    fn first_passage_starts_the_dialog() {
        let graph = DialogGraph::from_json_str(
            r#"{"passages":[
                {"name":"Intro","text":"Hi","tags":["Guard","says"],"links":[{"link":"Next","name":"Next"}]},
                {"name":"Next","text":"Bye","tags":["delay"],"pid":"2"}
            ]}"#,
        )
        .expect("graph");
        assert_eq!(graph.start().name, "Intro");
        assert_eq!(graph.passage_count(), 2);
        assert_eq!(graph.passage("Next").map(|p| p.text.as_str()), Some("Bye"));
        assert!(graph.passage("Next").is_some_and(|p| p.links.is_empty()));
        assert_eq!(graph.passage("Intro").map(|p| p.name.as_str()), Some("Intro"));
        assert!(graph.passage("Nowhere").is_none());
    }

    #[test]
    fn empty_and_malformed_documents_fail_to_load() {
        let empty = DialogGraph::from_json_str(r#"{"passages":[]}"#).expect_err("empty");
        assert_eq!(empty.code, "DIALOG_EMPTY");

        let missing = DialogGraph::from_json_str("{}").expect_err("no passages key");
        assert_eq!(missing.code, "DIALOG_EMPTY");

        let broken = DialogGraph::from_json_str("{").expect_err("broken");
        assert_eq!(broken.code, "DIALOG_PARSE");

        let missing_file = DialogGraph::load(Path::new("/definitely/not/here.json"))
            .expect_err("missing file");
        assert_eq!(missing_file.code, "DIALOG_NOT_FOUND");
    }

    #[test]
    fn content_strips_link_markup() {
        let passage = Passage {
            name: "Intro".to_string(),
            text: "Halt! [[Go|next]]\n[[RED:Leave->leave]]".to_string(),
            tags: vec![],
            links: vec![],
        };
        assert_eq!(passage.content(), "Halt!");
    }

    #[test]
    fn follow_reports_unknown_targets_with_the_source_passage() {
        let graph = DialogGraph::from_json_str(
            r#"{"passages":[{"name":"Intro","tags":["delay"],"links":[{"link":"Ghost","name":"Ghost"}]}]}"#,
        )
        .expect("graph");
        let start = graph.start();
        let link = &start.normalized_links()[0];
        let error = graph.follow(start, link).expect_err("unknown target");
        assert_eq!(error.code, "DIALOG_LINK_UNRESOLVED");
        assert_eq!(error.passage.as_deref(), Some("Intro"));
    }
}
