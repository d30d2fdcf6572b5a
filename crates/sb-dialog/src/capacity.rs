use std::collections::HashSet;

use sb_core::BuildError;

use crate::{DialogGraph, Directive, Passage};

/// How many branch and choice containers a dialog can ever need at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capacity {
    pub max_branches: usize,
    pub max_choices: usize,
}

impl Capacity {
    pub fn max(self, other: Capacity) -> Capacity {
        Capacity {
            max_branches: self.max_branches.max(other.max_branches),
            max_choices: self.max_choices.max(other.max_choices),
        }
    }
}

struct CapacityWalk<'g> {
    graph: &'g DialogGraph,
    visited: HashSet<&'g str>,
    branch_heads: HashSet<&'g str>,
    capacity: Capacity,
}

impl<'g> CapacityWalk<'g> {
    /// Follows links the way the compiler does: every link of a prompt opens
    /// a branch, a non-prompt passage continues into its first link only.
    fn visit(&mut self, passage: &'g Passage, opens_branch: bool) -> Result<(), BuildError> {
        if opens_branch && self.branch_heads.insert(passage.name.as_str()) {
            self.capacity.max_branches += 1;
        }
        if !self.visited.insert(passage.name.as_str()) {
            return Ok(());
        }

        let directive = Directive::from_passage(passage)?;
        let links = passage.normalized_links();
        if directive.prompt {
            self.capacity.max_choices = self.capacity.max_choices.max(links.len());
            for link in &links {
                let next = self.graph.follow(passage, link)?;
                self.visit(next, true)?;
            }
        } else if let Some(link) = links.first() {
            let next = self.graph.follow(passage, link)?;
            self.visit(next, false)?;
        }
        Ok(())
    }
}

impl DialogGraph {
    /// Walks the graph once from the start passage. Every passage is expanded
    /// at most once; a passage counts as one branch however many prompts
    /// lead to it.
    pub fn estimate_capacity(&self) -> Result<Capacity, BuildError> {
        let mut walk = CapacityWalk {
            graph: self,
            visited: HashSet::new(),
            branch_heads: HashSet::new(),
            capacity: Capacity::default(),
        };
        walk.visit(self.start(), true)?;
        Ok(walk.capacity)
    }
}
