//! Model Index - id → element lookup over the element tree
//!
//! Each entry stores the element's parent id and its child path from the root
//! (`[2, 0]` = first child of the root's third child). Lookup by id is a hash hit
//! followed by a walk down the path.
//!
//! Paths go stale when siblings are reordered, so every structural change made
//! through [`crate::DiagramModel`] refreshes the affected subtree.

use crate::element::{Element, ModelRoot};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Id of the parent (the root id for top-level elements)
    pub parent_id: String,
    /// Child indices from the root down to the element
    pub path: Vec<usize>,
}

impl IndexEntry {
    /// Index among the element's siblings
    pub fn sibling_index(&self) -> usize {
        self.path.last().copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelIndex {
    root_id: String,
    entries: HashMap<String, IndexEntry>,
}

impl ModelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh index over the whole tree
    pub fn build(root: &ModelRoot) -> Self {
        let mut index = Self {
            root_id: root.id.clone(),
            entries: HashMap::new(),
        };
        let mut path = Vec::new();
        index.add_children(&root.id, &root.children, &mut path);
        tracing::trace!("ModelIndex built with {} elements", index.entries.len());
        index
    }

    fn add_children(&mut self, parent_id: &str, children: &[Element], path: &mut Vec<usize>) {
        for (i, child) in children.iter().enumerate() {
            path.push(i);
            if self.entries.contains_key(&child.id) || child.id == self.root_id {
                tracing::warn!(
                    "Duplicate element id {:?} under {:?}; keeping the first occurrence",
                    child.id,
                    parent_id
                );
            } else {
                self.entries.insert(
                    child.id.clone(),
                    IndexEntry {
                        parent_id: parent_id.to_string(),
                        path: path.clone(),
                    },
                );
            }
            self.add_children(&child.id, &child.children, path);
            path.pop();
        }
    }

    /// Re-walk the subtree below `parent_id` after its children were reordered
    pub fn refresh(&mut self, root: &ModelRoot, parent_id: &str) {
        let (mut path, children) = if parent_id == root.id {
            (Vec::new(), &root.children)
        } else {
            let Some(entry) = self.entries.get(parent_id) else {
                *self = Self::build(root);
                return;
            };
            let path = entry.path.clone();
            match resolve(&root.children, &path) {
                Some(parent) if parent.id == parent_id => (path, &parent.children),
                _ => {
                    *self = Self::build(root);
                    return;
                }
            }
        };

        // Paths below the parent are overwritten; duplicates are already known.
        let mut stack: Vec<(String, &Element, Vec<usize>)> = Vec::new();
        for (i, child) in children.iter().enumerate() {
            path.push(i);
            stack.push((parent_id.to_string(), child, path.clone()));
            path.pop();
        }
        while let Some((parent, element, element_path)) = stack.pop() {
            for (i, child) in element.children.iter().enumerate() {
                let mut child_path = element_path.clone();
                child_path.push(i);
                stack.push((element.id.clone(), child, child_path));
            }
            if let Some(entry) = self.entries.get_mut(&element.id) {
                if entry.parent_id == parent {
                    entry.path = element_path;
                }
            }
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn entry(&self, id: &str) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get<'a>(&self, root: &'a ModelRoot, id: &str) -> Option<&'a Element> {
        let entry = self.entries.get(id)?;
        resolve(&root.children, &entry.path).filter(|e| e.id == id)
    }

    pub fn get_mut<'a>(&self, root: &'a mut ModelRoot, id: &str) -> Option<&'a mut Element> {
        let entry = self.entries.get(id)?;
        resolve_mut(&mut root.children, &entry.path).filter(|e| e.id == id)
    }
}

fn resolve<'a>(children: &'a [Element], path: &[usize]) -> Option<&'a Element> {
    let (first, rest) = path.split_first()?;
    let element = children.get(*first)?;
    if rest.is_empty() {
        Some(element)
    } else {
        resolve(&element.children, rest)
    }
}

fn resolve_mut<'a>(children: &'a mut [Element], path: &[usize]) -> Option<&'a mut Element> {
    let (first, rest) = path.split_first()?;
    let element = children.get_mut(*first)?;
    if rest.is_empty() {
        Some(element)
    } else {
        resolve_mut(&mut element.children, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModelRoot {
        ModelRoot::new("graph", "graph").with_children(vec![
            Element::new("n1", "node").with_children(vec![
                Element::new("p1", "port"),
                Element::new("l1", "label"),
            ]),
            Element::new("n2", "node"),
            Element::edge("e1", "n1", "n2"),
        ])
    }

    #[test]
    fn test_build_indexes_every_element() {
        let root = sample();
        let index = ModelIndex::build(&root);

        assert_eq!(index.len(), 5);
        assert_eq!(index.root_id(), "graph");
        assert_eq!(index.entry("p1").unwrap().parent_id, "n1");
        assert_eq!(index.entry("l1").unwrap().path, vec![0, 1]);
        assert_eq!(index.entry("e1").unwrap().sibling_index(), 2);
    }

    #[test]
    fn test_lookup_miss() {
        let root = sample();
        let index = ModelIndex::build(&root);
        assert!(index.get(&root, "missing").is_none());
        assert!(!index.contains("graph"));
    }

    #[test]
    fn test_get_mut_edits_in_place() {
        let mut root = sample();
        let index = ModelIndex::build(&root);

        index.get_mut(&mut root, "l1").unwrap().selected = true;
        assert!(root.children[0].children[1].selected);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let root = ModelRoot::new("graph", "graph").with_children(vec![
            Element::new("dup", "node"),
            Element::new("dup", "edge"),
        ]);
        let index = ModelIndex::build(&root);

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&root, "dup").unwrap().type_tag, "node");
    }

    #[test]
    fn test_refresh_after_reorder() {
        let mut root = sample();
        let mut index = ModelIndex::build(&root);

        let n1 = root.children.remove(0);
        root.children.push(n1);
        index.refresh(&root, "graph");

        assert_eq!(index.entry("n1").unwrap().path, vec![2]);
        assert_eq!(index.entry("p1").unwrap().path, vec![2, 0]);
        assert_eq!(index.get(&root, "n2").unwrap().id, "n2");
    }
}
