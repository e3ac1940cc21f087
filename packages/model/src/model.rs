//! # Diagram Model
//!
//! Owns the current [`ModelRoot`] together with its [`ModelIndex`] and is the only
//! way commands touch the tree, so the index can never drift from the tree it
//! describes.

use crate::element::{Element, ModelRoot};
use crate::index::ModelIndex;

#[derive(Debug, Clone)]
pub struct DiagramModel {
    root: ModelRoot,
    index: ModelIndex,
}

impl DiagramModel {
    pub fn new(root: ModelRoot) -> Self {
        let index = ModelIndex::build(&root);
        Self { root, index }
    }

    pub fn empty() -> Self {
        Self::new(ModelRoot::empty())
    }

    pub fn root(&self) -> &ModelRoot {
        &self.root
    }

    pub fn index(&self) -> &ModelIndex {
        &self.index
    }

    pub fn into_root(self) -> ModelRoot {
        self.root
    }

    /// Swap in a new root and return the previous one
    pub fn replace_root(&mut self, root: ModelRoot) -> ModelRoot {
        let previous = std::mem::replace(&mut self.root, root);
        self.index = ModelIndex::build(&self.root);
        previous
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.index.get(&self.root, id)
    }

    /// Mutable access to one element.
    ///
    /// Structural edits (adding, removing or reordering children) must go through
    /// [`DiagramModel::move_child`] or [`DiagramModel::replace_root`] instead.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.index.get_mut(&mut self.root, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    pub fn parent_id(&self, id: &str) -> Option<&str> {
        self.index.entry(id).map(|e| e.parent_id.as_str())
    }

    /// Parent id and index among siblings
    pub fn position(&self, id: &str) -> Option<(String, usize)> {
        self.index
            .entry(id)
            .map(|e| (e.parent_id.clone(), e.sibling_index()))
    }

    /// Number of children under `parent_id` (root id included)
    pub fn child_count(&self, parent_id: &str) -> Option<usize> {
        if parent_id == self.root.id {
            Some(self.root.children.len())
        } else {
            self.get(parent_id).map(|p| p.children.len())
        }
    }

    /// Move an element to `new_index` among its siblings.
    ///
    /// The index is clamped to the last position. Returns false if the element is
    /// not in the model.
    pub fn move_child(&mut self, id: &str, new_index: usize) -> bool {
        let Some((parent_id, current)) = self.position(id) else {
            return false;
        };

        let children = if parent_id == self.root.id {
            &mut self.root.children
        } else {
            match self.index.get_mut(&mut self.root, &parent_id) {
                Some(parent) => &mut parent.children,
                None => return false,
            }
        };

        if current >= children.len() || children[current].id != id {
            return false;
        }

        let element = children.remove(current);
        let target = new_index.min(children.len());
        children.insert(target, element);

        self.index.refresh(&self.root, &parent_id);
        true
    }

    /// All elements in pre-order
    pub fn elements(&self) -> Vec<&Element> {
        self.root.elements()
    }

    /// Visit every element mutably. Must not reorder children.
    pub fn for_each_mut(&mut self, f: impl FnMut(&mut Element)) {
        self.root.for_each_mut(f);
    }
}

impl Default for DiagramModel {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<ModelRoot> for DiagramModel {
    fn from(root: ModelRoot) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DiagramModel {
        DiagramModel::new(ModelRoot::new("graph", "graph").with_children(vec![
            Element::new("a", "node"),
            Element::new("b", "node").with_children(vec![
                Element::new("b1", "port"),
                Element::new("b2", "port"),
            ]),
            Element::new("c", "node"),
        ]))
    }

    fn child_ids(children: &[Element]) -> Vec<&str> {
        children.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_move_to_end_is_clamped() {
        let mut model = sample();
        assert!(model.move_child("a", usize::MAX));
        assert_eq!(child_ids(&model.root().children), vec!["b", "c", "a"]);
        assert_eq!(model.position("a"), Some(("graph".to_string(), 2)));
        assert_eq!(model.position("b1"), Some(("b".to_string(), 0)));
        assert_eq!(model.get("b2").unwrap().id, "b2");
    }

    #[test]
    fn test_move_nested_child() {
        let mut model = sample();
        assert!(model.move_child("b2", 0));
        assert_eq!(child_ids(&model.get("b").unwrap().children), vec!["b2", "b1"]);
        assert_eq!(model.position("b1"), Some(("b".to_string(), 1)));
    }

    #[test]
    fn test_move_unknown_is_noop() {
        let mut model = sample();
        assert!(!model.move_child("zzz", 0));
        assert_eq!(child_ids(&model.root().children), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_replace_root_reindexes() {
        let mut model = sample();
        let old = model.replace_root(
            ModelRoot::new("other", "graph").with_children(vec![Element::new("x", "node")]),
        );

        assert_eq!(old.id, "graph");
        assert!(model.contains("x"));
        assert!(!model.contains("a"));
    }

    #[test]
    fn test_child_count() {
        let model = sample();
        assert_eq!(model.child_count("graph"), Some(3));
        assert_eq!(model.child_count("b"), Some(2));
        assert_eq!(model.child_count("nope"), None);
    }
}
