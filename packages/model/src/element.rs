//! # Element Tree
//!
//! The diagram model is a tree of [`Element`]s under a single [`ModelRoot`].
//!
//! ## Wire shape
//!
//! ```text
//! {
//!   "id": "graph", "type": "graph",
//!   "children": [
//!     { "id": "n1", "type": "node:task", "position": {...}, "size": {...} },
//!     { "id": "e1", "type": "edge", "sourceId": "n1", "targetId": "n2" }
//!   ]
//! }
//! ```
//!
//! Fields this crate does not model (labels, css classes, renderer hints) are kept
//! verbatim in `properties` so a model survives a round trip through the client.
//!
//! ## Categories
//!
//! Capabilities follow the type tag prefix (the text before the first `:`), so
//! `node`, `node:task` and `node:circle` are all nodes. Nodes, edges and ports are
//! selectable.

use crate::geometry::{Dimension, Point};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Broad element variant derived from the type tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementCategory {
    Graph,
    Node,
    Edge,
    Port,
    Label,
    Compartment,
    Other,
}

impl ElementCategory {
    pub fn from_type(type_tag: &str) -> Self {
        let prefix = type_tag.split(':').next().unwrap_or(type_tag);
        match prefix {
            "graph" => ElementCategory::Graph,
            "node" => ElementCategory::Node,
            "edge" => ElementCategory::Edge,
            "port" => ElementCategory::Port,
            "label" => ElementCategory::Label,
            "comp" | "compartment" => ElementCategory::Compartment,
            _ => ElementCategory::Other,
        }
    }

    pub fn is_selectable(self) -> bool {
        matches!(
            self,
            ElementCategory::Node | ElementCategory::Edge | ElementCategory::Port
        )
    }
}

/// A child element of the diagram tree
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,

    #[serde(rename = "type")]
    pub type_tag: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Dimension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Point>,

    /// Edge source (edges only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    /// Edge target (edges only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,

    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Element {
    pub fn new(id: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            children: Vec::new(),
            selected: false,
            position: None,
            size: None,
            alignment: None,
            source_id: None,
            target_id: None,
            properties: Map::new(),
        }
    }

    /// Shorthand for an edge between two element ids
    pub fn edge(
        id: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        let mut edge = Self::new(id, "edge");
        edge.source_id = Some(source_id.into());
        edge.target_id = Some(target_id.into());
        edge
    }

    pub fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn category(&self) -> ElementCategory {
        ElementCategory::from_type(&self.type_tag)
    }

    pub fn is_selectable(&self) -> bool {
        self.category().is_selectable()
    }

    pub fn is_node(&self) -> bool {
        self.category() == ElementCategory::Node
    }

    pub fn is_edge(&self) -> bool {
        self.category() == ElementCategory::Edge
    }

    /// True if this is an edge with `node_id` as source or target
    pub fn connects(&self, node_id: &str) -> bool {
        self.is_edge()
            && (self.source_id.as_deref() == Some(node_id)
                || self.target_id.as_deref() == Some(node_id))
    }

    fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            child.for_each_mut(f);
        }
    }
}

/// Top of the diagram tree
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelRoot {
    pub id: String,

    #[serde(rename = "type")]
    pub type_tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_bounds: Option<crate::geometry::Bounds>,

    #[serde(default)]
    pub children: Vec<Element>,

    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl ModelRoot {
    pub const EMPTY_ID: &'static str = "EMPTY";
    pub const EMPTY_TYPE: &'static str = "NONE";

    pub fn new(id: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            revision: None,
            canvas_bounds: None,
            children: Vec::new(),
            properties: Map::new(),
        }
    }

    /// Placeholder root used before any model has arrived
    pub fn empty() -> Self {
        Self::new(Self::EMPTY_ID, Self::EMPTY_TYPE)
    }

    pub fn is_empty_root(&self) -> bool {
        self.id == Self::EMPTY_ID && self.type_tag == Self::EMPTY_TYPE
    }

    pub fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }

    /// Visit every element (not the root itself) in pre-order
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut Element)) {
        for child in &mut self.children {
            child.for_each_mut(&mut f);
        }
    }

    /// All elements in pre-order
    pub fn elements(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(element) = stack.pop() {
            out.push(element);
            stack.extend(element.children.iter().rev());
        }
        out
    }

    pub fn from_json(json: &str) -> Result<Self, crate::ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, crate::ModelError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for ModelRoot {
    fn default() -> Self {
        Self::empty()
    }
}
