//! # Selection Commands
//!
//! `SelectCommand` selects and deselects elements by id. Selected elements are
//! raised to the end of their parent's child list so they render on top; edges
//! attached to a selected node are raised with it, ahead of the node.
//!
//! `SelectAllCommand` sets the flag on every selectable element.
//!
//! Both capture enough on first execute to put every flag and sibling position
//! back exactly on undo.

use crate::action::{Action, SelectAction, SelectAllAction};
use crate::command::{ActionCommand, Command};
use crate::errors::CommandError;
use std::collections::HashSet;
use trellis_model::{DiagramModel, Element};

/// An element captured at selection time
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSelection {
    pub element_id: String,
    pub parent_id: String,
    /// Index among its siblings before the command ran
    pub index: usize,
    pub was_selected: bool,
}

impl ElementSelection {
    fn capture(model: &DiagramModel, element: &Element) -> Option<Self> {
        let (parent_id, index) = model.position(&element.id)?;
        Some(Self {
            element_id: element.id.clone(),
            parent_id,
            index,
            was_selected: element.selected,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SelectCommand {
    action: SelectAction,
    selected: Vec<ElementSelection>,
    deselected: Vec<ElementSelection>,
}

impl SelectCommand {
    pub fn new(action: SelectAction) -> Self {
        Self {
            action,
            selected: Vec::new(),
            deselected: Vec::new(),
        }
    }

    /// Captured selections in raise order (connected edges first)
    pub fn selected(&self) -> &[ElementSelection] {
        &self.selected
    }

    pub fn deselected(&self) -> &[ElementSelection] {
        &self.deselected
    }

    fn capture_ids(model: &DiagramModel, ids: &[String]) -> Vec<ElementSelection> {
        let mut seen = HashSet::new();
        let mut captured = Vec::new();

        for id in ids {
            let Some(element) = model.get(id) else {
                tracing::debug!("Skipping unknown element {:?}", id);
                continue;
            };
            if !element.is_selectable() {
                tracing::debug!("Skipping non-selectable element {:?}", id);
                continue;
            }
            if !seen.insert(id.as_str()) {
                continue;
            }
            if let Some(selection) = ElementSelection::capture(model, element) {
                captured.push(selection);
            }
        }

        captured
    }

    /// Edges referencing any of the selected nodes, in document order
    fn connected_edges(model: &DiagramModel, selected: &[ElementSelection]) -> Vec<ElementSelection> {
        let nodes: Vec<&str> = selected
            .iter()
            .filter(|s| model.get(&s.element_id).is_some_and(Element::is_node))
            .map(|s| s.element_id.as_str())
            .collect();
        if nodes.is_empty() {
            return Vec::new();
        }

        model
            .elements()
            .into_iter()
            .filter(|e| e.is_edge() && nodes.iter().any(|n| e.connects(n)))
            .filter_map(|e| ElementSelection::capture(model, e))
            .collect()
    }
}

impl Command for SelectCommand {
    fn execute(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        let mut selected = Self::capture_ids(model, &self.action.selected_elements_ids);

        let mut edges = Self::connected_edges(model, &selected);
        if !edges.is_empty() {
            let edge_ids: HashSet<String> = edges.iter().map(|e| e.element_id.clone()).collect();
            selected.retain(|s| !edge_ids.contains(&s.element_id));
            edges.append(&mut selected);
            selected = edges;
        }

        self.selected = selected;
        self.deselected = Self::capture_ids(model, &self.action.deselected_elements_ids);

        tracing::debug!(
            "Selecting {} and deselecting {} elements",
            self.selected.len(),
            self.deselected.len()
        );

        self.redo(model)
    }

    fn undo(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        for selection in self.selected.iter().rev() {
            if let Some(element) = model.get_mut(&selection.element_id) {
                element.selected = selection.was_selected;
            }
        }

        // Raised elements sit at the end of their parents; putting them back in
        // ascending original index restores each sibling list exactly.
        let mut by_index: Vec<&ElementSelection> = self.selected.iter().collect();
        by_index.sort_by_key(|s| s.index);
        for selection in by_index {
            model.move_child(&selection.element_id, selection.index);
        }

        for selection in self.deselected.iter().rev() {
            if let Some(element) = model.get_mut(&selection.element_id) {
                element.selected = selection.was_selected;
            }
        }

        Ok(())
    }

    fn redo(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        for selection in &self.selected {
            model.move_child(&selection.element_id, usize::MAX);
        }
        for selection in &self.deselected {
            if let Some(element) = model.get_mut(&selection.element_id) {
                element.selected = false;
            }
        }
        for selection in &self.selected {
            if let Some(element) = model.get_mut(&selection.element_id) {
                element.selected = true;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SelectCommand"
    }
}

impl ActionCommand for SelectCommand {
    const KIND: &'static str = SelectAction::KIND;

    fn from_action(action: &Action) -> Option<Self> {
        match action {
            Action::Select(a) => Some(Self::new(a.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectAllCommand {
    select: bool,
    /// (element id, flag before the first execute)
    previous: Vec<(String, bool)>,
}

impl SelectAllCommand {
    pub fn new(select: bool) -> Self {
        Self {
            select,
            previous: Vec::new(),
        }
    }
}

impl Command for SelectAllCommand {
    fn execute(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        let select = self.select;
        let mut previous = Vec::new();
        model.for_each_mut(|element| {
            if element.is_selectable() {
                previous.push((element.id.clone(), element.selected));
                element.selected = select;
            }
        });
        tracing::debug!("Set selected={} on {} elements", select, previous.len());
        self.previous = previous;
        Ok(())
    }

    fn undo(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        for (id, was_selected) in &self.previous {
            if let Some(element) = model.get_mut(id) {
                element.selected = *was_selected;
            }
        }
        Ok(())
    }

    fn redo(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        for (id, _) in &self.previous {
            if let Some(element) = model.get_mut(id) {
                element.selected = self.select;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SelectAllCommand"
    }
}

impl ActionCommand for SelectAllCommand {
    const KIND: &'static str = SelectAllAction::KIND;

    fn from_action(action: &Action) -> Option<Self> {
        match action {
            Action::SelectAll(a) => Some(Self::new(a.select)),
            _ => None,
        }
    }
}
