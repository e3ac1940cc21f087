//! # Command Stack
//!
//! Runs commands against the diagram model and keeps undo/redo history.
//!
//! ## Design
//!
//! - The stack owns the [`DiagramModel`]; commands are the only writers
//! - Execute pushes onto the undo stack and clears the redo stack
//! - Undo moves the command to the redo stack, redo moves it back
//! - No depth cap and no coalescing: history is bounded only by memory
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = CommandStack::new(DiagramModel::new(root));
//!
//! stack.execute(Box::new(SelectAllCommand::new(true)))?;
//! stack.undo()?;
//! stack.redo()?;
//! ```

use crate::command::Command;
use crate::errors::CommandError;
use trellis_model::{DiagramModel, ModelRoot};

/// Rendering collaborator.
///
/// Notified after every successful execute, undo and redo. The stack never waits on
/// it and ignores what it does with the root.
pub trait ModelViewer {
    fn model_updated(&mut self, root: &ModelRoot);
}

pub struct CommandStack {
    model: DiagramModel,

    /// Executed commands (most recent last)
    undo_stack: Vec<Box<dyn Command>>,

    /// Undone commands (most recent last)
    redo_stack: Vec<Box<dyn Command>>,

    viewer: Option<Box<dyn ModelViewer>>,
}

impl CommandStack {
    pub fn new(model: DiagramModel) -> Self {
        Self {
            model,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            viewer: None,
        }
    }

    pub fn with_viewer(mut self, viewer: Box<dyn ModelViewer>) -> Self {
        self.viewer = Some(viewer);
        self
    }

    pub fn set_viewer(&mut self, viewer: Box<dyn ModelViewer>) {
        self.viewer = Some(viewer);
    }

    pub fn model(&self) -> &DiagramModel {
        &self.model
    }

    /// Execute a command and record it for undo.
    ///
    /// A command that fails is dropped and history is left as it was.
    pub fn execute(&mut self, mut command: Box<dyn Command>) -> Result<(), CommandError> {
        command.execute(&mut self.model)?;
        tracing::debug!("Executed {}", command.name());
        self.notify();

        if command.is_undoable() {
            self.undo_stack.push(command);
            // New command invalidates the undone future
            self.redo_stack.clear();
        }

        Ok(())
    }

    /// Undo the most recent command. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool, CommandError> {
        let Some(mut command) = self.undo_stack.pop() else {
            tracing::debug!("Nothing to undo");
            return Ok(false);
        };

        if let Err(e) = command.undo(&mut self.model) {
            self.undo_stack.push(command);
            return Err(e);
        }
        tracing::debug!("Undid {}", command.name());
        self.notify();

        self.redo_stack.push(command);
        Ok(true)
    }

    /// Redo the most recently undone command. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool, CommandError> {
        let Some(mut command) = self.redo_stack.pop() else {
            tracing::debug!("Nothing to redo");
            return Ok(false);
        };

        if let Err(e) = command.redo(&mut self.model) {
            self.redo_stack.push(command);
            return Err(e);
        }
        tracing::debug!("Redid {}", command.name());
        self.notify();

        self.undo_stack.push(command);
        Ok(true)
    }

    fn notify(&mut self) {
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.model_updated(self.model.root());
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Name of the command the next undo would revert
    pub fn undo_name(&self) -> Option<&'static str> {
        self.undo_stack.last().map(|c| c.name())
    }

    /// Name of the command the next redo would reapply
    pub fn redo_name(&self) -> Option<&'static str> {
        self.redo_stack.last().map(|c| c.name())
    }

    /// Clear all undo/redo history. The model is kept.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(DiagramModel::empty())
    }
}

impl std::fmt::Debug for CommandStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandStack")
            .field("model", &self.model.root().id)
            .field("undo_stack", &self.undo_stack)
            .field("redo_stack", &self.redo_stack)
            .field("viewer", &self.viewer.is_some())
            .finish()
    }
}
