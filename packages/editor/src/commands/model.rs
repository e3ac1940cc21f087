//! Whole-model replacement commands

use crate::action::{Action, SetModelAction, UpdateModelAction};
use crate::command::{ActionCommand, Command};
use crate::errors::CommandError;
use trellis_model::{DiagramModel, ModelRoot};

/// Replace the root with a new one, keeping the previous root for undo
#[derive(Debug, Clone)]
struct RootSwap {
    new_root: ModelRoot,
    old_root: Option<ModelRoot>,
}

impl RootSwap {
    fn new(new_root: ModelRoot) -> Self {
        Self {
            new_root,
            old_root: None,
        }
    }

    fn execute(&mut self, model: &mut DiagramModel) {
        self.old_root = Some(model.replace_root(self.new_root.clone()));
    }

    fn undo(&mut self, model: &mut DiagramModel, name: &'static str) -> Result<(), CommandError> {
        let old_root = self.old_root.clone().ok_or(CommandError::NotExecuted(name))?;
        model.replace_root(old_root);
        Ok(())
    }

    fn redo(&mut self, model: &mut DiagramModel) {
        model.replace_root(self.new_root.clone());
    }
}

#[derive(Debug, Clone)]
pub struct SetModelCommand {
    swap: RootSwap,
}

impl SetModelCommand {
    pub fn new(new_root: ModelRoot) -> Self {
        Self {
            swap: RootSwap::new(new_root),
        }
    }
}

impl Command for SetModelCommand {
    fn execute(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        tracing::debug!(
            "setModel {} ({}) replaces {}",
            self.swap.new_root.id,
            self.swap.new_root.type_tag,
            model.root().id
        );
        self.swap.execute(model);
        Ok(())
    }

    fn undo(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        let name = self.name();
        self.swap.undo(model, name)
    }

    fn redo(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        self.swap.redo(model);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SetModelCommand"
    }
}

impl ActionCommand for SetModelCommand {
    const KIND: &'static str = SetModelAction::KIND;

    fn from_action(action: &Action) -> Option<Self> {
        match action {
            Action::SetModel(a) => Some(Self::new(a.new_root.clone())),
            _ => None,
        }
    }
}

/// Replace the root with a later version of the same diagram.
///
/// Same replacement semantics as [`SetModelCommand`]; `animate` is only a hint for
/// the viewer.
#[derive(Debug, Clone)]
pub struct UpdateModelCommand {
    swap: RootSwap,
    pub animate: bool,
}

impl UpdateModelCommand {
    pub fn new(new_root: ModelRoot, animate: bool) -> Self {
        Self {
            swap: RootSwap::new(new_root),
            animate,
        }
    }
}

impl Command for UpdateModelCommand {
    fn execute(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        if model.root().id != self.swap.new_root.id && !model.root().is_empty_root() {
            tracing::debug!(
                "updateModel changes root id {} -> {}",
                model.root().id,
                self.swap.new_root.id
            );
        }
        self.swap.execute(model);
        Ok(())
    }

    fn undo(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        let name = self.name();
        self.swap.undo(model, name)
    }

    fn redo(&mut self, model: &mut DiagramModel) -> Result<(), CommandError> {
        self.swap.redo(model);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "UpdateModelCommand"
    }
}

impl ActionCommand for UpdateModelCommand {
    const KIND: &'static str = UpdateModelAction::KIND;

    fn from_action(action: &Action) -> Option<Self> {
        match action {
            Action::UpdateModel(a) => Some(Self::new(a.new_root.clone(), a.animate)),
            _ => None,
        }
    }
}
