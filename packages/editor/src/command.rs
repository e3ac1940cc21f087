use crate::action::Action;
use crate::errors::CommandError;
use trellis_model::DiagramModel;

/// A reversible unit of model mutation.
///
/// `execute` runs once, when the command stack first receives the command. It is
/// responsible for capturing whatever `undo` needs to put the model back.
/// After an `undo`, `redo` must leave the model exactly as `execute` did.
pub trait Command: std::fmt::Debug {
    fn execute(&mut self, model: &mut DiagramModel) -> Result<(), CommandError>;

    fn undo(&mut self, model: &mut DiagramModel) -> Result<(), CommandError>;

    fn redo(&mut self, model: &mut DiagramModel) -> Result<(), CommandError>;

    /// Debug name, used in logs and history descriptions
    fn name(&self) -> &'static str;

    /// Non-undoable commands run but are not recorded in history
    fn is_undoable(&self) -> bool {
        true
    }
}

/// A command built from a single action kind.
///
/// [`crate::ActionHandlerRegistry::register_command`] reads `KIND` to decide which
/// actions instantiate the command.
pub trait ActionCommand: Command + Sized + 'static {
    const KIND: &'static str;

    /// Build the command, or `None` if the action is not of `KIND`
    fn from_action(action: &Action) -> Option<Self>;
}
