//! # Action Handler Registry
//!
//! Maps an action kind to the handlers interested in it.
//!
//! - Registrations for the same kind accumulate; later ones never replace earlier ones
//! - One handler instance may be registered under many kinds
//! - A kind with no handlers is inert, not an error

use crate::action::{Action, ActionOrigin};
use crate::command::{ActionCommand, Command};
use crate::errors::RegistryError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

/// Reacts to an action by producing follow-up actions and commands
pub trait ActionHandler {
    fn handle(&mut self, action: &Action, origin: ActionOrigin) -> HandlerResult;
}

pub type SharedHandler = Rc<RefCell<dyn ActionHandler>>;

/// Effects of a single handler invocation, processed in order
#[derive(Debug, Default)]
pub struct HandlerResult {
    pub actions: Vec<Action>,
    pub commands: Vec<Box<dyn Command>>,
}

impl HandlerResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn action(action: Action) -> Self {
        Self {
            actions: vec![action],
            commands: Vec::new(),
        }
    }

    pub fn command(command: Box<dyn Command>) -> Self {
        Self {
            actions: Vec::new(),
            commands: vec![command],
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_command(mut self, command: Box<dyn Command>) -> Self {
        self.commands.push(command);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.commands.is_empty()
    }
}

/// Handler that turns actions of `C::KIND` into a fresh `C`
pub struct CommandActionHandler<C> {
    _command: PhantomData<fn() -> C>,
}

impl<C: ActionCommand> CommandActionHandler<C> {
    pub fn new() -> Self {
        Self {
            _command: PhantomData,
        }
    }
}

impl<C: ActionCommand> Default for CommandActionHandler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ActionCommand> ActionHandler for CommandActionHandler<C> {
    fn handle(&mut self, action: &Action, _origin: ActionOrigin) -> HandlerResult {
        match C::from_action(action) {
            Some(command) => HandlerResult::command(Box::new(command)),
            None => {
                tracing::warn!(
                    "{} cannot be built from a {} action",
                    std::any::type_name::<C>(),
                    action.kind()
                );
                HandlerResult::none()
            }
        }
    }
}

/// Handler backed by a closure
pub struct FnHandler<F>(pub F);

impl<F> ActionHandler for FnHandler<F>
where
    F: FnMut(&Action, ActionOrigin) -> HandlerResult,
{
    fn handle(&mut self, action: &Action, origin: ActionOrigin) -> HandlerResult {
        (self.0)(action, origin)
    }
}

/// Wrap a closure as a shareable handler
pub fn handler_fn<F>(f: F) -> SharedHandler
where
    F: FnMut(&Action, ActionOrigin) -> HandlerResult + 'static,
{
    Rc::new(RefCell::new(FnHandler(f)))
}

#[derive(Default)]
pub struct ActionHandlerRegistry {
    handlers: HashMap<String, Vec<SharedHandler>>,
}

impl ActionHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: impl Into<String>, handler: SharedHandler) {
        let kind = kind.into();
        tracing::debug!("Registered handler for {}", kind);
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Register a handler that instantiates `C` for every action of `C::KIND`.
    ///
    /// A command type with a blank `KIND` is reported and skipped.
    pub fn register_command<C: ActionCommand>(&mut self) -> Result<(), RegistryError> {
        if C::KIND.trim().is_empty() {
            let err = RegistryError::MissingKind(std::any::type_name::<C>());
            tracing::error!("{}", err);
            return Err(err);
        }
        self.register(
            C::KIND,
            Rc::new(RefCell::new(CommandActionHandler::<C>::new())),
        );
        Ok(())
    }

    /// Handlers for `kind` in registration order
    pub fn handlers(&self, kind: &str) -> Vec<SharedHandler> {
        self.handlers.get(kind).cloned().unwrap_or_default()
    }

    pub fn has_handlers(&self, kind: &str) -> bool {
        self.handlers.get(kind).is_some_and(|h| !h.is_empty())
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl std::fmt::Debug for ActionHandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(kind, handlers)| (kind.as_str(), handlers.len()))
            .collect();
        f.debug_struct("ActionHandlerRegistry")
            .field("handlers", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CommandError;
    use trellis_model::DiagramModel;

    #[derive(Debug)]
    struct Noop;

    impl Command for Noop {
        fn execute(&mut self, _model: &mut DiagramModel) -> Result<(), CommandError> {
            Ok(())
        }
        fn undo(&mut self, _model: &mut DiagramModel) -> Result<(), CommandError> {
            Ok(())
        }
        fn redo(&mut self, _model: &mut DiagramModel) -> Result<(), CommandError> {
            Ok(())
        }
        fn name(&self) -> &'static str {
            "Noop"
        }
    }

    impl ActionCommand for Noop {
        const KIND: &'static str = "noop";

        fn from_action(action: &Action) -> Option<Self> {
            (action.kind() == Self::KIND).then_some(Noop)
        }
    }

    #[derive(Debug)]
    struct Unnamed;

    impl Command for Unnamed {
        fn execute(&mut self, _model: &mut DiagramModel) -> Result<(), CommandError> {
            Ok(())
        }
        fn undo(&mut self, _model: &mut DiagramModel) -> Result<(), CommandError> {
            Ok(())
        }
        fn redo(&mut self, _model: &mut DiagramModel) -> Result<(), CommandError> {
            Ok(())
        }
        fn name(&self) -> &'static str {
            "Unnamed"
        }
    }

    impl ActionCommand for Unnamed {
        const KIND: &'static str = "";

        fn from_action(_action: &Action) -> Option<Self> {
            Some(Unnamed)
        }
    }

    #[test]
    fn test_registrations_accumulate() {
        let mut registry = ActionHandlerRegistry::new();
        registry.register("fit", handler_fn(|_, _| HandlerResult::none()));
        registry.register("fit", handler_fn(|_, _| HandlerResult::none()));

        assert_eq!(registry.handlers("fit").len(), 2);
        assert!(registry.has_handlers("fit"));
    }

    #[test]
    fn test_unknown_kind_has_no_handlers() {
        let registry = ActionHandlerRegistry::new();
        assert!(registry.handlers("nothing").is_empty());
        assert!(!registry.has_handlers("nothing"));
    }

    #[test]
    fn test_register_command() {
        let mut registry = ActionHandlerRegistry::new();
        registry.register_command::<Noop>().unwrap();

        let handler = registry.handlers("noop").remove(0);
        let result = handler
            .borrow_mut()
            .handle(&Action::Custom(crate::CustomAction::new("noop")), ActionOrigin::Local);
        assert_eq!(result.commands.len(), 1);
        assert_eq!(result.commands[0].name(), "Noop");
    }

    #[test]
    fn test_register_command_without_kind() {
        let mut registry = ActionHandlerRegistry::new();
        let err = registry.register_command::<Unnamed>().unwrap_err();

        assert!(matches!(err, RegistryError::MissingKind(_)));
        assert!(registry.kinds().is_empty());
    }

    #[test]
    fn test_one_handler_many_kinds() {
        let shared = handler_fn(|_, _| HandlerResult::none());
        let mut registry = ActionHandlerRegistry::new();
        registry.register("b", shared.clone());
        registry.register("a", shared.clone());

        assert_eq!(registry.kinds(), vec!["a", "b"]);
        assert!(Rc::ptr_eq(&registry.handlers("a")[0], &registry.handlers("b")[0]));
    }
}
