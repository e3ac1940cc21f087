//! # Action Dispatcher
//!
//! Central intake for actions: resolve handlers, run the commands they return on
//! the command stack, then dispatch their follow-up actions.
//!
//! ```text
//! dispatch(action)
//!   └─ for each handler of action.kind (registration order)
//!        ├─ handler.handle(action, origin) → { commands, actions }
//!        ├─ command_stack.execute(command)   for each command, in order
//!        └─ dispatch(follow_up, Local)       for each action, depth-first
//! ```
//!
//! Everything runs to completion before `dispatch` returns. The post-update
//! callback fires once, after the cascade settles, with the latest action whose
//! commands changed the model.

use crate::action::{Action, ActionOrigin};
use crate::command_stack::{CommandStack, ModelViewer};
use crate::errors::EditorError;
use crate::registry::ActionHandlerRegistry;
use tracing::{debug, error, instrument};
use trellis_model::DiagramModel;

/// Summary of one top-level dispatch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchResult {
    pub handlers_invoked: usize,
    pub commands_executed: usize,
    /// Latest action whose commands changed the model
    pub last_update: Option<Action>,
    /// Actions dropped by the cascade depth cap
    pub dropped: usize,
}

impl DispatchResult {
    pub fn updated(&self) -> bool {
        self.last_update.is_some()
    }
}

pub struct ActionDispatcher {
    registry: ActionHandlerRegistry,
    command_stack: CommandStack,
    max_cascade_depth: Option<usize>,
}

impl ActionDispatcher {
    pub fn new(registry: ActionHandlerRegistry, command_stack: CommandStack) -> Self {
        Self {
            registry,
            command_stack,
            max_cascade_depth: None,
        }
    }

    /// Limit how deep follow-up actions may nest (the top-level action is depth 0)
    pub fn with_max_cascade_depth(mut self, depth: Option<usize>) -> Self {
        self.max_cascade_depth = depth;
        self
    }

    pub fn registry(&self) -> &ActionHandlerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ActionHandlerRegistry {
        &mut self.registry
    }

    pub fn command_stack(&self) -> &CommandStack {
        &self.command_stack
    }

    pub fn command_stack_mut(&mut self) -> &mut CommandStack {
        &mut self.command_stack
    }

    pub fn model(&self) -> &DiagramModel {
        self.command_stack.model()
    }

    pub fn set_viewer(&mut self, viewer: Box<dyn ModelViewer>) {
        self.command_stack.set_viewer(viewer);
    }

    pub fn dispatch(&mut self, action: &Action) -> DispatchResult {
        self.dispatch_from(action, ActionOrigin::Local)
    }

    pub fn dispatch_from(&mut self, action: &Action, origin: ActionOrigin) -> DispatchResult {
        self.dispatch_with(action, origin, &mut |_, _| {})
    }

    /// Dispatch and call `on_updated` once the cascade has settled, if anything in it
    /// changed the model
    #[instrument(skip(self, action, on_updated), fields(kind = %action.kind(), origin = ?origin))]
    pub fn dispatch_with(
        &mut self,
        action: &Action,
        origin: ActionOrigin,
        on_updated: &mut dyn FnMut(&Action, &DiagramModel),
    ) -> DispatchResult {
        let mut result = DispatchResult::default();
        self.dispatch_inner(action, origin, 0, &mut result);

        if let Some(update) = &result.last_update {
            on_updated(update, self.command_stack.model());
        }
        result
    }

    /// Parse a JSON action and dispatch it as locally produced
    pub fn dispatch_json(&mut self, json: &str) -> Result<DispatchResult, EditorError> {
        let action = Action::from_json(json)?;
        Ok(self.dispatch(&action))
    }

    fn dispatch_inner(
        &mut self,
        action: &Action,
        origin: ActionOrigin,
        depth: usize,
        result: &mut DispatchResult,
    ) {
        if let Some(max) = self.max_cascade_depth {
            if depth > max {
                error!(
                    "Cascade depth {} exceeded at {}; dropping action",
                    max,
                    action.kind()
                );
                result.dropped += 1;
                return;
            }
        }

        match action {
            Action::Undo => return self.step_history(action, result, CommandStack::undo),
            Action::Redo => return self.step_history(action, result, CommandStack::redo),
            _ => {}
        }

        let handlers = self.registry.handlers(action.kind());
        if handlers.is_empty() {
            debug!("No handlers for {}", action.kind());
            return;
        }

        for handler in handlers {
            let outcome = handler.borrow_mut().handle(action, origin);
            result.handlers_invoked += 1;

            for command in outcome.commands {
                let name = command.name();
                match self.command_stack.execute(command) {
                    Ok(()) => {
                        result.commands_executed += 1;
                        result.last_update = Some(action.clone());
                    }
                    Err(e) => error!("{} failed for {}: {}", name, action.kind(), e),
                }
            }

            for follow_up in &outcome.actions {
                debug!("{} → {}", action.kind(), follow_up.kind());
                self.dispatch_inner(follow_up, ActionOrigin::Local, depth + 1, result);
            }
        }
    }

    fn step_history(
        &mut self,
        action: &Action,
        result: &mut DispatchResult,
        step: fn(&mut CommandStack) -> Result<bool, crate::errors::CommandError>,
    ) {
        match step(&mut self.command_stack) {
            Ok(true) => result.last_update = Some(action.clone()),
            Ok(false) => debug!("{} with empty history", action.kind()),
            Err(e) => error!("{} failed: {}", action.kind(), e),
        }
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("registry", &self.registry)
            .field("command_stack", &self.command_stack)
            .field("max_cascade_depth", &self.max_cascade_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{handler_fn, HandlerResult};
    use crate::{register_default_commands, CustomAction};
    use std::cell::RefCell;
    use std::rc::Rc;
    use trellis_model::{Element, ModelRoot};

    fn dispatcher() -> ActionDispatcher {
        let mut registry = ActionHandlerRegistry::new();
        register_default_commands(&mut registry).unwrap();
        let model = DiagramModel::new(
            ModelRoot::new("g", "graph")
                .with_children(vec![Element::new("n1", "node"), Element::new("n2", "node")]),
        );
        ActionDispatcher::new(registry, CommandStack::new(model))
    }

    #[test]
    fn test_unknown_kind_is_inert() {
        let mut dispatcher = dispatcher();
        let result = dispatcher.dispatch(&CustomAction::new("nobodyListens").into());

        assert_eq!(result, DispatchResult::default());
    }

    #[test]
    fn test_select_runs_command() {
        let mut dispatcher = dispatcher();
        let result = dispatcher.dispatch(&Action::select(&["n1"], &[]));

        assert_eq!(result.handlers_invoked, 1);
        assert_eq!(result.commands_executed, 1);
        assert!(dispatcher.model().get("n1").unwrap().selected);
        assert!(dispatcher.command_stack().can_undo());
    }

    #[test]
    fn test_undo_redo_route_to_stack() {
        let mut dispatcher = dispatcher();
        dispatcher.dispatch(&Action::select_all(true));

        let undo = dispatcher.dispatch(&Action::Undo);
        assert_eq!(undo.last_update, Some(Action::Undo));
        assert!(!dispatcher.model().get("n2").unwrap().selected);

        dispatcher.dispatch(&Action::Redo);
        assert!(dispatcher.model().get("n2").unwrap().selected);

        dispatcher.dispatch(&Action::Undo);
        let empty = dispatcher.dispatch(&Action::Undo);
        assert!(!empty.updated());
    }

    #[test]
    fn test_follow_ups_run_depth_first_as_local() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = dispatcher();

        let l = log.clone();
        dispatcher.registry_mut().register(
            "a",
            handler_fn(move |action, origin| {
                l.borrow_mut().push(format!("{}:{:?}", action.kind(), origin));
                HandlerResult::action(CustomAction::new("b").into())
                    .with_action(CustomAction::new("c").into())
            }),
        );
        let l = log.clone();
        dispatcher.registry_mut().register(
            "b",
            handler_fn(move |action, origin| {
                l.borrow_mut().push(format!("{}:{:?}", action.kind(), origin));
                HandlerResult::action(CustomAction::new("c").into())
            }),
        );
        let l = log.clone();
        dispatcher.registry_mut().register(
            "c",
            handler_fn(move |action, _| {
                l.borrow_mut().push(action.kind().to_string());
                HandlerResult::none()
            }),
        );

        dispatcher.dispatch_from(&CustomAction::new("a").into(), ActionOrigin::Authority);

        assert_eq!(*log.borrow(), vec!["a:Authority", "b:Local", "c", "c"]);
    }

    #[test]
    fn test_on_updated_gets_latest_mutating_action() {
        let mut dispatcher = dispatcher();
        dispatcher.registry_mut().register(
            "selectThenAll",
            handler_fn(|_, _| {
                HandlerResult::action(Action::select(&["n1"], &[]))
                    .with_action(Action::select_all(false))
            }),
        );

        let mut calls = Vec::new();
        dispatcher.dispatch_with(
            &CustomAction::new("selectThenAll").into(),
            ActionOrigin::Local,
            &mut |action, _| calls.push(action.kind().to_string()),
        );

        assert_eq!(calls, vec!["allSelected"]);
    }

    #[test]
    fn test_cascade_depth_cap() {
        let mut dispatcher = dispatcher().with_max_cascade_depth(Some(3));
        dispatcher.registry_mut().register(
            "loop",
            handler_fn(|action, _| HandlerResult::action(action.clone())),
        );

        let result = dispatcher.dispatch(&CustomAction::new("loop").into());

        assert_eq!(result.handlers_invoked, 4);
        assert_eq!(result.dropped, 1);
    }

    #[test]
    fn test_dispatch_json() {
        let mut dispatcher = dispatcher();
        dispatcher
            .dispatch_json(r#"{"kind":"allSelected","select":true}"#)
            .unwrap();
        assert!(dispatcher.model().get("n1").unwrap().selected);

        assert!(dispatcher.dispatch_json("{ nope").is_err());
    }
}
