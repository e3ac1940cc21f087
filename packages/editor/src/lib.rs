//! # Trellis Editor
//!
//! Action dispatch and undoable commands over a diagram model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Action: { kind, ...fields }                 │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ActionDispatcher                            │
//! │  - Resolve handlers by kind (registry)      │
//! │  - Run returned commands                    │
//! │  - Dispatch follow-up actions depth-first   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ CommandStack: execute / undo / redo         │
//! │  - Only writer of the DiagramModel          │
//! │  - Notifies the ModelViewer                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Kind is the only routing key**: unknown kinds are inert
//! 2. **Commands are reversible**: undo puts the model back exactly
//! 3. **Origin is explicit**: handlers are told whether an action came from the authority
//! 4. **Single writer**: one command mutates the model at a time
//!
//! ## Usage
//!
//! ```rust,ignore
//! use trellis_editor::{register_default_commands, Action, ActionDispatcher,
//!     ActionHandlerRegistry, CommandStack};
//!
//! let mut registry = ActionHandlerRegistry::new();
//! register_default_commands(&mut registry)?;
//!
//! let mut dispatcher = ActionDispatcher::new(registry, CommandStack::new(model));
//! dispatcher.dispatch(&Action::select(&["n1"], &[]));
//! dispatcher.dispatch(&Action::Undo);
//! ```

mod action;
mod command;
mod command_stack;
mod commands;
mod dispatcher;
mod errors;
mod registry;

pub use action::{
    Action, ActionOrigin, ComputedBoundsAction, CustomAction, ElementAndAlignment,
    ElementAndBounds, ExportSvgAction, FitToScreenAction, RedoAction, RequestBoundsAction,
    RequestModelAction, SelectAction, SelectAllAction, ServerStatusAction, SetModelAction,
    Severity, UndoAction, UpdateModelAction,
};
pub use command::{ActionCommand, Command};
pub use command_stack::{CommandStack, ModelViewer};
pub use commands::{
    register_default_commands, ElementSelection, SelectAllCommand, SelectCommand,
    SetModelCommand, UpdateModelCommand,
};
pub use dispatcher::{ActionDispatcher, DispatchResult};
pub use errors::{CommandError, EditorError, RegistryError};
pub use registry::{
    handler_fn, ActionHandler, ActionHandlerRegistry, CommandActionHandler, FnHandler,
    HandlerResult, SharedHandler,
};

// Re-export the model for convenience
pub use trellis_model::{DiagramModel, Element, ModelRoot};
