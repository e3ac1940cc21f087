//! # Diagram Server
//!
//! Client side of the authority protocol. Bridges the local dispatcher to a remote
//! model authority over a [`TransportSink`].
//!
//! ```text
//!  renderer ──local actions──▶ ActionDispatcher ──▶ ModelSourceHandler ──send──▶ authority
//!                                    ▲                                              │
//!                                    └──────── message_received(envelope) ◀────────┘
//! ```
//!
//! Routing rules of the handler:
//! - `computedBounds`: forwarded when the authority does layout, otherwise applied
//!   to the current root and resubmitted locally as `setModel`/`updateModel`
//! - `requestBounds`: never forwarded
//! - `export`, `serverStatus`: consumed locally
//! - anything else: forwarded unless it came from the authority
//!
//! Every dispatch entry point stores the model once a model-bearing cascade has settled.

use crate::config::DiagramServerConfig;
use crate::errors::SyncError;
use crate::message::{ActionMessage, InboundMessage};
use crate::storage::{ExportSink, MemoryExportSink, MemoryStorage, ModelStorage};
use crate::transport::TransportSink;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error, info, warn};
use trellis_editor::{
    register_default_commands, Action, ActionDispatcher, ActionHandler, ActionHandlerRegistry,
    ActionOrigin, CommandStack, ComputedBoundsAction, DispatchResult, ExportSvgAction,
    HandlerResult, ModelViewer, RequestBoundsAction, ServerStatusAction, Severity,
};
use trellis_model::{DiagramModel, ModelIndex, ModelRoot};

/// Action handler that forwards to, and consumes from, the authority
pub struct ModelSourceHandler {
    client_id: String,
    needs_client_layout: bool,
    needs_server_layout: bool,
    transport: Box<dyn TransportSink>,
    storage: Box<dyn ModelStorage>,
    export_sink: Box<dyn ExportSink>,
    current_root: ModelRoot,
    last_submitted_model_type: Option<String>,
    last_status: Option<ServerStatusAction>,
}

impl ModelSourceHandler {
    pub fn new(config: &DiagramServerConfig, transport: Box<dyn TransportSink>) -> Self {
        Self {
            client_id: config.client_id.clone(),
            needs_client_layout: config.needs_client_layout,
            needs_server_layout: config.needs_server_layout,
            transport,
            storage: Box::new(MemoryStorage::new()),
            export_sink: Box::new(MemoryExportSink::new()),
            current_root: ModelRoot::empty(),
            last_submitted_model_type: None,
            last_status: None,
        }
    }

    pub fn current_root(&self) -> &ModelRoot {
        &self.current_root
    }

    pub fn last_submitted_model_type(&self) -> Option<&str> {
        self.last_submitted_model_type.as_deref()
    }

    pub fn last_status(&self) -> Option<&ServerStatusAction> {
        self.last_status.as_ref()
    }

    pub fn storage(&self) -> &dyn ModelStorage {
        self.storage.as_ref()
    }

    /// Remember a root carried by a model-bearing action
    fn store_new_root(&mut self, action: &Action, root: &ModelRoot) {
        self.current_root = root.clone();
        if matches!(action, Action::SetModel(_) | Action::UpdateModel(_)) {
            self.last_submitted_model_type = Some(root.type_tag.clone());
        }
        self.storage.store(root);
    }

    /// Post-update hook: only model-bearing actions replace the remembered root
    fn model_updated(&mut self, action: &Action, model: &DiagramModel) {
        if action.new_root().is_none() {
            return;
        }
        debug!("Storing model {} after {}", model.root().id, action.kind());
        self.store_new_root(action, model.root());
    }

    fn forward(&mut self, action: &Action) {
        let action = match action {
            Action::RequestModel(request) => {
                let mut request = request.clone();
                request
                    .options
                    .entry("needsClientLayout")
                    .or_insert(Value::Bool(self.needs_client_layout));
                request
                    .options
                    .entry("needsServerLayout")
                    .or_insert(Value::Bool(self.needs_server_layout));
                Action::RequestModel(request)
            }
            other => other.clone(),
        };

        debug!("Forwarding {} to the authority", action.kind());
        if let Err(e) = self
            .transport
            .send_message(ActionMessage::new(self.client_id.clone(), action))
        {
            error!("Failed to send message: {}", e);
        }
    }

    fn handle_computed_bounds(&mut self, action: &ComputedBoundsAction) -> HandlerResult {
        let index = ModelIndex::build(&self.current_root);

        for bounds in &action.bounds {
            match index.get_mut(&mut self.current_root, &bounds.element_id) {
                Some(element) => {
                    element.position = Some(bounds.new_bounds.position());
                    element.size = Some(bounds.new_bounds.size());
                }
                None => warn!("No element {:?} for computed bounds", bounds.element_id),
            }
        }
        for alignment in action.alignments.iter().flatten() {
            match index.get_mut(&mut self.current_root, &alignment.element_id) {
                Some(element) => element.alignment = Some(alignment.new_alignment),
                None => warn!("No element {:?} for computed alignment", alignment.element_id),
            }
        }

        HandlerResult::action(self.submit_model())
    }

    /// `updateModel` when the root type matches the last submission, `setModel` otherwise
    fn submit_model(&mut self) -> Action {
        let root = self.current_root.clone();
        let same_type = self.last_submitted_model_type.as_deref() == Some(root.type_tag.as_str());
        self.last_submitted_model_type = Some(root.type_tag.clone());

        if same_type {
            Action::update_model(root)
        } else {
            Action::set_model(root)
        }
    }

    fn handle_export(&mut self, action: &ExportSvgAction) {
        if let Err(e) = self.export_sink.save(&action.svg) {
            error!("Failed to save export: {}", e);
        }
    }

    fn handle_server_status(&mut self, action: &ServerStatusAction) {
        match action.severity {
            Severity::Fatal | Severity::Error => error!("Server status: {}", action.message),
            Severity::Warning => warn!("Server status: {}", action.message),
            Severity::Info => info!("Server status: {}", action.message),
            Severity::Ok => debug!("Server status: {}", action.message),
        }
        self.last_status = Some(action.clone());
    }
}

impl ActionHandler for ModelSourceHandler {
    fn handle(&mut self, action: &Action, origin: ActionOrigin) -> HandlerResult {
        if let Some(root) = action.new_root() {
            self.store_new_root(action, root);
        }

        match action {
            Action::ComputedBounds(bounds) => {
                if !self.needs_server_layout {
                    self.handle_computed_bounds(bounds)
                } else if origin.is_authority() {
                    debug!("Not echoing computedBounds back to the authority");
                    HandlerResult::none()
                } else {
                    self.forward(action);
                    HandlerResult::none()
                }
            }
            Action::RequestBounds(_) => HandlerResult::none(),
            Action::Export(export) => {
                self.handle_export(export);
                HandlerResult::none()
            }
            Action::ServerStatus(status) => {
                self.handle_server_status(status);
                HandlerResult::none()
            }
            _ if origin.is_authority() => {
                debug!("Not echoing {} back to the authority", action.kind());
                HandlerResult::none()
            }
            _ => {
                self.forward(action);
                HandlerResult::none()
            }
        }
    }
}

/// Composition root: dispatcher, default commands and the model source handler
pub struct DiagramServer {
    config: DiagramServerConfig,
    dispatcher: ActionDispatcher,
    source: Rc<RefCell<ModelSourceHandler>>,
}

impl DiagramServer {
    pub fn new(
        config: DiagramServerConfig,
        transport: Box<dyn TransportSink>,
    ) -> Result<Self, SyncError> {
        let source = Rc::new(RefCell::new(ModelSourceHandler::new(&config, transport)));

        let mut registry = ActionHandlerRegistry::new();
        register_default_commands(&mut registry)?;

        let local_kinds = [
            ComputedBoundsAction::KIND,
            RequestBoundsAction::KIND,
            ExportSvgAction::KIND,
            ServerStatusAction::KIND,
        ];
        for kind in local_kinds {
            registry.register(kind, source.clone());
        }
        for kind in &config.forwarded_kinds {
            if local_kinds.contains(&kind.as_str()) {
                continue;
            }
            registry.register(kind.clone(), source.clone());
        }

        let dispatcher = ActionDispatcher::new(registry, CommandStack::new(DiagramModel::empty()))
            .with_max_cascade_depth(config.max_cascade_depth);

        info!("Diagram client {} ready", config.client_id);
        Ok(Self {
            config,
            dispatcher,
            source,
        })
    }

    pub fn with_storage(self, storage: Box<dyn ModelStorage>) -> Self {
        self.source.borrow_mut().storage = storage;
        self
    }

    pub fn set_export_sink(&mut self, sink: Box<dyn ExportSink>) {
        self.source.borrow_mut().export_sink = sink;
    }

    pub fn set_viewer(&mut self, viewer: Box<dyn ModelViewer>) {
        self.dispatcher.set_viewer(viewer);
    }

    pub fn config(&self) -> &DiagramServerConfig {
        &self.config
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    pub fn model(&self) -> &DiagramModel {
        self.dispatcher.model()
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Register an extra handler, e.g. for application-defined kinds
    pub fn register(&mut self, kind: impl Into<String>, handler: trellis_editor::SharedHandler) {
        self.dispatcher.registry_mut().register(kind, handler);
    }

    pub fn current_root(&self) -> ModelRoot {
        self.source.borrow().current_root().clone()
    }

    pub fn last_submitted_model_type(&self) -> Option<String> {
        self.source
            .borrow()
            .last_submitted_model_type()
            .map(str::to_string)
    }

    pub fn last_status(&self) -> Option<ServerStatusAction> {
        self.source.borrow().last_status().cloned()
    }

    pub fn stored_root(&self) -> Option<ModelRoot> {
        self.source.borrow().storage().load()
    }

    /// Dispatch a locally produced action
    pub fn dispatch(&mut self, action: &Action) -> DispatchResult {
        self.dispatch_from(action, ActionOrigin::Local)
    }

    fn dispatch_from(&mut self, action: &Action, origin: ActionOrigin) -> DispatchResult {
        let source = self.source.clone();
        self.dispatcher
            .dispatch_with(action, origin, &mut |update, model| {
                source.borrow_mut().model_updated(update, model)
            })
    }

    /// Ask the authority for the model
    pub fn request_model(&mut self) -> DispatchResult {
        self.dispatch(&Action::RequestModel(Default::default()))
    }

    pub fn undo(&mut self) -> DispatchResult {
        self.dispatch(&Action::Undo)
    }

    pub fn redo(&mut self) -> DispatchResult {
        self.dispatch(&Action::Redo)
    }

    /// Handle a payload from the transport.
    ///
    /// Returns `None` when the payload is malformed (logged) or addressed to another
    /// client (ignored).
    pub fn message_received(&mut self, payload: impl Into<InboundMessage>) -> Option<DispatchResult> {
        let message = match ActionMessage::parse(&payload.into()) {
            Ok(message) => message,
            Err(e) => {
                error!("Received data is not an action message: {}", e);
                return None;
            }
        };

        if !message.is_for(&self.config.client_id) {
            debug!(
                "Ignoring {} addressed to {:?}",
                message.action.kind(),
                message.client_id
            );
            return None;
        }

        Some(self.dispatch_from(&message.action, ActionOrigin::Authority))
    }
}

impl std::fmt::Debug for DiagramServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramServer")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
