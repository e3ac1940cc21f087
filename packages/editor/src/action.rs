//! # Actions
//!
//! Plain, serializable descriptions of an intended or applied model change.
//!
//! Every action carries a `kind` tag on the wire. The kind is the only thing the
//! dispatcher routes on:
//!
//! ```text
//! { "kind": "elementSelected", "selectedElementsIDs": ["n1"], "deselectedElementsIDs": [] }
//! ```
//!
//! Kinds this crate does not model are kept as [`CustomAction`] so actions defined
//! by the authority or by application handlers pass through untouched.

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use trellis_model::{Bounds, ModelRoot, Point};

/// Where an action entered the dispatcher from.
///
/// Threaded through each handler call so the sync layer can tell an action it
/// just received from the authority from one produced locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionOrigin {
    #[default]
    Local,
    Authority,
}

impl ActionOrigin {
    pub fn is_authority(self) -> bool {
        self == ActionOrigin::Authority
    }
}

/// Ask the authority for a model
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestModelAction {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl RequestModelAction {
    pub const KIND: &'static str = "requestModel";
}

/// Replace the whole model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetModelAction {
    pub new_root: ModelRoot,
}

impl SetModelAction {
    pub const KIND: &'static str = "setModel";
}

/// Replace the model with a version that shares ids with the current one
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelAction {
    pub new_root: ModelRoot,
    #[serde(default = "default_animate")]
    pub animate: bool,
}

impl UpdateModelAction {
    pub const KIND: &'static str = "updateModel";
}

fn default_animate() -> bool {
    true
}

/// Hand a model to the renderer so it can measure it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestBoundsAction {
    pub new_root: ModelRoot,
}

impl RequestBoundsAction {
    pub const KIND: &'static str = "requestBounds";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementAndBounds {
    pub element_id: String,
    pub new_bounds: Bounds,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementAndAlignment {
    pub element_id: String,
    pub new_alignment: Point,
}

/// Measured bounds coming back from the renderer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComputedBoundsAction {
    #[serde(default)]
    pub bounds: Vec<ElementAndBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignments: Option<Vec<ElementAndAlignment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
}

impl ComputedBoundsAction {
    pub const KIND: &'static str = "computedBounds";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SelectAction {
    #[serde(rename = "selectedElementsIDs", default)]
    pub selected_elements_ids: Vec<String>,
    #[serde(rename = "deselectedElementsIDs", default)]
    pub deselected_elements_ids: Vec<String>,
}

impl SelectAction {
    pub const KIND: &'static str = "elementSelected";

    pub fn new(selected: Vec<String>, deselected: Vec<String>) -> Self {
        Self {
            selected_elements_ids: selected,
            deselected_elements_ids: deselected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectAllAction {
    #[serde(default = "default_select")]
    pub select: bool,
}

impl SelectAllAction {
    pub const KIND: &'static str = "allSelected";
}

fn default_select() -> bool {
    true
}

/// Viewport fit request (handled by the renderer)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FitToScreenAction {
    #[serde(default)]
    pub element_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    #[serde(default)]
    pub animate: bool,
}

impl FitToScreenAction {
    pub const KIND: &'static str = "fit";
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Ok,
    Info,
    Warning,
    Error,
    Fatal,
}

/// Authority status report
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerStatusAction {
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
}

impl ServerStatusAction {
    pub const KIND: &'static str = "serverStatus";
}

/// Exported diagram markup, saved locally
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExportSvgAction {
    pub svg: String,
}

impl ExportSvgAction {
    pub const KIND: &'static str = "export";
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UndoAction;

impl UndoAction {
    pub const KIND: &'static str = "undo";
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RedoAction;

impl RedoAction {
    pub const KIND: &'static str = "redo";
}

/// Action of a kind this crate does not model
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAction {
    pub kind: String,
    pub fields: Map<String, Value>,
}

impl CustomAction {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RequestModel(RequestModelAction),
    SetModel(SetModelAction),
    UpdateModel(UpdateModelAction),
    RequestBounds(RequestBoundsAction),
    ComputedBounds(ComputedBoundsAction),
    Select(SelectAction),
    SelectAll(SelectAllAction),
    Fit(FitToScreenAction),
    ServerStatus(ServerStatusAction),
    Export(ExportSvgAction),
    Undo,
    Redo,
    Custom(CustomAction),
}

impl Action {
    pub fn kind(&self) -> &str {
        match self {
            Action::RequestModel(_) => RequestModelAction::KIND,
            Action::SetModel(_) => SetModelAction::KIND,
            Action::UpdateModel(_) => UpdateModelAction::KIND,
            Action::RequestBounds(_) => RequestBoundsAction::KIND,
            Action::ComputedBounds(_) => ComputedBoundsAction::KIND,
            Action::Select(_) => SelectAction::KIND,
            Action::SelectAll(_) => SelectAllAction::KIND,
            Action::Fit(_) => FitToScreenAction::KIND,
            Action::ServerStatus(_) => ServerStatusAction::KIND,
            Action::Export(_) => ExportSvgAction::KIND,
            Action::Undo => UndoAction::KIND,
            Action::Redo => RedoAction::KIND,
            Action::Custom(custom) => &custom.kind,
        }
    }

    /// Root carried by model-bearing kinds (setModel, updateModel, requestBounds)
    pub fn new_root(&self) -> Option<&ModelRoot> {
        match self {
            Action::SetModel(a) => Some(&a.new_root),
            Action::UpdateModel(a) => Some(&a.new_root),
            Action::RequestBounds(a) => Some(&a.new_root),
            _ => None,
        }
    }

    pub fn set_model(new_root: ModelRoot) -> Self {
        Action::SetModel(SetModelAction { new_root })
    }

    pub fn update_model(new_root: ModelRoot) -> Self {
        Action::UpdateModel(UpdateModelAction {
            new_root,
            animate: true,
        })
    }

    pub fn request_bounds(new_root: ModelRoot) -> Self {
        Action::RequestBounds(RequestBoundsAction { new_root })
    }

    pub fn select(selected: &[&str], deselected: &[&str]) -> Self {
        Action::Select(SelectAction::new(
            selected.iter().map(|s| s.to_string()).collect(),
            deselected.iter().map(|s| s.to_string()).collect(),
        ))
    }

    pub fn select_all(select: bool) -> Self {
        Action::SelectAll(SelectAllAction { select })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<CustomAction> for Action {
    fn from(action: CustomAction) -> Self {
        Action::Custom(action)
    }
}

fn payload<T: Serialize>(value: &T) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
            "action payload must be an object, got {}",
            other
        ))),
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = match self {
            Action::RequestModel(a) => payload(a),
            Action::SetModel(a) => payload(a),
            Action::UpdateModel(a) => payload(a),
            Action::RequestBounds(a) => payload(a),
            Action::ComputedBounds(a) => payload(a),
            Action::Select(a) => payload(a),
            Action::SelectAll(a) => payload(a),
            Action::Fit(a) => payload(a),
            Action::ServerStatus(a) => payload(a),
            Action::Export(a) => payload(a),
            Action::Undo | Action::Redo => Ok(Map::new()),
            Action::Custom(a) => Ok(a.fields.clone()),
        };
        let mut fields = fields.map_err(S::Error::custom)?;
        fields.insert("kind".to_string(), Value::from(self.kind()));
        fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let kind = match fields.remove("kind") {
            Some(Value::String(kind)) if !kind.is_empty() => kind,
            Some(_) => return Err(D::Error::custom("action kind must be a non-empty string")),
            None => return Err(D::Error::missing_field("kind")),
        };
        let value = Value::Object(fields);

        let action = match kind.as_str() {
            RequestModelAction::KIND => serde_json::from_value(value).map(Action::RequestModel),
            SetModelAction::KIND => serde_json::from_value(value).map(Action::SetModel),
            UpdateModelAction::KIND => serde_json::from_value(value).map(Action::UpdateModel),
            RequestBoundsAction::KIND => serde_json::from_value(value).map(Action::RequestBounds),
            ComputedBoundsAction::KIND => {
                serde_json::from_value(value).map(Action::ComputedBounds)
            }
            SelectAction::KIND => serde_json::from_value(value).map(Action::Select),
            SelectAllAction::KIND => serde_json::from_value(value).map(Action::SelectAll),
            FitToScreenAction::KIND => serde_json::from_value(value).map(Action::Fit),
            ServerStatusAction::KIND => serde_json::from_value(value).map(Action::ServerStatus),
            ExportSvgAction::KIND => serde_json::from_value(value).map(Action::Export),
            UndoAction::KIND => Ok(Action::Undo),
            RedoAction::KIND => Ok(Action::Redo),
            _ => {
                let Value::Object(fields) = value else {
                    unreachable!("constructed as an object above")
                };
                return Ok(Action::Custom(CustomAction { kind, fields }));
            }
        };

        action.map_err(|e| D::Error::custom(format!("invalid {} action: {}", kind, e)))
    }
}
