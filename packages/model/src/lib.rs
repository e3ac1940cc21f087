//! # Trellis Model
//!
//! Tree-shaped diagram model shared by the editor and the sync layer.
//!
//! - [`ModelRoot`] / [`Element`]: serde-backed element tree (the wire shape)
//! - [`ModelIndex`]: id → element lookup
//! - [`DiagramModel`]: root + index, the mutation surface commands work against

mod element;
mod geometry;
mod index;
mod model;

pub use element::{Element, ElementCategory, ModelRoot};
pub use geometry::{Bounds, Dimension, Point};
pub use index::{IndexEntry, ModelIndex};
pub use model::DiagramModel;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),
}
