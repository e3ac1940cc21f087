//! Local persistence collaborators: the latest model root and exported markup

use crate::errors::SyncError;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use trellis_model::ModelRoot;

pub const EXPORT_FILE_NAME: &str = "diagram.svg";

pub trait ModelStorage {
    fn store(&mut self, root: &ModelRoot);

    fn load(&self) -> Option<ModelRoot>;
}

/// Keeps the last stored root in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    root: Option<ModelRoot>,
    stores: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `store` was called
    pub fn store_count(&self) -> usize {
        self.stores
    }
}

impl ModelStorage for MemoryStorage {
    fn store(&mut self, root: &ModelRoot) {
        self.root = Some(root.clone());
        self.stores += 1;
    }

    fn load(&self) -> Option<ModelRoot> {
        self.root.clone()
    }
}

/// Where `export` actions are saved
pub trait ExportSink {
    fn save(&mut self, svg: &str) -> Result<(), SyncError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryExportSink {
    exports: Rc<RefCell<Vec<String>>>,
}

impl MemoryExportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exports(&self) -> Vec<String> {
        self.exports.borrow().clone()
    }
}

impl ExportSink for MemoryExportSink {
    fn save(&mut self, svg: &str) -> Result<(), SyncError> {
        self.exports.borrow_mut().push(svg.to_string());
        Ok(())
    }
}

/// Writes each export to `<dir>/diagram.svg`, replacing the previous one
#[derive(Debug, Clone)]
pub struct DirectoryExportSink {
    dir: PathBuf,
}

impl DirectoryExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(EXPORT_FILE_NAME)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectoryExportSink {
    fn save(&mut self, svg: &str) -> Result<(), SyncError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path();
        std::fs::write(&path, svg)?;
        tracing::info!("Exported diagram to {}", path.display());
        Ok(())
    }
}
