//! Persistence of designs as XML files.

mod xml;

pub use xml::{from_xml, to_xml};

use crate::layer::Layer;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Version written into saved designs.
pub const FORMAT_VERSION: &str = "1.0";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("Invalid file format: root element is '{0}', expected 'design'")]
    InvalidRoot(String),
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
    #[error("Invalid number in attribute '{attribute}': '{value}'")]
    InvalidNumber { attribute: String, value: String },
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Attributes of the `design` root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignMetadata {
    pub author: String,
    pub version: String,
    /// Save date as `MM/dd/yyyy`.
    pub date: String,
}

impl DesignMetadata {
    /// Metadata stamped with today's date.
    pub fn now(author: &str) -> Self {
        Self {
            author: author.to_string(),
            version: FORMAT_VERSION.to_string(),
            date: chrono::Local::now().format("%m/%d/%Y").to_string(),
        }
    }
}

/// A parsed design: metadata plus the ordered layers.
#[derive(Debug, Clone)]
pub struct Design {
    pub metadata: DesignMetadata,
    pub layers: Vec<Layer>,
}

/// Write a design to `path`.
pub fn save_design(path: &Path, design: &Design) -> StorageResult<()> {
    fs::write(path, to_xml(design))?;
    log::info!(
        "Saved {} layers to {}",
        design.layers.len(),
        path.display()
    );
    Ok(())
}

/// Read and fully validate a design from `path`.
pub fn load_design(path: &Path) -> StorageResult<Design> {
    let text = fs::read_to_string(path)?;
    let design = from_xml(&text)?;
    log::info!(
        "Loaded {} layers from {}",
        design.layers.len(),
        path.display()
    );
    Ok(design)
}
