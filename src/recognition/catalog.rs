//! Symbol identifiers, their glyphs and the model's class table.
//!
//! The catalog is a TOML list in model class order, so position `n` is the
//! symbol for output class `n`. The default catalog is compiled in from
//! `assets/symbols.toml`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Stable identifier of a recognizable symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

const EMBEDDED_CATALOG: &str = include_str!("../../assets/symbols.toml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid symbol catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Symbol catalog is empty")]
    Empty,
    #[error("Symbol id {0} appears more than once")]
    DuplicateId(SymbolId),
    #[error("Symbol {id} has no preview image")]
    NoPreview { id: SymbolId },
    #[error("Unknown symbol id {0}")]
    UnknownSymbol(SymbolId),
    #[error("Failed to decode preview {path}: {source}")]
    Preview {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// One recognizable symbol.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SymbolEntry {
    pub id: SymbolId,
    /// Unicode rendering shown in the candidate list.
    pub glyph: String,
    /// LaTeX source for the symbol.
    pub command: String,
    /// Preview image, relative to the catalog's preview directory.
    #[serde(default)]
    pub preview: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "symbol", default)]
    symbols: Vec<SymbolEntry>,
}

/// Read-only lookup from symbol id to display data.
#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    entries: Vec<SymbolEntry>,
    by_id: HashMap<SymbolId, usize>,
    preview_dir: Option<PathBuf>,
}

impl SymbolCatalog {
    /// Catalog bundled with the application.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_toml_str(EMBEDDED_CATALOG)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        if file.symbols.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut by_id = HashMap::with_capacity(file.symbols.len());
        for (index, entry) in file.symbols.iter().enumerate() {
            if by_id.insert(entry.id, index).is_some() {
                return Err(CatalogError::DuplicateId(entry.id));
            }
        }
        Ok(Self {
            entries: file.symbols,
            by_id,
            preview_dir: None,
        })
    }

    /// Resolve relative preview paths against `dir`.
    pub fn with_preview_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preview_dir = Some(dir.into());
        self
    }

    pub fn get(&self, id: SymbolId) -> Option<&SymbolEntry> {
        self.by_id.get(&id).map(|&index| &self.entries[index])
    }

    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Class index → symbol id, in model output order.
    pub fn class_table(&self) -> Vec<SymbolId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    /// Decode the preview image for `id`.
    pub fn load_preview(&self, id: SymbolId) -> Result<image::RgbaImage, CatalogError> {
        let entry = self.get(id).ok_or(CatalogError::UnknownSymbol(id))?;
        let relative = entry
            .preview
            .as_deref()
            .ok_or(CatalogError::NoPreview { id })?;
        let path = self.preview_path(relative);
        image::open(&path)
            .map(|image| image.to_rgba8())
            .map_err(|source| CatalogError::Preview { path, source })
    }

    fn preview_path(&self, relative: &Path) -> PathBuf {
        match &self.preview_dir {
            Some(dir) if relative.is_relative() => dir.join(relative),
            _ => relative.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn embedded_catalog_is_consistent() {
        let catalog = SymbolCatalog::embedded().unwrap();
        assert!(catalog.len() >= 10);
        let table = catalog.class_table();
        assert_eq!(table.len(), catalog.len());
        let alpha = catalog.get(SymbolId(0)).unwrap();
        assert_eq!(alpha.glyph, "α");
        assert_eq!(alpha.command, "\\alpha");
    }

    #[test]
    fn embedded_previews_ship_with_the_crate() {
        let catalog = SymbolCatalog::embedded()
            .unwrap()
            .with_preview_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/previews"));
        for entry in catalog.entries() {
            assert!(entry.preview.is_some(), "symbol {} has no preview", entry.id);
        }
        let integral = catalog.load_preview(SymbolId(39)).unwrap();
        assert_eq!(integral.dimensions(), (48, 48));
        assert!(integral.pixels().any(|pixel| pixel[3] > 0));
    }

    #[test]
    fn class_table_follows_file_order_not_id_order() {
        let catalog = SymbolCatalog::from_toml_str(
            r#"
            [[symbol]]
            id = 9
            glyph = "∫"
            command = "\\int"

            [[symbol]]
            id = 2
            glyph = "∑"
            command = "\\sum"
            "#,
        )
        .unwrap();
        assert_eq!(catalog.class_table(), vec![SymbolId(9), SymbolId(2)]);
        assert_eq!(catalog.get(SymbolId(2)).unwrap().glyph, "∑");
        assert!(catalog.get(SymbolId(3)).is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = SymbolCatalog::from_toml_str(
            r#"
            [[symbol]]
            id = 1
            glyph = "a"
            command = "a"

            [[symbol]]
            id = 1
            glyph = "b"
            command = "b"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(SymbolId(1))));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            SymbolCatalog::from_toml_str("").unwrap_err(),
            CatalogError::Empty
        ));
    }

    #[test]
    fn preview_is_decoded_from_preview_dir() {
        let dir = tempdir().unwrap();
        let image = image::RgbaImage::from_pixel(4, 3, image::Rgba([0, 0, 0, 255]));
        image.save(dir.path().join("alpha.png")).unwrap();
        let catalog = SymbolCatalog::from_toml_str(
            r#"
            [[symbol]]
            id = 0
            glyph = "α"
            command = "\\alpha"
            preview = "alpha.png"

            [[symbol]]
            id = 1
            glyph = "β"
            command = "\\beta"
            "#,
        )
        .unwrap()
        .with_preview_dir(dir.path());
        let preview = catalog.load_preview(SymbolId(0)).unwrap();
        assert_eq!(preview.dimensions(), (4, 3));
        assert!(matches!(
            catalog.load_preview(SymbolId(1)).unwrap_err(),
            CatalogError::NoPreview { .. }
        ));
    }
}
