//! Image Symbol Table Module
//!
//! Reads the names of a shared library's exported symbols from the file on
//! disk, before the image is linked into the process. Exports are
//! classified as functions or data from the image's own symbol types.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use object::{Object, ObjectSymbol};

use crate::error::ModuleError;
use crate::symbol::{ImageSymbol, SymbolKind};

/// Source of a module's exported symbol catalog
#[cfg_attr(test, mockall::automock)]
pub trait ImageReader: Send + Sync {
    /// Names and kinds of every symbol the image at `path` exports
    fn exported_symbols(&self, path: &Path) -> Result<Vec<ImageSymbol>, ModuleError>;
}

/// [`ImageReader`] parsing ELF, Mach-O and PE images with `object`
#[derive(Debug, Clone, Default)]
pub struct ObjectImageReader {
    catalog_untyped: bool,
}

impl ObjectImageReader {
    /// `catalog_untyped` includes exports without a symbol type, as data
    pub fn new(catalog_untyped: bool) -> Self {
        Self { catalog_untyped }
    }
}

impl ImageReader for ObjectImageReader {
    fn exported_symbols(&self, path: &Path) -> Result<Vec<ImageSymbol>, ModuleError> {
        let parse_error = |reason: String| ModuleError::ImageParse {
            path: path.to_path_buf(),
            reason,
        };

        let data = fs::read(path).map_err(|e| parse_error(e.to_string()))?;
        let file = object::File::parse(&*data).map_err(|e| parse_error(e.to_string()))?;

        let mut symbols = catalog(&file, self.catalog_untyped);
        if symbols.is_empty() {
            // Images without a dynamic symbol table (PE) list exports separately.
            symbols = file
                .exports()
                .map_err(|e| parse_error(e.to_string()))?
                .into_iter()
                .map(|export| String::from_utf8_lossy(export.name()).into_owned())
                .filter(|name| !name.is_empty())
                .collect::<HashSet<_>>()
                .into_iter()
                .map(|name| ImageSymbol::new(name, SymbolKind::Function))
                .collect();
        }

        tracing::debug!(
            "catalogued {} exported symbols in {}",
            symbols.len(),
            path.display()
        );
        Ok(symbols)
    }
}

fn catalog(file: &object::File<'_>, catalog_untyped: bool) -> Vec<ImageSymbol> {
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();

    for sym in file.dynamic_symbols() {
        if sym.is_undefined() || !sym.is_global() {
            continue;
        }
        let kind = match sym.kind() {
            object::SymbolKind::Text => SymbolKind::Function,
            object::SymbolKind::Data => SymbolKind::Data,
            object::SymbolKind::Unknown if catalog_untyped => SymbolKind::Data,
            _ => continue,
        };
        let Ok(name) = sym.name() else {
            continue;
        };
        if name.is_empty() || !seen.insert(name) {
            continue;
        }
        symbols.push(ImageSymbol::new(name, kind));
    }

    symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.so");
        let err = ObjectImageReader::default()
            .exported_symbols(&path)
            .unwrap_err();
        assert!(matches!(err, ModuleError::ImageParse { path: p, .. } if p == path));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an object file").unwrap();

        let err = ObjectImageReader::default()
            .exported_symbols(file.path())
            .unwrap_err();
        assert!(matches!(err, ModuleError::ImageParse { .. }));
    }

    #[test]
    fn test_reads_own_executable() {
        let exe = std::env::current_exe().unwrap();
        let symbols = ObjectImageReader::new(true).exported_symbols(&exe).unwrap();

        let mut names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
