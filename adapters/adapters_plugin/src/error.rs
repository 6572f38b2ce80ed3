//! Module loading errors

use std::path::PathBuf;

/// Dynamic module errors
///
/// `Clone` so a terminal failure cached in the registry can be handed to
/// every later caller for the same module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    /// The requested path could not be canonicalized
    #[error("module open({}): resolving symbolic links failed: {reason}", .path.display())]
    PathResolution { path: PathBuf, reason: String },
    /// The image's symbol table could not be read
    #[error("module open({}): reading symbol table failed: {reason}", .path.display())]
    ImageParse { path: PathBuf, reason: String },
    /// The OS refused to link the image, or its initializer failed
    #[error("module open({}): {reason}", .path.display())]
    Load { path: PathBuf, reason: String },
    /// One catalogued symbol had no runtime address
    #[error("module {}: could not resolve symbol {symbol}: {reason}", .module.display())]
    SymbolResolution {
        module: PathBuf,
        symbol: String,
        reason: String,
    },
    /// Lookup of a name the module does not provide
    #[error("symbol {symbol} not found in module {}", .module.display())]
    SymbolNotFound { module: PathBuf, symbol: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = ModuleError::SymbolNotFound {
            module: PathBuf::from("/opt/mods/libgreet.so"),
            symbol: "greet".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "symbol greet not found in module /opt/mods/libgreet.so"
        );

        let err = ModuleError::Load {
            path: PathBuf::from("/opt/mods/libgreet.so"),
            reason: "initializer plugin_init returned status 3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "module open(/opt/mods/libgreet.so): initializer plugin_init returned status 3"
        );
    }
}
