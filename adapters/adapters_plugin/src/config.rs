//! Loader configuration

/// Environment variable overriding the initializer entry point name
pub const INIT_SYMBOL_ENV: &str = "PLUGIN_INIT_SYMBOL";

/// Default initializer entry point
pub const DEFAULT_INIT_SYMBOL: &str = "plugin_init";

/// Dynamic module loader configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Exported `extern "C" fn() -> c_int` run once after linking, before
    /// symbols are resolved. A non-zero return fails the module.
    pub initializer_symbol: String,
    /// Catalog symbols the image marks with no type as data symbols
    pub catalog_untyped_symbols: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            initializer_symbol: DEFAULT_INIT_SYMBOL.to_string(),
            catalog_untyped_symbols: false,
        }
    }
}

impl LoaderConfig {
    /// Defaults, with the initializer name taken from [`INIT_SYMBOL_ENV`]
    /// when it is set and non-empty
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(name) = std::env::var(INIT_SYMBOL_ENV) {
            if !name.is_empty() {
                config.initializer_symbol = name;
            }
        }
        config
    }

    pub fn with_initializer_symbol(mut self, name: impl Into<String>) -> Self {
        self.initializer_symbol = name.into();
        self
    }

    pub fn with_untyped_symbols(mut self, catalog: bool) -> Self {
        self.catalog_untyped_symbols = catalog;
        self
    }
}
