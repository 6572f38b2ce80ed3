//! Adapters Layer: Dynamic Modules
//!
//! Loads shared libraries at runtime exactly once per process and exposes
//! their exported symbols by name.
//!
//! ## Overview
//!
//! A module is identified by its canonical (symlink-resolved) path. The
//! first caller for a path:
//!
//! 1. reads the image's exported symbol table ([`ImageReader`])
//! 2. links the image into the process ([`DynamicLinker`])
//! 3. publishes a placeholder record and releases the registry lock
//! 4. runs the module's initializer entry point, if it exports one
//! 5. resolves every catalogued symbol
//! 6. fires the record's completion signal
//!
//! Concurrent callers for the same path find the placeholder and block on
//! the completion signal, then share the finished record. Modules are
//! never unloaded; a module whose initializer fails stays failed.
//!
//! ## Modules
//!
//! - **[`registry`]**: process-wide registry, [`load_module`], [`lookup_symbol`]
//! - **[`image`]**: symbol table reader
//! - **[`linker`]**: OS dynamic linker
//! - **[`completion`]**: one-shot broadcast signal
//! - **[`symbol`]**: resolved symbols
//! - **[`config`]**: loader configuration

pub mod completion;
pub mod config;
pub mod error;
pub mod image;
pub mod linker;
pub mod registry;
pub mod symbol;

pub use config::LoaderConfig;
pub use error::ModuleError;
pub use image::{ImageReader, ObjectImageReader};
pub use linker::{DynamicLinker, LinkedImage, SystemImage, SystemLinker};
pub use registry::{load_module, lookup_symbol, ModuleHandle, ModuleRegistry};
pub use symbol::{ImageSymbol, Symbol, SymbolAddress, SymbolKind};
