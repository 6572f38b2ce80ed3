//! Module Registry Module
//!
//! Process-wide, load-once registry of dynamic modules keyed by canonical
//! path.
//!
//! ## Protocol
//!
//! The registry lock covers lookup, image reading, linking and publication
//! of a placeholder record. Failures up to that point are returned to the
//! caller and leave nothing behind, so a later call retries. Once the
//! placeholder is published the lock is released; the initializer and
//! symbol resolution run outside it, and the outcome (success or a failed
//! initializer) is broadcast through the record's [`Completion`] and kept
//! for the life of the process. A panic in the initializer or during
//! resolution also completes the record, as a failure, before it unwinds
//! out of `load`.
//!
//! A thread that re-enters [`ModuleRegistry::load`] for the module it is
//! itself loading (from inside the module's initializer) gets the in-flight
//! handle back instead of deadlocking on its own completion signal.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

use tracing::{debug, info, warn};

use crate::completion::Completion;
use crate::config::LoaderConfig;
use crate::error::ModuleError;
use crate::image::{ImageReader, ObjectImageReader};
use crate::linker::{DynamicLinker, LinkedImage, SystemLinker};
use crate::symbol::{ImageSymbol, Symbol};

/// Resolved contents of a successfully loaded module
#[derive(Debug, Default)]
struct ModuleSymbols {
    symbols: HashMap<String, Symbol>,
    resolution_errors: Vec<ModuleError>,
}

type Outcome = Result<ModuleSymbols, ModuleError>;

/// Registry entry for one canonical path
struct ModuleRecord {
    path: PathBuf,
    image: Box<dyn LinkedImage>,
    loader: ThreadId,
    outcome: Completion<Outcome>,
}

impl fmt::Debug for ModuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRecord")
            .field("path", &self.path)
            .field("loader", &self.loader)
            .field("outcome", &self.outcome.get())
            .finish_non_exhaustive()
    }
}

/// Shared handle to a loaded module
///
/// Cloning is cheap; all clones refer to the same record. Two handles are
/// equal exactly when they refer to the same module.
#[derive(Debug, Clone)]
pub struct ModuleHandle {
    record: Arc<ModuleRecord>,
}

impl ModuleHandle {
    /// Canonical path the module was loaded from
    pub fn path(&self) -> &Path {
        &self.record.path
    }

    /// Whether loading has finished successfully
    ///
    /// `false` only for a handle returned to the loading thread while the
    /// module's initializer is still running.
    pub fn is_loaded(&self) -> bool {
        matches!(self.record.outcome.get(), Some(Ok(_)))
    }

    /// Find an exported symbol by exact name
    pub fn lookup(&self, name: &str) -> Result<&Symbol, ModuleError> {
        self.contents()
            .and_then(|contents| contents.symbols.get(name))
            .ok_or_else(|| ModuleError::SymbolNotFound {
                module: self.record.path.clone(),
                symbol: name.to_string(),
            })
    }

    /// Every resolved symbol, in no particular order
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.contents()
            .into_iter()
            .flat_map(|contents| contents.symbols.values())
    }

    /// Catalogued symbols the linker could not resolve
    pub fn resolution_errors(&self) -> &[ModuleError] {
        self.contents()
            .map(|contents| contents.resolution_errors.as_slice())
            .unwrap_or(&[])
    }

    fn contents(&self) -> Option<&ModuleSymbols> {
        match self.record.outcome.get() {
            Some(Ok(contents)) => Some(contents),
            _ => None,
        }
    }
}

impl PartialEq for ModuleHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }
}

impl Eq for ModuleHandle {}

/// Load-once registry of dynamic modules
pub struct ModuleRegistry {
    modules: Mutex<HashMap<PathBuf, Arc<ModuleRecord>>>,
    reader: Box<dyn ImageReader>,
    linker: Box<dyn DynamicLinker>,
    config: LoaderConfig,
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.loaded_paths())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

static GLOBAL_REGISTRY: OnceLock<ModuleRegistry> = OnceLock::new();

impl ModuleRegistry {
    /// Registry using the object-file reader and the system linker
    pub fn new(config: LoaderConfig) -> Self {
        let reader = ObjectImageReader::new(config.catalog_untyped_symbols);
        Self::with_backends(config, Box::new(reader), Box::new(SystemLinker))
    }

    pub fn with_backends(
        config: LoaderConfig,
        reader: Box<dyn ImageReader>,
        linker: Box<dyn DynamicLinker>,
    ) -> Self {
        Self {
            modules: Mutex::new(HashMap::new()),
            reader,
            linker,
            config,
        }
    }

    /// The process-wide registry, configured from the environment on first use
    pub fn global() -> &'static ModuleRegistry {
        GLOBAL_REGISTRY.get_or_init(|| Self::new(LoaderConfig::from_env()))
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Canonical paths of every module with a published record
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.lock_modules().keys().cloned().collect()
    }

    /// Load the module at `path`, or return the already-loaded one
    ///
    /// Paths naming the same file (through symbolic links or relative
    /// components) return equal handles. Blocks while another thread is
    /// loading the same module.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<ModuleHandle, ModuleError> {
        let requested = path.as_ref();
        let canonical = requested
            .canonicalize()
            .map_err(|e| ModuleError::PathResolution {
                path: requested.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut modules = self.lock_modules();

        if let Some(record) = modules.get(&canonical).cloned() {
            drop(modules);
            return Self::await_record(record);
        }

        let catalog = self.reader.exported_symbols(&canonical)?;
        let image = self.linker.open(&canonical)?;
        debug!(
            "linked {} with {} catalogued symbols",
            canonical.display(),
            catalog.len()
        );

        let record = Arc::new(ModuleRecord {
            path: canonical.clone(),
            image,
            loader: thread::current().id(),
            outcome: Completion::new(),
        });
        modules.insert(canonical, Arc::clone(&record));
        drop(modules);

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.finish(&record, catalog))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                warn!("module {} panicked while loading", record.path.display());
                record.outcome.fire(Err(ModuleError::Load {
                    path: record.path.clone(),
                    reason: "module initialization panicked".to_string(),
                }));
                panic::resume_unwind(payload);
            }
        };
        if let Err(err) = &outcome {
            warn!("module {} failed to load: {}", record.path.display(), err);
        }
        record.outcome.fire(outcome);

        Self::await_record(record)
    }

    fn await_record(record: Arc<ModuleRecord>) -> Result<ModuleHandle, ModuleError> {
        if record.loader == thread::current().id() && !record.outcome.is_fired() {
            debug!(
                "reentrant load of {} while its initializer runs",
                record.path.display()
            );
            return Ok(ModuleHandle { record });
        }
        match record.outcome.wait() {
            Ok(_) => Ok(ModuleHandle { record }),
            Err(err) => {
                debug!("returning cached failure for {}", record.path.display());
                Err(err.clone())
            }
        }
    }

    /// Run the initializer, then resolve the catalog
    fn finish(&self, record: &ModuleRecord, catalog: Vec<ImageSymbol>) -> Outcome {
        let entry = self.config.initializer_symbol.as_str();
        if let Some(status) = record.image.run_initializer(entry) {
            if status != 0 {
                return Err(ModuleError::Load {
                    path: record.path.clone(),
                    reason: format!("initializer {entry} returned status {status}"),
                });
            }
            debug!("initializer {} of {} succeeded", entry, record.path.display());
        }

        let mut contents = ModuleSymbols::default();
        for ImageSymbol { name, kind } in catalog {
            if contents.symbols.contains_key(&name) {
                continue;
            }
            match record.image.address_of(&name) {
                Ok(address) => {
                    contents
                        .symbols
                        .insert(name.clone(), Symbol::new(name, kind, address));
                }
                Err(reason) => {
                    warn!(
                        "module {}: could not resolve symbol {}: {}",
                        record.path.display(),
                        name,
                        reason
                    );
                    contents.resolution_errors.push(ModuleError::SymbolResolution {
                        module: record.path.clone(),
                        symbol: name,
                        reason,
                    });
                }
            }
        }

        info!(
            "loaded module {} ({} symbols)",
            record.path.display(),
            contents.symbols.len()
        );
        Ok(contents)
    }

    fn lock_modules(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<ModuleRecord>>> {
        self.modules.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Load a module through the process-wide registry
pub fn load_module(path: impl AsRef<Path>) -> Result<ModuleHandle, ModuleError> {
    ModuleRegistry::global().load(path)
}

/// Copy of the named symbol of `module`
pub fn lookup_symbol(module: &ModuleHandle, name: &str) -> Result<Symbol, ModuleError> {
    module.lookup(name).cloned()
}
