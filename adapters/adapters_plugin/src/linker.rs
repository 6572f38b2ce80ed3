//! Dynamic Linker Module
//!
//! Links images into the process through the OS loader and looks up the
//! runtime addresses of their symbols. Linked images are never unloaded.

use std::ffi::{c_int, c_void, CString};
use std::path::Path;

use libloading::Library;

use crate::error::ModuleError;
use crate::symbol::SymbolAddress;

/// OS dynamic linker
#[cfg_attr(test, mockall::automock)]
pub trait DynamicLinker: Send + Sync {
    /// Link the image at `path` into the process
    fn open(&self, path: &Path) -> Result<Box<dyn LinkedImage>, ModuleError>;
}

/// An image linked into the process
#[cfg_attr(test, mockall::automock)]
pub trait LinkedImage: Send + Sync {
    /// Run the `extern "C" fn() -> c_int` named `entry`
    ///
    /// `None` if the image does not export `entry`.
    fn run_initializer(&self, entry: &str) -> Option<i32>;

    /// Runtime address of `symbol`, or the linker's reason for not having one
    fn address_of(&self, symbol: &str) -> Result<SymbolAddress, String>;
}

/// [`DynamicLinker`] backed by `dlopen`/`LoadLibrary`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLinker;

impl DynamicLinker for SystemLinker {
    fn open(&self, path: &Path) -> Result<Box<dyn LinkedImage>, ModuleError> {
        // SAFETY: loading a library runs its static constructors. Callers of
        // the registry vouch for the modules they load.
        let library = unsafe { Library::new(path) }.map_err(|e| ModuleError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(SystemImage { library }))
    }
}

/// An image linked by [`SystemLinker`]
#[derive(Debug)]
pub struct SystemImage {
    library: Library,
}

impl SystemImage {
    fn raw_address(&self, symbol: &str) -> Result<*mut c_void, String> {
        let name = CString::new(symbol).map_err(|e| e.to_string())?;
        // SAFETY: the symbol is only read as an untyped address here.
        let sym = unsafe { self.library.get::<*mut c_void>(name.as_bytes_with_nul()) }
            .map_err(|e| e.to_string())?;
        Ok(*sym)
    }
}

impl LinkedImage for SystemImage {
    fn run_initializer(&self, entry: &str) -> Option<i32> {
        let name = CString::new(entry).ok()?;
        // SAFETY: the initializer contract is `extern "C" fn() -> c_int`.
        unsafe {
            let init = self
                .library
                .get::<unsafe extern "C" fn() -> c_int>(name.as_bytes_with_nul())
                .ok()?;
            Some(init())
        }
    }

    fn address_of(&self, symbol: &str) -> Result<SymbolAddress, String> {
        let ptr = self.raw_address(symbol)?;
        SymbolAddress::new(ptr).ok_or_else(|| format!("{symbol} resolved to a null address"))
    }
}
