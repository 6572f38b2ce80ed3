//! Symbols exported by dynamic modules

use std::ffi::c_void;
use std::mem;
use std::ptr::NonNull;

/// Whether a symbol names code or a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Data,
}

/// Runtime address of a symbol inside the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolAddress(NonNull<c_void>);

// SAFETY: the address points into an image that is never unloaded. Sharing
// the address between threads is sound; dereferencing it is the caller's
// responsibility through the unsafe accessors on `Symbol`.
unsafe impl Send for SymbolAddress {}
unsafe impl Sync for SymbolAddress {}

impl SymbolAddress {
    /// `None` for a null address
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// A name and kind read from an image's export table, before linking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSymbol {
    pub name: String,
    pub kind: SymbolKind,
}

impl ImageSymbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A resolved symbol of a loaded module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
    address: SymbolAddress,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, address: SymbolAddress) -> Self {
        Self {
            name: name.into(),
            kind,
            address,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn address(&self) -> SymbolAddress {
        self.address
    }

    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }

    /// The symbol as a callable function pointer
    ///
    /// Returns `None` for data symbols, or when `F` is not pointer-sized.
    ///
    /// # Safety
    ///
    /// `F` must be an `extern "C" fn` type matching the symbol's actual
    /// signature.
    pub unsafe fn as_fn<F: Copy>(&self) -> Option<F> {
        if !self.is_function() || mem::size_of::<F>() != mem::size_of::<*mut c_void>() {
            return None;
        }
        let ptr = self.address.as_ptr();
        Some(mem::transmute_copy::<*mut c_void, F>(&ptr))
    }

    /// The symbol's address as a typed pointer
    ///
    /// For data symbols this is the address of the variable itself.
    pub fn as_ptr<T>(&self) -> *mut T {
        self.address.as_ptr().cast()
    }
}
