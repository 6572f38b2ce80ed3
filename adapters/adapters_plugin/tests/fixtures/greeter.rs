//! Shared library loaded by the module loader tests.
//!
//! `plugin_init` counts its calls and adjusts `GREETING`, so tests can see
//! both how often it ran and that it ran before `greet` was resolved.

use std::ffi::c_int;
use std::sync::atomic::{AtomicI32, Ordering};

#[no_mangle]
pub static INIT_CALLS: AtomicI32 = AtomicI32::new(0);

#[no_mangle]
pub static GREETING: AtomicI32 = AtomicI32::new(42);

#[no_mangle]
pub extern "C" fn plugin_init() -> c_int {
    INIT_CALLS.fetch_add(1, Ordering::SeqCst);
    GREETING.fetch_add(12, Ordering::SeqCst);
    0
}

#[no_mangle]
pub extern "C" fn greet() -> c_int {
    GREETING.load(Ordering::SeqCst)
}
