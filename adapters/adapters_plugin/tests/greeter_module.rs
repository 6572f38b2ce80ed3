//! End-to-end load of a module with an initializer
//!
//! Kept to a single test in its own binary: the fixture's initializer call
//! count is process-wide, so no other test may load it.

use adapters_plugin::*;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_initializer_runs_once_across_concurrent_loads() {
    let Some(path) = option_env!("GREETER_FIXTURE") else {
        // Fixture not built for this target.
        return;
    };
    let registry = Arc::new(ModuleRegistry::new(LoaderConfig::default()));

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let loaders: Vec<_> = (0..threads)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.load(path).unwrap()
            })
        })
        .collect();
    let handles: Vec<_> = loaders.into_iter().map(|t| t.join().unwrap()).collect();

    let module = &handles[0];
    for handle in &handles {
        assert_eq!(handle, module);
    }
    assert!(module.is_loaded());
    assert!(module.resolution_errors().is_empty());

    let init_calls = module.lookup("INIT_CALLS").unwrap();
    assert_eq!(init_calls.kind(), SymbolKind::Data);
    let init_calls = unsafe { &*init_calls.as_ptr::<AtomicI32>() };
    assert_eq!(init_calls.load(Ordering::SeqCst), 1);

    let greet = module.lookup("greet").unwrap();
    assert!(greet.is_function());
    let greet = unsafe { greet.as_fn::<unsafe extern "C" fn() -> i32>() }.unwrap();
    assert_eq!(unsafe { greet() }, 54);
}
