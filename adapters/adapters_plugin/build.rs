//! Build script for adapters_plugin
//!
//! Compiles `tests/fixtures/greeter.rs` into a shared library with the same
//! `rustc` cargo is using and exposes its path to the tests as
//! `GREETER_FIXTURE`. When the fixture cannot be built (cross builds, no
//! usable compiler) the tests that need it skip themselves.

use std::env;
use std::path::PathBuf;
use std::process::Command;

const FIXTURE: &str = "tests/fixtures/greeter.rs";

fn main() {
    println!("cargo:rerun-if-changed={FIXTURE}");

    let (Ok(rustc), Ok(out_dir), Ok(manifest_dir)) = (
        env::var("RUSTC"),
        env::var("OUT_DIR"),
        env::var("CARGO_MANIFEST_DIR"),
    ) else {
        return;
    };

    // The fixture is loaded by the test process, so it must match the host.
    if env::var("TARGET").ok() != env::var("HOST").ok() {
        return;
    }

    let output = PathBuf::from(out_dir).join(format!(
        "{}greeter{}",
        env::consts::DLL_PREFIX,
        env::consts::DLL_SUFFIX
    ));
    let status = Command::new(rustc)
        .args(["--crate-type", "cdylib", "--crate-name", "greeter", "--edition", "2021"])
        .arg("-o")
        .arg(&output)
        .arg(PathBuf::from(manifest_dir).join(FIXTURE))
        .status();

    match status {
        Ok(status) if status.success() => {
            println!("cargo:rustc-env=GREETER_FIXTURE={}", output.display());
        }
        Ok(status) => {
            println!("cargo:warning=greeter fixture build failed ({status}); fixture tests skip");
        }
        Err(e) => {
            println!("cargo:warning=could not run rustc for the greeter fixture: {e}");
        }
    }
}
