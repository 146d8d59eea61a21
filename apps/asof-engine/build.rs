//! Build Script for Asof Engine
//!
//! Only emits the `coverage` cfg so `#[cfg(not(coverage))]` can exclude
//! timing-sensitive code from instrumented runs.

use std::env;

fn main() {
    #[cfg(coverage)]
    {
        println!("cargo:rustc-env=LLVM_PROFILE_FILE=coverage-%p-%m.profraw");
    }

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=CARGO_LLVM_COV");
    println!("cargo:rerun-if-env-changed=RUSTFLAGS");

    let instrumented = env::var("CARGO_LLVM_COV").is_ok()
        || env::var("LLVM_PROFILE_FILE").is_ok()
        || env::var("RUSTFLAGS").is_ok_and(|flags| flags.contains("instrument-coverage"));

    if instrumented {
        println!("cargo:rustc-cfg=coverage");
    }
}
