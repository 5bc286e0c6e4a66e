//! Build script for hostpal-core
//!
//! This script checks system requirements before compilation:
//! - Minimum Rust version
//! - Target family (the C library is required for `strnlen`/`snprintf`)
//!
//! ## Requirements
//!
//! - **Rust**: 1.74.0 or newer (`std::io::Error::other`)
//! - **Target**: any unix-family target; Fuchsia additionally gets the
//!   process-wide service context

fn main()
{
    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 74, 0);

        if rustc_version < min_rust_version {
            panic!(
                "hostpal-core requires Rust {} or newer, found {}",
                min_rust_version, rustc_version
            );
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }

    let family = std::env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();
    if !family.split(',').any(|f| f == "unix") {
        println!("cargo:warning=hostpal-core targets unix-family platforms; found {family:?}");
    }
}
