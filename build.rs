//! Locates the vendor `MvCameraControl` library when the `mvs` feature is on.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=MVCAM_SDK_PATH");
    println!("cargo:rerun-if-env-changed=MVCAM_COMMON_RUNENV");

    if env::var_os("CARGO_FEATURE_MVS").is_none() {
        return;
    }

    // The runtime package exports MVCAM_COMMON_RUNENV, the SDK package MVCAM_SDK_PATH.
    let lib_dir = env::var_os("MVCAM_COMMON_RUNENV")
        .map(PathBuf::from)
        .or_else(|| env::var_os("MVCAM_SDK_PATH").map(|p| PathBuf::from(p).join("lib")));

    match lib_dir {
        Some(dir) => {
            // Build scripts run on the host; ask cargo about the target.
            let arch_dir = if env::var("CARGO_CFG_TARGET_POINTER_WIDTH").as_deref() == Ok("64") {
                dir.join("64")
            } else {
                dir.join("32")
            };
            println!("cargo:rustc-link-search=native={}", arch_dir.display());
        }
        None => {
            println!(
                "cargo:warning=neither MVCAM_COMMON_RUNENV nor MVCAM_SDK_PATH is set; \
                 relying on the default linker search path for MvCameraControl"
            );
        }
    }
}
