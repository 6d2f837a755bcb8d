// build.rs

use std::env;

fn main() {
    // Backend selection. Exactly one of the three cfgs is emitted so the crate
    // root can re-export a single backend's types.
    //
    // We read CARGO_CFG_TARGET_ARCH instead of cfg!(target_arch) because the
    // build script runs on the host, which differs from the target when
    // cross-compiling.
    println!("cargo::rerun-if-changed=build.rs");
    println!("cargo::rustc-check-cfg=cfg(laneflow_sse, laneflow_neon, laneflow_generic)");

    let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let forced_generic = env::var_os("CARGO_FEATURE_FORCE_GENERIC").is_some();

    let backend = match (forced_generic, arch.as_str()) {
        (true, _) => "laneflow_generic",
        (false, "x86_64") => "laneflow_sse",
        (false, "aarch64") => "laneflow_neon",
        _ => "laneflow_generic",
    };

    println!("cargo::rustc-cfg={}", backend);
}
