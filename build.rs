use std::{env, fs, path::PathBuf};

fn main() {
    // Provision memory.x for the RP2040 target. Host builds (tests) skip this.
    let target = env::var("TARGET").unwrap();
    if target.starts_with("thumbv6m") {
        let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
        let memory_x = fs::read_to_string("memory.x").expect("Failed to read memory.x");
        fs::write(out_dir.join("memory.x"), memory_x).expect("Failed to write memory.x");
        println!("cargo:rustc-link-search={}", out_dir.display());
        println!("cargo:rerun-if-changed=memory.x");
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }
}
