//! Places `memory.x` on the linker search path for RP2040 builds.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-env-changed=POWER_ALARM_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=POWER_ALARM_WIFI_PASSWORD");

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return;
    }

    let Some(out_dir) = env::var_os("OUT_DIR").map(PathBuf::from) else {
        return;
    };
    if let Err(error) = fs::write(out_dir.join("memory.x"), include_bytes!("memory.x")) {
        println!("cargo:warning=failed to stage memory.x: {error}");
        return;
    }

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
