use rustc_version::{version, version_meta, Channel};
use std::env;

fn main() {
    let version = version().unwrap();
    assert!(version.major >= 1);
    assert!(version.minor >= 56);

    println!("cargo:rustc-check-cfg=cfg(stable,beta,nightly,dev,x11)");

    match version_meta().unwrap().channel {
        Channel::Stable => {
            println!("cargo:rustc-cfg=stable");
        }
        Channel::Beta => {
            println!("cargo:rustc-cfg=beta");
        }
        Channel::Nightly => {
            println!("cargo:rustc-cfg=nightly");
        }
        Channel::Dev => {
            println!("cargo:rustc-cfg=dev");
        }
    }

    // The build script runs on the host, so ask cargo about the target.
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let x11_os = ["linux", "freebsd", "dragonfly", "openbsd", "netbsd"];
    if x11_os.contains(&target_os.as_str()) && env::var_os("CARGO_FEATURE_X11").is_some() {
        println!("cargo:rustc-cfg=x11");
    }
}
