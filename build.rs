use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let target = env::var("TARGET").unwrap_or_default();
    if !target.contains("avr") {
        // Host builds are for the test suite.
        return;
    }

    println!("cargo:rustc-link-arg=-mmcu=atmega128a");
    println!("cargo:rustc-env=MCU_FREQ_HZ=16000000");
}
