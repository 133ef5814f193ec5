//! Architecture boundary tests — run with `cargo test -p firmware --test arch_boundaries`
// Architecture test file: expect/unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::assertions_on_constants,
)]
//!
//! Layering rules:
//!   Rule 1: platform (HAL) must not depend on playback or firmware
//!   Rule 2: playback must not depend on firmware and must not touch registers
//!   Rule 3: both audio paths are reachable only through `AudioOutput`
//!   Rule 4: the binary wires exactly the interrupts the drivers expect
//!
//! Manifest and source checks use `include_str!`, so a violation fails the
//! test binary on the host without a target toolchain.

use firmware::audio::{CodecPath, PwmPath, Wm8994};
use firmware::bus::ControlBus;
use firmware::BusyDelay;
use platform::audio_config::{DataBusPins, PwmPins};
use platform::{AudioOutput, Mmio};
use playback::ProfileOutput;

/// Dependency lines of a manifest, comments stripped.
fn dependency_lines(manifest: &str) -> Vec<&str> {
    manifest
        .lines()
        .map(|l| l.split('#').next().unwrap_or("").trim())
        .filter(|l| !l.is_empty())
        .collect()
}

#[test]
fn platform_depends_on_nothing_above_it() {
    let manifest = include_str!("../../platform/Cargo.toml");
    for line in dependency_lines(manifest) {
        assert!(!line.starts_with("firmware"), "platform must not depend on firmware: {line}");
        assert!(!line.starts_with("playback"), "platform must not depend on playback: {line}");
    }
}

#[test]
fn playback_depends_only_on_platform() {
    let manifest = include_str!("../../playback/Cargo.toml");
    for line in dependency_lines(manifest) {
        assert!(!line.starts_with("firmware"), "playback must not depend on firmware: {line}");
        assert!(!line.starts_with("stm32f4"), "playback must stay device-independent: {line}");
    }
}

#[test]
fn playback_never_touches_registers() {
    for (name, source) in [
        ("engine.rs", include_str!("../../playback/src/engine.rs")),
        ("output.rs", include_str!("../../playback/src/output.rs")),
        ("volume.rs", include_str!("../../playback/src/volume.rs")),
    ] {
        assert!(!source.contains("Mmio"), "{name} must not use Mmio");
        assert!(!source.contains("RegisterAccess"), "{name} must not use RegisterAccess");
        assert!(!source.contains("unsafe"), "{name} must not contain unsafe code");
    }
}

#[test]
fn no_async_runtime_in_manifests() {
    for manifest in [
        include_str!("../Cargo.toml"),
        include_str!("../../../Cargo.toml"),
    ] {
        for banned in ["embassy", "tokio", "rtic"] {
            assert!(
                dependency_lines(manifest).iter().all(|l| !l.starts_with(banned)),
                "{banned} must not be a dependency; the audio paths are interrupt-driven"
            );
        }
    }
}

#[test]
fn collections_crate_is_confined_to_host_mocks() {
    let firmware = include_str!("../Cargo.toml");
    assert!(
        dependency_lines(firmware).iter().all(|l| !l.starts_with("heapless")),
        "firmware has no use for heapless"
    );
    let platform = include_str!("../../platform/Cargo.toml");
    let heapless = dependency_lines(platform)
        .into_iter()
        .find(|l| l.starts_with("heapless") && l.contains("optional"))
        .expect("platform's heapless dependency must be optional");
    assert!(heapless.contains("workspace = true"));
    assert!(platform.contains("std     = [\"dep:heapless\"]"));
}

/// Both paths plug into the engine through the same trait.
#[test]
fn audio_paths_implement_audio_output() {
    fn assert_output<'a, O: AudioOutput<'a>>() {}

    assert_output::<CodecPath<'static, 'static, ControlBus<Mmio, BusyDelay>, BusyDelay, Mmio, Mmio>>();
    assert_output::<PwmPath<'static, 'static, Mmio, Mmio>>();
    assert_output::<
        ProfileOutput<
            CodecPath<'static, 'static, ControlBus<Mmio, BusyDelay>, BusyDelay, Mmio, Mmio>,
            PwmPath<'static, 'static, Mmio, Mmio>,
        >,
    >();
}

#[test]
fn codec_driver_is_bus_generic() {
    // Compile-only: the driver takes any embedded-hal I2C bus.
    fn _on_any_bus<I: embedded_hal::i2c::I2c>(bus: I) -> Wm8994<I, BusyDelay> {
        Wm8994::new(bus, BusyDelay::default(), platform::VolumePercent::DEFAULT, platform::SampleRate::Hz44100)
    }
}

#[test]
fn main_binds_both_audio_interrupts() {
    let main = include_str!("../src/main.rs");
    assert!(main.contains("fn DMA1_STREAM5()"), "codec path completion interrupt");
    assert!(main.contains("fn TIM3()"), "PWM sample tick interrupt");
    assert!(main.contains("on_dma_interrupt("));
    assert!(main.contains("on_sample_tick("));
}

#[test]
fn sample_tick_outranks_dma_completion() {
    // Lower NVIC number = higher priority; the F407 implements 4 bits.
    assert!(PwmPins::IRQ_PRIORITY < DataBusPins::IRQ_PRIORITY);
    assert!(DataBusPins::IRQ_PRIORITY < 16);
}

#[test]
fn memory_x_matches_stm32f407vg() {
    let memory_x = include_str!("../../../memory.x");
    assert!(memory_x.contains("ORIGIN = 0x08000000, LENGTH = 1024K"));
    assert!(memory_x.contains("ORIGIN = 0x20000000, LENGTH = 128K"));
    assert!(!memory_x.contains("CCMRAM"), "DMA cannot reach CCM RAM");
}

#[test]
fn defmt_default_level_matches_build_env() {
    let workspace = include_str!("../../../Cargo.toml");
    let config = include_str!("../../../.cargo/config.toml");
    assert!(workspace.contains("default-log-level = \"info\""));
    assert!(config.contains("DEFMT_LOG = \"info\""));
}

#[test]
fn runner_targets_the_board_chip() {
    let config = include_str!("../../../.cargo/config.toml");
    assert!(config.contains("STM32F407VGTx"));
    assert!(config.contains("-Tdefmt.x"));
}
