//! F4 Audio Player Firmware - Main Entry Point
//!
//! Hardware-only entry point for the STM32F407. Brings up the clock tree,
//! opens the audio path selected by the device profile and loops a test tone
//! through the playback engine.

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception, ExceptionFrame};
use defmt_rtt as _;
use panic_probe as _;
use static_cell::StaticCell;
use stm32f4::stm32f407::{interrupt, Interrupt, NVIC};

use firmware::audio::tone;
use firmware::audio::{on_sample_tick, CodecPath, PwmConfig, PwmPath, PwmShared, Wm8994};
use firmware::board::{self, GpioBank};
use firmware::boot;
use firmware::bus::{
    on_dma_interrupt, ControlBus, ControlBusConfig, ControlBusId, I2sBus, I2sBusConfig,
    StreamFlags,
};
use firmware::regs::{base, DmaStreamRegs, RccRegs, TimerRegs};
use firmware::{audio::CodecError, BusyDelay};
use platform::audio_config::{DataBusPins, PwmPins};
use platform::config::{APP_NAME, APP_VERSION};
use platform::{AudioError, AudioProfile, LoopMode, Mmio, PlayerConfig, TrackId};
use playback::{PlaybackEngine, ProfileOutput};

#[cfg(feature = "pwm-profile")]
const PROFILE: AudioProfile = AudioProfile::Pwm;
#[cfg(not(feature = "pwm-profile"))]
const PROFILE: AudioProfile = AudioProfile::Codec;

const PLAYER_CONFIG: PlayerConfig = PlayerConfig::new()
    .with_profile(PROFILE)
    .with_loop_mode(LoopMode::One);

/// 441 Hz test tone; 4400 frames hold a whole number of periods.
const TONE_HZ: f32 = 441.0;
const TONE_SAMPLES: usize = 8_800;

static STREAM_FLAGS: StreamFlags = StreamFlags::new();
static PWM_SHARED: PwmShared = PwmShared::new();
static TONE: StaticCell<[i16; TONE_SAMPLES]> = StaticCell::new();

type CodecOutput = CodecPath<
    'static,
    'static,
    ControlBus<Mmio, BusyDelay>,
    BusyDelay,
    Mmio,
    Mmio,
>;
type PwmOutput = PwmPath<'static, 'static, Mmio, Mmio>;
type Output = ProfileOutput<CodecOutput, PwmOutput>;

#[entry]
fn main() -> ! {
    defmt::info!("{=str} v{=str}", APP_NAME, APP_VERSION);

    let config = PLAYER_CONFIG;
    if let Err(e) = config.validate() {
        defmt::error!("Invalid player configuration: {}", e);
        halt();
    }

    // SAFETY: boot context, nothing else owns RCC or the flash interface yet.
    let (rcc, flash) = unsafe { (RccRegs::new(Mmio::new(base::RCC)), Mmio::new(base::FLASH)) };
    if let Err(e) = boot::configure_clock_tree(&rcc, &flash, boot::DEFAULT_TIMEOUT_LOOPS) {
        defmt::error!("Clock bring-up failed: {}", e);
        halt();
    }

    // SAFETY: the bank is the only GPIO owner from here on.
    let mut pins = unsafe { GpioBank::steal() };
    board::enable_audio_clocks(pins.rcc(), ControlBusId::I2c1);

    let channels = match config.profile {
        AudioProfile::Codec => 2,
        AudioProfile::Pwm => 1,
    };
    let samples: &'static mut [i16; TONE_SAMPLES] = TONE.init([0; TONE_SAMPLES]);
    tone::sine_wave(samples, config.sample_rate, TONE_HZ, channels);
    let samples: &'static [i16] = samples;

    let output = match open_output(&config, &mut pins) {
        Ok(output) => output,
        Err(e) => {
            defmt::error!("Audio path bring-up failed: {}", e);
            halt();
        }
    };
    unmask_audio_interrupt(config.profile);

    let mut engine = PlaybackEngine::new(output, &config);
    if let Err(e) = engine.load(TrackId(0), samples).and_then(|()| engine.play()) {
        defmt::error!("Playback start failed: {}", e);
        halt();
    }
    defmt::info!("Playing {=f32} Hz test tone", TONE_HZ);

    loop {
        match engine.poll() {
            Ok(Some(event)) => defmt::debug!("Playback event: {}", event),
            Ok(None) => {}
            Err(e) => defmt::warn!("Playback poll failed: {}", e),
        }
        cortex_m::asm::wfi();
    }
}

fn open_output(config: &PlayerConfig, pins: &mut GpioBank<Mmio>) -> Result<Output, AudioError> {
    match config.profile {
        AudioProfile::Codec => {
            let id = ControlBusId::I2c1;
            // SAFETY: each block below is handed to exactly one driver.
            let (i2c, spi, dma) = unsafe {
                (
                    Mmio::new(id.base_address()),
                    Mmio::new(base::SPI3),
                    Mmio::new(base::DMA1),
                )
            };
            let bus = ControlBus::open(id, i2c, BusyDelay::default(), pins, ControlBusConfig::default());
            let codec = Wm8994::new(bus, BusyDelay::default(), config.initial_volume, config.sample_rate);
            let stream = I2sBus::open(spi, dma, &STREAM_FLAGS, pins, I2sBusConfig::new(config.sample_rate))
                .map_err(|e| AudioError::from(CodecError::from(e)))?;
            let mut path = CodecPath::new(codec, stream);
            path.init(pins)?;
            Ok(ProfileOutput::Codec(path))
        }
        AudioProfile::Pwm => {
            // SAFETY: TIM2 and TIM3 are owned by the PWM path alone.
            let (carrier, tick) = unsafe { (Mmio::new(base::TIM2), Mmio::new(base::TIM3)) };
            let path = PwmPath::open(carrier, tick, &PWM_SHARED, pins, PwmConfig::from_player(config))?;
            Ok(ProfileOutput::Pwm(path))
        }
    }
}

fn unmask_audio_interrupt(profile: AudioProfile) {
    let (irq, priority) = match profile {
        AudioProfile::Codec => (Interrupt::DMA1_STREAM5, DataBusPins::IRQ_PRIORITY),
        AudioProfile::Pwm => (Interrupt::TIM3, PwmPins::IRQ_PRIORITY),
    };
    // SAFETY: called once after the path is configured; the handlers below
    // only touch state shared through atomics.
    unsafe {
        let mut cp = cortex_m::Peripherals::steal();
        // The F407 implements the top four priority bits.
        cp.NVIC.set_priority(irq, priority.wrapping_shl(4));
        NVIC::unmask(irq);
    }
}

fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

#[interrupt]
fn DMA1_STREAM5() {
    // SAFETY: the handler only reads and clears stream-5 interrupt flags.
    let dma = DmaStreamRegs::new(unsafe { Mmio::new(base::DMA1) }, DataBusPins::DMA_STREAM);
    on_dma_interrupt(&dma, &STREAM_FLAGS);
}

#[interrupt]
fn TIM3() {
    // SAFETY: the handler writes TIM2 CCR1 and clears the TIM3 update flag,
    // which the PWM path does not touch while the tick runs.
    let (carrier, tick) = unsafe {
        (
            TimerRegs::new(Mmio::new(base::TIM2)),
            TimerRegs::new(Mmio::new(base::TIM3)),
        )
    };
    on_sample_tick(&PWM_SHARED, &carrier, &tick);
}

#[exception]
unsafe fn HardFault(ef: &ExceptionFrame) -> ! {
    defmt::panic!(
        "HardFault! Stacked exception frame at {=u32:#x}. Check stacked PC for fault address.",
        ef as *const _ as u32
    );
}
