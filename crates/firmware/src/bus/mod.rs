//! Audio buses: the I2C control bus and the I2S audio-data bus with DMA.
//!
//! Both drivers are written against [`platform::RegisterAccess`], so the
//! same code drives silicon through [`platform::Mmio`] and runs on the host
//! against simulated registers.

pub mod i2c;
pub mod i2s;

pub use i2c::{ControlBus, ControlBusConfig, ControlBusId, I2cError, I2cPhase};
pub use i2s::{
    on_dma_interrupt, I2sBus, I2sBusConfig, StartError, StopError, StreamError, StreamFlags,
    Transfer,
};
