//! spi-tools-spidev - Linux spidev configuration and transfers
//!
//! This crate wraps the Linux `spidev` character-device interface used by
//! the `spi-config` and `spi-pipe` tools.
//!
//! # Overview
//!
//! The Linux SPI driver exposes SPI controllers through character devices
//! at `/dev/spidevX.Y` where X is the bus number and Y is the chip select.
//! Each device has a small configuration (clock mode, bit order, word size,
//! maximum clock speed and a few mode flags such as `SPI_READY`) that is
//! read and written with one ioctl per field, and transfers data with
//! `SPI_IOC_MESSAGE`.
//!
//! # Example
//!
//! ```no_run
//! use spi_tools_spidev::{ConfigRequest, LinuxSpi, SpiBus, SpiMode};
//!
//! let mut spi = LinuxSpi::open("/dev/spidev0.0")?;
//! let current = spi.read_config()?;
//! println!("{}", current);
//!
//! let request = ConfigRequest {
//!     mode: Some(SpiMode::Mode3),
//!     speed_hz: Some(4_000_000),
//!     ..Default::default()
//! };
//! spi.apply_changes(&request.changes_from(&current))?;
//!
//! let tx = [0x9f, 0x00, 0x00, 0x00];
//! let mut rx = [0u8; 4];
//! spi.transfer(&tx, &mut rx)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read access to `/dev/spidevX.Y`
//! - May require adding user to `spi` group or using udev rules

pub mod bus;
pub mod config;
pub mod device;
pub mod dummy;
pub mod error;
pub mod pipe;

// Re-exports
pub use bus::SpiBus;
pub use config::{
    parse_bits_per_word, parse_block_count, parse_block_size, parse_flag, parse_mode,
    parse_speed, ConfigChange, ConfigRequest, ModeFlags, SpiConfig, SpiMode,
};
pub use device::LinuxSpi;
pub use dummy::DummySpi;
pub use error::{LinuxSpiError, Result};
pub use pipe::{BlockCount, PipeError, PipeSummary};
