//! spi-tools - command-line utilities for Linux spidev devices
//!
//! Two tools share this crate:
//! - **spi-config** queries or changes a device's clock mode, bit order,
//!   word size, clock speed and SPI_READY handling
//! - **spi-pipe** streams standard input to the device in fixed-size blocks
//!   and writes what the device clocks back to standard output
//!
//! The device access itself lives in the `spi-tools-spidev` crate; this
//! crate holds argument parsing, logging setup and the command logic.

pub mod cli;
pub mod commands;

/// Initialize the logger
///
/// `RUST_LOG` is honoured, defaulting to warnings only so that nothing but
/// problems reach stderr. Each `--verbose` raises the level by one step.
pub fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    match verbose {
        0 => {} // default (warn)
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        2 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }

    builder.init();
}
