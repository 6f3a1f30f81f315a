//! CLI command implementations
//!
//! Both commands are written against the `SpiBus` trait so they run the
//! same on a spidev device and on the in-memory `DummySpi` used in tests.
//!
//! ## spi-config
//!
//! Reads the current configuration, then either prints it or writes only
//! the fields that change.
//!
//! ## spi-pipe
//!
//! Saves the configuration, applies the requested one, streams blocks
//! through the bus and restores the saved configuration afterwards.

pub mod config;
pub mod pipe;

use thiserror::Error;

/// Errors raised by the command layer itself
#[derive(Debug, Error)]
pub enum CommandError {
    /// The input ended before the requested number of blocks was sent
    #[error("input ended after {transferred} of {requested} blocks")]
    Incomplete { transferred: u64, requested: u64 },
}
