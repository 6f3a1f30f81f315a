//! The `SpiBus` trait
//!
//! Command logic is written against this trait so it can run on a real
//! spidev device ([`crate::LinuxSpi`]) or an in-memory loopback
//! ([`crate::DummySpi`]).

use crate::config::{ConfigChange, SpiConfig};
use crate::error::Result;

/// A configurable SPI bus that performs full-duplex transfers
pub trait SpiBus {
    /// Read the complete current configuration
    fn read_config(&mut self) -> Result<SpiConfig>;

    /// Write the raw mode byte (clock mode and flags)
    fn write_mode(&mut self, mode: u8) -> Result<()>;

    /// Select LSB-first (true) or MSB-first (false) bit order
    fn write_lsb_first(&mut self, lsb_first: bool) -> Result<()>;

    /// Set the word size in bits
    fn write_bits_per_word(&mut self, bits: u8) -> Result<()>;

    /// Set the maximum clock speed in Hz
    fn write_speed_hz(&mut self, speed_hz: u32) -> Result<()>;

    /// Clock `tx` out while clocking the same number of bytes into `rx`
    ///
    /// Both buffers must have the same length.
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()>;

    /// Largest transfer the bus accepts in one message, if known
    fn max_transfer_len(&self) -> Option<usize> {
        None
    }

    /// Perform a single configuration write
    fn apply(&mut self, change: &ConfigChange) -> Result<()> {
        log::debug!("Writing {}", change);
        match *change {
            ConfigChange::Mode(raw) => self.write_mode(raw),
            ConfigChange::LsbFirst(lsb) => self.write_lsb_first(lsb),
            ConfigChange::BitsPerWord(bits) => self.write_bits_per_word(bits),
            ConfigChange::SpeedHz(hz) => self.write_speed_hz(hz),
        }
    }

    /// Perform configuration writes in order, stopping at the first failure
    fn apply_changes(&mut self, changes: &[ConfigChange]) -> Result<()> {
        for change in changes {
            self.apply(change)?;
        }
        Ok(())
    }

    /// Write every field of `config`: mode, bit order, word size, speed
    fn write_config(&mut self, config: &SpiConfig) -> Result<()> {
        self.apply_changes(&[
            ConfigChange::Mode(config.mode_byte()),
            ConfigChange::LsbFirst(config.lsb_first),
            ConfigChange::BitsPerWord(config.bits_per_word),
            ConfigChange::SpeedHz(config.speed_hz),
        ])
    }
}
