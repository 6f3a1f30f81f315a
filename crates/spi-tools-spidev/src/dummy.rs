//! In-memory loopback bus for testing
//!
//! `DummySpi` keeps a configuration in memory, records every configuration
//! write, and answers each transfer by echoing the transmitted bytes back
//! through a configurable transform. Useful for exercising command logic
//! without a spidev device.

use crate::bus::SpiBus;
use crate::config::{ConfigChange, SpiConfig};
use crate::error::{LinuxSpiError, Result};

/// Dummy SPI bus
#[derive(Debug, Clone)]
pub struct DummySpi {
    config: SpiConfig,
    writes: Vec<ConfigChange>,
    transfers: Vec<usize>,
    transform: fn(u8) -> u8,
    fail_after: Option<usize>,
    fail_writes_after: Option<usize>,
    max_transfer_len: Option<usize>,
}

impl Default for DummySpi {
    fn default() -> Self {
        Self::new(SpiConfig::default())
    }
}

impl DummySpi {
    /// Create a loopback bus starting from `config`
    pub fn new(config: SpiConfig) -> Self {
        Self {
            config,
            writes: Vec::new(),
            transfers: Vec::new(),
            transform: |b| b,
            fail_after: None,
            fail_writes_after: None,
            max_transfer_len: None,
        }
    }

    /// Apply `transform` to every echoed byte
    pub fn with_transform(mut self, transform: fn(u8) -> u8) -> Self {
        self.transform = transform;
        self
    }

    /// Make every transfer after the first `count` fail
    pub fn fail_transfers_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// Make every configuration write after the first `count` fail
    ///
    /// Failed writes leave the configuration untouched and are not recorded.
    pub fn fail_writes_after(mut self, count: usize) -> Self {
        self.fail_writes_after = Some(count);
        self
    }

    /// Report `len` as the largest accepted transfer
    pub fn with_max_transfer_len(mut self, len: usize) -> Self {
        self.max_transfer_len = Some(len);
        self
    }

    /// Current configuration
    pub fn config(&self) -> &SpiConfig {
        &self.config
    }

    /// Configuration writes received so far, oldest first
    pub fn writes(&self) -> &[ConfigChange] {
        &self.writes
    }

    fn write_error(&self) -> Option<std::io::Error> {
        self.fail_writes_after
            .filter(|&n| self.writes.len() >= n)
            .map(|_| std::io::Error::from_raw_os_error(libc::EINVAL))
    }

    /// Length of every successful transfer, oldest first
    pub fn transfers(&self) -> &[usize] {
        &self.transfers
    }
}

impl SpiBus for DummySpi {
    fn read_config(&mut self) -> Result<SpiConfig> {
        Ok(self.config)
    }

    fn write_mode(&mut self, mode: u8) -> Result<()> {
        if let Some(source) = self.write_error() {
            return Err(LinuxSpiError::SetModeFailed { mode, source });
        }
        self.writes.push(ConfigChange::Mode(mode));
        self.config.set_mode_byte(mode);
        Ok(())
    }

    fn write_lsb_first(&mut self, lsb_first: bool) -> Result<()> {
        if let Some(source) = self.write_error() {
            return Err(LinuxSpiError::SetLsbFirstFailed {
                lsb_first: u8::from(lsb_first),
                source,
            });
        }
        self.writes.push(ConfigChange::LsbFirst(lsb_first));
        self.config.lsb_first = lsb_first;
        Ok(())
    }

    fn write_bits_per_word(&mut self, bits: u8) -> Result<()> {
        if let Some(source) = self.write_error() {
            return Err(LinuxSpiError::SetBitsPerWordFailed { bits, source });
        }
        self.writes.push(ConfigChange::BitsPerWord(bits));
        self.config.set_bits_per_word(bits);
        Ok(())
    }

    fn write_speed_hz(&mut self, speed_hz: u32) -> Result<()> {
        if let Some(source) = self.write_error() {
            return Err(LinuxSpiError::SetSpeedFailed {
                speed: speed_hz,
                source,
            });
        }
        self.writes.push(ConfigChange::SpeedHz(speed_hz));
        self.config.speed_hz = speed_hz;
        Ok(())
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        if tx.len() != rx.len() {
            return Err(LinuxSpiError::InvalidParameter(
                "buffers differ in length".into(),
            ));
        }
        if self.fail_after.is_some_and(|n| self.transfers.len() >= n) {
            return Err(LinuxSpiError::TransferFailed(std::io::Error::from_raw_os_error(
                libc::EIO,
            )));
        }

        for (out, &byte) in rx.iter_mut().zip(tx) {
            *out = (self.transform)(byte);
        }
        self.transfers.push(tx.len());
        Ok(())
    }

    fn max_transfer_len(&self) -> Option<usize> {
        self.max_transfer_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpiMode;

    #[test]
    fn test_loopback_transfer() {
        let mut spi = DummySpi::default().with_transform(|b| !b);
        let tx = [0x00, 0x5a, 0xff];
        let mut rx = [0u8; 3];

        spi.transfer(&tx, &mut rx).unwrap();

        assert_eq!(rx, [0xff, 0xa5, 0x00]);
        assert_eq!(spi.transfers(), &[3]);
    }

    #[test]
    fn test_write_config_roundtrips() {
        let mut spi = DummySpi::default();
        let wanted = SpiConfig {
            mode: SpiMode::Mode2,
            lsb_first: true,
            bits_per_word: 12,
            speed_hz: 8_000_000,
            spi_ready: true,
            ..Default::default()
        };

        spi.write_config(&wanted).unwrap();

        assert_eq!(spi.read_config().unwrap(), wanted);
        assert_eq!(spi.writes().len(), 4);
    }

    #[test]
    fn test_transfer_failure() {
        let mut spi = DummySpi::default().fail_transfers_after(1);
        let mut rx = [0u8; 1];

        assert!(spi.transfer(&[1], &mut rx).is_ok());
        assert!(matches!(
            spi.transfer(&[2], &mut rx),
            Err(LinuxSpiError::TransferFailed(_))
        ));
    }

    #[test]
    fn test_write_failure() {
        let mut spi = DummySpi::default().fail_writes_after(2);

        spi.write_mode(0x03).unwrap();
        spi.write_lsb_first(true).unwrap();
        assert!(matches!(
            spi.write_bits_per_word(16),
            Err(LinuxSpiError::SetBitsPerWordFailed { bits: 16, .. })
        ));

        assert_eq!(spi.writes().len(), 2);
        assert_eq!(spi.config().bits_per_word, 8);
    }
}
