//! spi-config command implementation

use spi_tools_spidev::{ConfigRequest, SpiBus};
use std::io::Write;

/// Run the spi-config command
///
/// With `query` set the current configuration is printed to `out` as
/// `<device>: mode=M, lsb=L, bits=B, speed=S, spiready=R` and nothing is
/// written to the device.
pub fn run<B, W>(
    bus: &mut B,
    device: &str,
    query: bool,
    request: &ConfigRequest,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>>
where
    B: SpiBus + ?Sized,
    W: Write + ?Sized,
{
    let current = bus.read_config()?;
    log::debug!(
        "{}: current configuration {} (cpol={}, cpha={})",
        device,
        current,
        current.mode.cpol(),
        current.mode.cpha()
    );

    if query {
        if !request.is_empty() {
            log::warn!("{}: --query given, ignoring requested settings", device);
        }
        writeln!(out, "{}: {}", device, current)?;
        return Ok(());
    }

    let changes = request.changes_from(&current);
    if changes.is_empty() {
        log::info!("{}: nothing to change", device);
        return Ok(());
    }

    bus.apply_changes(&changes)?;
    for change in &changes {
        log::info!("{}: set {}", device, change);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spi_tools_spidev::{ConfigChange, DummySpi, LinuxSpiError, ModeFlags, SpiConfig, SpiMode};

    fn device() -> DummySpi {
        DummySpi::new(SpiConfig {
            mode: SpiMode::Mode1,
            lsb_first: false,
            bits_per_word: 8,
            speed_hz: 1_000_000,
            spi_ready: true,
            extra_flags: ModeFlags::CS_HIGH,
        })
    }

    #[test]
    fn test_query_prints_and_writes_nothing() {
        let mut spi = device();
        let request = ConfigRequest {
            speed_hz: Some(20),
            ..Default::default()
        };
        let mut out = Vec::new();

        run(&mut spi, "/dev/spidev0.0", true, &request, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "/dev/spidev0.0: mode=1, lsb=0, bits=8, speed=1000000, spiready=1\n"
        );
        assert!(spi.writes().is_empty());
    }

    #[test]
    fn test_no_request_writes_nothing() {
        let mut spi = device();
        let mut out = Vec::new();

        run(&mut spi, "/dev/spidev0.0", false, &ConfigRequest::default(), &mut out).unwrap();

        assert!(out.is_empty());
        assert!(spi.writes().is_empty());
    }

    #[test]
    fn test_only_changed_fields_are_written() {
        let mut spi = device();
        let request = ConfigRequest {
            mode: Some(SpiMode::Mode1),
            bits_per_word: Some(8),
            speed_hz: Some(4_000_000),
            ..Default::default()
        };
        let mut out = Vec::new();

        run(&mut spi, "/dev/spidev0.0", false, &request, &mut out).unwrap();

        assert_eq!(spi.writes(), &[ConfigChange::SpeedHz(4_000_000)]);
        assert_eq!(spi.config().speed_hz, 4_000_000);
    }

    #[test]
    fn test_clearing_ready_keeps_mode_and_flags() {
        let mut spi = device();
        let request = ConfigRequest {
            spi_ready: Some(false),
            ..Default::default()
        };
        let mut out = Vec::new();

        run(&mut spi, "/dev/spidev0.0", false, &request, &mut out).unwrap();

        assert_eq!(spi.writes(), &[ConfigChange::Mode(0x04 | 0x01)]);
        let config = spi.config();
        assert_eq!(config.mode, SpiMode::Mode1);
        assert!(!config.spi_ready);
        assert_eq!(config.extra_flags, ModeFlags::CS_HIGH);
    }

    #[test]
    fn test_mode_change_keeps_ready() {
        let mut spi = device();
        let request = ConfigRequest {
            mode: Some(SpiMode::Mode3),
            lsb_first: Some(true),
            ..Default::default()
        };
        let mut out = Vec::new();

        run(&mut spi, "/dev/spidev0.0", false, &request, &mut out).unwrap();

        assert_eq!(
            spi.writes(),
            &[
                ConfigChange::Mode(0x80 | 0x08 | 0x04 | 0x03),
                ConfigChange::LsbFirst(true),
            ]
        );
        assert!(spi.config().spi_ready);
    }

    #[test]
    fn test_first_failed_write_aborts() {
        let mut spi = device().fail_writes_after(1);
        let request = ConfigRequest {
            mode: Some(SpiMode::Mode3),
            bits_per_word: Some(16),
            speed_hz: Some(4_000_000),
            ..Default::default()
        };
        let mut out = Vec::new();

        let err = run(&mut spi, "/dev/spidev0.0", false, &request, &mut out).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LinuxSpiError>(),
            Some(LinuxSpiError::SetBitsPerWordFailed { bits: 16, .. })
        ));
        assert_eq!(spi.writes(), &[ConfigChange::Mode(0x80 | 0x04 | 0x03)]);
        assert_eq!(spi.config().speed_hz, 1_000_000);
    }
}
