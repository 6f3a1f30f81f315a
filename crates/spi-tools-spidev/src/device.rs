//! Linux spidev device
//!
//! `LinuxSpi` implements [`SpiBus`] on top of the ioctls documented in
//! `Documentation/spi/spidev.rst`.

use crate::bus::SpiBus;
use crate::config::SpiConfig;
use crate::error::{LinuxSpiError, Result};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

/// Path to kernel spidev buffer size parameter
const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// Buffer size used when the page size cannot be determined
const DEFAULT_PAGE_SIZE: usize = 4096;

/// Linux spidev ioctl constants
mod ioctl {
    use nix::{ioctl_read, ioctl_write_buf, ioctl_write_ptr};

    // SPI ioctl magic number
    const SPI_IOC_MAGIC: u8 = b'k';

    // SPI ioctl type numbers
    const SPI_IOC_TYPE_MESSAGE: u8 = 0;
    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_LSB_FIRST: u8 = 2;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_read!(spi_ioc_rd_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_read!(
        spi_ioc_rd_lsb_first,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_LSB_FIRST,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_lsb_first,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_LSB_FIRST,
        u8
    );
    ioctl_read!(
        spi_ioc_rd_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_read!(
        spi_ioc_rd_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    // SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(struct spi_ioc_transfer)]),
    // so the size field comes from the slice length.
    ioctl_write_buf!(
        spi_ioc_message,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MESSAGE,
        super::SpiIocTransfer
    );
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,          // __u64 tx_buf
    rx_buf: u64,          // __u64 rx_buf
    len: u32,             // __u32 len
    speed_hz: u32,        // __u32 speed_hz
    delay_usecs: u16,     // __u16 delay_usecs
    bits_per_word: u8,    // __u8 bits_per_word
    cs_change: u8,        // __u8 cs_change
    tx_nbits: u8,         // __u8 tx_nbits
    rx_nbits: u8,         // __u8 rx_nbits
    word_delay_usecs: u8, // __u8 word_delay_usecs
    _pad: u8,             // padding
}

fn os_error(errno: nix::errno::Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(errno as i32)
}

/// spidev character device
///
/// Opens `/dev/spidevX.Y` read-only; configuration and transfers all go
/// through ioctls, so no write access to the node is needed.
pub struct LinuxSpi {
    /// File handle for spidev device
    file: File,
    /// Device path, kept for messages
    path: String,
}

impl LinuxSpi {
    /// Open a spidev device
    pub fn open(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        log::debug!("spidev: Opening device {}", path);

        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: path.to_string(),
                source: e,
            })?;

        log::info!("spidev: Opened {}", path);

        Ok(Self {
            file,
            path: path.to_string(),
        })
    }
}

impl SpiBus for LinuxSpi {
    fn read_config(&mut self) -> Result<SpiConfig> {
        let fd = self.file.as_raw_fd();
        let mut config = SpiConfig::default();

        let mut mode: u8 = 0;
        unsafe {
            ioctl::spi_ioc_rd_mode(fd, &mut mode).map_err(|e| LinuxSpiError::ReadFailed {
                request: "SPI_IOC_RD_MODE",
                source: os_error(e),
            })?;
        }
        config.set_mode_byte(mode);

        let mut lsb_first: u8 = 0;
        unsafe {
            ioctl::spi_ioc_rd_lsb_first(fd, &mut lsb_first).map_err(|e| {
                LinuxSpiError::ReadFailed {
                    request: "SPI_IOC_RD_LSB_FIRST",
                    source: os_error(e),
                }
            })?;
        }
        config.lsb_first = lsb_first != 0;

        let mut bits: u8 = 0;
        unsafe {
            ioctl::spi_ioc_rd_bits_per_word(fd, &mut bits).map_err(|e| {
                LinuxSpiError::ReadFailed {
                    request: "SPI_IOC_RD_BITS_PER_WORD",
                    source: os_error(e),
                }
            })?;
        }
        config.set_bits_per_word(bits);

        let mut speed: u32 = 0;
        unsafe {
            ioctl::spi_ioc_rd_max_speed_hz(fd, &mut speed).map_err(|e| {
                LinuxSpiError::ReadFailed {
                    request: "SPI_IOC_RD_MAX_SPEED_HZ",
                    source: os_error(e),
                }
            })?;
        }
        config.speed_hz = speed;

        log::debug!("spidev: {} raw mode 0x{:02x}, {}", self.path, mode, config);
        Ok(config)
    }

    fn write_mode(&mut self, mode: u8) -> Result<()> {
        let fd = self.file.as_raw_fd();
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &mode).map_err(|e| LinuxSpiError::SetModeFailed {
                mode,
                source: os_error(e),
            })?;
        }
        Ok(())
    }

    fn write_lsb_first(&mut self, lsb_first: bool) -> Result<()> {
        let fd = self.file.as_raw_fd();
        // The kernel treats any non-zero value as LSB first
        let value = u8::from(lsb_first);
        unsafe {
            ioctl::spi_ioc_wr_lsb_first(fd, &value).map_err(|e| {
                LinuxSpiError::SetLsbFirstFailed {
                    lsb_first: value,
                    source: os_error(e),
                }
            })?;
        }
        Ok(())
    }

    fn write_bits_per_word(&mut self, bits: u8) -> Result<()> {
        let fd = self.file.as_raw_fd();
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(|e| {
                LinuxSpiError::SetBitsPerWordFailed {
                    bits,
                    source: os_error(e),
                }
            })?;
        }
        Ok(())
    }

    fn write_speed_hz(&mut self, speed_hz: u32) -> Result<()> {
        let fd = self.file.as_raw_fd();
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed_hz).map_err(|e| {
                LinuxSpiError::SetSpeedFailed {
                    speed: speed_hz,
                    source: os_error(e),
                }
            })?;
        }
        Ok(())
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        if tx.len() != rx.len() {
            return Err(LinuxSpiError::InvalidParameter(format!(
                "transmit ({} bytes) and receive ({} bytes) buffers differ in length",
                tx.len(),
                rx.len()
            )));
        }
        if tx.is_empty() {
            return Ok(());
        }
        let len = u32::try_from(tx.len()).map_err(|_| {
            LinuxSpiError::InvalidParameter(format!("transfer of {} bytes is too long", tx.len()))
        })?;

        // Zero speed, delay and word size select the device defaults
        let transfer = SpiIocTransfer {
            tx_buf: tx.as_ptr() as u64,
            rx_buf: rx.as_mut_ptr() as u64,
            len,
            ..Default::default()
        };

        let fd = self.file.as_raw_fd();
        unsafe {
            ioctl::spi_ioc_message(fd, std::slice::from_ref(&transfer))
                .map_err(|e| LinuxSpiError::TransferFailed(os_error(e)))?;
        }

        log::trace!("spidev: Transferred {} bytes", len);
        Ok(())
    }

    fn max_transfer_len(&self) -> Option<usize> {
        Some(get_max_kernel_buf_size())
    }
}

/// Read the maximum kernel buffer size from sysfs, or use page size as fallback
fn get_max_kernel_buf_size() -> usize {
    if let Ok(content) = std::fs::read_to_string(BUF_SIZE_SYSFS) {
        match parse_buf_size(&content) {
            Some(size) => {
                log::debug!("spidev: Using buffer size {} from sysfs", size);
                return size;
            }
            None => log::warn!("spidev: Invalid buffer size in {}", BUF_SIZE_SYSFS),
        }
    } else {
        log::debug!("spidev: Cannot read {}, using page size", BUF_SIZE_SYSFS);
    }

    let page_size = page_size_or_default(unsafe { libc::sysconf(libc::_SC_PAGESIZE) });
    log::debug!("spidev: Using page size {} as buffer size", page_size);
    page_size
}

fn parse_buf_size(content: &str) -> Option<usize> {
    content.trim().parse::<usize>().ok().filter(|&size| size > 0)
}

/// `sysconf` returns -1 when the page size is unknown
fn page_size_or_default(raw: libc::c_long) -> usize {
    usize::try_from(raw)
        .ok()
        .filter(|&size| size > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_struct_matches_kernel_abi() {
        assert_eq!(std::mem::size_of::<SpiIocTransfer>(), 32);
    }

    #[test]
    fn test_parse_buf_size() {
        assert_eq!(parse_buf_size("4096\n"), Some(4096));
        assert_eq!(parse_buf_size("0"), None);
        assert_eq!(parse_buf_size("lots"), None);
    }

    #[test]
    fn test_page_size_or_default() {
        assert_eq!(page_size_or_default(8192), 8192);
        assert_eq!(page_size_or_default(-1), DEFAULT_PAGE_SIZE);
        assert_eq!(page_size_or_default(0), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_open_without_path() {
        assert!(matches!(LinuxSpi::open(""), Err(LinuxSpiError::NoDevice)));
    }

    #[test]
    fn test_open_missing_device() {
        let err = LinuxSpi::open("/dev/spidev-does-not-exist").err().unwrap();
        match err {
            LinuxSpiError::OpenFailed { path, source } => {
                assert_eq!(path, "/dev/spidev-does-not-exist");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_transfer_length_mismatch() {
        // Rejected before any ioctl reaches the file
        let mut spi = LinuxSpi::open("/dev/null").unwrap();
        let mut rx: [u8; 0] = [];

        assert!(matches!(
            spi.transfer(&[1], &mut rx),
            Err(LinuxSpiError::InvalidParameter(_))
        ));
    }
}
