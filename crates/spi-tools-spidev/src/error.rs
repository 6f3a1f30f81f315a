//! Error types for spidev operations

use thiserror::Error;

/// Errors raised while talking to a spidev character device
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A configuration read ioctl failed
    #[error("{request}: {source}")]
    ReadFailed {
        request: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set the raw mode byte
    #[error("SPI_IOC_WR_MODE: failed to set mode byte 0x{mode:02x}: {source}")]
    SetModeFailed {
        mode: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set the bit order
    #[error("SPI_IOC_WR_LSB_FIRST: failed to set lsb={lsb_first}: {source}")]
    SetLsbFirstFailed {
        lsb_first: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set bits per word
    #[error("SPI_IOC_WR_BITS_PER_WORD: failed to set bits per word to {bits}: {source}")]
    SetBitsPerWordFailed {
        bits: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set clock speed
    #[error("SPI_IOC_WR_MAX_SPEED_HZ: failed to set speed to {speed} Hz: {source}")]
    SetSpeedFailed {
        speed: u32,
        #[source]
        source: std::io::Error,
    },

    /// SPI transfer failed
    #[error("SPI_IOC_MESSAGE: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Device not specified
    #[error("No device specified (use option -h for help)")]
    NoDevice,
}

/// Result type for spidev operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;
