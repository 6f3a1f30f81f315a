//! SPI bus configuration records
//!
//! [`SpiConfig`] is the complete configuration read back from a device.
//! [`ConfigRequest`] is what the user asked for on the command line, with
//! every field optional; it knows how to merge itself onto a current
//! configuration and which individual writes are needed to get there.

use crate::pipe::BlockCount;
use bitflags::bitflags;
use std::fmt;

/// Slowest clock accepted on the command line (Hz)
pub const MIN_SPEED_HZ: u32 = 10;

/// Fastest clock accepted on the command line (Hz)
pub const MAX_SPEED_HZ: u32 = 100_000_000;

/// Smallest word size accepted on the command line
pub const MIN_BITS_PER_WORD: u8 = 7;

/// Largest block accepted on the command line; a transfer length is a `u32`
pub const MAX_BLOCK_SIZE: usize = u32::MAX as usize;

/// spidev reports 0 bits per word for the default of 8
const DEFAULT_BITS_PER_WORD: u8 = 8;

bitflags! {
    /// Flags of the 8-bit spidev mode byte
    ///
    /// Values match `SPI_*` in `<linux/spi/spi.h>`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModeFlags: u8 {
        /// Clock phase
        const CPHA       = 0x01;
        /// Clock polarity
        const CPOL       = 0x02;
        /// Chip select is active high
        const CS_HIGH    = 0x04;
        /// Least significant bit first
        const LSB_FIRST  = 0x08;
        /// Shared SI/SO signal
        const THREE_WIRE = 0x10;
        /// Loopback mode
        const LOOP       = 0x20;
        /// No chip select
        const NO_CS      = 0x40;
        /// Slave pulls low to pause
        const READY      = 0x80;

        /// The two clock mode bits
        const CLOCK_MODE = Self::CPHA.bits() | Self::CPOL.bits();
    }
}

impl Default for ModeFlags {
    fn default() -> Self {
        ModeFlags::empty()
    }
}

/// SPI clock mode (CPOL/CPHA pair)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpiMode {
    /// Low idle level, sample on leading edge
    #[default]
    Mode0,
    /// Low idle level, sample on trailing edge
    Mode1,
    /// High idle level, sample on leading edge
    Mode2,
    /// High idle level, sample on trailing edge
    Mode3,
}

impl SpiMode {
    /// Decode the clock mode from the low two bits of a mode byte
    pub fn from_bits(bits: u8) -> Self {
        match bits & ModeFlags::CLOCK_MODE.bits() {
            0 => SpiMode::Mode0,
            1 => SpiMode::Mode1,
            2 => SpiMode::Mode2,
            _ => SpiMode::Mode3,
        }
    }

    /// Mode number (0-3)
    pub fn bits(self) -> u8 {
        match self {
            SpiMode::Mode0 => 0,
            SpiMode::Mode1 => 1,
            SpiMode::Mode2 => 2,
            SpiMode::Mode3 => 3,
        }
    }

    /// Clock polarity (0 or 1)
    pub fn cpol(self) -> u8 {
        (self.bits() >> 1) & 1
    }

    /// Clock phase (0 or 1)
    pub fn cpha(self) -> u8 {
        self.bits() & 1
    }
}

impl fmt::Display for SpiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Complete configuration of a spidev device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiConfig {
    /// Clock mode
    pub mode: SpiMode,
    /// Shift out the least significant bit first
    pub lsb_first: bool,
    /// Word size in bits
    pub bits_per_word: u8,
    /// Maximum clock speed in Hz
    pub speed_hz: u32,
    /// Honour the SPI_READY handshake signal
    pub spi_ready: bool,
    /// Remaining mode-byte flags (CS_HIGH, 3WIRE, LOOP, NO_CS), kept as read
    pub extra_flags: ModeFlags,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            mode: SpiMode::Mode0,
            lsb_first: false,
            bits_per_word: DEFAULT_BITS_PER_WORD,
            speed_hz: 0,
            spi_ready: false,
            extra_flags: ModeFlags::empty(),
        }
    }
}

impl SpiConfig {
    /// Update mode, bit order, ready flag and extra flags from a raw mode byte
    pub fn set_mode_byte(&mut self, raw: u8) {
        let flags = ModeFlags::from_bits_retain(raw);
        self.mode = SpiMode::from_bits(raw);
        self.lsb_first = flags.contains(ModeFlags::LSB_FIRST);
        self.spi_ready = flags.contains(ModeFlags::READY);
        self.extra_flags =
            flags - ModeFlags::CLOCK_MODE - ModeFlags::LSB_FIRST - ModeFlags::READY;
    }

    /// Raw mode byte for `SPI_IOC_WR_MODE`
    pub fn mode_byte(&self) -> u8 {
        let mut flags = self.extra_flags - ModeFlags::CLOCK_MODE;
        flags |= ModeFlags::from_bits_retain(self.mode.bits());
        flags.set(ModeFlags::LSB_FIRST, self.lsb_first);
        flags.set(ModeFlags::READY, self.spi_ready);
        flags.bits()
    }

    /// Word size as stored by the kernel, where 0 stands for 8
    pub fn set_bits_per_word(&mut self, raw: u8) {
        self.bits_per_word = if raw == 0 { DEFAULT_BITS_PER_WORD } else { raw };
    }
}

impl fmt::Display for SpiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mode={}, lsb={}, bits={}, speed={}, spiready={}",
            self.mode,
            u8::from(self.lsb_first),
            self.bits_per_word,
            self.speed_hz,
            u8::from(self.spi_ready)
        )
    }
}

/// A single configuration write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    /// Raw mode byte (clock mode and flags)
    Mode(u8),
    /// Bit order
    LsbFirst(bool),
    /// Word size
    BitsPerWord(u8),
    /// Maximum clock speed in Hz
    SpeedHz(u32),
}

impl fmt::Display for ConfigChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigChange::Mode(raw) => write!(f, "mode byte 0x{:02x}", raw),
            ConfigChange::LsbFirst(lsb) => write!(f, "lsb={}", u8::from(*lsb)),
            ConfigChange::BitsPerWord(bits) => write!(f, "bits={}", bits),
            ConfigChange::SpeedHz(hz) => write!(f, "speed={} Hz", hz),
        }
    }
}

/// Settings requested by the user; `None` leaves the field as it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigRequest {
    pub mode: Option<SpiMode>,
    pub lsb_first: Option<bool>,
    pub bits_per_word: Option<u8>,
    pub speed_hz: Option<u32>,
    pub spi_ready: Option<bool>,
}

impl ConfigRequest {
    /// True when no setting was requested
    pub fn is_empty(&self) -> bool {
        *self == ConfigRequest::default()
    }

    /// Overlay the requested settings onto `current`
    pub fn merge_onto(&self, current: &SpiConfig) -> SpiConfig {
        SpiConfig {
            mode: self.mode.unwrap_or(current.mode),
            lsb_first: self.lsb_first.unwrap_or(current.lsb_first),
            bits_per_word: self.bits_per_word.unwrap_or(current.bits_per_word),
            speed_hz: self.speed_hz.unwrap_or(current.speed_hz),
            spi_ready: self.spi_ready.unwrap_or(current.spi_ready),
            extra_flags: current.extra_flags,
        }
    }

    /// The writes needed to move the device from `current` to the request
    ///
    /// The mode byte carries both the clock mode and the READY flag, so it is
    /// written when either of them changes.
    pub fn changes_from(&self, current: &SpiConfig) -> Vec<ConfigChange> {
        let target = self.merge_onto(current);
        let mut changes = Vec::new();

        if target.mode != current.mode || target.spi_ready != current.spi_ready {
            changes.push(ConfigChange::Mode(target.mode_byte()));
        }
        if target.lsb_first != current.lsb_first {
            changes.push(ConfigChange::LsbFirst(target.lsb_first));
        }
        if target.bits_per_word != current.bits_per_word {
            changes.push(ConfigChange::BitsPerWord(target.bits_per_word));
        }
        if target.speed_hz != current.speed_hz {
            changes.push(ConfigChange::SpeedHz(target.speed_hz));
        }

        changes
    }
}

fn parse_int(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

/// Parse an SPI mode number (0-3)
pub fn parse_mode(s: &str) -> Result<SpiMode, String> {
    match parse_int(s) {
        Some(v @ 0..=3) => Ok(SpiMode::from_bits(v as u8)),
        _ => Err(format!("wrong SPI mode ([0-3]): {}", s)),
    }
}

/// Parse a boolean given as 0 or 1
pub fn parse_flag(s: &str) -> Result<bool, String> {
    match parse_int(s) {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        _ => Err(format!("wrong value ([0,1]): {}", s)),
    }
}

/// Parse a word size (7 or more)
pub fn parse_bits_per_word(s: &str) -> Result<u8, String> {
    match parse_int(s) {
        Some(v) if v >= i64::from(MIN_BITS_PER_WORD) && v <= i64::from(u8::MAX) => Ok(v as u8),
        _ => Err(format!(
            "wrong bits per word value ([{}-{}]): {}",
            MIN_BITS_PER_WORD,
            u8::MAX,
            s
        )),
    }
}

/// Parse a clock speed in Hz
pub fn parse_speed(s: &str) -> Result<u32, String> {
    match parse_int(s) {
        Some(v) if v >= i64::from(MIN_SPEED_HZ) && v <= i64::from(MAX_SPEED_HZ) => Ok(v as u32),
        _ => Err(format!(
            "invalid SPI speed ([{}-{}] Hz): {}",
            MIN_SPEED_HZ, MAX_SPEED_HZ, s
        )),
    }
}

/// Parse a transfer block size in bytes (at least 1)
pub fn parse_block_size(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(v) if v > 0 && v <= MAX_BLOCK_SIZE => Ok(v),
        _ => Err(format!("wrong blocksize ([1-{}]): {}", MAX_BLOCK_SIZE, s)),
    }
}

/// Parse a block count, where -1 means no limit
pub fn parse_block_count(s: &str) -> Result<BlockCount, String> {
    match parse_int(s) {
        Some(-1) => Ok(BlockCount::Unlimited),
        Some(v) if v >= 0 => Ok(BlockCount::Limited(v as u64)),
        _ => Err(format!("wrong block number (-1 or more): {}", s)),
    }
}
