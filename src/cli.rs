//! CLI argument parsing

use clap::{ArgAction, Args, Parser};
use spi_tools_spidev::{
    parse_bits_per_word, parse_block_count, parse_block_size, parse_flag, parse_mode,
    parse_speed, BlockCount, ConfigRequest, SpiMode,
};

const MODE_LONG_HELP: &str = "Use the selected SPI mode:
  0: low idle level, sample on leading edge,
  1: low idle level, sample on trailing edge,
  2: high idle level, sample on leading edge,
  3: high idle level, sample on trailing edge.";

/// Options shared by both tools
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Increase log verbosity (--verbose, --verbose --verbose, ...)
    #[arg(long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Display the version number
    #[arg(short = 'v', long, action = ArgAction::Version)]
    pub version: Option<bool>,
}

#[derive(Parser, Debug)]
#[command(name = "spi-config")]
#[command(version, about = "Query or set the configuration of a spidev device", long_about = None)]
#[command(disable_version_flag = true)]
pub struct ConfigCli {
    /// Use the given spidev character device
    #[arg(short, long, value_name = "DEV")]
    pub device: String,

    /// Print the current configuration
    #[arg(short, long)]
    pub query: bool,

    /// Use the selected SPI mode (0-3)
    #[arg(short, long, value_name = "0-3", value_parser = parse_mode, long_help = MODE_LONG_HELP)]
    pub mode: Option<SpiMode>,

    /// LSB first (1) or MSB first (0)
    #[arg(short, long, value_name = "0|1", value_parser = parse_flag)]
    pub lsb: Option<bool>,

    /// Bits per word
    #[arg(short, long, value_name = "7..", value_parser = parse_bits_per_word)]
    pub bits: Option<u8>,

    /// Set the speed in Hz
    #[arg(short, long, value_name = "HZ", value_parser = parse_speed)]
    pub speed: Option<u32>,

    /// Consider SPI_RDY signal (1) or ignore it (0)
    #[arg(short = 'r', long, value_name = "0|1", value_parser = parse_flag)]
    pub spirdy: Option<bool>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ConfigCli {
    /// Settings given on the command line
    pub fn request(&self) -> ConfigRequest {
        ConfigRequest {
            mode: self.mode,
            lsb_first: self.lsb,
            bits_per_word: self.bits,
            speed_hz: self.speed,
            spi_ready: self.spirdy,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "spi-pipe")]
#[command(
    version,
    about = "Send standard input to a spidev device and write what comes back to standard output",
    long_about = None
)]
#[command(disable_version_flag = true)]
pub struct PipeCli {
    /// Use the given spidev character device
    #[arg(short, long, value_name = "DEV")]
    pub device: String,

    /// Use the selected SPI mode (0-3)
    #[arg(short, long, value_name = "0-3", value_parser = parse_mode, long_help = MODE_LONG_HELP)]
    pub mode: Option<SpiMode>,

    /// Maximum SPI clock rate (in Hz)
    #[arg(short, long, value_name = "HZ", value_parser = parse_speed)]
    pub speed: Option<u32>,

    /// LSB first (1) or MSB first (0)
    #[arg(short, long, value_name = "0|1", value_parser = parse_flag)]
    pub lsb: Option<bool>,

    /// Bits per word
    #[arg(short = 'B', long, value_name = "7..", value_parser = parse_bits_per_word)]
    pub bits: Option<u8>,

    /// Consider SPI_RDY signal (1) or ignore it (0)
    #[arg(short = 'r', long, value_name = "0|1", value_parser = parse_flag)]
    pub spirdy: Option<bool>,

    /// Transfer block size in bytes
    #[arg(short = 'b', long, value_name = "BYTES", value_parser = parse_block_size)]
    pub blocksize: usize,

    /// Number of blocks to transfer (-1 = infinite)
    #[arg(
        short = 'n',
        long,
        value_name = "COUNT",
        default_value = "-1",
        allow_negative_numbers = true,
        value_parser = parse_block_count
    )]
    pub number: BlockCount,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl PipeCli {
    /// Settings given on the command line
    pub fn request(&self) -> ConfigRequest {
        ConfigRequest {
            mode: self.mode,
            lsb_first: self.lsb,
            bits_per_word: self.bits,
            speed_hz: self.speed,
            spi_ready: self.spirdy,
        }
    }
}
