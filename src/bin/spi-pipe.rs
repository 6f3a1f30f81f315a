//! spi-pipe - stream standard input through a spidev device
//!
//! Every block read from stdin is clocked out on the bus; the bytes clocked
//! in at the same time go to stdout.

use clap::Parser;
use spi_tools::cli::PipeCli;
use spi_tools::commands;
use spi_tools_spidev::LinuxSpi;

fn main() {
    let cli = PipeCli::parse();
    spi_tools::init_logging(cli.common.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("spi-pipe: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &PipeCli) -> Result<(), Box<dyn std::error::Error>> {
    let mut spi = LinuxSpi::open(&cli.device)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    commands::pipe::run(
        &mut spi,
        &cli.request(),
        cli.blocksize,
        cli.number,
        &mut stdin.lock(),
        &mut stdout.lock(),
    )?;

    Ok(())
}
