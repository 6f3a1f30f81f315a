//! spi-config - query or set the configuration of a spidev device

use clap::Parser;
use spi_tools::cli::ConfigCli;
use spi_tools::commands;
use spi_tools_spidev::LinuxSpi;

fn main() {
    let cli = ConfigCli::parse();
    spi_tools::init_logging(cli.common.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("spi-config: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &ConfigCli) -> Result<(), Box<dyn std::error::Error>> {
    let mut spi = LinuxSpi::open(&cli.device)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    commands::config::run(&mut spi, &cli.device, cli.query, &cli.request(), &mut out)
}
