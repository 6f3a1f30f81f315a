//! spi-pipe command implementation

use super::CommandError;
use spi_tools_spidev::{pipe, BlockCount, ConfigRequest, PipeError, PipeSummary, SpiBus};
use std::io::{Read, Write};

/// Run the spi-pipe command
///
/// The configuration found on the device is restored when the transfer
/// loop ends, whether or not it succeeded. An error from the loop takes
/// precedence over an error while restoring.
pub fn run<B, R, W>(
    bus: &mut B,
    request: &ConfigRequest,
    block_size: usize,
    count: BlockCount,
    input: &mut R,
    output: &mut W,
) -> Result<PipeSummary, Box<dyn std::error::Error>>
where
    B: SpiBus + ?Sized,
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let previous = bus.read_config()?;
    let wanted = request.merge_onto(&previous);
    log::debug!("Saved configuration {}", previous);

    if let Some(max) = bus.max_transfer_len() {
        if block_size > max {
            log::warn!(
                "Block size {} exceeds the largest transfer the device accepts ({} bytes)",
                block_size,
                max
            );
        }
    }

    let result = bus
        .write_config(&wanted)
        .map_err(PipeError::from)
        .and_then(|()| {
            log::info!("Using configuration {}", wanted);
            pipe::run(bus, input, output, block_size, count)
        });

    let restored = bus.write_config(&previous);
    let summary = result?;
    restored?;

    log::info!(
        "Transferred {} bytes in {} blocks",
        summary.bytes,
        summary.blocks
    );

    match count {
        BlockCount::Limited(requested) if !summary.completed => Err(CommandError::Incomplete {
            transferred: summary.blocks,
            requested,
        }
        .into()),
        _ => Ok(summary),
    }
}
