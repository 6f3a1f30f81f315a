//! Block streaming between a byte stream and an SPI bus
//!
//! Every block read from the input is clocked out on the bus and the bytes
//! clocked in at the same time are written to the output.

use crate::bus::SpiBus;
use crate::error::LinuxSpiError;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Number of blocks to transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockCount {
    /// Until the input ends
    #[default]
    Unlimited,
    /// At most this many blocks
    Limited(u64),
}

/// Errors that stop a pipe run
#[derive(Debug, Error)]
pub enum PipeError {
    #[error("Failed to read input: {0}")]
    Input(#[source] io::Error),

    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),

    #[error("not enough memory to allocate two {size} bytes buffers")]
    Allocation { size: usize },

    #[error(transparent)]
    Spi(#[from] LinuxSpiError),
}

/// What a pipe run transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipeSummary {
    /// Blocks transferred, including a final partial block
    pub blocks: u64,
    /// Bytes transferred
    pub bytes: u64,
    /// The requested count was reached, or an unlimited run hit end of input
    pub completed: bool,
}

/// Stream `input` through `bus` into `output` in blocks of `block_size` bytes
///
/// A short final block is transferred as is. The run stops at end of input
/// or once `count` blocks have been transferred.
pub fn run<B, R, W>(
    bus: &mut B,
    input: &mut R,
    output: &mut W,
    block_size: usize,
    count: BlockCount,
) -> Result<PipeSummary, PipeError>
where
    B: SpiBus + ?Sized,
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    if block_size == 0 {
        return Err(LinuxSpiError::InvalidParameter("block size must be at least 1".into()).into());
    }

    let mut tx = alloc_block(block_size)?;
    let mut rx = alloc_block(block_size)?;
    let mut summary = PipeSummary::default();

    loop {
        if let BlockCount::Limited(n) = count {
            if summary.blocks >= n {
                summary.completed = true;
                break;
            }
        }

        let filled = fill_block(input, &mut tx).map_err(PipeError::Input)?;

        if filled > 0 {
            bus.transfer(&tx[..filled], &mut rx[..filled])?;
            output.write_all(&rx[..filled]).map_err(PipeError::Output)?;
            output.flush().map_err(PipeError::Output)?;

            summary.blocks += 1;
            summary.bytes += filled as u64;
            log::trace!("pipe: block {} ({} bytes)", summary.blocks, filled);
        }

        if filled < block_size {
            log::debug!("pipe: end of input after {} bytes", summary.bytes);
            summary.completed = match count {
                BlockCount::Unlimited => true,
                BlockCount::Limited(n) => summary.blocks >= n,
            };
            break;
        }
    }

    Ok(summary)
}

fn alloc_block(size: usize) -> Result<Vec<u8>, PipeError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| PipeError::Allocation { size })?;
    buf.resize(size, 0);
    Ok(buf)
}

/// Read until `buf` is full or the input ends; returns the bytes read
fn fill_block<R: Read + ?Sized>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut offset = 0;
    while offset < buf.len() {
        match input.read(&mut buf[offset..]) {
            Ok(0) => break,
            Ok(n) => offset += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::DummySpi;
    use std::io::Cursor;

    /// Hands out at most `chunk` bytes per read, with one EINTR up front
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
        interrupted: bool,
    }

    impl Trickle {
        fn new(data: &[u8], chunk: usize) -> Self {
            Self {
                data: data.to_vec(),
                pos: 0,
                chunk,
                interrupted: false,
            }
        }
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let n = buf.len().min(self.chunk).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unlimited_with_partial_last_block() {
        let mut spi = DummySpi::default().with_transform(|b| b.wrapping_add(1));
        let mut input = Cursor::new(vec![1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let mut output = Vec::new();

        let summary = run(&mut spi, &mut input, &mut output, 4, BlockCount::Unlimited).unwrap();

        assert_eq!(output, vec![2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(spi.transfers(), &[4, 4, 2]);
        assert_eq!(
            summary,
            PipeSummary {
                blocks: 3,
                bytes: 10,
                completed: true
            }
        );
    }

    #[test]
    fn test_exact_multiple_ends_cleanly() {
        let mut spi = DummySpi::default();
        let mut input = Cursor::new(vec![0xaa; 8]);
        let mut output = Vec::new();

        let summary = run(&mut spi, &mut input, &mut output, 4, BlockCount::Unlimited).unwrap();

        assert_eq!(spi.transfers(), &[4, 4]);
        assert_eq!(summary.blocks, 2);
        assert!(summary.completed);
    }

    #[test]
    fn test_limited_count_stops_early() {
        let mut spi = DummySpi::default();
        let mut input = Cursor::new(vec![7u8; 32]);
        let mut output = Vec::new();

        let summary = run(&mut spi, &mut input, &mut output, 4, BlockCount::Limited(3)).unwrap();

        assert_eq!(output.len(), 12);
        assert_eq!(summary.blocks, 3);
        assert!(summary.completed);
        assert_eq!(input.position(), 12);
    }

    #[test]
    fn test_limited_count_short_input_is_incomplete() {
        let mut spi = DummySpi::default();
        let mut input = Cursor::new(vec![7u8; 6]);
        let mut output = Vec::new();

        let summary = run(&mut spi, &mut input, &mut output, 4, BlockCount::Limited(3)).unwrap();

        assert_eq!(summary.blocks, 2);
        assert_eq!(summary.bytes, 6);
        assert!(!summary.completed);
    }

    #[test]
    fn test_partial_block_can_complete_count() {
        let mut spi = DummySpi::default();
        let mut input = Cursor::new(vec![7u8; 6]);
        let mut output = Vec::new();

        let summary = run(&mut spi, &mut input, &mut output, 4, BlockCount::Limited(2)).unwrap();

        assert!(summary.completed);
    }

    #[test]
    fn test_zero_blocks() {
        let mut spi = DummySpi::default();
        let mut input = Cursor::new(vec![1u8; 4]);
        let mut output = Vec::new();

        let summary = run(&mut spi, &mut input, &mut output, 4, BlockCount::Limited(0)).unwrap();

        assert!(output.is_empty());
        assert!(spi.transfers().is_empty());
        assert!(summary.completed);
    }

    #[test]
    fn test_empty_input() {
        let mut spi = DummySpi::default();
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();

        let summary = run(&mut spi, &mut input, &mut output, 4, BlockCount::Unlimited).unwrap();

        assert_eq!(summary.blocks, 0);
        assert!(summary.completed);
    }

    #[test]
    fn test_short_reads_fill_whole_blocks() {
        let mut spi = DummySpi::default();
        let data: Vec<u8> = (0..20).collect();
        let mut input = Trickle::new(&data, 3);
        let mut output = Vec::new();

        run(&mut spi, &mut input, &mut output, 8, BlockCount::Unlimited).unwrap();

        assert_eq!(spi.transfers(), &[8, 8, 4]);
        assert_eq!(output, data);
    }

    #[test]
    fn test_transfer_error_stops_run() {
        let mut spi = DummySpi::default().fail_transfers_after(1);
        let mut input = Cursor::new(vec![0u8; 16]);
        let mut output = Vec::new();

        let err = run(&mut spi, &mut input, &mut output, 4, BlockCount::Unlimited).unwrap_err();

        assert!(matches!(err, PipeError::Spi(LinuxSpiError::TransferFailed(_))));
        assert_eq!(output.len(), 4);
    }

    #[test]
    fn test_io_errors() {
        let mut spi = DummySpi::default();
        let mut output = Vec::new();
        let err = run(&mut spi, &mut Broken, &mut output, 4, BlockCount::Unlimited).unwrap_err();
        assert!(matches!(err, PipeError::Input(_)));

        let mut input = Cursor::new(vec![0u8; 4]);
        let err = run(&mut spi, &mut input, &mut Broken, 4, BlockCount::Unlimited).unwrap_err();
        assert!(matches!(err, PipeError::Output(_)));
    }

    #[test]
    fn test_unallocatable_block_size() {
        let mut spi = DummySpi::default();
        let mut input = Cursor::new(vec![0u8; 4]);
        let mut output = Vec::new();

        let err = run(&mut spi, &mut input, &mut output, usize::MAX, BlockCount::Unlimited)
            .unwrap_err();

        assert!(matches!(err, PipeError::Allocation { size } if size == usize::MAX));
        assert!(spi.transfers().is_empty());
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let mut spi = DummySpi::default();
        let mut input = Cursor::new(vec![0u8; 4]);
        let mut output = Vec::new();

        assert!(run(&mut spi, &mut input, &mut output, 0, BlockCount::Unlimited).is_err());
    }
}
