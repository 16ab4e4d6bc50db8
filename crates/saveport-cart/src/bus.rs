//! The serial bus seam

use crate::error::CartResult;

/// One serial command bus to a cartridge save chip
///
/// Implementations execute a single command frame per call: the command
/// bytes (opcode, address, and any write data) are clocked out, then
/// `response.len()` bytes are clocked back in, all within one
/// chip-select assertion. An empty `response` makes the frame
/// write-only.
///
/// The bus is a process-wide singleton in practice; ownership of the
/// implementing value enforces that one [`CartController`] drives it at
/// a time.
///
/// [`CartController`]: crate::CartController
pub trait SpiBus {
    /// Execute one command frame
    fn exchange(&mut self, command: &[u8], response: &mut [u8]) -> CartResult<()>;

    /// Pause between status polls
    ///
    /// Split out from [`exchange`](Self::exchange) so emulated buses can
    /// account time without sleeping.
    fn delay_ms(&mut self, ms: u64);
}
