//! Clock module.
use crate::{ErrorCode, time::Hertz};

/// Contract to a single firmware managed module clock.
///
/// On this SoC family the clock tree is owned by the system firmware, drivers
/// only gate their functional clocks and query rates.
pub trait ModuleClock {
    fn enable(&mut self) -> Result<(), ErrorCode>;
    fn disable(&mut self) -> Result<(), ErrorCode>;
    /// Current rate of the clock.
    fn rate(&self) -> Hertz;
}
