//! Power domain module.
use crate::ErrorCode;

/// Contract to a firmware managed power domain.
pub trait PowerDomain {
    fn on(&mut self) -> Result<(), ErrorCode>;
    fn off(&mut self) -> Result<(), ErrorCode>;
}
