//! Time units used by the HAL.
pub type Hertz = fugit::HertzU32;
