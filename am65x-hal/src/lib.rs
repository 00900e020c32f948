//! # HAL for the TI K3 AM65x SoC family
//!
//! Drivers on top of the [am65x] peripheral access crate: the ICSSG PRU
//! Ethernet offload driver and the AM654 SD host controller driver with its
//! IO PHY delay line handling, plus the narrow contracts to the collaborators
//! the drivers depend on (packet DMA, module clocks, power domains, the PHY
//! and MMC command layers).
#![no_std]

pub mod clocks;
pub mod dma;
pub mod eth;
pub mod mmc;
pub mod power;
pub mod time;

pub use am65x as pac;

/// Error code used across the narrow collaborator contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorCode {
    #[error("device or resource not found")]
    NotFound,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("input/output error")]
    Io,
    #[error("operation timed out")]
    TimedOut,
    #[error("operation not supported")]
    NotSupported,
    #[error("out of memory")]
    OutOfMemory,
}
