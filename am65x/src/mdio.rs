//! # MDIO controller register module.
//!
//! The same MDIO state machine instance is used by the CPSW and ICSSG
//! peripherals.
use arbitrary_int::u5;

#[bitbybit::bitfield(u32, debug)]
pub struct MdioControl {
    /// The state machine is idle and the clock divider is inactive.
    #[bit(31, r)]
    idle: bool,
    #[bit(30, rw)]
    enable: bool,
    #[bits(24..=28, r)]
    highest_user_channel: u5,
    /// Standby and preamble behaviour.
    #[bit(20, rw)]
    preamble_disable: bool,
    /// MDCLK divider applied to the functional clock.
    #[bits(0..=15, rw)]
    clock_divider: u16,
}

#[bitbybit::bitfield(u32, debug)]
pub struct UserAccess {
    /// Writing 1 starts the transaction, reads 1 while the transaction is in progress.
    #[bit(31, rw)]
    go: bool,
    #[bit(30, rw)]
    write: bool,
    /// For reads, set when the PHY acknowledged the transaction.
    #[bit(29, r)]
    ack: bool,
    #[bits(21..=25, rw)]
    reg_addr: u5,
    #[bits(16..=20, rw)]
    phy_addr: u5,
    #[bits(0..=15, rw)]
    data: u16,
}

/// MDIO controller register file.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Mdio {
    #[mmio(PureRead)]
    version: u32,
    control: MdioControl,
    /// One bit per PHY address which responded to the background polling.
    #[mmio(PureRead)]
    alive: u32,
    /// One bit per PHY address with link up.
    #[mmio(PureRead)]
    link: u32,
    link_int_raw: u32,
    link_int_masked: u32,
    _reserved0: [u32; 2],
    user_int_raw: u32,
    user_int_masked: u32,
    user_int_mask_set: u32,
    user_int_mask_clear: u32,
    _reserved1: [u32; 20],
    user_access_0: UserAccess,
    user_phy_sel_0: u32,
    user_access_1: UserAccess,
    user_phy_sel_1: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<Mdio>(), 0x90);
