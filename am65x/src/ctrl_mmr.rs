//! # Control module (CTRL_MMR) register module.
//!
//! Covers the pad configuration registers of the MAIN and WKUP domains and
//! the per-ICSSG RGMII control words.
use arbitrary_int::u4;

pub const CTRL_MMR_BASE_ADDR: usize = 0x0010_0000;
/// Offset of the ICSSG RGMII control words inside CTRL_MMR.
pub const ICSSG_RGMII_CTRL_OFFSET: usize = 0x4500;
pub const ICSSG_RGMII_CTRL_BASE_ADDR: usize = CTRL_MMR_BASE_ADDR + ICSSG_RGMII_CTRL_OFFSET;

pub const MAIN_PADCFG_BASE_ADDR: usize = 0x0011_C000;
pub const WKUP_PADCFG_BASE_ADDR: usize = 0x4301_C000;

pub const MAIN_PADCFG_COUNT: usize = 157;
pub const WKUP_PADCFG_COUNT: usize = 69;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct RgmiiControl {
    /// When set, the internal transmit clock delay of the RGMII interface is disabled
    /// and the board or the PHY must provide the delay.
    #[bit(24, rw)]
    internal_delay_disabled: bool,
}

/// RGMII control words, one per ICSSG instance.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct IcssgRgmiiControl {
    icssg0: RgmiiControl,
    icssg1: RgmiiControl,
    icssg2: RgmiiControl,
}

static_assertions::const_assert_eq!(core::mem::size_of::<IcssgRgmiiControl>(), 0xC);

impl IcssgRgmiiControl {
    /// Create the RGMII control register instance at [ICSSG_RGMII_CTRL_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    pub const unsafe fn new_mmio_fixed() -> MmioIcssgRgmiiControl<'static> {
        unsafe { Self::new_mmio_at(ICSSG_RGMII_CTRL_BASE_ADDR) }
    }
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct PadConfig {
    /// Locks the pad configuration until the next reset.
    #[bit(31, rw)]
    lock: bool,
    /// Disables the output driver of the pad.
    #[bit(21, rw)]
    tx_disable: bool,
    /// Enables the input buffer of the pad.
    #[bit(18, rw)]
    rx_active: bool,
    /// Selects a pull-up instead of a pull-down.
    #[bit(17, rw)]
    pull_up: bool,
    /// Disables the pull resistor entirely.
    #[bit(16, rw)]
    pull_disable: bool,
    /// Enables the schmitt trigger input stage.
    #[bit(14, rw)]
    schmitt_enable: bool,
    #[bits(0..=3, rw)]
    mux_mode: u4,
}

/// MAIN domain pad configuration registers.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct MainPadConfig {
    pad: [PadConfig; MAIN_PADCFG_COUNT],
}

impl MainPadConfig {
    /// Create the MAIN pad configuration instance at [MAIN_PADCFG_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// See [IcssgRgmiiControl::new_mmio_fixed].
    pub const unsafe fn new_mmio_fixed() -> MmioMainPadConfig<'static> {
        unsafe { Self::new_mmio_at(MAIN_PADCFG_BASE_ADDR) }
    }
}

/// WKUP domain pad configuration registers.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct WkupPadConfig {
    pad: [PadConfig; WKUP_PADCFG_COUNT],
}

impl WkupPadConfig {
    /// Create the WKUP pad configuration instance at [WKUP_PADCFG_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// See [IcssgRgmiiControl::new_mmio_fixed].
    pub const unsafe fn new_mmio_fixed() -> MmioWkupPadConfig<'static> {
        unsafe { Self::new_mmio_at(WKUP_PADCFG_BASE_ADDR) }
    }
}
