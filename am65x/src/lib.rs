//! # PAC for the TI K3 AM65x SoC family
//!
//! Peripheral register access for the subset of the AM65x consumed by the
//! [HAL](https://docs.rs/am65x-hal): the two SD host controller instances with
//! their subsystem/PHY register regions, the ICSSG real-time MII blocks, the
//! MDIO controllers and the control module (pad configuration and ICSSG RGMII
//! control).
#![no_std]

use core::sync::atomic::{AtomicBool, Ordering};

pub mod ctrl_mmr;
pub mod icssg;
pub mod mdio;
pub mod sdhci;

static PERIPHERALS_TAKEN: AtomicBool = AtomicBool::new(false);

/// Register handles for one ICSSG instance.
pub struct IcssgPeripherals {
    pub mii_g_rt: icssg::MmioMiiGRt<'static>,
    pub mdio: mdio::MmioMdio<'static>,
    pub task_manager: icssg::MmioTaskManager<'static>,
}

/// All peripherals modelled by this crate.
pub struct Peripherals {
    pub mmc0: sdhci::MmioSdHost<'static>,
    pub mmc0_ss: sdhci::MmioSdSubsystem<'static>,
    pub mmc1: sdhci::MmioSdHost<'static>,
    pub mmc1_ss: sdhci::MmioSdSubsystem<'static>,
    pub icssg0: IcssgPeripherals,
    pub icssg1: IcssgPeripherals,
    pub icssg2: IcssgPeripherals,
    pub icssg_rgmii_ctrl: ctrl_mmr::MmioIcssgRgmiiControl<'static>,
    pub main_padcfg: ctrl_mmr::MmioMainPadConfig<'static>,
    pub wkup_padcfg: ctrl_mmr::MmioWkupPadConfig<'static>,
}

impl Peripherals {
    /// Takes the peripheral singleton.
    ///
    /// Returns [None] if the singleton was already taken.
    pub fn take() -> Option<Self> {
        if PERIPHERALS_TAKEN.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(unsafe { Self::steal() })
    }

    /// Steals the peripheral singleton.
    ///
    /// # Safety
    ///
    /// Circumvents the singleton guarantee of [Self::take]. The caller must
    /// ensure no register block ends up with two owners.
    pub unsafe fn steal() -> Self {
        unsafe {
            Self {
                mmc0: sdhci::SdHost::new_mmio_fixed_0(),
                mmc0_ss: sdhci::SdSubsystem::new_mmio_fixed_0(),
                mmc1: sdhci::SdHost::new_mmio_fixed_1(),
                mmc1_ss: sdhci::SdSubsystem::new_mmio_fixed_1(),
                icssg0: icssg::Icssg::Icssg0.steal_peripherals(),
                icssg1: icssg::Icssg::Icssg1.steal_peripherals(),
                icssg2: icssg::Icssg::Icssg2.steal_peripherals(),
                icssg_rgmii_ctrl: ctrl_mmr::IcssgRgmiiControl::new_mmio_fixed(),
                main_padcfg: ctrl_mmr::MainPadConfig::new_mmio_fixed(),
                wkup_padcfg: ctrl_mmr::WkupPadConfig::new_mmio_fixed(),
            }
        }
    }
}
