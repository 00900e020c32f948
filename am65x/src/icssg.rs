//! # ICSSG (Industrial Communications Subsystem, Gigabit) register module.
//!
//! Covers the parts of the subsystem the Ethernet offload driver touches: the
//! real-time MII packet classifier inside MII_G_RT, the PRU task manager
//! control words and the shared RAM geometry.

pub const ICSSG_0_BASE_ADDR: usize = 0x0B00_0000;
pub const ICSSG_1_BASE_ADDR: usize = 0x0B10_0000;
pub const ICSSG_2_BASE_ADDR: usize = 0x0B20_0000;

/// Shared data RAM (RAM2) offset inside an ICSSG instance.
pub const SHARED_RAM_OFFSET: usize = 0x1_0000;
/// MII_G_RT register region offset inside an ICSSG instance.
pub const MII_G_RT_OFFSET: usize = 0x3_3000;
/// MDIO controller offset inside an ICSSG instance.
pub const MDIO_OFFSET: usize = 0x3_2400;
/// Task manager region offset inside an ICSSG instance.
pub const TASK_MANAGER_OFFSET: usize = 0x2_A000;

/// Offset of the slice 1 firmware configuration region inside shared RAM.
pub const SLICE_1_CONFIG_OFFSET: usize = 0x8000;
/// MSMC SRAM carved out per ICSSG instance for firmware buffer pools.
pub const MSMC_RAM_SIZE: usize = 0x1_0000;

/// Number of hardware packet classifiers per slice.
pub const NUM_CLASSIFIERS: usize = 16;

/// Classifier data match term for the interface MAC address.
pub const CLASS_TERM_MAC_INTERFACE: u32 = 1 << 0;
/// Classifier data match term for the broadcast MAC address.
pub const CLASS_TERM_MAC_BROADCAST: u32 = 1 << 1;
/// Classifier data match term for any multicast MAC address.
pub const CLASS_TERM_MAC_MULTICAST: u32 = 1 << 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icssg {
    Icssg0 = 0,
    Icssg1 = 1,
    Icssg2 = 2,
}

impl Icssg {
    #[inline]
    pub const fn base_addr(&self) -> usize {
        match self {
            Icssg::Icssg0 => ICSSG_0_BASE_ADDR,
            Icssg::Icssg1 => ICSSG_1_BASE_ADDR,
            Icssg::Icssg2 => ICSSG_2_BASE_ADDR,
        }
    }

    #[inline]
    pub const fn shared_ram_addr(&self) -> usize {
        self.base_addr() + SHARED_RAM_OFFSET
    }

    /// Steal the MII_G_RT register block of this instance.
    ///
    /// # Safety
    ///
    /// Circumvents ownership and safety guarantees of the peripheral singleton.
    pub const unsafe fn steal_mii_g_rt(&self) -> MmioMiiGRt<'static> {
        unsafe { MiiGRt::new_mmio_at(self.base_addr() + MII_G_RT_OFFSET) }
    }

    /// Steal the MDIO register block of this instance.
    ///
    /// # Safety
    ///
    /// Circumvents ownership and safety guarantees of the peripheral singleton.
    pub const unsafe fn steal_mdio(&self) -> crate::mdio::MmioMdio<'static> {
        unsafe { crate::mdio::Mdio::new_mmio_at(self.base_addr() + MDIO_OFFSET) }
    }

    /// Steal the task manager register block of this instance.
    ///
    /// # Safety
    ///
    /// Circumvents ownership and safety guarantees of the peripheral singleton.
    pub const unsafe fn steal_task_manager(&self) -> MmioTaskManager<'static> {
        unsafe { TaskManager::new_mmio_at(self.base_addr() + TASK_MANAGER_OFFSET) }
    }

    /// Steal all register blocks of this instance.
    ///
    /// # Safety
    ///
    /// Circumvents ownership and safety guarantees of the peripheral singleton.
    pub const unsafe fn steal_peripherals(&self) -> crate::IcssgPeripherals {
        unsafe {
            crate::IcssgPeripherals {
                mii_g_rt: self.steal_mii_g_rt(),
                mdio: self.steal_mdio(),
                task_manager: self.steal_task_manager(),
            }
        }
    }
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct ClassifierConfig {
    /// When set, the corresponding classifier combines its terms with OR instead of AND.
    #[bits(0..=15, rw)]
    or_and_select: u16,
    /// Non-volatile classifier state. Cleared classifiers re-arm after each frame.
    #[bits(16..=31, rw)]
    non_volatile: u16,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct ClassGate {
    /// Keeps the gate closed independently of the classifier result.
    #[bit(5, rw)]
    hold: bool,
    /// Forwards the raw classifier result, bypassing the rate limiters.
    #[bit(4, rw)]
    raw: bool,
    /// Allows traffic matched by this classifier to reach the host port.
    #[bit(0, rw)]
    allow: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct MacHigh {
    #[bits(0..=15, rw)]
    addr_47_32: u16,
}

/// Per-slice packet classifier register group inside MII_G_RT.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct RxClassifier {
    /// AND term enables for each of the 16 classifiers.
    and_enable: [u32; NUM_CLASSIFIERS],
    /// OR term enables for each of the 16 classifiers.
    or_enable: [u32; NUM_CLASSIFIERS],
    config: ClassifierConfig,
    _reserved0: u32,
    gates: [ClassGate; NUM_CLASSIFIERS],
    /// Interface MAC address bits 31:0.
    mac_low: u32,
    mac_high: MacHigh,
    _reserved1: [u32; 12],
}

static_assertions::const_assert_eq!(core::mem::size_of::<RxClassifier>(), 0x100);

/// Classifier view of the MII_G_RT register region.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct MiiGRt {
    #[mmio(Inner)]
    classifier_slice_0: RxClassifier,
    #[mmio(Inner)]
    classifier_slice_1: RxClassifier,
}

static_assertions::const_assert_eq!(core::mem::size_of::<MiiGRt>(), 0x200);

/// PRU task manager control words, one per slice.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct TaskManager {
    slice_0_ctrl: u32,
    _reserved0: [u32; 127],
    slice_1_ctrl: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<TaskManager>(), 0x204);
