//! Hardware packet classifier driving.
//!
//! Each slice owns 16 classifiers in the real-time MII block. The bootloader
//! use case only distinguishes "deliver to host" and "drop": one classifier
//! matching broadcast, multicast and the interface MAC address is opened on
//! start, everything is closed again on stop.
use am65x::icssg::{
    CLASS_TERM_MAC_BROADCAST, CLASS_TERM_MAC_INTERFACE, CLASS_TERM_MAC_MULTICAST, ClassGate,
    ClassifierConfig, MacHigh, MmioMiiGRt, MmioRxClassifier, NUM_CLASSIFIERS,
};

use super::topology::SliceId;

/// Classifier used for host bound traffic.
const HOST_CLASS: usize = 0;

pub struct Classifier {
    regs: MmioMiiGRt<'static>,
}

impl Classifier {
    #[inline]
    pub fn new(regs: MmioMiiGRt<'static>) -> Self {
        Self { regs }
    }

    fn slice_regs(&mut self, slice: SliceId) -> MmioRxClassifier<'_> {
        match slice {
            SliceId::Slice0 => self.regs.classifier_slice_0(),
            SliceId::Slice1 => self.regs.classifier_slice_1(),
        }
    }

    /// Programs the interface MAC address of the slice.
    pub fn set_mac_addr(&mut self, slice: SliceId, mac: &[u8; 6]) {
        let low = u32::from_le_bytes([mac[0], mac[1], mac[2], mac[3]]);
        let high = u16::from_le_bytes([mac[4], mac[5]]);
        let mut regs = self.slice_regs(slice);
        regs.write_mac_low(low);
        regs.write_mac_high(MacHigh::builder().with_addr_47_32(high).build());
    }

    /// Installs the default receive configuration: everything closed except
    /// host traffic (broadcast, multicast and the interface MAC address).
    pub fn set_default(&mut self, slice: SliceId) {
        self.disable(slice);
        let mut regs = self.slice_regs(slice);
        regs.write_or_enable(
            HOST_CLASS,
            CLASS_TERM_MAC_BROADCAST | CLASS_TERM_MAC_MULTICAST | CLASS_TERM_MAC_INTERFACE,
        );
        let mut config = ClassifierConfig::new_with_raw_value(0);
        config.set_or_and_select(1 << HOST_CLASS);
        regs.write_config(config);
        let mut gate = ClassGate::new_with_raw_value(0);
        gate.set_raw(true);
        gate.set_allow(true);
        regs.write_gates(HOST_CLASS, gate);
    }

    /// Closes all gates and clears every match term of the slice.
    pub fn disable(&mut self, slice: SliceId) {
        let mut regs = self.slice_regs(slice);
        let mut gate = ClassGate::new_with_raw_value(0);
        gate.set_hold(true);
        for n in 0..NUM_CLASSIFIERS {
            regs.write_and_enable(n, 0);
            regs.write_or_enable(n, 0);
            regs.write_gates(n, gate);
        }
        regs.write_config(ClassifierConfig::new_with_raw_value(0));
    }
}
