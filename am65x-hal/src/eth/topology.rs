//! Port topology resolution.
//!
//! A single Ethernet interface is served by up to two ICSSG instances. Which
//! instance and which PRU slice carries ingress respectively egress traffic
//! depends on which MII port of the subsystem is wired up on the board and on
//! whether the paired-instance mode is used. Firmware configuration, packet
//! classification and DMA channel naming all key off this mapping, so it is
//! resolved once up front.
use core::fmt::Write as _;

use heapless::String;

/// Number of ICSSG instances serving one Ethernet interface.
pub const NUM_ICSSG: usize = 2;

/// Maximum length of a DMA channel name.
pub const CHANNEL_NAME_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceId {
    Slice0 = 0,
    Slice1 = 1,
}

impl SliceId {
    #[inline]
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

/// Which MII port sub-nodes the board configuration declares.
///
/// The framework above this driver supports a single interface per device, so
/// exactly one of the two ports must be declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortNodes {
    pub mii0: bool,
    pub mii1: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("neither MII port is declared")]
    NoPortNode,
    #[error("both MII ports are declared, only one interface is supported")]
    BothPortNodes,
}

/// An (instance, slice) pair addressing one traffic direction.
///
/// The instance is the index into the per-interface resource set: 0 is the
/// primary ICSSG, 1 the paired one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSlice {
    pub icssg: usize,
    pub slice: SliceId,
}

/// Resolved ingress/egress mapping for one interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    dual_icssg: bool,
    config_slice: [SliceId; NUM_ICSSG],
    ingress: PortSlice,
    egress: PortSlice,
}

impl Topology {
    pub fn resolve(dual_icssg: bool, ports: PortNodes) -> Result<Self, TopologyError> {
        match (ports.mii0, ports.mii1) {
            (false, false) => Err(TopologyError::NoPortNode),
            (true, true) => Err(TopologyError::BothPortNodes),
            (true, false) => Ok(if dual_icssg {
                Self {
                    dual_icssg,
                    config_slice: [SliceId::Slice0, SliceId::Slice1],
                    ingress: PortSlice {
                        icssg: 0,
                        slice: SliceId::Slice0,
                    },
                    egress: PortSlice {
                        icssg: 1,
                        slice: SliceId::Slice1,
                    },
                }
            } else {
                Self {
                    dual_icssg,
                    config_slice: [SliceId::Slice0, SliceId::Slice0],
                    ingress: PortSlice {
                        icssg: 0,
                        slice: SliceId::Slice0,
                    },
                    egress: PortSlice {
                        icssg: 0,
                        slice: SliceId::Slice0,
                    },
                }
            }),
            (false, true) => Ok(if dual_icssg {
                Self {
                    dual_icssg,
                    config_slice: [SliceId::Slice1, SliceId::Slice0],
                    ingress: PortSlice {
                        icssg: 1,
                        slice: SliceId::Slice0,
                    },
                    egress: PortSlice {
                        icssg: 0,
                        slice: SliceId::Slice1,
                    },
                }
            } else {
                // The egress slice stays 0 here even though the port is
                // served by slice 1. Kept bit-for-bit compatible with the
                // firmware channel wiring.
                Self {
                    dual_icssg,
                    config_slice: [SliceId::Slice1, SliceId::Slice0],
                    ingress: PortSlice {
                        icssg: 0,
                        slice: SliceId::Slice0,
                    },
                    egress: PortSlice {
                        icssg: 0,
                        slice: SliceId::Slice0,
                    },
                }
            }),
        }
    }

    #[inline]
    pub const fn dual_icssg(&self) -> bool {
        self.dual_icssg
    }

    /// Slice carrying the firmware configuration of the given instance.
    #[inline]
    pub const fn config_slice(&self, icssg: usize) -> SliceId {
        self.config_slice[icssg]
    }

    #[inline]
    pub const fn ingress(&self) -> PortSlice {
        self.ingress
    }

    #[inline]
    pub const fn egress(&self) -> PortSlice {
        self.egress
    }

    /// TX channel name. Channels are distinguished by slice for a single
    /// instance and by instance for paired instances.
    pub fn tx_channel_name(&self) -> String<CHANNEL_NAME_LEN> {
        let mut name = String::new();
        let selector = if self.dual_icssg {
            self.egress.icssg
        } else {
            self.egress.slice.index()
        };
        // The string is large enough for any selector, see unit tests.
        write!(&mut name, "tx{}-0", selector).unwrap();
        name
    }

    /// RX channel name, see [Self::tx_channel_name].
    pub fn rx_channel_name(&self) -> String<CHANNEL_NAME_LEN> {
        let mut name = String::new();
        let selector = if self.dual_icssg {
            self.ingress.icssg
        } else {
            self.ingress.slice.index()
        };
        write!(&mut name, "rx{}", selector).unwrap();
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MII0: PortNodes = PortNodes {
        mii0: true,
        mii1: false,
    };
    const MII1: PortNodes = PortNodes {
        mii0: false,
        mii1: true,
    };

    #[test]
    fn test_no_port_node() {
        let result = Topology::resolve(
            false,
            PortNodes {
                mii0: false,
                mii1: false,
            },
        );
        assert_eq!(result.unwrap_err(), TopologyError::NoPortNode);
    }

    #[test]
    fn test_both_port_nodes() {
        let result = Topology::resolve(
            true,
            PortNodes {
                mii0: true,
                mii1: true,
            },
        );
        assert_eq!(result.unwrap_err(), TopologyError::BothPortNodes);
    }

    #[test]
    fn test_single_icssg_mii0() {
        let topology = Topology::resolve(false, MII0).unwrap();
        assert_eq!(topology.config_slice(0), SliceId::Slice0);
        assert_eq!(
            topology.ingress(),
            PortSlice {
                icssg: 0,
                slice: SliceId::Slice0
            }
        );
        assert_eq!(
            topology.egress(),
            PortSlice {
                icssg: 0,
                slice: SliceId::Slice0
            }
        );
        assert_eq!(topology.tx_channel_name(), "tx0-0");
        assert_eq!(topology.rx_channel_name(), "rx0");
    }

    #[test]
    fn test_single_icssg_mii1() {
        let topology = Topology::resolve(false, MII1).unwrap();
        assert_eq!(topology.config_slice(0), SliceId::Slice1);
        assert_eq!(
            topology.ingress(),
            PortSlice {
                icssg: 0,
                slice: SliceId::Slice0
            }
        );
        assert_eq!(
            topology.egress(),
            PortSlice {
                icssg: 0,
                slice: SliceId::Slice0
            }
        );
        assert_eq!(topology.tx_channel_name(), "tx0-0");
        assert_eq!(topology.rx_channel_name(), "rx0");
    }

    #[test]
    fn test_dual_icssg_mii0() {
        let topology = Topology::resolve(true, MII0).unwrap();
        assert_eq!(topology.config_slice(0), SliceId::Slice0);
        assert_eq!(topology.config_slice(1), SliceId::Slice1);
        assert_eq!(
            topology.ingress(),
            PortSlice {
                icssg: 0,
                slice: SliceId::Slice0
            }
        );
        assert_eq!(
            topology.egress(),
            PortSlice {
                icssg: 1,
                slice: SliceId::Slice1
            }
        );
        assert_eq!(topology.tx_channel_name(), "tx1-0");
        assert_eq!(topology.rx_channel_name(), "rx0");
    }

    #[test]
    fn test_dual_icssg_mii1() {
        let topology = Topology::resolve(true, MII1).unwrap();
        assert_eq!(topology.config_slice(0), SliceId::Slice1);
        assert_eq!(topology.config_slice(1), SliceId::Slice0);
        assert_eq!(
            topology.ingress(),
            PortSlice {
                icssg: 1,
                slice: SliceId::Slice0
            }
        );
        assert_eq!(
            topology.egress(),
            PortSlice {
                icssg: 0,
                slice: SliceId::Slice1
            }
        );
        assert_eq!(topology.tx_channel_name(), "tx0-0");
        assert_eq!(topology.rx_channel_name(), "rx1");
    }
}
