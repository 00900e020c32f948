//! PHY contract and interface mode handling.
use core::str::FromStr;

use crate::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Mbps10,
    Mbps100,
    Mbps1000,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duplex {
    Half,
    Full,
}

/// Negotiated link state reported by the PHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub speed: Speed,
    pub duplex: Duplex,
}

/// MII interface mode between the MAC and the PHY, named like the board
/// configuration strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhyInterface {
    Mii,
    Rmii,
    Rgmii,
    /// RGMII with both delays provided by the PHY.
    RgmiiId,
    /// RGMII with the receive delay provided by the PHY.
    RgmiiRxid,
    /// RGMII with the transmit delay provided by the PHY.
    RgmiiTxid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid PHY mode")]
pub struct InvalidPhyMode;

impl FromStr for PhyInterface {
    type Err = InvalidPhyMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mii" => Ok(PhyInterface::Mii),
            "rmii" => Ok(PhyInterface::Rmii),
            "rgmii" => Ok(PhyInterface::Rgmii),
            "rgmii-id" => Ok(PhyInterface::RgmiiId),
            "rgmii-rxid" => Ok(PhyInterface::RgmiiRxid),
            "rgmii-txid" => Ok(PhyInterface::RgmiiTxid),
            _ => Err(InvalidPhyMode),
        }
    }
}

impl PhyInterface {
    #[inline]
    pub const fn is_rgmii(&self) -> bool {
        matches!(
            self,
            PhyInterface::Rgmii
                | PhyInterface::RgmiiId
                | PhyInterface::RgmiiRxid
                | PhyInterface::RgmiiTxid
        )
    }
}

/// Contract to the PHY framework for one connected gigabit PHY.
pub trait EthernetPhy {
    /// Applies the feature mask and board specific fixups.
    fn configure(&mut self) -> Result<(), ErrorCode>;

    /// Starts the PHY and waits for a negotiated link.
    fn startup(&mut self) -> Result<Link, ErrorCode>;

    fn shutdown(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phy_mode_parsing() {
        assert_eq!("rgmii".parse(), Ok(PhyInterface::Rgmii));
        assert_eq!("rgmii-id".parse(), Ok(PhyInterface::RgmiiId));
        assert_eq!("rgmii-rxid".parse(), Ok(PhyInterface::RgmiiRxid));
        assert_eq!("rgmii-txid".parse(), Ok(PhyInterface::RgmiiTxid));
        assert_eq!("mii".parse(), Ok(PhyInterface::Mii));
        assert_eq!("rmii".parse(), Ok(PhyInterface::Rmii));
        assert_eq!(PhyInterface::from_str("sgmii"), Err(InvalidPhyMode));
    }

    #[test]
    fn test_rgmii_detection() {
        assert!(PhyInterface::RgmiiId.is_rgmii());
        assert!(!PhyInterface::Mii.is_rgmii());
    }
}
