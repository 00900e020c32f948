//! Daughtercard detection.
//!
//! Each expansion slot has an active-low presence signal on the I2C IO
//! expander and a dedicated EEPROM address. A card is accepted when its
//! EEPROM record carries the expected name; accepted cards contribute their
//! MAC addresses to the environment pool at a card specific offset and their
//! overlay artifact to the overlay list.
use core::fmt::Write as _;

use embedded_hal::{digital::InputPin, i2c::I2c};
use heapless::String;

use crate::{
    Environment,
    eeprom::{BoardEeprom, is_valid_ethaddr},
};
use am65x_hal::ErrorCode;

/// Expansion slots with presence detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    App = 0,
    Lcd = 1,
    Serdes = 2,
    HdmiGpmc = 3,
}

pub const NUM_SLOTS: usize = 4;

/// EEPROM address of each slot, indexed by [Slot].
pub const SLOT_EEPROM_ADDR: [u8; NUM_SLOTS] = [0x52, 0x55, 0x54, 0x53];

/// A supported expansion card.
#[derive(Debug, Clone, Copy)]
pub struct CardInfo {
    /// Slot the card is installed in.
    pub slot: Slot,
    /// EEPROM-programmed card name.
    pub name: &'static str,
    /// Overlay artifact to apply for this card.
    pub overlay: &'static str,
    /// First MAC address pool index contributed by this card.
    pub eth_offset: usize,
}

pub const EXPANSION_CARDS: [CardInfo; 5] = [
    CardInfo {
        slot: Slot::App,
        name: "AM6-GPAPPEVM",
        overlay: "k3-am654-gp.dtbo",
        eth_offset: 0,
    },
    CardInfo {
        slot: Slot::App,
        name: "AM6-IDKAPPEVM",
        overlay: "k3-am654-idk.dtbo",
        eth_offset: 3,
    },
    CardInfo {
        slot: Slot::Serdes,
        name: "SER-PCIE2LEVM",
        overlay: "k3-am654-pcie-usb2.dtbo",
        eth_offset: 0,
    },
    CardInfo {
        slot: Slot::Serdes,
        name: "SER-PCIEUSBEVM",
        overlay: "k3-am654-pcie-usb3.dtbo",
        eth_offset: 0,
    },
    CardInfo {
        slot: Slot::Lcd,
        name: "OLDI-LCD1EVM",
        overlay: "k3-am654-evm-oldi-lcd1evm.dtbo",
        eth_offset: 0,
    },
];

/// Upper bound for the overlay list environment value.
pub const MAX_OVERLAYS_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DaughtercardError {
    #[error("presence detection GPIO error")]
    Gpio,
    #[error("environment error: {0}")]
    Environment(ErrorCode),
    #[error("overlay list overflow")]
    OverlayListFull,
}

/// Detection state for [EXPANSION_CARDS], by table index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectedCards {
    flags: [bool; EXPANSION_CARDS.len()],
}

impl DetectedCards {
    #[inline]
    pub const fn card_detected(&self, index: usize) -> bool {
        self.flags[index]
    }

    /// Overlay artifact name of the index-th detected card, in table order.
    pub fn overlay(&self, index: usize) -> Option<&'static str> {
        self.flags
            .iter()
            .zip(EXPANSION_CARDS.iter())
            .filter_map(|(detected, card)| detected.then_some(card.overlay))
            .nth(index)
    }
}

/// Probes every expansion slot and processes the cards that are present.
///
/// An unreadable or foreign card EEPROM only skips the card in question.
pub fn probe<P: InputPin, I: I2c, E: Environment>(
    detect_pins: &mut [P; NUM_SLOTS],
    i2c: &mut I,
    env: &mut E,
) -> Result<DetectedCards, DaughtercardError> {
    let mut detected = DetectedCards::default();

    for (index, card) in EXPANSION_CARDS.iter().enumerate() {
        let slot = card.slot as usize;
        // The presence signal is active-low.
        let present = detect_pins[slot]
            .is_low()
            .map_err(|_| DaughtercardError::Gpio)?;
        if !present {
            continue;
        }

        let eeprom_addr = SLOT_EEPROM_ADDR[slot];
        let record = match BoardEeprom::read(i2c, eeprom_addr) {
            Ok(record) => record,
            Err(e) => {
                // Pretty serious, but skip over this card rather than ending
                // the probing process altogether.
                log::error!("reading daughtercard EEPROM at {eeprom_addr:#04x} failed: {e}");
                continue;
            }
        };
        if record.name != card.name {
            continue;
        }

        log::info!("detected {}", card.name);
        detected.flags[index] = true;

        // Contribute the card MAC addresses to the environment pool, starting
        // at the card specific offset.
        for (i, mac) in record.mac_addrs.iter().enumerate() {
            if !is_valid_ethaddr(mac) {
                continue;
            }
            set_ethaddr_env(env, card.eth_offset + i, mac)
                .map_err(DaughtercardError::Environment)?;
        }
    }

    let mut overlays: String<MAX_OVERLAYS_LEN> = String::new();
    for (index, card) in EXPANSION_CARDS.iter().enumerate() {
        if !detected.flags[index] || card.overlay.is_empty() {
            continue;
        }
        // The new overlay, a separating space and the terminator must fit.
        if overlays.len() + card.overlay.len() + 2 > MAX_OVERLAYS_LEN {
            return Err(DaughtercardError::OverlayListFull);
        }
        overlays.push_str(card.overlay).unwrap();
        overlays.push(' ').unwrap();
    }
    if !overlays.is_empty() {
        env.set("name_overlays", &overlays)
            .map_err(DaughtercardError::Environment)?;
    }

    Ok(detected)
}

/// Sets the indexed Ethernet MAC address environment variable.
pub fn set_ethaddr_env<E: Environment>(
    env: &mut E,
    index: usize,
    mac: &[u8; 6],
) -> Result<(), ErrorCode> {
    let mut key: String<16> = String::new();
    if index == 0 {
        key.push_str("ethaddr").unwrap();
    } else {
        write!(&mut key, "eth{index}addr").map_err(|_| ErrorCode::InvalidArgument)?;
    }
    let mut value: String<18> = String::new();
    write!(
        &mut value,
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
    .unwrap();
    env.set(&key, &value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{MockEnv, MockI2c, PresencePin};

    #[test]
    fn test_ethaddr_env_keys() {
        let mut env = MockEnv::default();
        set_ethaddr_env(&mut env, 0, &[0x70, 0xFF, 0x76, 0x1C, 0x00, 0x01]).unwrap();
        set_ethaddr_env(&mut env, 4, &[0x70, 0xFF, 0x76, 0x1C, 0x00, 0x05]).unwrap();
        assert_eq!(env.get_str("ethaddr"), Some("70:ff:76:1c:00:01"));
        assert_eq!(env.get_str("eth4addr"), Some("70:ff:76:1c:00:05"));
    }

    #[test]
    fn test_empty_slots_detect_nothing() {
        let mut pins = [const { PresencePin::absent() }; NUM_SLOTS];
        let mut i2c = MockI2c::default();
        let mut env = MockEnv::default();
        let detected = probe(&mut pins, &mut i2c, &mut env).unwrap();
        assert_eq!(detected, DetectedCards::default());
        assert_eq!(env.get_str("name_overlays"), None);
    }

    #[test]
    fn test_app_card_detection() {
        let mut pins = [const { PresencePin::absent() }; NUM_SLOTS];
        pins[Slot::App as usize] = PresencePin::present();
        let mut i2c = MockI2c::default();
        i2c.install(
            SLOT_EEPROM_ADDR[Slot::App as usize],
            crate::eeprom::tests::record(
                "AM6-IDKAPPEVM",
                "17E40001",
                &[[0x70, 0xFF, 0x76, 0x1C, 0x00, 0x10]],
            ),
        );
        let mut env = MockEnv::default();

        let detected = probe(&mut pins, &mut i2c, &mut env).unwrap();
        assert!(!detected.card_detected(0));
        assert!(detected.card_detected(1));
        assert_eq!(detected.overlay(0), Some("k3-am654-idk.dtbo"));
        assert_eq!(detected.overlay(1), None);
        // The IDK application card MAC pool starts at index 3.
        assert_eq!(env.get_str("eth3addr"), Some("70:ff:76:1c:00:10"));
        assert_eq!(env.get_str("name_overlays"), Some("k3-am654-idk.dtbo "));
    }

    #[test]
    fn test_unreadable_eeprom_skips_card() {
        let mut pins = [const { PresencePin::absent() }; NUM_SLOTS];
        pins[Slot::Serdes as usize] = PresencePin::present();
        // No EEPROM installed for the slot address.
        let mut i2c = MockI2c::default();
        let mut env = MockEnv::default();
        let detected = probe(&mut pins, &mut i2c, &mut env).unwrap();
        assert_eq!(detected, DetectedCards::default());
    }

    #[test]
    fn test_invalid_macs_are_not_populated() {
        let mut pins = [const { PresencePin::absent() }; NUM_SLOTS];
        pins[Slot::Lcd as usize] = PresencePin::present();
        let mut i2c = MockI2c::default();
        i2c.install(
            SLOT_EEPROM_ADDR[Slot::Lcd as usize],
            crate::eeprom::tests::record("OLDI-LCD1EVM", "17E40002", &[[0; 6]]),
        );
        let mut env = MockEnv::default();
        let detected = probe(&mut pins, &mut i2c, &mut env).unwrap();
        assert!(detected.card_detected(4));
        assert_eq!(env.get_str("ethaddr"), None);
    }
}
