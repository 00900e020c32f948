//! # AM65x EVM board support
//!
//! Late bring-up glue for the evaluation board: identification of the base
//! board and any plugged-in daughtercards through their ID EEPROMs, serial
//! number and MAC address provisioning into the environment, the board pin
//! multiplexing tables and the DRAM geometry and timing parameters.
#![no_std]

pub mod daughtercard;
pub mod dram;
pub mod eeprom;
pub mod pinmux;

use core::fmt::Write as _;

use embedded_hal::{digital::InputPin, i2c::I2c};
use heapless::String;

use am65x_hal::ErrorCode;
use daughtercard::NUM_SLOTS;
use eeprom::{BoardEeprom, EepromError, is_valid_ethaddr};

/// I2C address of the base board identification EEPROM.
pub const BOARD_EEPROM_ADDR: u8 = 0x50;
/// EEPROM-programmed name of the base board.
pub const BASE_BOARD_NAME: &str = "AM6-COMPROCEVM";
/// Environment board name, also the fallback when identification fails.
pub const BOARD_ENV_NAME: &str = "am65x";

/// Narrow contract to the bootloader environment store.
pub trait Environment {
    fn get(&self, key: &str) -> Option<&str>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ErrorCode>;
}

/// Reads the base board identification EEPROM.
pub fn read_board_eeprom<I: I2c>(i2c: &mut I) -> Result<BoardEeprom, EepromError> {
    BoardEeprom::read(i2c, BOARD_EEPROM_ADDR)
}

/// Publishes the board name. Boards claiming a foreign name still get the
/// default name, with a warning.
pub fn setup_board_env<E: Environment>(
    env: &mut E,
    record: Option<&BoardEeprom>,
) -> Result<(), ErrorCode> {
    if let Some(record) = record
        && record.name != BASE_BOARD_NAME
    {
        log::warn!("unidentified board claims {} in eeprom header", record.name);
    }
    env.set("board_name", BOARD_ENV_NAME)
}

/// Propagates the EEPROM serial number into `serial#`, leaving an existing
/// value alone. The record value must be fully hexadecimal.
pub fn setup_serial<E: Environment>(env: &mut E, record: &BoardEeprom) -> Result<(), ErrorCode> {
    if env.get("serial#").is_some() {
        return Ok(());
    }
    match u64::from_str_radix(record.serial.as_str(), 16) {
        Ok(serial) => {
            let mut value: String<17> = String::new();
            write!(&mut value, "{serial:016x}").unwrap();
            env.set("serial#", &value)
        }
        Err(_) => {
            log::error!("can't set serial# to {}", record.serial);
            Ok(())
        }
    }
}

/// Publishes the MAC pool of the record starting at the given index.
pub fn set_mac_addresses<E: Environment>(
    env: &mut E,
    start_index: usize,
    record: &BoardEeprom,
) -> Result<(), ErrorCode> {
    for (i, mac) in record.mac_addrs.iter().enumerate() {
        if !is_valid_ethaddr(mac) {
            continue;
        }
        daughtercard::set_ethaddr_env(env, start_index + i, mac)?;
    }
    Ok(())
}

/// Late board initialization: board identification, serial number and MAC
/// provisioning, then daughtercard probing.
///
/// The first MAC address a.k.a. `ethaddr` comes from the fuses via the
/// gigabit switch subsystem, so base board provisioning starts at index 1.
pub fn late_init<E: Environment, I: I2c, P: InputPin>(
    env: &mut E,
    i2c: &mut I,
    detect_pins: &mut [P; NUM_SLOTS],
) -> Result<(), ErrorCode> {
    match read_board_eeprom(i2c) {
        Ok(record) => {
            setup_board_env(env, Some(&record))?;
            setup_serial(env, &record)?;
            set_mac_addresses(env, 1, &record)?;
        }
        Err(e) => {
            log::error!("reading on-board EEPROM at {BOARD_EEPROM_ADDR:#04x} failed: {e}");
            setup_board_env(env, None)?;
        }
    }
    if let Err(e) = daughtercard::probe(detect_pins, i2c, env) {
        log::error!("daughtercard probing failed: {e}");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;

    use std::{collections::BTreeMap, string::String as StdString, vec::Vec};

    use embedded_hal::digital;
    use embedded_hal::i2c::{self, Operation, SevenBitAddress};

    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct MockEnv {
        vars: BTreeMap<StdString, StdString>,
    }

    impl MockEnv {
        pub(crate) fn get_str(&self, key: &str) -> Option<&str> {
            self.vars.get(key).map(|value| value.as_str())
        }

        pub(crate) fn insert(&mut self, key: &str, value: &str) {
            self.vars.insert(key.into(), value.into());
        }
    }

    impl Environment for MockEnv {
        fn get(&self, key: &str) -> Option<&str> {
            self.get_str(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), ErrorCode> {
            self.vars.insert(key.into(), value.into());
            Ok(())
        }
    }

    #[derive(Debug)]
    pub(crate) struct MockI2cError;

    impl i2c::Error for MockI2cError {
        fn kind(&self) -> i2c::ErrorKind {
            i2c::ErrorKind::Other
        }
    }

    /// I2C bus with EEPROM contents behind selected addresses.
    #[derive(Debug, Default)]
    pub(crate) struct MockI2c {
        eeproms: BTreeMap<u8, Vec<u8>>,
    }

    impl MockI2c {
        pub(crate) fn install(&mut self, addr: u8, contents: impl AsRef<[u8]>) {
            self.eeproms.insert(addr, contents.as_ref().into());
        }
    }

    impl i2c::ErrorType for MockI2c {
        type Error = MockI2cError;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: SevenBitAddress,
            operations: &mut [Operation<'_>],
        ) -> Result<(), MockI2cError> {
            let contents = self.eeproms.get(&address).ok_or(MockI2cError)?;
            let mut offset = 0;
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => {
                        offset = match **bytes {
                            [high, low] => usize::from(high) << 8 | usize::from(low),
                            _ => 0,
                        };
                    }
                    Operation::Read(buffer) => {
                        for (i, byte) in buffer.iter_mut().enumerate() {
                            *byte = contents.get(offset + i).copied().unwrap_or(0xFF);
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[derive(Debug)]
    pub(crate) struct PinError;

    impl digital::Error for PinError {
        fn kind(&self) -> digital::ErrorKind {
            digital::ErrorKind::Other
        }
    }

    /// Active-low presence detection pin.
    #[derive(Debug)]
    pub(crate) struct PresencePin {
        low: bool,
    }

    impl PresencePin {
        pub(crate) const fn present() -> Self {
            Self { low: true }
        }

        pub(crate) const fn absent() -> Self {
            Self { low: false }
        }
    }

    impl digital::ErrorType for PresencePin {
        type Error = PinError;
    }

    impl InputPin for PresencePin {
        fn is_high(&mut self) -> Result<bool, PinError> {
            Ok(!self.low)
        }

        fn is_low(&mut self) -> Result<bool, PinError> {
            Ok(self.low)
        }
    }

    fn bus_with_base_board() -> MockI2c {
        let mut i2c = MockI2c::default();
        i2c.install(
            BOARD_EEPROM_ADDR,
            eeprom::tests::record(
                BASE_BOARD_NAME,
                "17e40003",
                &[[0x70, 0xFF, 0x76, 0x1C, 0x01, 0x00]],
            ),
        );
        i2c
    }

    #[test]
    fn test_late_init_provisions_environment() {
        let mut env = MockEnv::default();
        let mut i2c = bus_with_base_board();
        let mut pins = [const { PresencePin::absent() }; NUM_SLOTS];

        late_init(&mut env, &mut i2c, &mut pins).unwrap();

        assert_eq!(env.get_str("board_name"), Some("am65x"));
        assert_eq!(env.get_str("serial#"), Some("0000000017e40003"));
        // Index 0 belongs to the fused switch subsystem MAC.
        assert_eq!(env.get_str("ethaddr"), None);
        assert_eq!(env.get_str("eth1addr"), Some("70:ff:76:1c:01:00"));
    }

    #[test]
    fn test_late_init_without_eeprom_falls_back() {
        let mut env = MockEnv::default();
        let mut i2c = MockI2c::default();
        let mut pins = [const { PresencePin::absent() }; NUM_SLOTS];

        late_init(&mut env, &mut i2c, &mut pins).unwrap();

        assert_eq!(env.get_str("board_name"), Some("am65x"));
        assert_eq!(env.get_str("serial#"), None);
    }

    #[test]
    fn test_existing_serial_is_kept() {
        let mut env = MockEnv::default();
        env.insert("serial#", "cafe");
        let mut i2c = bus_with_base_board();
        let mut pins = [const { PresencePin::absent() }; NUM_SLOTS];

        late_init(&mut env, &mut i2c, &mut pins).unwrap();

        assert_eq!(env.get_str("serial#"), Some("cafe"));
    }

    #[test]
    fn test_non_hex_serial_is_rejected() {
        let mut env = MockEnv::default();
        let mut i2c = MockI2c::default();
        i2c.install(
            BOARD_EEPROM_ADDR,
            eeprom::tests::record(BASE_BOARD_NAME, "SN-17E4", &[]),
        );
        let mut pins = [const { PresencePin::absent() }; NUM_SLOTS];

        late_init(&mut env, &mut i2c, &mut pins).unwrap();

        assert_eq!(env.get_str("serial#"), None);
    }
}
