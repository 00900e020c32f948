//! AM6-format board identification EEPROM.
//!
//! The base board and every expansion card carry an I2C EEPROM with the same
//! record at offset zero: magic word, board name, hardware version, serial
//! number and a pool of factory programmed MAC addresses.
use embedded_hal::i2c::I2c;
use heapless::{String, Vec};

use am65x_hal::ErrorCode;

pub const EEPROM_MAGIC: u32 = 0xEE33_55AA;

pub const NAME_LEN: usize = 16;
pub const VERSION_LEN: usize = 4;
pub const SERIAL_LEN: usize = 12;
pub const MAX_MAC_ADDRS: usize = 8;

/// Serialized record size in bytes.
pub const RECORD_LEN: usize = 4 + NAME_LEN + VERSION_LEN + SERIAL_LEN + 4 + 6 * MAX_MAC_ADDRS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EepromError {
    #[error("transfer error: {0}")]
    Transfer(ErrorCode),
    #[error("bad magic word {0:#010x}")]
    BadMagic(u32),
    #[error("malformed record")]
    Malformed,
}

/// Parsed board identification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEeprom {
    pub name: String<NAME_LEN>,
    pub version: String<VERSION_LEN>,
    pub serial: String<SERIAL_LEN>,
    pub mac_addrs: Vec<[u8; 6], MAX_MAC_ADDRS>,
}

impl BoardEeprom {
    /// Reads and parses the record from the EEPROM at the given address,
    /// using two-byte in-chip offset addressing.
    pub fn read<I: I2c>(i2c: &mut I, addr: u8) -> Result<Self, EepromError> {
        let mut raw = [0; RECORD_LEN];
        i2c.write_read(addr, &[0, 0], &mut raw)
            .map_err(|_| EepromError::Transfer(ErrorCode::Io))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &[u8]) -> Result<Self, EepromError> {
        if raw.len() < RECORD_LEN {
            return Err(EepromError::Malformed);
        }
        let magic = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        if magic != EEPROM_MAGIC {
            return Err(EepromError::BadMagic(magic));
        }
        let name = ascii_field(&raw[4..4 + NAME_LEN])?;
        let version = ascii_field(&raw[20..20 + VERSION_LEN])?;
        let serial = ascii_field(&raw[24..24 + SERIAL_LEN])?;
        let mac_cnt = usize::from(raw[36]).min(MAX_MAC_ADDRS);
        let mut mac_addrs = Vec::new();
        for i in 0..mac_cnt {
            let offset = 40 + i * 6;
            let mut mac = [0; 6];
            mac.copy_from_slice(&raw[offset..offset + 6]);
            // Vector capacity matches the clamped count.
            mac_addrs.push(mac).unwrap();
        }
        Ok(Self {
            name,
            version,
            serial,
            mac_addrs,
        })
    }
}

/// NUL or 0xFF padded printable ASCII field.
fn ascii_field<const N: usize>(raw: &[u8]) -> Result<String<N>, EepromError> {
    let mut field = String::new();
    for &byte in raw {
        if byte == 0 || byte == 0xFF {
            break;
        }
        if !byte.is_ascii_graphic() {
            return Err(EepromError::Malformed);
        }
        field.push(byte as char).map_err(|_| EepromError::Malformed)?;
    }
    Ok(field)
}

/// A usable unicast MAC address: neither all-zero nor with the group bit set.
pub fn is_valid_ethaddr(mac: &[u8; 6]) -> bool {
    mac.iter().any(|&byte| byte != 0) && mac[0] & 0x01 == 0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(name: &str, serial: &str, macs: &[[u8; 6]]) -> [u8; RECORD_LEN] {
        let mut raw = [0; RECORD_LEN];
        raw[0..4].copy_from_slice(&EEPROM_MAGIC.to_le_bytes());
        raw[4..4 + name.len()].copy_from_slice(name.as_bytes());
        raw[20..22].copy_from_slice(b"A3");
        raw[24..24 + serial.len()].copy_from_slice(serial.as_bytes());
        raw[36] = macs.len() as u8;
        for (i, mac) in macs.iter().enumerate() {
            raw[40 + i * 6..46 + i * 6].copy_from_slice(mac);
        }
        raw
    }

    #[test]
    fn test_parse_record() {
        let macs = [[0x70, 0xFF, 0x76, 0x1C, 0x00, 0x01]];
        let raw = record("AM6-COMPROCEVM", "17E40001", &macs);
        let parsed = BoardEeprom::parse(&raw).unwrap();
        assert_eq!(parsed.name, "AM6-COMPROCEVM");
        assert_eq!(parsed.version, "A3");
        assert_eq!(parsed.serial, "17E40001");
        assert_eq!(parsed.mac_addrs.len(), 1);
        assert_eq!(parsed.mac_addrs[0], macs[0]);
    }

    #[test]
    fn test_bad_magic() {
        let mut raw = record("AM6-COMPROCEVM", "17E40001", &[]);
        raw[0] = 0;
        assert_eq!(
            BoardEeprom::parse(&raw).unwrap_err(),
            EepromError::BadMagic(0xEE33_5500)
        );
    }

    #[test]
    fn test_short_record() {
        assert_eq!(
            BoardEeprom::parse(&[0; 8]).unwrap_err(),
            EepromError::Malformed
        );
    }

    #[test]
    fn test_mac_count_clamped() {
        let mut raw = record("AM6-GPAPPEVM", "1", &[]);
        raw[36] = 200;
        let parsed = BoardEeprom::parse(&raw).unwrap();
        assert_eq!(parsed.mac_addrs.len(), MAX_MAC_ADDRS);
    }

    #[test]
    fn test_valid_ethaddr() {
        assert!(is_valid_ethaddr(&[0x70, 0xFF, 0x76, 0x1C, 0x00, 0x01]));
        assert!(!is_valid_ethaddr(&[0; 6]));
        // Group bit set.
        assert!(!is_valid_ethaddr(&[0x01, 0, 0x5E, 0, 0, 1]));
    }
}
