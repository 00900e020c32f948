//! Load-time firmware configuration.
//!
//! The PRU firmware reads its configuration record from the start of the
//! shared data RAM, at a per-slice offset. The record is little-endian on the
//! wire independently of the host byte order.
use am65x::icssg::SLICE_1_CONFIG_OFFSET;

use super::topology::SliceId;

/// Number of TX buffer size slots in the configuration record.
pub const NUM_TX_BUF_SLOTS: usize = 16;
/// Buffer size programmed into the slots backing the bootloader TX path.
pub const TX_BUF_SIZE: u32 = 0x1800;
/// First TX buffer slot used by the bootloader firmware.
pub const FIRST_TX_BUF_SLOT: usize = 8;

/// Size of the serialized record in bytes.
pub const CONFIG_SIZE: usize = core::mem::size_of::<FirmwareConfig>();

/// Load-time configuration record for one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct FirmwareConfig {
    status: u32,
    addr_lo: u32,
    addr_hi: u32,
    tx_buf_sz: [u32; NUM_TX_BUF_SLOTS],
    num_tx_threads: u32,
    rx_flow_id: u32,
    rx_mgr_flow_id: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<FirmwareConfig>(), 88);

impl FirmwareConfig {
    /// Creates the record for the bootloader use case: a single RX flow with
    /// id 0 for the host port, no additional TX threads and the upper half of
    /// the TX buffer slots pointing into the SRAM carve-out at
    /// `buffer_pool_addr`.
    pub fn new_load_time(buffer_pool_addr: u64) -> Self {
        let mut tx_buf_sz = [0; NUM_TX_BUF_SLOTS];
        for slot in tx_buf_sz.iter_mut().skip(FIRST_TX_BUF_SLOT) {
            *slot = TX_BUF_SIZE;
        }
        Self {
            status: 0,
            addr_lo: buffer_pool_addr as u32,
            addr_hi: (buffer_pool_addr >> 32) as u32,
            tx_buf_sz,
            num_tx_threads: 0,
            rx_flow_id: 0,
            rx_mgr_flow_id: 0,
        }
    }

    pub fn to_le_words(&self) -> [u32; CONFIG_SIZE / 4] {
        let mut words = [0; CONFIG_SIZE / 4];
        words[0] = self.status.to_le();
        words[1] = self.addr_lo.to_le();
        words[2] = self.addr_hi.to_le();
        for (word, size) in words[3..3 + NUM_TX_BUF_SLOTS]
            .iter_mut()
            .zip(self.tx_buf_sz.iter())
        {
            *word = size.to_le();
        }
        words[19] = self.num_tx_threads.to_le();
        words[20] = self.rx_flow_id.to_le();
        words[21] = self.rx_mgr_flow_id.to_le();
        words
    }

    /// Copies the record into the shared RAM region of the slice.
    ///
    /// # Safety
    ///
    /// `shared_ram` must point to the mapped shared data RAM of the ICSSG
    /// instance owning the slice.
    pub unsafe fn write_to_shared_ram(&self, shared_ram: *mut u32, slice: SliceId) {
        let words = self.to_le_words();
        let base = unsafe { shared_ram.byte_add(slice.index() * SLICE_1_CONFIG_OFFSET) };
        for (i, word) in words.iter().enumerate() {
            unsafe { core::ptr::write_volatile(base.add(i), *word) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_time_record() {
        let config = FirmwareConfig::new_load_time(0x7000_1000);
        let words = config.to_le_words();
        // status
        assert_eq!(words[0], 0);
        // buffer pool address split
        assert_eq!(words[1], 0x7000_1000);
        assert_eq!(words[2], 0);
        // lower TX buffer slots stay unused
        for word in &words[3..3 + FIRST_TX_BUF_SLOT] {
            assert_eq!(*word, 0);
        }
        for word in &words[3 + FIRST_TX_BUF_SLOT..3 + NUM_TX_BUF_SLOTS] {
            assert_eq!(*word, TX_BUF_SIZE);
        }
        // thread count and flow ids
        assert_eq!(words[19], 0);
        assert_eq!(words[20], 0);
        assert_eq!(words[21], 0);
    }

    #[test]
    fn test_wide_buffer_pool_addr() {
        let config = FirmwareConfig::new_load_time(0x8_7000_0000);
        let words = config.to_le_words();
        assert_eq!(words[1], 0x7000_0000);
        assert_eq!(words[2], 0x8);
    }
}
