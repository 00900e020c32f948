//! RX buffer pool module.
//!
//! A fixed pool of receive buffers is handed to the RX channel at start of
//! day. Buffer ownership moves to the hardware on posting and comes back with
//! the received packet; consumed packets are recycled strictly in order, so a
//! running index modulo the pool size is all the bookkeeping needed.
use core::{cell::UnsafeCell, mem::MaybeUninit, sync::atomic::AtomicBool};

use crate::dma::{DmaChannel, DmaError};

/// Receive buffer size: a maximum size frame rounded up to the cache line.
pub const RX_BUF_SIZE: usize = 1536;
/// Default number of receive buffers.
pub const DEFAULT_RX_BUF_COUNT: usize = 4;

static RX_BUFS_TAKEN: AtomicBool = AtomicBool::new(false);

#[repr(C, align(64))]
#[derive(Debug, Clone, Copy)]
pub struct AlignedBuffer(pub [u8; RX_BUF_SIZE]);

/// This is a low level wrapper to simplify declaring the buffer pool backing
/// memory statically.
#[repr(transparent)]
pub struct BufferStorage<const N: usize>(pub UnsafeCell<MaybeUninit<[AlignedBuffer; N]>>);

unsafe impl<const N: usize> Sync for BufferStorage<N> {}

impl<const N: usize> BufferStorage<N> {
    #[inline]
    pub const fn new() -> Self {
        Self(UnsafeCell::new(MaybeUninit::uninit()))
    }

    /// Initializes the buffers and returns a mutable reference to them.
    pub fn take(&self) -> Option<&'static mut [AlignedBuffer; N]> {
        if RX_BUFS_TAKEN.swap(true, core::sync::atomic::Ordering::SeqCst) {
            return None;
        }
        let bufs = unsafe { &mut *self.0.get() };
        bufs.write([const { AlignedBuffer([0; RX_BUF_SIZE]) }; N]);
        Some(unsafe { bufs.assume_init_mut() })
    }
}

impl<const N: usize> Default for BufferStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequentially recycling receive buffer pool.
pub struct RxBufferPool<'a> {
    bufs: &'a mut [AlignedBuffer],
    next: u32,
}

impl<'a> RxBufferPool<'a> {
    #[inline]
    pub fn new(bufs: &'a mut [AlignedBuffer]) -> Self {
        Self { bufs, next: 0 }
    }

    #[allow(clippy::len_without_is_empty)]
    #[inline]
    pub fn len(&self) -> usize {
        self.bufs.len()
    }

    /// Posts every buffer of the pool to the channel and resets the recycle
    /// index.
    pub fn post_all(&mut self, channel: &mut impl DmaChannel) -> Result<(), DmaError> {
        for buf in self.bufs.iter_mut() {
            unsafe { channel.prepare_receive_buffer(buf.0.as_mut_ptr(), RX_BUF_SIZE)? };
        }
        self.next = 0;
        Ok(())
    }

    /// Returns the buffer of the oldest outstanding packet to the hardware.
    ///
    /// Packets are consumed in reception order, so no buffer address needs to
    /// be tracked.
    pub fn recycle_next(&mut self, channel: &mut impl DmaChannel) -> Result<(), DmaError> {
        let index = self.next as usize % self.bufs.len();
        unsafe {
            channel.prepare_receive_buffer(self.bufs[index].0.as_mut_ptr(), RX_BUF_SIZE)?;
        }
        self.next = self.next.wrapping_add(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dma::ReceivedPacket;

    #[derive(Default)]
    struct RecordingChannel {
        posted: std::vec::Vec<*mut u8>,
    }

    impl DmaChannel for RecordingChannel {
        fn enable(&mut self) -> Result<(), DmaError> {
            Ok(())
        }

        fn disable(&mut self) -> Result<(), DmaError> {
            Ok(())
        }

        unsafe fn prepare_receive_buffer(
            &mut self,
            addr: *mut u8,
            len: usize,
        ) -> Result<(), DmaError> {
            assert_eq!(len, RX_BUF_SIZE);
            self.posted.push(addr);
            Ok(())
        }

        fn send(&mut self, _packet: &[u8]) -> Result<(), DmaError> {
            Ok(())
        }

        fn receive(&mut self) -> Result<Option<ReceivedPacket>, DmaError> {
            Ok(None)
        }
    }

    extern crate std;

    #[test]
    fn test_post_and_recycle_order() {
        let mut bufs = [const { AlignedBuffer([0; RX_BUF_SIZE]) }; 4];
        let expected: std::vec::Vec<*mut u8> =
            bufs.iter_mut().map(|buf| buf.0.as_mut_ptr()).collect();
        let mut pool = RxBufferPool::new(&mut bufs);
        let mut channel = RecordingChannel::default();

        pool.post_all(&mut channel).unwrap();
        assert_eq!(channel.posted, expected);

        // Recycling walks the pool in order and wraps around.
        channel.posted.clear();
        for _ in 0..6 {
            pool.recycle_next(&mut channel).unwrap();
        }
        assert_eq!(
            channel.posted,
            [
                expected[0],
                expected[1],
                expected[2],
                expected[3],
                expected[0],
                expected[1]
            ]
        );
    }

    #[test]
    fn test_post_all_resets_recycle_index() {
        let mut bufs = [const { AlignedBuffer([0; RX_BUF_SIZE]) }; 2];
        let first = bufs[0].0.as_mut_ptr();
        let mut pool = RxBufferPool::new(&mut bufs);
        let mut channel = RecordingChannel::default();

        pool.recycle_next(&mut channel).unwrap();
        pool.post_all(&mut channel).unwrap();
        channel.posted.clear();
        pool.recycle_next(&mut channel).unwrap();
        assert_eq!(channel.posted, [first]);
    }
}
