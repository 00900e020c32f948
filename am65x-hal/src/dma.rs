//! Packet DMA contract.
//!
//! The UDMA engine and its descriptor rings live behind this interface. The
//! Ethernet driver only requests named channels, hands receive buffers to the
//! hardware and shuttles single packets.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DmaError {
    #[error("no DMA channel with the requested name")]
    ChannelNotFound,
    #[error("channel is not enabled")]
    NotEnabled,
    #[error("no receive buffer available")]
    NoBuffer,
    #[error("receive buffer queue is full")]
    QueueFull,
    #[error("transfer failed")]
    TransferFailed,
}

/// A packet handed out by a receive channel.
///
/// The backing memory stays owned by the channel. It must not be accessed
/// anymore once the buffer has been returned to the hardware with
/// [DmaChannel::prepare_receive_buffer].
#[derive(Debug, Clone, Copy)]
pub struct ReceivedPacket {
    addr: *const u8,
    len: usize,
}

impl ReceivedPacket {
    #[inline]
    pub const fn new(addr: *const u8, len: usize) -> Self {
        Self { addr, len }
    }

    #[inline]
    pub const fn addr(&self) -> *const u8 {
        self.addr
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packet contents.
    ///
    /// # Safety
    ///
    /// The returned slice must be dropped before the backing buffer is
    /// recycled to the hardware.
    #[inline]
    pub unsafe fn bytes(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.addr, self.len) }
    }
}

/// A single TX or RX packet channel.
///
/// Dropping a channel releases it back to the DMA provider.
pub trait DmaChannel {
    fn enable(&mut self) -> Result<(), DmaError>;

    fn disable(&mut self) -> Result<(), DmaError>;

    /// Hands a receive buffer to the hardware.
    ///
    /// # Safety
    ///
    /// The buffer must stay valid and untouched until it is handed back by
    /// [Self::receive].
    unsafe fn prepare_receive_buffer(&mut self, addr: *mut u8, len: usize) -> Result<(), DmaError>;

    fn send(&mut self, packet: &[u8]) -> Result<(), DmaError>;

    /// Polls for a received packet.
    fn receive(&mut self) -> Result<Option<ReceivedPacket>, DmaError>;
}

/// Provider of named packet DMA channels.
pub trait PacketDma {
    type Channel: DmaChannel;

    fn channel_by_name(&mut self, name: &str) -> Result<Self::Channel, DmaError>;
}
