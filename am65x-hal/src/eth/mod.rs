//! # ICSSG PRU Ethernet driver
//!
//! Firmware assisted Ethernet offload on the programmable real-time units.
//! The driver resolves which ICSSG instances and slices carry ingress and
//! egress traffic, writes the load-time firmware configuration into shared
//! RAM, sequences PHY, clock and classifier bring-up and shuttles single
//! packets through named packet DMA channels.
use am65x::ctrl_mmr::MmioIcssgRgmiiControl;
use am65x::icssg::{Icssg, MSMC_RAM_SIZE, MmioMiiGRt, MmioTaskManager};
use am65x::mdio::MmioMdio;

use crate::{
    ErrorCode,
    clocks::ModuleClock,
    dma::{DmaChannel, DmaError, PacketDma, ReceivedPacket},
    time::Hertz,
};

pub mod classifier;
pub mod config;
pub mod mdio;
pub mod phy;
pub mod rx_pool;
pub mod topology;

pub use classifier::Classifier;
pub use config::FirmwareConfig;
pub use mdio::Mdio;
pub use phy::{EthernetPhy, Link, PhyInterface};
pub use rx_pool::{AlignedBuffer, RxBufferPool};
pub use topology::{NUM_ICSSG, PortNodes, PortSlice, SliceId, Topology, TopologyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PruethError {
    #[error("topology resolution failed: {0}")]
    Topology(#[from] TopologyError),
    #[error("paired ICSSG resources missing")]
    MissingPairedResources,
    #[error("DMA error: {0}")]
    Dma(#[from] DmaError),
    #[error("MDIO functional clock error: {0}")]
    Clock(ErrorCode),
    #[error("PHY error: {0}")]
    Phy(ErrorCode),
}

/// Register blocks and memory regions of one ICSSG instance, as handed out
/// by the subsystem driver.
pub struct IcssgResources {
    pub mii_g_rt: MmioMiiGRt<'static>,
    pub task_manager: MmioTaskManager<'static>,
    /// Mapped shared data RAM of the instance.
    pub shared_ram: *mut u32,
}

#[derive(Debug, Clone, Copy)]
pub struct PruethConfig {
    /// The interface is served by a pair of ICSSG instances.
    pub dual_icssg: bool,
    /// Declared MII port sub-nodes.
    pub ports: PortNodes,
    pub mac_address: [u8; 6],
    pub phy_interface: PhyInterface,
    /// Provide the RGMII transmit delay internally instead of relying on the
    /// board or the PHY.
    pub enable_rgmii_delay: bool,
    /// Control module word of the ICSSG instance the port is wired to.
    pub rgmii_ctrl_sel: Icssg,
    pub mdio_bus_freq: Hertz,
    /// Physical base of the SRAM carve-out backing the firmware buffer pools.
    pub sram_base: u64,
}

/// ICSSG PRU Ethernet driver instance.
pub struct Prueth<D: PacketDma, P: EthernetPhy> {
    topology: Topology,
    classifiers: [Option<Classifier>; NUM_ICSSG],
    task_managers: [Option<MmioTaskManager<'static>>; NUM_ICSSG],
    mdio: Mdio,
    dma: D,
    phy: P,
    mac_address: [u8; 6],
    rx_pool: RxBufferPool<'static>,
    dma_tx: Option<D::Channel>,
    dma_rx: Option<D::Channel>,
    link: Option<Link>,
}

impl<D: PacketDma, P: EthernetPhy> Prueth<D, P> {
    /// Creates the driver instance and performs the probe-time sequencing:
    /// topology resolution, RGMII delay policy, MDIO functional clock and bus
    /// bring-up, PHY configuration and the load-time firmware configuration
    /// of each active slice.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PruethConfig,
        primary: IcssgResources,
        paired: Option<IcssgResources>,
        rgmii_ctrl: &mut MmioIcssgRgmiiControl<'static>,
        mdio_regs: MmioMdio<'static>,
        mdio_fck: &mut impl ModuleClock,
        dma: D,
        mut phy: P,
        rx_bufs: &'static mut [AlignedBuffer],
    ) -> Result<Self, PruethError> {
        let topology = Topology::resolve(config.dual_icssg, config.ports)?;
        if config.dual_icssg && paired.is_none() {
            return Err(PruethError::MissingPairedResources);
        }

        mdio_fck.enable().map_err(PruethError::Clock)?;

        if config.phy_interface.is_rgmii() {
            Self::apply_rgmii_delay_policy(config, rgmii_ctrl);
        }

        let mut mdio = Mdio::new(mdio_regs, mdio_fck.rate(), config.mdio_bus_freq);
        if let Err(e) = phy.configure() {
            log::error!("PHY configuration failed: {e}");
            mdio.disable();
            if let Err(e) = mdio_fck.disable() {
                log::warn!("disabling MDIO functional clock failed: {e}");
            }
            return Err(PruethError::Phy(e));
        }

        // Load-time firmware configuration for each active slice. The paired
        // instance owns the second half of the SRAM carve-out.
        unsafe {
            FirmwareConfig::new_load_time(config.sram_base)
                .write_to_shared_ram(primary.shared_ram, topology.config_slice(0));
        }
        if let Some(paired) = &paired {
            unsafe {
                FirmwareConfig::new_load_time(config.sram_base + MSMC_RAM_SIZE as u64)
                    .write_to_shared_ram(paired.shared_ram, topology.config_slice(1));
            }
        }

        let mut classifiers = [None, None];
        let mut task_managers = [None, None];
        classifiers[0] = Some(Classifier::new(primary.mii_g_rt));
        task_managers[0] = Some(primary.task_manager);
        if let Some(paired) = paired {
            classifiers[1] = Some(Classifier::new(paired.mii_g_rt));
            task_managers[1] = Some(paired.task_manager);
        }

        Ok(Self {
            topology,
            classifiers,
            task_managers,
            mdio,
            dma,
            phy,
            mac_address: config.mac_address,
            rx_pool: RxBufferPool::new(rx_bufs),
            dma_tx: None,
            dma_rx: None,
            link: None,
        })
    }

    fn apply_rgmii_delay_policy(
        config: PruethConfig,
        rgmii_ctrl: &mut MmioIcssgRgmiiControl<'static>,
    ) {
        let delay_disabled = !config.enable_rgmii_delay;
        match config.rgmii_ctrl_sel {
            Icssg::Icssg0 => rgmii_ctrl.modify_icssg0(|mut val| {
                val.set_internal_delay_disabled(delay_disabled);
                val
            }),
            Icssg::Icssg1 => rgmii_ctrl.modify_icssg1(|mut val| {
                val.set_internal_delay_disabled(delay_disabled);
                val
            }),
            Icssg::Icssg2 => rgmii_ctrl.modify_icssg2(|mut val| {
                val.set_internal_delay_disabled(delay_disabled);
                val
            }),
        }
    }

    fn classifier_mut(&mut self, icssg: usize) -> Result<&mut Classifier, PruethError> {
        self.classifiers[icssg]
            .as_mut()
            .ok_or(PruethError::MissingPairedResources)
    }

    /// Starts the interface: programs the ingress classifier, requests the
    /// DMA channels by name, posts all receive buffers, enables both channels
    /// and starts the PHY.
    pub fn start(&mut self) -> Result<(), PruethError> {
        let ingress = self.topology.ingress();
        let mac_address = self.mac_address;
        let classifier = self.classifier_mut(ingress.icssg)?;
        classifier.set_mac_addr(ingress.slice, &mac_address);
        classifier.set_default(ingress.slice);

        let tx_name = self.topology.tx_channel_name();
        let rx_name = self.topology.rx_channel_name();
        let mut dma_tx = self.dma.channel_by_name(&tx_name).inspect_err(|e| {
            log::error!("TX dma get failed: {e}");
        })?;
        let mut dma_rx = self.dma.channel_by_name(&rx_name).inspect_err(|e| {
            log::error!("RX dma get failed: {e}");
        })?;

        self.rx_pool.post_all(&mut dma_rx).inspect_err(|e| {
            log::error!("RX dma add buf failed: {e}");
        })?;

        dma_tx.enable().inspect_err(|e| {
            log::error!("TX dma enable failed: {e}");
        })?;
        if let Err(e) = dma_rx.enable() {
            log::error!("RX dma enable failed: {e}");
            dma_tx.disable().ok();
            return Err(e.into());
        }
        match self.phy.startup() {
            Ok(link) => self.link = Some(link),
            Err(e) => {
                log::error!("PHY startup failed: {e}");
                dma_rx.disable().ok();
                dma_tx.disable().ok();
                return Err(PruethError::Phy(e));
            }
        }
        self.dma_tx = Some(dma_tx);
        self.dma_rx = Some(dma_rx);
        Ok(())
    }

    /// Queues a single packet for transmission.
    pub fn send(&mut self, packet: &[u8]) -> Result<(), PruethError> {
        let tx = self
            .dma_tx
            .as_mut()
            .ok_or(PruethError::Dma(DmaError::NotEnabled))?;
        Ok(tx.send(packet)?)
    }

    /// Polls for a received packet. The packet buffer stays owned by the
    /// hardware pool and must be returned with [Self::free_packet].
    pub fn recv(&mut self) -> Result<Option<ReceivedPacket>, PruethError> {
        let rx = self
            .dma_rx
            .as_mut()
            .ok_or(PruethError::Dma(DmaError::NotEnabled))?;
        Ok(rx.receive()?)
    }

    /// Returns the buffer of a consumed packet to the receive pool.
    pub fn free_packet(&mut self, packet: ReceivedPacket) -> Result<(), PruethError> {
        if packet.is_empty() {
            return Ok(());
        }
        let rx = self
            .dma_rx
            .as_mut()
            .ok_or(PruethError::Dma(DmaError::NotEnabled))?;
        log::debug!("free packet, length {}", packet.len());
        Ok(self.rx_pool.recycle_next(rx)?)
    }

    /// Stops the interface. Errors on the way down are logged, not
    /// propagated.
    pub fn stop(&mut self) {
        let ingress = self.topology.ingress();
        if let Some(classifier) = self.classifiers[ingress.icssg].as_mut() {
            classifier.disable(ingress.slice);
        }
        self.phy.shutdown();
        self.link = None;
        if let Some(mut tx) = self.dma_tx.take()
            && let Err(e) = tx.disable()
        {
            log::warn!("TX dma disable failed: {e}");
        }
        if let Some(mut rx) = self.dma_rx.take()
            && let Err(e) = rx.disable()
        {
            log::warn!("RX dma disable failed: {e}");
        }
        // Firmware shutdown workaround: clear the task manager control word
        // of every slice the interface used.
        self.clear_task_manager(ingress);
        if self.topology.dual_icssg() {
            self.clear_task_manager(self.topology.egress());
        }
    }

    fn clear_task_manager(&mut self, port: PortSlice) {
        if let Some(tm) = self.task_managers[port.icssg].as_mut() {
            match port.slice {
                SliceId::Slice0 => tm.write_slice_0_ctrl(0),
                SliceId::Slice1 => tm.write_slice_1_ctrl(0),
            }
        }
    }

    /// Link state negotiated at [Self::start].
    #[inline]
    pub fn link(&self) -> Option<Link> {
        self.link
    }

    #[inline]
    pub fn mdio_mut(&mut self) -> &mut Mdio {
        &mut self.mdio
    }

    delegate::delegate! {
        to self.topology {
            #[inline]
            pub const fn dual_icssg(&self) -> bool;

            #[inline]
            pub const fn ingress(&self) -> PortSlice;

            #[inline]
            pub const fn egress(&self) -> PortSlice;
        }
    }
}
