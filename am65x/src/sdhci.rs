//! # SD host controller register module.
//!
//! Each MMC/SD instance consists of two register regions: the standard SD
//! host register file ([SdHost]) and the AM654 subsystem region ([SdSubsystem])
//! which carries the slot configuration and the IO PHY with its delay lines.
use arbitrary_int::{u2, u3, u4, u5, u6, u12};

pub const MMC_0_BASE_ADDR: usize = 0x04F8_0000;
pub const MMC_0_SS_BASE_ADDR: usize = 0x04F9_0000;
pub const MMC_1_BASE_ADDR: usize = 0x04FA_0000;
pub const MMC_1_SS_BASE_ADDR: usize = 0x04FB_0000;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct BlockParams {
    #[bits(16..=31, rw)]
    blocks_count: u16,
    /// SDMA buffer boundary, encoded as 4 kB times two to the power of this value.
    #[bits(12..=14, rw)]
    sdma_boundary: u3,
    #[bits(0..=11, rw)]
    block_size: u12,
}

#[bitbybit::bitenum(u2, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum CommandType {
    Normal = 0b00,
    Suspend = 0b01,
    Resume = 0b10,
    Abort = 0b11,
}

#[bitbybit::bitenum(u2, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum ResponseLength {
    NoResponse = 0b00,
    ResponseLength136 = 0b01,
    ResponseLength48 = 0b10,
    ResponseLength48Busy = 0b11,
}

#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum TransferDirection {
    /// Host to card.
    Write = 0,
    /// Card to host.
    Read = 1,
}

/// Transfer mode register at 0x0C and command register at 0x0E, combined.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct TransferModeAndCommand {
    /// Set to command number (CMD0-63, ACMD0-63)
    #[bits(24..=29, rw)]
    command_index: u6,
    #[bits(22..=23, rw)]
    command_type: CommandType,
    #[bit(21, rw)]
    data_is_present: bool,
    /// When 1, the host controller checks the index field in the response to see if it has the
    /// same value as the command index.
    #[bit(20, rw)]
    command_index_check_enable: bool,
    /// When 1, the host controller checks the CRC field in the response.
    #[bit(19, rw)]
    command_crc_check_enable: bool,
    #[bits(16..=17, rw)]
    response_type_select: ResponseLength,
    #[bit(5, rw)]
    multi_block_select: bool,
    #[bit(4, rw)]
    data_transfer_direction: TransferDirection,
    /// Multiple block transfers for memory require CMD12 to stop the transaction. When this bit
    /// is 1, the host controller issues CMD12 automatically when completing the last block
    /// transfer.
    #[bit(2, rw)]
    auto_cmd12_enable: bool,
    #[bit(1, rw)]
    block_count_enable: bool,
    #[bit(0, rw)]
    dma_enable: bool,
}

#[bitbybit::bitfield(u32, debug)]
pub struct PresentState {
    #[bit(24, r)]
    cmd_line_signal_level: bool,
    #[bits(20..=23, r)]
    data_line_signal_level: u4,
    #[bit(19, r)]
    write_protect_switch_level: bool,
    #[bit(18, r)]
    card_detect_pin_level: bool,
    #[bit(17, r)]
    card_state_stable: bool,
    #[bit(16, r)]
    card_inserted: bool,
    #[bit(11, r)]
    buffer_read_enable: bool,
    #[bit(10, r)]
    buffer_write_enable: bool,
    #[bit(9, r)]
    read_transfer_active: bool,
    #[bit(8, r)]
    write_transfer_active: bool,
    #[bit(2, r)]
    dat_line_active: bool,
    #[bit(1, r)]
    command_inhibit_dat: bool,
    #[bit(0, r)]
    command_inhibit_cmd: bool,
}

#[bitbybit::bitenum(u2, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum DmaSelect {
    Sdma = 0b00,
    Adma2 = 0b10,
    Adma2Or3 = 0b11,
}

/// Host control 1, power control, block gap and wakeup registers at 0x28, combined.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct HostControl1AndPower {
    #[bits(9..=11, rw)]
    bus_voltage_select: u3,
    #[bit(8, rw)]
    bus_power: bool,
    /// Enables the 8-bit bus width of embedded devices.
    #[bit(5, rw)]
    extended_data_width: bool,
    #[bits(3..=4, rw)]
    dma_select: Option<DmaSelect>,
    #[bit(2, rw)]
    high_speed_enable: bool,
    #[bit(1, rw)]
    data_width_4_bit: bool,
    #[bit(0, rw)]
    led_control: bool,
}

/// Clock control, timeout control and software reset registers at 0x2C, combined.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct ClockAndResetControl {
    #[bit(26, rw)]
    software_reset_dat: bool,
    #[bit(25, rw)]
    software_reset_cmd: bool,
    #[bit(24, rw)]
    software_reset_all: bool,
    #[bits(16..=19, rw)]
    data_timeout_counter: u4,
    /// Lower 8 bits of the 10-bit divided clock divisor.
    #[bits(8..=15, rw)]
    sd_clock_divisor: u8,
    /// Upper 2 bits of the 10-bit divided clock divisor.
    #[bits(6..=7, rw)]
    sd_clock_divisor_upper: u2,
    #[bit(2, rw)]
    sd_clock_enable: bool,
    #[bit(1, r)]
    internal_clock_stable: bool,
    #[bit(0, rw)]
    internal_clock_enable: bool,
}

/// Interrupt status layout, shared by the status, status enable and signal enable registers.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct InterruptBits {
    #[bit(28, rw)]
    tuning_error: bool,
    #[bit(25, rw)]
    adma_error: bool,
    #[bit(24, rw)]
    auto_cmd_error: bool,
    #[bit(22, rw)]
    data_end_bit_error: bool,
    #[bit(21, rw)]
    data_crc_error: bool,
    #[bit(20, rw)]
    data_timeout_error: bool,
    #[bit(19, rw)]
    command_index_error: bool,
    #[bit(18, rw)]
    command_end_bit_error: bool,
    #[bit(17, rw)]
    command_crc_error: bool,
    #[bit(16, rw)]
    command_timeout_error: bool,
    #[bit(15, r)]
    error_interrupt: bool,
    #[bit(12, rw)]
    retuning_event: bool,
    #[bit(8, rw)]
    card_interrupt: bool,
    #[bit(7, rw)]
    card_removal: bool,
    #[bit(6, rw)]
    card_insertion: bool,
    /// Valid data exists in the host side buffer, also raised for tuning block reception.
    #[bit(5, rw)]
    buffer_read_ready: bool,
    #[bit(4, rw)]
    buffer_write_ready: bool,
    #[bit(3, rw)]
    dma_interrupt: bool,
    #[bit(2, rw)]
    block_gap_event: bool,
    #[bit(1, rw)]
    transfer_complete: bool,
    #[bit(0, rw)]
    command_complete: bool,
}

#[bitbybit::bitenum(u3, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum UhsMode {
    Sdr12 = 0b000,
    Sdr25 = 0b001,
    Sdr50 = 0b010,
    Sdr104 = 0b011,
    Ddr50 = 0b100,
    Hs400 = 0b101,
}

/// Auto CMD error status register at 0x3C and host control 2 at 0x3E, combined.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct HostControl2 {
    #[bit(31, rw)]
    preset_value_enable: bool,
    #[bit(30, rw)]
    async_interrupt_enable: bool,
    /// Set by the host driver to use the tuned sampling clock. Cleared by the
    /// controller when tuning fails.
    #[bit(23, rw)]
    sampling_clock_select: bool,
    /// Set by the host driver to start the tuning procedure. The controller
    /// clears this bit when tuning completes.
    #[bit(22, rw)]
    execute_tuning: bool,
    #[bits(20..=21, rw)]
    driver_strength_select: u2,
    #[bit(19, rw)]
    signaling_1v8_enable: bool,
    #[bits(16..=18, rw)]
    uhs_mode_select: Option<UhsMode>,
    #[bit(7, r)]
    auto_cmd12_not_issued: bool,
    #[bit(4, r)]
    auto_cmd_index_error: bool,
    #[bit(3, r)]
    auto_cmd_end_bit_error: bool,
    #[bit(2, r)]
    auto_cmd_crc_error: bool,
    #[bit(1, r)]
    auto_cmd_timeout_error: bool,
    #[bit(0, r)]
    auto_cmd12_not_executed: bool,
}

/// Standard SD host controller register file.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct SdHost {
    sdma_address: u32,
    block: BlockParams,
    argument: u32,
    transfer: TransferModeAndCommand,
    #[mmio(PureRead)]
    response: [u32; 4],
    buffer_data_port: u32,
    #[mmio(PureRead)]
    present_state: PresentState,
    host_control_1_and_power: HostControl1AndPower,
    clock_and_reset: ClockAndResetControl,
    interrupt_status: InterruptBits,
    interrupt_status_enable: InterruptBits,
    interrupt_signal_enable: InterruptBits,
    host_control_2: HostControl2,
}

static_assertions::const_assert_eq!(core::mem::size_of::<SdHost>(), 0x40);

impl SdHost {
    /// Create a new MMC0 host register instance at address [MMC_0_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    pub const unsafe fn new_mmio_fixed_0() -> MmioSdHost<'static> {
        unsafe { Self::new_mmio_at(MMC_0_BASE_ADDR) }
    }

    /// Create a new MMC1 host register instance at address [MMC_1_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// See [Self::new_mmio_fixed_0].
    pub const unsafe fn new_mmio_fixed_1() -> MmioSdHost<'static> {
        unsafe { Self::new_mmio_at(MMC_1_BASE_ADDR) }
    }
}

#[bitbybit::bitenum(u2, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum SlotType {
    Removable = 0b00,
    Embedded = 0b01,
    SharedBus = 0b10,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct CtlConfig2 {
    #[bits(30..=31, rw)]
    slot_type: Option<SlotType>,
}

/// Output driver impedance encoding of the DR_TY field.
#[bitbybit::bitenum(u3, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum DriverStrength {
    Ohm50 = 0b000,
    Ohm33 = 0b001,
    Ohm66 = 0b010,
    Ohm100 = 0b011,
    Ohm40 = 0b100,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct PhyControl1 {
    /// When set, the IO pads are controlled by the test IO mux instead of the controller.
    #[bit(31, rw)]
    iomux_enable: bool,
    #[bits(20..=22, rw)]
    driver_strength: Option<DriverStrength>,
    /// Requests a DLL retrim after a tap delay change.
    #[bit(17, rw)]
    retrim: bool,
    /// DLL charge pump trim current.
    #[bits(4..=7, rw)]
    dll_trim_icp: u4,
    #[bit(1, rw)]
    enable_dll: bool,
    /// Power down bias. Must be up for IO line calibration.
    #[bit(0, rw)]
    power_down_bias: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct PhyControl4 {
    #[bits(24..=27, rw)]
    strobe_select: u4,
    #[bit(20, rw)]
    otap_delay_enable: bool,
    #[bits(12..=15, rw)]
    otap_delay_select: u4,
    #[bit(8, rw)]
    itap_delay_enable: bool,
    #[bits(0..=4, rw)]
    itap_delay_select: u5,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct PhyControl5 {
    /// Selects the 100 MHz DLL frequency range.
    #[bit(9, rw)]
    frequency_sel_100: bool,
    /// Selects the 50 MHz DLL frequency range.
    #[bit(8, rw)]
    frequency_sel_50: bool,
    #[bits(0..=2, rw)]
    clock_buffer_select: u3,
}

#[bitbybit::bitfield(u32, debug)]
pub struct PhyStatus1 {
    /// Set once the IO line impedance calibration has finished.
    #[bit(1, r)]
    calibration_done: bool,
    /// Set once the delay line has locked onto the clock.
    #[bit(0, r)]
    dll_ready: bool,
}

/// AM654 MMC subsystem register region: slot configuration and IO PHY.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct SdSubsystem {
    #[mmio(PureRead)]
    pid: u32,
    _reserved0: [u32; 4],
    ctl_cfg_2: CtlConfig2,
    _reserved1: [u32; 58],
    phy_ctrl_1: PhyControl1,
    phy_ctrl_2: u32,
    phy_ctrl_3: u32,
    phy_ctrl_4: PhyControl4,
    phy_ctrl_5: PhyControl5,
    phy_ctrl_6: u32,
    _reserved2: [u32; 6],
    #[mmio(PureRead)]
    phy_stat_1: PhyStatus1,
    #[mmio(PureRead)]
    phy_stat_2: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<SdSubsystem>(), 0x138);

impl SdSubsystem {
    /// Create a new MMC0 subsystem register instance at address [MMC_0_SS_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// See [SdHost::new_mmio_fixed_0].
    pub const unsafe fn new_mmio_fixed_0() -> MmioSdSubsystem<'static> {
        unsafe { Self::new_mmio_at(MMC_0_SS_BASE_ADDR) }
    }

    /// Create a new MMC1 subsystem register instance at address [MMC_1_SS_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// See [SdHost::new_mmio_fixed_0].
    pub const unsafe fn new_mmio_fixed_1() -> MmioSdSubsystem<'static> {
        unsafe { Self::new_mmio_at(MMC_1_SS_BASE_ADDR) }
    }
}
