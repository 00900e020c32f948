//! # AM654 SD host controller driver
//!
//! The controller itself is a standard SD host; what is specific to this SoC
//! is the subsystem region wrapped around it: slot configuration, the IO line
//! calibration and the output tap delay / delay line (DLL) machinery which
//! has to be re-sequenced on every clock change. The MMC command layer stays
//! external, the tuning procedure reaches it through
//! [TuningCommandIssuer].
use am65x::sdhci::{
    BlockParams, ClockAndResetControl, DriverStrength, InterruptBits, MmioSdHost, MmioSdSubsystem,
    SlotType, TransferDirection, TransferModeAndCommand, UhsMode,
};
use arbitrary_int::{u2, u4, u12};
use embedded_hal::delay::DelayNs;
use num_enum::TryFromPrimitive;

use crate::{ErrorCode, clocks::ModuleClock, power::PowerDomain, time::Hertz};

pub mod phy;

pub use phy::DllFrequency;

/// Minimum bus frequency served without the delay line.
pub const MIN_FREQ: Hertz = Hertz::from_raw(400_000);

pub const TUNING_LOOP_COUNT: usize = 40;

/// Poll budget for the internal clock to stabilize, in milliseconds.
pub const CLOCK_STABLE_TRIES: u32 = 150;

pub const CMD_SEND_TUNING_BLOCK: u8 = 19;
pub const CMD_SEND_TUNING_BLOCK_HS200: u8 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SdhciError {
    #[error("IO line calibration timed out")]
    CalibrationTimeout,
    #[error("delay line failed to lock")]
    DllLockTimeout,
    #[error("internal clock did not stabilize")]
    ClockStableTimeout,
    #[error("tuning failed")]
    TuningFailed,
    #[error("invalid driver strength value {0} ohm")]
    InvalidDriverStrength(u32),
    #[error("power domain error: {0}")]
    PowerDomain(ErrorCode),
    #[error("command error: {0}")]
    Command(ErrorCode),
}

/// Driver strength values accepted from board configuration, in ohms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum DriverStrengthOhms {
    Ohm50 = 50,
    Ohm33 = 33,
    Ohm66 = 66,
    Ohm100 = 100,
    Ohm40 = 40,
}

impl DriverStrengthOhms {
    /// Register encoding of the ohm value.
    pub const fn register_value(&self) -> DriverStrength {
        match self {
            DriverStrengthOhms::Ohm50 => DriverStrength::Ohm50,
            DriverStrengthOhms::Ohm33 => DriverStrength::Ohm33,
            DriverStrengthOhms::Ohm66 => DriverStrength::Ohm66,
            DriverStrengthOhms::Ohm100 => DriverStrength::Ohm100,
            DriverStrengthOhms::Ohm40 => DriverStrength::Ohm40,
        }
    }
}

/// Board level configuration of one host instance.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub otap_delay_select: u4,
    pub trim_icp: u4,
    pub driver_strength: DriverStrength,
    pub non_removable: bool,
}

impl Config {
    /// Creates the configuration from the raw board values, validating the
    /// driver strength.
    pub fn new(
        otap_delay_select: u4,
        trim_icp: u4,
        driver_strength_ohms: u32,
        non_removable: bool,
    ) -> Result<Self, SdhciError> {
        let strength = DriverStrengthOhms::try_from(driver_strength_ohms)
            .map_err(|_| SdhciError::InvalidDriverStrength(driver_strength_ohms))?;
        Ok(Self {
            otap_delay_select,
            trim_icp,
            driver_strength: strength.register_value(),
            non_removable,
        })
    }
}

/// Narrow contract to the MMC command layer for tuning block reads.
pub trait TuningCommandIssuer {
    /// Issues the given tuning block read command and waits for completion.
    fn send_tuning_command(&mut self, opcode: u8) -> Result<(), ErrorCode>;
}

pub struct Am654Sdhci {
    host: MmioSdHost<'static>,
    ss: MmioSdSubsystem<'static>,
    config: Config,
    base_clock: Hertz,
    dll_on: bool,
}

impl Am654Sdhci {
    /// Probe-time bring-up: powers the domain up (when one is attached),
    /// discovers the base clock rate and runs the one-time controller
    /// initialization.
    pub fn probe(
        host: MmioSdHost<'static>,
        ss: MmioSdSubsystem<'static>,
        config: Config,
        power_domain: Option<&mut dyn PowerDomain>,
        clock: &impl ModuleClock,
        delay: &mut impl DelayNs,
    ) -> Result<Self, SdhciError> {
        if let Some(domain) = power_domain {
            domain.on().map_err(SdhciError::PowerDomain)?;
        }
        let base_clock = clock.rate();
        let mut sdhci = Self {
            host,
            ss,
            config,
            base_clock,
            dll_on: false,
        };
        sdhci.init(delay)?;
        Ok(sdhci)
    }

    /// One-time initialization: OTAP delay reset, IO line calibration, pin
    /// mux enable and slot type.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), SdhciError> {
        phy::disable_output_tap_delay(&mut self.ss);
        phy::calibrate_io_lines(&mut self.ss, delay)?;
        // Enable the pins by taking the test IO mux out of the path.
        self.ss.modify_phy_ctrl_1(|mut val| {
            val.set_iomux_enable(false);
            val
        });
        let slot_type = if self.config.non_removable {
            SlotType::Embedded
        } else {
            SlotType::Removable
        };
        self.ss.modify_ctl_cfg_2(|mut val| {
            val.set_slot_type(slot_type);
            val
        });
        Ok(())
    }

    /// Computes the 10-bit divided clock divisor: the card clock is the base
    /// clock divided by twice the divisor, zero meaning undivided.
    pub fn calculate_clock_divisor(base: Hertz, target: Hertz) -> u16 {
        if target >= base {
            return 0;
        }
        let target = target.raw().max(1);
        base.raw().div_ceil(2 * target).min(0x3FF) as u16
    }

    fn set_card_clock(
        &mut self,
        target: Hertz,
        delay: &mut impl DelayNs,
    ) -> Result<(), SdhciError> {
        let divisor = Self::calculate_clock_divisor(self.base_clock, target);
        let mut val = ClockAndResetControl::new_with_raw_value(0);
        val.set_sd_clock_divisor((divisor & 0xFF) as u8);
        val.set_sd_clock_divisor_upper(u2::new((divisor >> 8) as u8));
        val.set_internal_clock_enable(true);
        self.host.write_clock_and_reset(val);
        let mut tries = CLOCK_STABLE_TRIES;
        while !self.host.read_clock_and_reset().internal_clock_stable() {
            if tries == 0 {
                return Err(SdhciError::ClockStableTimeout);
            }
            tries -= 1;
            delay.delay_ms(1);
        }
        val.set_sd_clock_enable(true);
        self.host.write_clock_and_reset(val);
        Ok(())
    }

    /// Post clock-change sequencing: gates the card clock, drops the delay
    /// line, reprograms the divided clock and brings the output tap delay and
    /// the delay line back up for speeds above [MIN_FREQ].
    pub fn set_ios_post(
        &mut self,
        speed: Hertz,
        delay: &mut impl DelayNs,
    ) -> Result<(), SdhciError> {
        self.host.modify_clock_and_reset(|mut val| {
            val.set_sd_clock_enable(false);
            val
        });

        if self.dll_on {
            phy::disable_dll(&mut self.ss);
            self.dll_on = false;
        }

        self.set_card_clock(speed, delay)?;

        if speed > MIN_FREQ {
            phy::enable_output_tap_delay(&mut self.ss, self.config.otap_delay_select);
            phy::configure_dll(
                &mut self.ss,
                DllFrequency::for_speed(speed),
                self.config.trim_icp,
                self.config.driver_strength,
            );
            phy::wait_dll_ready(&mut self.ss, delay)?;
            self.dll_on = true;
        }
        Ok(())
    }

    /// Programs the signalling voltage and UHS timing mode.
    pub fn set_control_reg(&mut self, timing: UhsMode, is_sd: bool, signal_voltage_1v8: bool) {
        if is_sd && signal_voltage_1v8 {
            self.host.modify_host_control_2(|mut val| {
                val.set_signaling_1v8_enable(true);
                val
            });
        }
        self.host.modify_host_control_2(|mut val| {
            val.set_uhs_mode_select(timing);
            val
        });
    }

    /// Runs the tuning procedure: up to [TUNING_LOOP_COUNT] tuning block
    /// reads until the controller clears the execute-tuning bit and reports a
    /// tuned sampling clock.
    pub fn execute_tuning(
        &mut self,
        commands: &mut impl TuningCommandIssuer,
        opcode: u8,
        bus_width_8: bool,
        delay: &mut impl DelayNs,
    ) -> Result<(), SdhciError> {
        log::debug!("executing tuning with opcode {opcode}");
        self.host.modify_host_control_2(|mut val| {
            val.set_execute_tuning(true);
            val
        });
        // Only the buffer read ready interrupt is of interest while tuning.
        let mut tuning_irq = InterruptBits::new_with_raw_value(0);
        tuning_irq.set_buffer_read_ready(true);
        self.host.write_interrupt_status_enable(tuning_irq);
        self.host.write_interrupt_signal_enable(tuning_irq);

        let mut remaining = TUNING_LOOP_COUNT;
        let expired = loop {
            if remaining == 0 {
                break true;
            }
            remaining -= 1;

            let block_size: u32 = if opcode == CMD_SEND_TUNING_BLOCK_HS200 && bus_width_8 {
                128
            } else {
                64
            };
            let mut block = BlockParams::new_with_raw_value(0);
            block.set_block_size(u12::new(block_size as u16));
            block.set_blocks_count(1);
            self.host.write_block(block);
            let mut transfer = TransferModeAndCommand::new_with_raw_value(0);
            transfer.set_data_transfer_direction(TransferDirection::Read);
            self.host.write_transfer(transfer);

            commands
                .send_tuning_command(opcode)
                .map_err(SdhciError::Command)?;

            if !self.host.read_host_control_2().execute_tuning() {
                break false;
            }
            if opcode == CMD_SEND_TUNING_BLOCK {
                delay.delay_us(1);
            }
        };

        if expired {
            self.host.modify_host_control_2(|mut val| {
                val.set_sampling_clock_select(false);
                val
            });
        }
        if !self.host.read_host_control_2().sampling_clock_select() {
            log::error!("tuning failed");
            return Err(SdhciError::TuningFailed);
        }

        // Enable only the interrupts served by the controller again and mask
        // all signal sources.
        let mut served = InterruptBits::new_with_raw_value(0);
        served.set_command_complete(true);
        served.set_transfer_complete(true);
        served.set_buffer_write_ready(true);
        served.set_buffer_read_ready(true);
        served.set_dma_interrupt(true);
        served.set_command_timeout_error(true);
        served.set_command_crc_error(true);
        served.set_command_end_bit_error(true);
        served.set_command_index_error(true);
        served.set_data_timeout_error(true);
        served.set_data_crc_error(true);
        served.set_data_end_bit_error(true);
        self.host.write_interrupt_status_enable(served);
        self.host
            .write_interrupt_signal_enable(InterruptBits::new_with_raw_value(0));
        Ok(())
    }

    #[inline]
    pub const fn base_clock(&self) -> Hertz {
        self.base_clock
    }

    #[inline]
    pub const fn dll_on(&self) -> bool {
        self.dll_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_strength_mapping() {
        assert_eq!(
            DriverStrengthOhms::try_from(50).unwrap().register_value(),
            DriverStrength::Ohm50
        );
        assert_eq!(
            DriverStrengthOhms::try_from(33).unwrap().register_value(),
            DriverStrength::Ohm33
        );
        assert_eq!(
            DriverStrengthOhms::try_from(66).unwrap().register_value(),
            DriverStrength::Ohm66
        );
        assert_eq!(
            DriverStrengthOhms::try_from(100).unwrap().register_value(),
            DriverStrength::Ohm100
        );
        assert_eq!(
            DriverStrengthOhms::try_from(40).unwrap().register_value(),
            DriverStrength::Ohm40
        );
        assert!(DriverStrengthOhms::try_from(75).is_err());
    }

    #[test]
    fn test_config_rejects_invalid_strength() {
        let result = Config::new(u4::new(2), u4::new(8), 75, false);
        assert_eq!(result.unwrap_err(), SdhciError::InvalidDriverStrength(75));
    }

    #[test]
    fn test_clock_divisor_calculation() {
        let base = Hertz::from_raw(200_000_000);
        // Undivided when the target is at or above the base clock.
        assert_eq!(
            Am654Sdhci::calculate_clock_divisor(base, Hertz::from_raw(200_000_000)),
            0
        );
        // 200 MHz / (2 * 2) = 50 MHz
        assert_eq!(
            Am654Sdhci::calculate_clock_divisor(base, Hertz::from_raw(50_000_000)),
            2
        );
        // 200 MHz / (2 * 4) = 25 MHz
        assert_eq!(
            Am654Sdhci::calculate_clock_divisor(base, Hertz::from_raw(25_000_000)),
            4
        );
        // Initialization frequency rounds up to stay at or below the target.
        let divisor = Am654Sdhci::calculate_clock_divisor(base, MIN_FREQ);
        assert_eq!(divisor, 250);
        assert!(200_000_000 / (2 * u32::from(divisor)) <= 400_000);
        // Saturates at the 10-bit field.
        assert_eq!(
            Am654Sdhci::calculate_clock_divisor(base, Hertz::from_raw(1)),
            0x3FF
        );
    }
}
