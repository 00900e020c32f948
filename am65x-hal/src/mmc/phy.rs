//! IO PHY and delay line handling.
use am65x::sdhci::{DriverStrength, MmioSdSubsystem};
use arbitrary_int::u4;
use embedded_hal::delay::DelayNs;

use super::SdhciError;
use crate::time::Hertz;

/// Poll budget for the IO line calibration, in microseconds.
pub const CALIBRATION_TRIES: u32 = 20;
/// Poll budget for the delay line lock, in milliseconds.
pub const DLL_READY_TRIES: u32 = 1000;

/// DLL frequency range selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DllFrequency {
    /// Neither range select is set.
    Mhz200,
    Mhz100,
    /// Everything at or below 50 MHz.
    Mhz50,
}

impl DllFrequency {
    pub const fn for_speed(speed: Hertz) -> Self {
        match speed.raw() {
            200_000_000 => DllFrequency::Mhz200,
            100_000_000 => DllFrequency::Mhz100,
            _ => DllFrequency::Mhz50,
        }
    }

    pub const fn sel_50(&self) -> bool {
        matches!(self, DllFrequency::Mhz50)
    }

    pub const fn sel_100(&self) -> bool {
        matches!(self, DllFrequency::Mhz100)
    }
}

/// Runs the IO line impedance calibration if it has not completed yet.
pub fn calibrate_io_lines(
    ss: &mut MmioSdSubsystem<'static>,
    delay: &mut impl DelayNs,
) -> Result<(), SdhciError> {
    if ss.read_phy_stat_1().calibration_done() {
        return Ok(());
    }
    ss.modify_phy_ctrl_1(|mut val| {
        val.set_power_down_bias(true);
        val
    });
    let mut tries = CALIBRATION_TRIES;
    while !ss.read_phy_stat_1().calibration_done() {
        if tries == 0 {
            return Err(SdhciError::CalibrationTimeout);
        }
        tries -= 1;
        delay.delay_us(1);
    }
    Ok(())
}

pub fn enable_output_tap_delay(ss: &mut MmioSdSubsystem<'static>, select: u4) {
    ss.modify_phy_ctrl_4(|mut val| {
        val.set_otap_delay_enable(true);
        val.set_otap_delay_select(select);
        val
    });
}

pub fn disable_output_tap_delay(ss: &mut MmioSdSubsystem<'static>) {
    ss.modify_phy_ctrl_4(|mut val| {
        val.set_otap_delay_enable(false);
        val.set_otap_delay_select(u4::new(0));
        val
    });
}

/// Programs the DLL frequency range, trim and driver strength, then enables
/// the delay line.
pub fn configure_dll(
    ss: &mut MmioSdSubsystem<'static>,
    frequency: DllFrequency,
    trim_icp: u4,
    driver_strength: DriverStrength,
) {
    ss.modify_phy_ctrl_5(|mut val| {
        val.set_frequency_sel_50(frequency.sel_50());
        val.set_frequency_sel_100(frequency.sel_100());
        val
    });
    ss.modify_phy_ctrl_1(|mut val| {
        val.set_dll_trim_icp(trim_icp);
        val.set_driver_strength(driver_strength);
        val
    });
    ss.modify_phy_ctrl_1(|mut val| {
        val.set_enable_dll(true);
        val
    });
}

pub fn disable_dll(ss: &mut MmioSdSubsystem<'static>) {
    ss.modify_phy_ctrl_1(|mut val| {
        val.set_enable_dll(false);
        val
    });
}

/// Polls for the delay line lock with a one second budget.
pub fn wait_dll_ready(
    ss: &mut MmioSdSubsystem<'static>,
    delay: &mut impl DelayNs,
) -> Result<(), SdhciError> {
    let mut tries = DLL_READY_TRIES;
    while !ss.read_phy_stat_1().dll_ready() {
        if tries == 0 {
            return Err(SdhciError::DllLockTimeout);
        }
        tries -= 1;
        delay.delay_ms(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dll_frequency_selection() {
        assert_eq!(
            DllFrequency::for_speed(Hertz::from_raw(200_000_000)),
            DllFrequency::Mhz200
        );
        assert_eq!(
            DllFrequency::for_speed(Hertz::from_raw(100_000_000)),
            DllFrequency::Mhz100
        );
        assert_eq!(
            DllFrequency::for_speed(Hertz::from_raw(50_000_000)),
            DllFrequency::Mhz50
        );
        assert_eq!(
            DllFrequency::for_speed(Hertz::from_raw(25_000_000)),
            DllFrequency::Mhz50
        );
    }

    #[test]
    fn test_range_select_bits() {
        assert!(DllFrequency::Mhz50.sel_50());
        assert!(!DllFrequency::Mhz50.sel_100());
        assert!(DllFrequency::Mhz100.sel_100());
        assert!(!DllFrequency::Mhz100.sel_50());
        assert!(!DllFrequency::Mhz200.sel_50());
        assert!(!DllFrequency::Mhz200.sel_100());
    }
}
