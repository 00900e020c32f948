//! MDIO controller driver.
use am65x::mdio::{MmioMdio, UserAccess};
use arbitrary_int::u5;

use crate::{ErrorCode, time::Hertz};

/// Default MDIO bus frequency if the board does not specify one.
pub const DEFAULT_BUS_FREQ: Hertz = Hertz::from_raw(2_200_000);

pub struct Mdio {
    regs: MmioMdio<'static>,
}

impl Mdio {
    /// Creates the bus driver and enables the state machine with a clock
    /// divider derived from the functional clock.
    pub fn new(mut regs: MmioMdio<'static>, fck_rate: Hertz, bus_freq: Hertz) -> Self {
        let divider = Self::calculate_clock_divider(fck_rate, bus_freq);
        regs.modify_control(|mut val| {
            val.set_clock_divider(divider);
            val.set_enable(true);
            val
        });
        Self { regs }
    }

    /// MDCLK is the functional clock divided by the divider plus one.
    pub fn calculate_clock_divider(fck_rate: Hertz, bus_freq: Hertz) -> u16 {
        let bus_freq = bus_freq.raw().max(1);
        (fck_rate.raw() / bus_freq).saturating_sub(1).min(0xFFFF) as u16
    }

    fn wait_user_access_idle(&mut self) {
        while self.regs.read_user_access_0().go() {}
    }

    pub fn read_blocking(&mut self, phy_addr: u5, reg_addr: u5) -> Result<u16, ErrorCode> {
        self.wait_user_access_idle();
        let mut request = UserAccess::new_with_raw_value(0);
        request.set_go(true);
        request.set_write(false);
        request.set_reg_addr(reg_addr);
        request.set_phy_addr(phy_addr);
        self.regs.write_user_access_0(request);
        self.wait_user_access_idle();
        let access = self.regs.read_user_access_0();
        if !access.ack() {
            return Err(ErrorCode::Io);
        }
        Ok(access.data())
    }

    pub fn write_blocking(&mut self, phy_addr: u5, reg_addr: u5, data: u16) {
        self.wait_user_access_idle();
        let mut request = UserAccess::new_with_raw_value(0);
        request.set_go(true);
        request.set_write(true);
        request.set_reg_addr(reg_addr);
        request.set_phy_addr(phy_addr);
        request.set_data(data);
        self.regs.write_user_access_0(request);
        self.wait_user_access_idle();
    }

    /// Bitmask of PHY addresses which responded to background polling.
    #[inline]
    pub fn alive(&mut self) -> u32 {
        self.regs.read_alive()
    }

    /// Bitmask of PHY addresses with link up.
    #[inline]
    pub fn link(&mut self) -> u32 {
        self.regs.read_link()
    }

    /// Disables the state machine.
    pub fn disable(&mut self) {
        self.regs.modify_control(|mut val| {
            val.set_enable(false);
            val
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_divider_calculation() {
        // 250 MHz functional clock, 2.2 MHz bus.
        let div = Mdio::calculate_clock_divider(Hertz::from_raw(250_000_000), DEFAULT_BUS_FREQ);
        assert_eq!(div, 112);
        // Divider saturates at the field width.
        let div = Mdio::calculate_clock_divider(Hertz::from_raw(500_000_000), Hertz::from_raw(1));
        assert_eq!(div, 0xFFFF);
    }

    #[test]
    fn test_actual_bus_frequency() {
        use approx::abs_diff_eq;

        let fck = Hertz::from_raw(250_000_000);
        let div = Mdio::calculate_clock_divider(fck, DEFAULT_BUS_FREQ);
        let actual = fck.raw() as f64 / f64::from(div + 1);
        // The divided clock stays at or below the requested bus frequency.
        assert!(actual <= DEFAULT_BUS_FREQ.raw() as f64);
        assert!(abs_diff_eq!(actual, 2_212_389.38, epsilon = 0.01));
    }
}
