//! Board pin multiplexing tables.
//!
//! Flat tables of pad index and configuration, grouped by peripheral. Pads of
//! a group share their electrical settings and only differ in index and mux
//! mode.
use am65x::ctrl_mmr::{
    MAIN_PADCFG_COUNT, MmioMainPadConfig, MmioWkupPadConfig, PadConfig, WKUP_PADCFG_COUNT,
};
use arbitrary_int::u4;

/// One pad configuration register assignment.
#[derive(Debug, Clone, Copy)]
pub struct PadSetting {
    pub index: usize,
    pub config: PadConfig,
}

const fn pad_output(index: usize, mux_mode: u8) -> PadSetting {
    PadSetting {
        index,
        config: PadConfig::builder()
            .with_lock(false)
            .with_tx_disable(false)
            .with_rx_active(false)
            .with_pull_up(false)
            .with_pull_disable(true)
            .with_schmitt_enable(false)
            .with_mux_mode(u4::new(mux_mode))
            .build(),
    }
}

const fn pad_input(index: usize, mux_mode: u8) -> PadSetting {
    PadSetting {
        index,
        config: PadConfig::builder()
            .with_lock(false)
            .with_tx_disable(true)
            .with_rx_active(true)
            .with_pull_up(false)
            .with_pull_disable(true)
            .with_schmitt_enable(true)
            .with_mux_mode(u4::new(mux_mode))
            .build(),
    }
}

const fn pad_bidir_pullup(index: usize, mux_mode: u8) -> PadSetting {
    PadSetting {
        index,
        config: PadConfig::builder()
            .with_lock(false)
            .with_tx_disable(false)
            .with_rx_active(true)
            .with_pull_up(true)
            .with_pull_disable(false)
            .with_schmitt_enable(false)
            .with_mux_mode(u4::new(mux_mode))
            .build(),
    }
}

/// MAIN domain pads: SD card, eMMC and the ICSSG2 RGMII and MDIO interface.
pub const MAIN_PADS: &[PadSetting] = &[
    // MMC0 (eMMC): clock, command, 8 data lines, data strobe
    pad_bidir_pullup(120, 0),
    pad_bidir_pullup(121, 0),
    pad_bidir_pullup(122, 0),
    pad_bidir_pullup(123, 0),
    pad_bidir_pullup(124, 0),
    pad_bidir_pullup(125, 0),
    pad_bidir_pullup(126, 0),
    pad_bidir_pullup(127, 0),
    pad_bidir_pullup(128, 0),
    pad_bidir_pullup(129, 0),
    pad_input(130, 0),
    // MMC1 (SD card): clock, command, 4 data lines, card detect
    pad_bidir_pullup(131, 0),
    pad_bidir_pullup(132, 0),
    pad_bidir_pullup(133, 0),
    pad_bidir_pullup(134, 0),
    pad_bidir_pullup(135, 0),
    pad_bidir_pullup(136, 0),
    pad_input(137, 0),
    // ICSSG2 RGMII: TX clock, TX control, TXD0-3
    pad_output(66, 2),
    pad_output(67, 2),
    pad_output(68, 2),
    pad_output(69, 2),
    pad_output(70, 2),
    pad_output(71, 2),
    // ICSSG2 RGMII: RX clock, RX control, RXD0-3
    pad_input(72, 2),
    pad_input(73, 2),
    pad_input(74, 2),
    pad_input(75, 2),
    pad_input(76, 2),
    pad_input(77, 2),
    // ICSSG2 MDIO: clock, data
    pad_output(93, 2),
    pad_bidir_pullup(94, 2),
];

/// WKUP domain pads: the boot UART and the board identification I2C bus.
pub const WKUP_PADS: &[PadSetting] = &[
    // WKUP UART0: RX, TX
    pad_input(43, 0),
    pad_output(44, 0),
    // WKUP I2C0: SCL, SDA
    pad_bidir_pullup(47, 0),
    pad_bidir_pullup(48, 0),
];

/// Applies the MAIN domain table.
pub fn apply_main_padcfg(regs: &mut MmioMainPadConfig<'static>) {
    for setting in MAIN_PADS {
        regs.write_pad(setting.index, setting.config);
    }
}

/// Applies the WKUP domain table.
pub fn apply_wkup_padcfg(regs: &mut MmioWkupPadConfig<'static>) {
    for setting in WKUP_PADS {
        regs.write_pad(setting.index, setting.config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unique_and_in_range(pads: &[PadSetting], count: usize) {
        for (i, setting) in pads.iter().enumerate() {
            assert!(
                setting.index < count,
                "pad index {} out of range",
                setting.index
            );
            for other in &pads[i + 1..] {
                assert_ne!(
                    setting.index, other.index,
                    "pad index {} configured twice",
                    setting.index
                );
            }
        }
    }

    #[test]
    fn test_main_table() {
        assert_unique_and_in_range(MAIN_PADS, MAIN_PADCFG_COUNT);
    }

    #[test]
    fn test_wkup_table() {
        assert_unique_and_in_range(WKUP_PADS, WKUP_PADCFG_COUNT);
    }

    #[test]
    fn test_rgmii_rx_pads_have_receivers_enabled() {
        for setting in MAIN_PADS.iter().filter(|pad| (72..=77).contains(&pad.index)) {
            assert!(setting.config.rx_active());
            assert!(setting.config.tx_disable());
        }
    }
}
