//! DRAM geometry and controller timing parameters.
//!
//! The DDR subsystem is configured from a register image handed to the system
//! firmware; the board overrides the entries that depend on the fitted memory
//! parts before the image is submitted.

/// Start of the DDR low region.
pub const SDRAM_BASE: u64 = 0x8000_0000;
/// Start of the DDR high region above the 32-bit boundary.
pub const SDRAM_BASE_HIGH: u64 = 0x8_8000_0000;
/// Size of each DDR region.
pub const BANK_SIZE: u64 = 0x8000_0000;

/// One contiguous DRAM bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DramBank {
    pub start: u64,
    pub size: u64,
}

/// Memory bank declaration. The high bank only exists with 64-bit physical
/// addressing enabled.
pub fn bank_layout(phys_64bit: bool) -> ([Option<DramBank>; 2], u64) {
    let low = DramBank {
        start: SDRAM_BASE,
        size: BANK_SIZE,
    };
    if phys_64bit {
        let high = DramBank {
            start: SDRAM_BASE_HIGH,
            size: BANK_SIZE,
        };
        ([Some(low), Some(high)], low.size + high.size)
    } else {
        ([Some(low), None], low.size)
    }
}

/// Limits the memory the bootloader itself places data in to the DDR low
/// region.
pub fn usable_ram_top(ram_top: u64) -> u64 {
    ram_top.min(0x1_0000_0000)
}

/// A (byte offset, value) override in the DDR controller register image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingOverride {
    pub offset: usize,
    pub value: u32,
}

/// Timing overrides for the fitted memory parts:
///
/// Manufacturer:        Winbond
/// Device Part Number:  W972GG6JB-25I
/// Clock Freq.:         200 MHz
/// Density:             2 Gb
/// Chip Selects:        1
/// Number of Banks:     8
/// Row address:         14
/// Column address:      10
pub const TIMING_OVERRIDES: &[TimingOverride] = &[
    TimingOverride {
        offset: 0x74,
        value: 0x0102_010A,
    },
    TimingOverride {
        offset: 0x98,
        value: 0x0400_5003,
    },
    TimingOverride {
        offset: 0x9C,
        value: 0x0900_00C8,
    },
    TimingOverride {
        offset: 0xA8,
        value: 0x0036_B009,
    },
    TimingOverride {
        offset: 0xAC,
        value: 0x0327_0612,
    },
    TimingOverride {
        offset: 0xB0,
        value: 0x0202_0202,
    },
    TimingOverride {
        offset: 0xB4,
        value: 0x00C8_0029,
    },
    TimingOverride {
        offset: 0xC0,
        value: 0x0001_1900,
    },
    TimingOverride {
        offset: 0x12C,
        value: 0x0740_0300,
    },
    TimingOverride {
        offset: 0x130,
        value: 0x0740_0300,
    },
    TimingOverride {
        offset: 0x2C4,
        value: 0x0203_0303,
    },
];

/// Applies the overrides onto the controller register image.
pub fn apply_timing_overrides(register_image: &mut [u32]) {
    for entry in TIMING_OVERRIDES {
        register_image[entry.offset / 4] = entry.value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_layout() {
        let (banks, total) = bank_layout(false);
        assert_eq!(
            banks[0],
            Some(DramBank {
                start: SDRAM_BASE,
                size: BANK_SIZE
            })
        );
        assert_eq!(banks[1], None);
        assert_eq!(total, 0x8000_0000);

        let (banks, total) = bank_layout(true);
        assert_eq!(
            banks[1],
            Some(DramBank {
                start: SDRAM_BASE_HIGH,
                size: BANK_SIZE
            })
        );
        assert_eq!(total, 0x1_0000_0000);
    }

    #[test]
    fn test_usable_ram_top_is_clamped_to_low_region() {
        assert_eq!(usable_ram_top(0x8_8000_0000), 0x1_0000_0000);
        assert_eq!(usable_ram_top(0xC000_0000), 0xC000_0000);
    }

    #[test]
    fn test_timing_overrides() {
        let mut image = [0u32; 0x300 / 4];
        apply_timing_overrides(&mut image);
        assert_eq!(image[0x74 / 4], 0x0102_010A);
        assert_eq!(image[0x2C4 / 4], 0x0203_0303);
        // Untouched words stay at their defaults.
        assert_eq!(image[0x78 / 4], 0);
        let touched = TIMING_OVERRIDES.len();
        assert_eq!(image.iter().filter(|&&word| word != 0).count(), touched);
    }
}
