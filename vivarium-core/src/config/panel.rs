//! Panel profiles
//!
//! Each supported panel is described entirely by data: command-link
//! wiring, video timing, the controller init command table, an optional
//! identity check, and whether the command link stays alive for runtime
//! sleep/wake commands. Bring-up code in `vivarium-drivers` is a single
//! path over this data.

/// One entry of a controller init sequence
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelCommand {
    pub opcode: u8,
    pub params: &'static [u8],
    /// Blocking delay after the command, in milliseconds
    pub delay_ms: u16,
}

impl PanelCommand {
    pub const fn new(opcode: u8, params: &'static [u8]) -> Self {
        Self {
            opcode,
            params,
            delay_ms: 0,
        }
    }

    pub const fn with_delay(opcode: u8, params: &'static [u8], delay_ms: u16) -> Self {
        Self {
            opcode,
            params,
            delay_ms,
        }
    }
}

/// Identity verification performed before the init table is played
///
/// A readback that is all zeroes is always rejected (a floating bus reads
/// as zero). When `expected` is non-empty the readback must also start
/// with it.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IdCheck {
    pub opcode: u8,
    pub expected: &'static [u8],
}

/// Sync signal timing for one axis
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncTiming {
    pub pulse_width: u16,
    pub back_porch: u16,
    pub front_porch: u16,
}

/// RGB video timing engine configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VideoConfig {
    pub h_res: u16,
    pub v_res: u16,
    pub pclk_hz: u32,
    pub hsync: SyncTiming,
    pub vsync: SyncTiming,
    pub hsync_idle_low: bool,
    pub vsync_idle_low: bool,
    pub de_idle_high: bool,
    pub pclk_active_neg: bool,
    pub hsync_pin: u8,
    pub vsync_pin: u8,
    pub de_pin: u8,
    pub pclk_pin: u8,
    /// D0..D15 mapped to B3..B7, G2..G7, R3..R7
    pub data_pins: [u8; 16],
    /// Place the engine's internal frame buffer in PSRAM
    pub fb_in_psram: bool,
}

/// Command-phase SPI channel wiring
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    pub sclk_pin: u8,
    pub mosi_pin: u8,
    pub cs_pin: u8,
    /// D/C line: low for opcode, high for parameters
    pub dc_pin: u8,
    pub frequency_hz: u32,
    /// SPI mode (CPOL/CPHA)
    pub mode: u8,
}

/// Complete description of one panel variant
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelProfile {
    pub name: &'static str,
    pub link: LinkConfig,
    pub video: VideoConfig,
    pub init_cmds: &'static [PanelCommand],
    pub id_check: Option<IdCheck>,
    /// Keep the command link alive for runtime sleep/wake commands;
    /// when false the link is released once the init table has played.
    pub retain_link: bool,
}

/// ST7701 controller init sequence (Command2 bank switching, gamma and
/// power tables, then format/orientation, sleep-out and display-on).
const ST7701_INIT_CMDS: &[PanelCommand] = &[
    PanelCommand::new(0xFF, &[0x77, 0x01, 0x00, 0x00, 0x10]),
    PanelCommand::new(0xC0, &[0x3B, 0x00]),
    PanelCommand::new(0xC1, &[0x0D, 0x02]),
    PanelCommand::new(0xC2, &[0x31, 0x04]),
    PanelCommand::new(0xCD, &[0x00]),
    PanelCommand::new(
        0xB0,
        &[
            0x00, 0x10, 0x16, 0x0C, 0x12, 0x05, 0x02, 0x07, 0x08, 0x21, 0x06, 0x11, 0x11, 0xA6,
            0x31, 0x18,
        ],
    ),
    PanelCommand::new(
        0xB1,
        &[
            0x00, 0x0F, 0x15, 0x0B, 0x11, 0x05, 0x02, 0x07, 0x08, 0x20, 0x04, 0x12, 0x11, 0xA4,
            0x31, 0x18,
        ],
    ),
    PanelCommand::new(0xFF, &[0x77, 0x01, 0x00, 0x00, 0x11]),
    PanelCommand::new(0xB0, &[0x6D]),
    PanelCommand::new(0xB1, &[0x37]),
    PanelCommand::new(0xB2, &[0x81]),
    PanelCommand::new(0xB3, &[0x80]),
    PanelCommand::new(0xB5, &[0x43]),
    PanelCommand::new(0xB7, &[0x85]),
    PanelCommand::new(0xB8, &[0x20]),
    PanelCommand::new(0xB9, &[0x10]),
    PanelCommand::new(0xBA, &[0x24]),
    PanelCommand::new(0xC1, &[0x78]),
    PanelCommand::new(0xC2, &[0x78]),
    PanelCommand::new(0xC3, &[0x8C]),
    PanelCommand::new(0xD0, &[0x88]),
    PanelCommand::new(0xE0, &[0x00, 0x00, 0x02]),
    PanelCommand::new(
        0xE1,
        &[
            0x04, 0xA0, 0x00, 0x00, 0x07, 0xA0, 0x00, 0x00, 0x00, 0x20, 0x20,
        ],
    ),
    PanelCommand::new(0xE2, &[0x30, 0x30, 0x04, 0x30, 0x30, 0x04]),
    PanelCommand::new(0xE3, &[0x00, 0x00, 0x33, 0x33]),
    PanelCommand::new(0xE4, &[0x44, 0x44]),
    PanelCommand::new(
        0xE5,
        &[
            0x0C, 0x30, 0xA0, 0xA0, 0x0F, 0x30, 0xA0, 0xA0, 0x08, 0x30, 0xA0, 0xA0, 0x0A, 0x30,
            0xA0, 0xA0,
        ],
    ),
    PanelCommand::new(0xE6, &[0x00, 0x00, 0x33, 0x33]),
    PanelCommand::new(0xE7, &[0x44, 0x44]),
    PanelCommand::new(
        0xE8,
        &[
            0x0D, 0x30, 0xA0, 0xA0, 0x0C, 0x30, 0xA0, 0xA0, 0x0F, 0x30, 0xA0, 0xA0, 0x08, 0x30,
            0xA0, 0xA0,
        ],
    ),
    PanelCommand::new(0xEB, &[0x00, 0x01, 0xE4, 0xE4, 0x44, 0x88, 0x40]),
    PanelCommand::new(0xED, &[0xFF, 0x02, 0x01, 0x00, 0x00, 0x10, 0x00]),
    PanelCommand::new(0xEF, &[0x10, 0x0D, 0x04, 0x08, 0x3F, 0x1F]),
    PanelCommand::new(0xFF, &[0x77, 0x01, 0x00, 0x00, 0x13]),
    PanelCommand::new(0xEF, &[0x08]),
    PanelCommand::new(0xFF, &[0x77, 0x01, 0x00, 0x00, 0x00]),
    PanelCommand::new(0x3A, &[0x55]),
    PanelCommand::new(0x36, &[0x00]),
    PanelCommand::with_delay(0x11, &[], 120),
    PanelCommand::with_delay(0x29, &[], 20),
];

/// ST7262 needs only the basics: sleep-out, 16-bit color, memory access
/// order, display-on.
const ST7262_INIT_CMDS: &[PanelCommand] = &[
    PanelCommand::with_delay(0x11, &[], 120),
    PanelCommand::new(0x3A, &[0x55]),
    PanelCommand::new(0x36, &[0x00]),
    PanelCommand::with_delay(0x29, &[], 20),
];

/// 7" 1024x600 ST7701 board
///
/// The most defensive variant: identity readback before the init table,
/// and the command link is retained so sleep/wake commands can be issued
/// at runtime.
pub const ST7701_7IN: PanelProfile = PanelProfile {
    name: "st7701",
    link: LinkConfig {
        sclk_pin: 6,
        mosi_pin: 11,
        cs_pin: 12,
        dc_pin: 4,
        frequency_hz: 10_000_000,
        mode: 0,
    },
    video: VideoConfig {
        h_res: 1024,
        v_res: 600,
        pclk_hz: 30_000_000,
        hsync: SyncTiming {
            pulse_width: 20,
            back_porch: 140,
            front_porch: 160,
        },
        vsync: SyncTiming {
            pulse_width: 3,
            back_porch: 20,
            front_porch: 12,
        },
        hsync_idle_low: true,
        vsync_idle_low: true,
        de_idle_high: false,
        pclk_active_neg: true,
        hsync_pin: 46,
        vsync_pin: 3,
        de_pin: 5,
        pclk_pin: 7,
        data_pins: [
            14, 38, 18, 17, 10, 39, 0, 45, 48, 47, 21, 1, 2, 42, 41, 40,
        ],
        fb_in_psram: true,
    },
    init_cmds: ST7701_INIT_CMDS,
    // RDDID; no vendor bytes are published for this glass, so only the
    // all-zero (absent controller) case is rejected.
    id_check: Some(IdCheck {
        opcode: 0x04,
        expected: &[],
    }),
    retain_link: true,
};

/// 7" 800x480 ST7262 board
pub const ST7262_7IN: PanelProfile = PanelProfile {
    name: "st7262",
    link: LinkConfig {
        sclk_pin: 6,
        mosi_pin: 7,
        cs_pin: 5,
        dc_pin: 4,
        frequency_hz: 10_000_000,
        mode: 0,
    },
    video: VideoConfig {
        h_res: 800,
        v_res: 480,
        pclk_hz: 10_000_000,
        hsync: SyncTiming {
            pulse_width: 10,
            back_porch: 40,
            front_porch: 40,
        },
        vsync: SyncTiming {
            pulse_width: 10,
            back_porch: 20,
            front_porch: 10,
        },
        hsync_idle_low: true,
        vsync_idle_low: true,
        de_idle_high: false,
        pclk_active_neg: true,
        hsync_pin: 46,
        vsync_pin: 3,
        de_pin: 5,
        pclk_pin: 7,
        data_pins: [
            45, 48, 47, 21, 14, 13, 12, 11, 10, 9, 46, 3, 8, 18, 17, 16,
        ],
        fb_in_psram: true,
    },
    init_cmds: ST7262_INIT_CMDS,
    id_check: None,
    retain_link: false,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn st7701_table_ends_with_display_on() {
        let last = ST7701_INIT_CMDS.last().unwrap();
        assert_eq!(last.opcode, 0x29);
        assert!(last.delay_ms > 0);
    }

    #[test]
    fn profiles_disagree_on_link_retention() {
        assert!(ST7701_7IN.retain_link);
        assert!(!ST7262_7IN.retain_link);
        assert!(ST7701_7IN.id_check.is_some());
        assert!(ST7262_7IN.id_check.is_none());
    }
}
