#[cfg(feature = "defmt")]
use defmt::{write, Format};

/// The I2C address of the TSL2541 sensor.
pub const ADDRESS: u8 = 0x39;

/// Expected content of the ID register.
pub const DEVICE_ID: u8 = 0xE4;
/// Expected content of the REVID register.
pub const REVISION_ID: u8 = 0x61;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    ENABLE = 0x80,
    ATIME = 0x81,
    WTIME = 0x83,
    AILTL = 0x84,
    AILTH = 0x85,
    AIHTL = 0x86,
    AIHTH = 0x87,
    PERS = 0x8C,
    CFG0 = 0x8D,
    CFG1 = 0x90,
    REVID = 0x91,
    ID = 0x92,
    STATUS = 0x93,
    VISDATAL = 0x94,
    VISDATAH = 0x95,
    IRDATAL = 0x96,
    IRDATAH = 0x97,
    CFG2 = 0x9F,
    CFG3 = 0xAB,
    AZ_CONFIG = 0xD6,
    INTENAB = 0xDD,
    VISADJ = 0xE6,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

// ENABLE
pub(crate) const ENABLE_PON: u8 = 0x01;
pub(crate) const ENABLE_AEN: u8 = 0x02;
// Driven by set_wait_timer_enabled, shares the AEN position.
pub(crate) const ENABLE_WAIT_TIMER: u8 = 0x02;

// CFG0. Bit 7 is reserved and must be written as 1, bit 2 is WLONG.
pub(crate) const CFG0_NO_WLONG: u8 = 0x80;
pub(crate) const CFG0_WLONG: u8 = 0x84;

// CFG1 / CFG2 gain fields
pub(crate) const CFG1_AGAIN: u8 = 0x03;
pub(crate) const CFG2_AGAINMAX: u8 = 0x10;
pub(crate) const CFG2_AGAINL: u8 = 0x04;

// CFG3
pub(crate) const CFG3_INT_READ_CLEAR: u8 = 0x80;
pub(crate) const CFG3_SAI: u8 = 0x10;

// AZ_CONFIG
pub(crate) const AZ_MODE: u8 = 0x80;
pub(crate) const AZ_NTH_ITERATION: u8 = 0x7F;

// INTENAB
pub(crate) const INTENAB_ASIEN: u8 = 0x80;
pub(crate) const INTENAB_AIEN: u8 = 0x10;

/// Content of the two identification registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier {
    pub device_id: u8,
    pub revision_id: u8,
}

impl Identifier {
    /// The chip is accepted unless *both* registers disagree with the TSL2541 values.
    pub fn is_tsl2541(&self) -> bool {
        self.device_id == DEVICE_ID || self.revision_id == REVISION_ID
    }
}

#[cfg(feature = "defmt")]
impl Format for Identifier {
    fn format(&self, fmt: defmt::Formatter) {
        write!(
            fmt,
            "ID: 0x{:02X}  REVID: 0x{:02X}",
            self.device_id, self.revision_id
        );
    }
}

/// Flags latched in the STATUS register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// ALS analog saturation.
    pub saturated: bool,
    /// ALS threshold interrupt asserted.
    pub als_interrupt: bool,
    /// Calibration finished.
    pub calibration_done: bool,
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        Status {
            saturated: value & 0x80 != 0,
            als_interrupt: value & 0x10 != 0,
            calibration_done: value & 0x08 != 0,
        }
    }
}

/// ALS gain ladder. The discriminant is the gain index accepted by
/// [`Tsl2541::set_als_gain`](crate::Tsl2541::set_als_gain).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AlsGain {
    /// 1/2x
    Half = 0,
    X1 = 1,
    X4 = 2,
    X16 = 3,
    X64 = 4,
    X128 = 5,
}

impl TryFrom<u8> for AlsGain {
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(AlsGain::Half),
            1 => Ok(AlsGain::X1),
            2 => Ok(AlsGain::X4),
            3 => Ok(AlsGain::X16),
            4 => Ok(AlsGain::X64),
            5 => Ok(AlsGain::X128),
            other => Err(other),
        }
    }
}

/// Where the auto-zero search starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AutoZeroMode {
    /// Always start at zero when searching the best offset value.
    StartAtZero = 0,
    /// Always start at the previous offset.
    StartAtPrevious = 1,
}

/// Integration time in milliseconds for an ATIME value, `(atime + 1) * 2.78`.
pub fn integration_time_ms(atime: u8) -> f32 {
    (atime as f32 + 1.0) * 2.78
}

/// Full scale ALS count for an ATIME value, `min((atime + 1) * 1024, 65535)`.
pub fn max_als_count(atime: u8) -> u16 {
    let cycles = atime as u32 + 1;
    (cycles * 1024).min(u16::MAX as u32) as u16
}
