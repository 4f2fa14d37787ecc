//! A platform agnostic `no_std` driver for the TSL2541 ambient light and IR sensor.
//!
//! The driver talks to the chip through the blocking I²C traits of
//! [`embedded-hal`](https://crates.io/crates/embedded-hal) at the fixed address `0x39`.
//! Every operation is a plain register transaction; there is no buffering and
//! no timing inside the driver, so waiting for an integration cycle to finish is
//! up to the caller.
//!
//! The driver owns the bus handle. Read-modify-write sequences are not atomic, so
//! sharing one sensor between contexts needs an outer lock around the whole
//! [`Tsl2541`].
#![cfg_attr(not(test), no_std)]

mod types;
pub use types::*;

#[cfg(feature = "defmt")]
use defmt::{debug, warn, write, Format};
use embedded_hal::blocking::i2c::{Read, Write, WriteRead};

/// ATIME written by [`Tsl2541::initialize`].
const RESET_INTEGRATION_TIME: u8 = 0x23;
/// Gain index written by [`Tsl2541::initialize`] (64x).
const RESET_GAIN: u8 = 4;
/// Auto-zero only on the first ALS cycle.
const RESET_AZ_ITERATION: u8 = 0x7F;

/// All possible errors in this crate
#[derive(Debug, PartialEq, Clone)]
pub enum Tsl2541Error<E> {
    /// I²C bus error
    I2c(E),
    /// Neither the ID nor the REVID register matched a TSL2541.
    IdentityMismatch { device_id: u8, revision_id: u8 },
}

#[cfg(feature = "defmt")]
impl<E> Format for Tsl2541Error<E> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Tsl2541Error::I2c(_) => write!(fmt, "I2C bus error"),
            Tsl2541Error::IdentityMismatch {
                device_id,
                revision_id,
            } => write!(
                fmt,
                "Identity mismatch: ID 0x{:02X} REVID 0x{:02X}",
                device_id, revision_id
            ),
        }
    }
}

#[derive(Debug)]
pub struct Tsl2541<I2C> {
    i2c: I2C,
    integration_time: u8,
    wait_time: u8,
    wait_long_enabled: bool,
}

impl<I2C, E> Tsl2541<I2C>
where
    I2C: Write<Error = E> + Read<Error = E> + WriteRead<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            integration_time: 0,
            wait_time: 0,
            wait_long_enabled: false,
        }
    }

    /// Gives the bus back.
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    /// Reads data from a register.
    fn read_register(&mut self, reg_address: Register) -> Result<u8, Tsl2541Error<E>> {
        let mut buf: [u8; 1] = [0; 1];
        self.i2c
            .write_read(ADDRESS, &[reg_address.addr()], &mut buf)
            .map_err(Tsl2541Error::I2c)
            .and(Ok(buf[0]))
    }

    /// Writes the given byte in the given register.
    fn write_register(
        &mut self,
        reg_address: Register,
        reg_value: u8,
    ) -> Result<(), Tsl2541Error<E>> {
        self.i2c
            .write(ADDRESS, &[reg_address.addr(), reg_value])
            .map_err(Tsl2541Error::I2c)
    }

    /// Sets or clears `bits` in a register, leaving the others untouched.
    fn update_bits(
        &mut self,
        reg_address: Register,
        bits: u8,
        set: bool,
    ) -> Result<(), Tsl2541Error<E>> {
        let value = self.read_register(reg_address)?;
        let value = if set { value | bits } else { value & !bits };
        self.write_register(reg_address, value)
    }

    /// Reads a little-endian 16 bit value, low byte first.
    fn read_word(&mut self, low: Register, high: Register) -> Result<u16, Tsl2541Error<E>> {
        let lo = self.read_register(low)?;
        let hi = self.read_register(high)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Zero-length write to the sensor address. Any bus error reads as "absent".
    pub fn probe(&mut self) -> bool {
        self.i2c.write(ADDRESS, &[]).is_ok()
    }

    /// Resets every configuration register to the driver defaults, powers on the
    /// oscillator and the ALS engine, then checks the identification registers.
    ///
    /// The chip is rejected only when both ID and REVID are wrong. In that case the
    /// ADC and the oscillator are switched off again before
    /// [`Tsl2541Error::IdentityMismatch`] is returned.
    pub fn initialize(&mut self) -> Result<(), Tsl2541Error<E>> {
        self.soft_reset()?;
        self.write_register(Register::ENABLE, ENABLE_PON | ENABLE_AEN)?;

        let id = self.identifier()?;
        if !id.is_tsl2541() {
            #[cfg(feature = "defmt")]
            warn!("Unexpected chip identity: {}", id);
            self.set_als_enabled(false)?;
            self.set_device_power(false)?;
            return Err(Tsl2541Error::IdentityMismatch {
                device_id: id.device_id,
                revision_id: id.revision_id,
            });
        }

        #[cfg(feature = "defmt")]
        debug!("TSL2541 ready, {}", id);
        Ok(())
    }

    fn soft_reset(&mut self) -> Result<(), Tsl2541Error<E>> {
        self.set_wait_timer_enabled(false)?;
        self.set_integration_time(RESET_INTEGRATION_TIME)?;
        self.set_wait_time(0)?;
        self.set_wait_long_enabled(false)?;
        self.set_als_gain(RESET_GAIN)?;
        self.set_status_read_clears(false)?;
        self.set_sleep_after_interrupt(false)?;
        self.set_auto_zero_mode(AutoZeroMode::StartAtZero)?;
        self.set_auto_zero_iteration_count(RESET_AZ_ITERATION)?;
        self.set_als_saturation_interrupt_enabled(false)?;
        self.set_als_interrupt_enabled(false)
    }

    /// Gets the device ID and revision ID. These should be 0xE4 and 0x61.
    pub fn identifier(&mut self) -> Result<Identifier, Tsl2541Error<E>> {
        let device_id = self.read_register(Register::ID)?;
        let revision_id = self.read_register(Register::REVID)?;

        Ok(Identifier {
            device_id,
            revision_id,
        })
    }

    /// Switches the internal oscillator (PON).
    pub fn set_device_power(&mut self, enabled: bool) -> Result<(), Tsl2541Error<E>> {
        self.update_bits(Register::ENABLE, ENABLE_PON, enabled)
    }

    /// Switches the ALS engine (AEN).
    pub fn set_als_enabled(&mut self, enabled: bool) -> Result<(), Tsl2541Error<E>> {
        self.update_bits(Register::ENABLE, ENABLE_AEN, enabled)
    }

    /// Sets or clears bit 1 of ENABLE.
    ///
    /// On the chip bit 1 is AEN (WEN is bit 3), so this also switches the ALS
    /// engine on or off. [`initialize`](Self::initialize) clears it before powering
    /// up again with PON and AEN.
    pub fn set_wait_timer_enabled(&mut self, enabled: bool) -> Result<(), Tsl2541Error<E>> {
        self.update_bits(Register::ENABLE, ENABLE_WAIT_TIMER, enabled)
    }

    /// Writes ATIME. One cycle is 2.78 ms, see [`integration_time_ms`] and
    /// [`max_als_count`].
    pub fn set_integration_time(&mut self, atime: u8) -> Result<(), Tsl2541Error<E>> {
        self.write_register(Register::ATIME, atime)?;
        self.integration_time = atime;
        Ok(())
    }

    /// Writes WTIME. Wait cycles are 2.78 ms, or 33.4 ms with wait-long.
    pub fn set_wait_time(&mut self, wtime: u8) -> Result<(), Tsl2541Error<E>> {
        self.write_register(Register::WTIME, wtime)?;
        self.wait_time = wtime;
        Ok(())
    }

    /// Writes CFG0.
    ///
    /// Polarity is inverted: `true` writes 0x80 (WLONG clear) and `false` writes
    /// 0x84 (WLONG set).
    pub fn set_wait_long_enabled(&mut self, enabled: bool) -> Result<(), Tsl2541Error<E>> {
        let value = if enabled { CFG0_NO_WLONG } else { CFG0_WLONG };
        self.write_register(Register::CFG0, value)?;
        self.wait_long_enabled = enabled;
        Ok(())
    }

    /// Sets the ALS interrupt window. The four threshold registers are written
    /// one by one; on a bus error the window may be half updated.
    pub fn set_interrupt_threshold(&mut self, low: u16, high: u16) -> Result<(), Tsl2541Error<E>> {
        let [low_l, low_h] = low.to_le_bytes();
        let [high_l, high_h] = high.to_le_bytes();
        self.write_register(Register::AILTL, low_l)?;
        self.write_register(Register::AILTH, low_h)?;
        self.write_register(Register::AIHTL, high_l)?;
        self.write_register(Register::AIHTH, high_h)
    }

    /// Writes PERS. Only the low nibble (APERS) is used by the chip.
    pub fn set_interrupt_persistence(&mut self, apers: u8) -> Result<(), Tsl2541Error<E>> {
        self.write_register(Register::PERS, apers)
    }

    /// Sets the ALS gain from its index in the ladder 1/2x, 1x, 4x, 16x, 64x, 128x.
    ///
    /// Indices above 5 are ignored without touching the bus.
    pub fn set_als_gain(&mut self, index: u8) -> Result<(), Tsl2541Error<E>> {
        match index {
            0 => {
                let cfg1 = self.read_register(Register::CFG1)? & !CFG1_AGAIN;
                self.write_register(Register::CFG1, cfg1)?;
                let cfg2 = self.read_register(Register::CFG2)? & !(CFG2_AGAINMAX | CFG2_AGAINL);
                self.write_register(Register::CFG2, cfg2)
            }
            1..=4 => {
                let cfg1 = (self.read_register(Register::CFG1)? & !CFG1_AGAIN) | (index - 1);
                self.write_register(Register::CFG1, cfg1)?;
                // Drops every CFG2 bit except AGAINL.
                let cfg2 = self.read_register(Register::CFG2)? & !CFG2_AGAINMAX & CFG2_AGAINL;
                self.write_register(Register::CFG2, cfg2)
            }
            5 => {
                let cfg1 = self.read_register(Register::CFG1)? | CFG1_AGAIN;
                self.write_register(Register::CFG1, cfg1)?;
                let cfg2 = self.read_register(Register::CFG2)? | CFG2_AGAINMAX | CFG2_AGAINL;
                self.write_register(Register::CFG2, cfg2)
            }
            _ => Ok(()),
        }
    }

    pub fn set_gain(&mut self, gain: AlsGain) -> Result<(), Tsl2541Error<E>> {
        self.set_als_gain(gain as u8)
    }

    /// Raw visible channel count.
    pub fn get_visible_light_count(&mut self) -> Result<u16, Tsl2541Error<E>> {
        self.read_word(Register::VISDATAL, Register::VISDATAH)
    }

    /// Raw IR channel count.
    pub fn get_infrared_count(&mut self) -> Result<u16, Tsl2541Error<E>> {
        self.read_word(Register::IRDATAL, Register::IRDATAH)
    }

    /// Reads the factory trim of the visible channel (VISADJ).
    pub fn visible_adjustment(&mut self) -> Result<u8, Tsl2541Error<E>> {
        self.read_register(Register::VISADJ)
    }

    /// Visible count corrected with the VISADJ trim.
    pub fn get_adjusted_visible_count(&mut self) -> Result<u16, Tsl2541Error<E>> {
        let adj = self.visible_adjustment()?;
        let vis = self.get_visible_light_count()?;
        Ok(apply_visible_adjustment(vis, adj))
    }

    /// INT_READ_CLEAR: reading STATUS clears all its flags.
    pub fn set_status_read_clears(&mut self, enabled: bool) -> Result<(), Tsl2541Error<E>> {
        self.update_bits(Register::CFG3, CFG3_INT_READ_CLEAR, enabled)
    }

    /// SAI: power down at the end of an ALS cycle that raised an interrupt.
    pub fn set_sleep_after_interrupt(&mut self, enabled: bool) -> Result<(), Tsl2541Error<E>> {
        self.update_bits(Register::CFG3, CFG3_SAI, enabled)
    }

    pub fn set_auto_zero_mode(&mut self, mode: AutoZeroMode) -> Result<(), Tsl2541Error<E>> {
        self.update_bits(
            Register::AZ_CONFIG,
            AZ_MODE,
            mode == AutoZeroMode::StartAtPrevious,
        )
    }

    /// Runs auto-zero every nth ALS cycle (0 never, 0x7F only the first cycle).
    ///
    /// The value is OR-ed into AZ_CONFIG, bits set by an earlier call stay set.
    pub fn set_auto_zero_iteration_count(&mut self, count: u8) -> Result<(), Tsl2541Error<E>> {
        let value = self.read_register(Register::AZ_CONFIG)? | (count & AZ_NTH_ITERATION);
        self.write_register(Register::AZ_CONFIG, value)
    }

    /// Enables or disables the ALS threshold interrupt (AIEN).
    ///
    /// INT_READ_CLEAR is switched on first. Disabling takes its base value from
    /// ENABLE, not INTENAB, and writes the result to INTENAB.
    pub fn set_als_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Tsl2541Error<E>> {
        self.set_status_read_clears(true)?;
        if enabled {
            let value = self.read_register(Register::INTENAB)? | INTENAB_AIEN;
            self.write_register(Register::INTENAB, value)
        } else {
            let value = self.read_register(Register::ENABLE)? & !INTENAB_AIEN;
            self.write_register(Register::INTENAB, value)
        }
    }

    /// Enables or disables the ALS saturation interrupt (ASIEN). INT_READ_CLEAR is
    /// switched on first.
    pub fn set_als_saturation_interrupt_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Tsl2541Error<E>> {
        self.set_status_read_clears(true)?;
        self.update_bits(Register::INTENAB, INTENAB_ASIEN, enabled)
    }

    pub fn status(&mut self) -> Result<Status, Tsl2541Error<E>> {
        Ok(self.read_register(Register::STATUS)?.into())
    }

    /// Reads STATUS and drops the value. With INT_READ_CLEAR set this releases the
    /// interrupt line; otherwise the read has no effect.
    pub fn clear_interrupt_flags(&mut self) -> Result<(), Tsl2541Error<E>> {
        self.read_register(Register::STATUS).map(|_| ())
    }

    /// Last ATIME written by this driver.
    pub fn integration_time(&self) -> u8 {
        self.integration_time
    }

    /// Last WTIME written by this driver.
    pub fn wait_time(&self) -> u8 {
        self.wait_time
    }

    pub fn wait_long_enabled(&self) -> bool {
        self.wait_long_enabled
    }
}

#[inline]
fn apply_visible_adjustment(vis: u16, adj: u8) -> u16 {
    let factor = if adj < 0x80 {
        1.0 + f32::from(adj) / 100.0
    } else {
        1.0 - f32::from(adj - 0x80) / 100.0
    };
    (f32::from(vis) * factor) as u16
}
