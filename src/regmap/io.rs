#![allow(unsafe_code)]

use core::sync::atomic::{Ordering, fence};

use crate::regmap::{RegmapError, types::REG_STRIDE};

/// Register backend seam.
///
/// The core performs every hardware transaction through this trait, so a
/// test harness can substitute plain memory and a driver can proxy
/// through whatever bus its registers actually live behind. The relaxed
/// variants skip ordering guarantees around the access; implementations
/// that have none to skip can leave the defaults, which forward to the
/// ordered versions.
pub trait RegIo {
    fn read(&mut self, reg: u32) -> Result<u32, RegmapError>;
    fn write(&mut self, reg: u32, val: u32) -> Result<(), RegmapError>;

    fn read_relaxed(&mut self, reg: u32) -> Result<u32, RegmapError> {
        self.read(reg)
    }

    fn write_relaxed(&mut self, reg: u32, val: u32) -> Result<(), RegmapError> {
        self.write(reg, val)
    }

    /// Writes a run of consecutive registers in one transaction.
    ///
    /// The default loops single writes; burst-capable backends override.
    fn write_block(&mut self, reg: u32, vals: &[u32]) -> Result<(), RegmapError> {
        for (i, val) in vals.iter().enumerate() {
            self.write(reg + i as u32 * REG_STRIDE, *val)?;
        }
        Ok(())
    }

    /// Settle-time hint between sequenced writes. No-op by default; a
    /// platform backend hooks its own delay primitive here.
    fn delay_us(&mut self, _us: u32) {}
}

/// Memory-mapped register space accessed through volatile loads/stores.
///
/// Ordered accesses carry a full fence on either side; the relaxed
/// variants are bare volatile accesses for hot paths where the caller
/// already orders against the device.
pub struct MmioSpace {
    base: *mut u32,
    len: usize,
}

impl MmioSpace {
    /// # Safety
    ///
    /// `base` must point at a mapped, device-backed region of at least
    /// `len` bytes that stays valid for the lifetime of this value, and
    /// nothing else may access the region while it is held here.
    pub unsafe fn new(base: *mut u32, len: usize) -> Self {
        Self { base, len }
    }

    #[inline]
    fn word(&self, reg: u32) -> Result<*mut u32, RegmapError> {
        let off = reg as usize;
        if off % REG_STRIDE as usize != 0 || off + REG_STRIDE as usize > self.len {
            return Err(RegmapError::Denied);
        }
        Ok(self.base.wrapping_add(off / REG_STRIDE as usize))
    }
}

impl RegIo for MmioSpace {
    fn read(&mut self, reg: u32) -> Result<u32, RegmapError> {
        fence(Ordering::SeqCst);
        let val = self.read_relaxed(reg)?;
        fence(Ordering::SeqCst);
        Ok(val)
    }

    fn write(&mut self, reg: u32, val: u32) -> Result<(), RegmapError> {
        fence(Ordering::SeqCst);
        self.write_relaxed(reg, val)?;
        fence(Ordering::SeqCst);
        Ok(())
    }

    fn read_relaxed(&mut self, reg: u32) -> Result<u32, RegmapError> {
        let ptr = self.word(reg)?;
        Ok(unsafe { ptr.read_volatile() })
    }

    fn write_relaxed(&mut self, reg: u32, val: u32) -> Result<(), RegmapError> {
        let ptr = self.word(reg)?;
        unsafe { ptr.write_volatile(val) };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mmio_space_round_trips_through_memory() {
        let mut backing = [0u32; 8];
        let mut space = unsafe { MmioSpace::new(backing.as_mut_ptr(), size_of_val(&backing)) };

        space.write(0x00, 0xA5A5_0001).unwrap();
        space.write_relaxed(0x1C, 0xA5A5_0002).unwrap();
        assert_eq!(space.read(0x00).unwrap(), 0xA5A5_0001);
        assert_eq!(space.read_relaxed(0x1C).unwrap(), 0xA5A5_0002);

        drop(space);
        assert_eq!(backing[0], 0xA5A5_0001);
        assert_eq!(backing[7], 0xA5A5_0002);
    }

    #[test]
    fn mmio_space_rejects_misaligned_and_out_of_range() {
        let mut backing = [0u32; 2];
        let mut space = unsafe { MmioSpace::new(backing.as_mut_ptr(), size_of_val(&backing)) };

        assert_eq!(space.read(0x02), Err(RegmapError::Denied));
        assert_eq!(space.write(0x08, 0), Err(RegmapError::Denied));
    }

    #[test]
    fn default_block_write_lands_consecutively() {
        struct Logged([u32; 4]);
        impl RegIo for Logged {
            fn read(&mut self, reg: u32) -> Result<u32, RegmapError> {
                Ok(self.0[(reg >> 2) as usize])
            }
            fn write(&mut self, reg: u32, val: u32) -> Result<(), RegmapError> {
                self.0[(reg >> 2) as usize] = val;
                Ok(())
            }
        }

        let mut io = Logged([0; 4]);
        io.write_block(0x4, &[7, 8, 9]).unwrap();
        assert_eq!(io.0, [0, 7, 8, 9]);
    }
}
