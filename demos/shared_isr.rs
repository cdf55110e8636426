//! Sharing example: one register map used from thread and ISR contexts
//!
//! This example demonstrates:
//! - Wrapping a map in SharedRegmap for critical-section access
//! - Thread-side staging of a configuration
//! - ISR-side sync of the dirty state to hardware

#![no_std]

use embedded_regmap::prelude::*;

const R_CTRL: u32 = 0x0000;
const R_COEFF: u32 = 0x0010;
const R_LAST: u32 = 0x007C;

struct Mem([u32; 32]);

impl RegIo for Mem {
    fn read(&mut self, reg: u32) -> Result<u32, RegmapError> {
        Ok(self.0[(reg >> 2) as usize])
    }

    fn write(&mut self, reg: u32, val: u32) -> Result<(), RegmapError> {
        self.0[(reg >> 2) as usize] = val;
        Ok(())
    }
}

pub fn main() {
    let defaults = [RegDefault { reg: R_CTRL, val: 0 }];
    let config = RegmapConfig {
        name: "shared-block",
        max_register: R_LAST,
        cache: CacheKind::Flat,
        defaults: &defaults,
        ..RegmapConfig::default()
    };
    let map: Regmap<'_, Mem, 32> = Regmap::new(Mem([0; 32]), &config).unwrap();
    let shared = SharedRegmap::new(map);

    // Thread side: stage the next configuration.
    shared
        .with(|map| {
            map.cache_set_only(true)?;
            map.write(R_CTRL, 1)?;
            map.write(R_COEFF, 0x4000_2000)
        })
        .unwrap();

    // ISR side (e.g. a frame-start interrupt): push it out.
    shared
        .with(|map| {
            map.cache_set_only(false)?;
            map.cache_sync()
        })
        .unwrap();

    // Hardware now holds the staged values.
    let coeff = shared
        .with(|map| {
            map.cache_set_bypass(true)?;
            let val = map.read(R_COEFF)?;
            map.cache_set_bypass(false)?;
            Ok::<u32, RegmapError>(val)
        })
        .unwrap();
    assert_eq!(coeff, 0x4000_2000);
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_shared_isr_example() {
        super::main();
    }
}
