//! Frame-staging example: cache-only writes serialized for a DMA loader
//!
//! This example demonstrates:
//! - A flat register shadow seeded with defaults
//! - Staging a whole frame configuration in cache-only mode
//! - A no-increment LUT burst staged alongside ordinary writes
//! - Serializing the staged state into loader header/payload records
//! - Appending extra register pairs computed outside the cache

#![no_std]

use embedded_regmap::prelude::*;
use embedded_regmap::regmap::loader::{TAG_PAIR, TAG_REPEAT, TAG_VALID};

const R_ENABLE: u32 = 0x0000;
const R_SIZE: u32 = 0x0010;
const R_GAMMA_SELECT: u32 = 0x0020;
const R_GAMMA_OFFSET: u32 = 0x0024;
const R_GAMMA_DATA: u32 = 0x0028;
const R_CROP: u32 = 0x0040;
const R_LAST: u32 = 0x00FC;

struct Mem([u32; 64]);

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
    let noinc_yes = [RegRange::new(R_GAMMA_DATA, R_GAMMA_DATA)];
    let noinc_table = AccessTable::new(&noinc_yes, &[]);
    let windows = [Window {
        name: "gamma",
        min: R_GAMMA_DATA,
        max: R_GAMMA_DATA,
        select_reg: R_GAMMA_SELECT,
        select_val: 1,
        offset_reg: R_GAMMA_OFFSET,
        stride: 2,
        count: 8,
    }];
    let defaults = [RegDefault { reg: R_ENABLE, val: 0 }];

    let config = RegmapConfig {
        name: "scaler",
        phys_base: 0x1A40_0000,
        max_register: R_LAST,
        cache: CacheKind::Flat,
        defaults: &defaults,
        wr_noinc_table: Some(&noinc_table),
        windows: &windows,
        ..RegmapConfig::default()
    };
    let mut map: Regmap<'_, Mem, 64> = Regmap::new(Mem([0; 64]), &config).unwrap();

    // ========== Stage the frame configuration ==========
    map.cache_set_only(true).unwrap();

    map.write(R_ENABLE, 1).unwrap();
    map.write(R_SIZE, (1080 << 16) | 1920).unwrap();
    map.write(R_CROP, 0x0010_0010).unwrap();

    // A gamma curve segment streamed through the LUT data register.
    let curve = [0x0000_0040, 0x0080_00C0, 0x0100_0140, 0x0180_01C0];
    map.noinc_write(R_GAMMA_DATA, 0, &curve).unwrap();

    // Nothing reached hardware yet.
    assert!(map.is_cache_dirty());

    // ========== Serialize for the loader ==========
    let mut headers = [LoaderHeader::default(); 8];
    let mut payloads = [LoaderPayload::default(); 8];
    let mut clb = LoaderBuffer::new(&mut headers, &mut payloads);
    clb.header_dva = 0x8000_1000; // where the DMA engine will fetch from

    map.cache_fsync(&mut clb, Formatter::Pair).unwrap();

    // Settings computed outside the cache join the same burst.
    let mut extra: CrSet<4> = CrSet::new();
    extra.push(R_CROP + 4, 0x0400_0300).unwrap();
    map.cache_fsync_ext(&mut clb, extra.as_slice()).unwrap();
    clb.finalize();

    // ========== Hand the records to the device ==========
    // Pair blocks for the registers, one repeat block for the burst,
    // one pair block for the extras.
    let blocks = clb.used_headers();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].0[0], TAG_VALID | TAG_PAIR);
    assert_eq!(blocks[1].0[0], TAG_VALID | TAG_PAIR | TAG_REPEAT);
    assert_eq!(blocks[2].0[0], TAG_VALID | TAG_PAIR);

    // The staged state is consumed; the next frame starts clean.
    assert!(!map.is_cache_dirty());
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_staged_frame_example() {
        super::main();
    }
}
