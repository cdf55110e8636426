//! Direct-mode example: validated register and field access
//!
//! This example demonstrates:
//! - Backing a register map with a plain-memory RegIo implementation
//! - Allow/deny access tables rejecting bad offsets
//! - Declaring a field table and using derived field accessors
//! - Read-modify-write helpers (update_bits, test_bits)

#![no_std]

use embedded_regmap::field_table;
use embedded_regmap::prelude::*;

const R_CTRL: u32 = 0x0000;
const R_STATUS: u32 = 0x0004;
const R_SIZE: u32 = 0x0008;
const R_LAST: u32 = 0x00FC;

field_table! {
    pub CtrlField: CTRL_FIELD_DESCS {
        Enable => (R_CTRL, 0, 0),
        Mode   => (R_CTRL, 1, 3),
        Width  => (R_SIZE, 0, 15),
        Height => (R_SIZE, 16, 31),
    }
}

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
    // R_STATUS is read-only: writable everywhere else, denied there.
    let wr_yes = [RegRange::new(R_CTRL, R_LAST)];
    let wr_no = [RegRange::new(R_STATUS, R_STATUS)];
    let wr_table = AccessTable::new(&wr_yes, &wr_no);

    let config = RegmapConfig {
        name: "ctrl-block",
        max_register: R_LAST,
        wr_table: Some(&wr_table),
        ..RegmapConfig::default()
    };
    let mut map: Regmap<'_, Mem, 64> = Regmap::new(Mem([0; 64]), &config).unwrap();

    // ========== Example 1: Plain round trip ==========
    map.write(R_CTRL, 0x0000_000B).unwrap();
    assert_eq!(map.read(R_CTRL).unwrap(), 0x0000_000B);

    // The read-only register rejects writes, with no side effect.
    assert_eq!(map.write(R_STATUS, 0xFFFF_FFFF), Err(RegmapError::Denied));

    // ========== Example 2: Field access ==========
    let fields: FieldBulk<4> = FieldBulk::from_descs(CTRL_FIELD_DESCS).unwrap();

    map.field_write(R_SIZE, fields.at(CtrlField::Width), 1920).unwrap();
    map.field_write(R_SIZE, fields.at(CtrlField::Height), 1080).unwrap();
    assert_eq!(map.read(R_SIZE).unwrap(), (1080 << 16) | 1920);

    // Writing one field leaves its neighbors alone.
    assert_eq!(
        map.field_read(R_SIZE, fields.at(CtrlField::Width)).unwrap(),
        1920
    );

    // ========== Example 3: Read-modify-write helpers ==========
    assert!(map.test_bits(R_CTRL, 0x3).unwrap());
    assert!(!map.test_bits(R_CTRL, 0x4).unwrap());

    // Clear the mode bits, keep enable.
    let changed = map.update_bits(R_CTRL, 0xE, 0).unwrap();
    assert!(changed);
    assert_eq!(map.read(R_CTRL).unwrap(), 0x1);
    assert_eq!(map.field_read(R_CTRL, fields.at(CtrlField::Mode)).unwrap(), 0);
}
