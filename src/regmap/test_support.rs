//! Test support utilities - only compiled in test builds.

use crate::regmap::{
    RegmapError,
    access::{AccessTable, RegRange, Window},
    core::{Regmap, RegmapConfig},
    field::FieldDesc,
    io::RegIo,
    types::{CacheKind, RegDefault},
};

// Standard fixture register layout.
pub(crate) const R_RW: u32 = 0x0000;
pub(crate) const R_RO: u32 = 0x0008;
pub(crate) const R_WO: u32 = 0x0010;
pub(crate) const R_VOL: u32 = 0x0018;
pub(crate) const R_LUT_SELECT: u32 = 0x0040;
pub(crate) const R_LUT_OFFSET: u32 = 0x0044;
pub(crate) const R_LUT_DATA: u32 = 0x0048;
pub(crate) const R_FIELD: u32 = 0x0068;
pub(crate) const R_BLOB: u32 = 0x0100;
pub(crate) const R_BLOB_END: u32 = 0x01FC;
pub(crate) const R_BULK: u32 = 0x0200;
pub(crate) const R_SEQ: u32 = 0x0300;
pub(crate) const R_SCRATCH: u32 = 0x0400;
pub(crate) const R_LAST: u32 = 0x0FFC;

pub(crate) const PHYS_BASE: u32 = 0x00D4_0000;
pub(crate) const BANK_STRIDE: u32 = 0x4000;
pub(crate) const SLOTS: usize = (R_LAST >> 2) as usize + 1;

static WR_YES: [RegRange; 4] = [
    RegRange::new(R_RW, R_RW),
    RegRange::new(R_WO, R_FIELD),
    RegRange::new(R_BLOB, R_BLOB_END),
    RegRange::new(R_BULK, R_LAST),
];
static WR_NO: [RegRange; 1] = [RegRange::new(R_RO, R_RO)];
static WR_TABLE: AccessTable<'static> = AccessTable::new(&WR_YES, &WR_NO);

static RD_YES: [RegRange; 4] = [
    RegRange::new(R_RW, R_RO),
    RegRange::new(R_VOL, R_FIELD),
    RegRange::new(R_BLOB, R_BLOB_END),
    RegRange::new(R_BULK, R_LAST),
];
static RD_TABLE: AccessTable<'static> = AccessTable::new(&RD_YES, &[]);

static VOL_YES: [RegRange; 1] = [RegRange::new(R_VOL, R_VOL)];
static VOL_TABLE: AccessTable<'static> = AccessTable::new(&VOL_YES, &[]);

static NOINC_YES: [RegRange; 1] = [RegRange::new(R_LUT_DATA, R_LUT_DATA)];
static NOINC_TABLE: AccessTable<'static> = AccessTable::new(&NOINC_YES, &[]);

pub(crate) static WINDOWS: [Window<'static>; 1] = [Window {
    name: "lut",
    min: R_LUT_DATA,
    max: R_LUT_DATA,
    select_reg: R_LUT_SELECT,
    select_val: 1,
    offset_reg: R_LUT_OFFSET,
    stride: 2,
    count: 4,
}];

pub(crate) static DEFAULTS: [RegDefault; 2] = [
    RegDefault { reg: R_RW, val: 1 },
    RegDefault { reg: R_WO, val: 2 },
];

/// Sub-fields of `R_FIELD`, by bit span.
pub(crate) const FIELD_DESCS: [FieldDesc; 5] = [
    FieldDesc::new(R_FIELD, 0, 0),
    FieldDesc::new(R_FIELD, 1, 2),
    FieldDesc::new(R_FIELD, 4, 7),
    FieldDesc::new(R_FIELD, 8, 15),
    FieldDesc::new(R_FIELD, 16, 31),
];
pub(crate) const F_0: usize = 0;
pub(crate) const F_1_2: usize = 1;
pub(crate) const F_4_7: usize = 2;
pub(crate) const F_8_15: usize = 3;
pub(crate) const F_16_31: usize = 4;

/// Memory-backed register space covering two shadow banks.
pub(crate) const MEM_WORDS: usize = (2 * BANK_STRIDE as usize) / 4;

pub(crate) struct MemIo {
    regs: [u32; MEM_WORDS],
}

impl MemIo {
    pub(crate) fn new() -> Self {
        Self {
            regs: [0; MEM_WORDS],
        }
    }

    /// Out-of-band read, bypassing the map entirely.
    pub(crate) fn peek(&self, reg: u32) -> u32 {
        self.regs[(reg >> 2) as usize]
    }

    /// Out-of-band write, e.g. to corrupt backing state under the map.
    pub(crate) fn poke(&mut self, reg: u32, val: u32) {
        self.regs[(reg >> 2) as usize] = val;
    }
}

impl RegIo for MemIo {
    fn read(&mut self, reg: u32) -> Result<u32, RegmapError> {
        self.regs
            .get((reg >> 2) as usize)
            .copied()
            .ok_or(RegmapError::Io)
    }

    fn write(&mut self, reg: u32, val: u32) -> Result<(), RegmapError> {
        let slot = self
            .regs
            .get_mut((reg >> 2) as usize)
            .ok_or(RegmapError::Io)?;
        *slot = val;
        Ok(())
    }
}

/// Backend that counts transactions and settle hints.
pub(crate) struct CountingIo {
    pub(crate) inner: MemIo,
    pub(crate) reads: usize,
    pub(crate) writes: usize,
    pub(crate) blocks: usize,
    pub(crate) delays: usize,
    pub(crate) delay_total_us: u32,
}

impl CountingIo {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemIo::new(),
            reads: 0,
            writes: 0,
            blocks: 0,
            delays: 0,
            delay_total_us: 0,
        }
    }
}

impl RegIo for CountingIo {
    fn read(&mut self, reg: u32) -> Result<u32, RegmapError> {
        self.reads += 1;
        self.inner.read(reg)
    }

    fn write(&mut self, reg: u32, val: u32) -> Result<(), RegmapError> {
        self.writes += 1;
        self.inner.write(reg, val)
    }

    fn write_block(&mut self, reg: u32, vals: &[u32]) -> Result<(), RegmapError> {
        self.blocks += 1;
        for (i, val) in vals.iter().enumerate() {
            self.inner.write(reg + 4 * i as u32, *val)?;
        }
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.delays += 1;
        self.delay_total_us += us;
    }
}

pub(crate) fn test_config(cache: CacheKind) -> RegmapConfig<'static> {
    RegmapConfig {
        name: "fixture",
        phys_base: PHYS_BASE,
        max_register: R_LAST,
        cache,
        defaults: &DEFAULTS,
        wr_table: Some(&WR_TABLE),
        rd_table: Some(&RD_TABLE),
        volatile_table: Some(&VOL_TABLE),
        wr_noinc_table: Some(&NOINC_TABLE),
        windows: &WINDOWS,
        num_banks: 2,
        bank_stride: BANK_STRIDE,
        strict_ranges: true,
        use_single_write: false,
    }
}

pub(crate) type TestMap = Regmap<'static, MemIo, SLOTS>;

pub(crate) fn test_map(cache: CacheKind) -> TestMap {
    Regmap::new(MemIo::new(), &test_config(cache)).unwrap()
}

pub(crate) fn test_map_counting(cache: CacheKind) -> Regmap<'static, CountingIo, SLOTS> {
    Regmap::new(CountingIo::new(), &test_config(cache)).unwrap()
}

/// The cache kinds that actually shadow registers.
pub(crate) const CACHED_KINDS: [CacheKind; 2] = [CacheKind::Flat, CacheKind::FlatThin];
