use bitmaps::{Bits, BitsImpl};
use heapless::Vec;

use crate::regmap::{
    RegmapError,
    access::{AccessTable, Window},
    cache::{CacheState, FlatStore},
    field::Field,
    io::RegIo,
    types::{
        CacheKind, MAX_NOINC_RUNS, MAX_NUM_BANKS, NOINC_BURST_MAX, REG_STRIDE, RegDefault, RegSeq,
    },
};

/// Construction-time description of a register map.
///
/// All tables are borrowed; the map keeps references for its lifetime,
/// so configs are usually `static` in production and locals in tests.
#[derive(Debug, Clone, Copy)]
pub struct RegmapConfig<'c> {
    /// Diagnostic label, carried verbatim.
    pub name: &'c str,
    /// Physical base address recorded into loader headers.
    pub phys_base: u32,
    /// Highest addressable register offset, stride aligned.
    pub max_register: u32,
    pub cache: CacheKind,
    /// Seed values for cached registers; required for cached kinds.
    pub defaults: &'c [RegDefault],
    pub wr_table: Option<&'c AccessTable<'c>>,
    pub rd_table: Option<&'c AccessTable<'c>>,
    pub volatile_table: Option<&'c AccessTable<'c>>,
    pub wr_noinc_table: Option<&'c AccessTable<'c>>,
    /// Indirect/windowed register blocks.
    pub windows: &'c [Window<'c>],
    /// Shadow-bank copies of the register block; 0 or 1 means none.
    pub num_banks: u32,
    /// Address distance between consecutive banks, power of two.
    pub bank_stride: u32,
    /// Run the access tables on every transaction. Disabled only for
    /// validated hot paths.
    pub strict_ranges: bool,
    /// Sync dirty registers one at a time instead of in bursts.
    pub use_single_write: bool,
}

impl Default for RegmapConfig<'_> {
    fn default() -> Self {
        Self {
            name: "",
            phys_base: 0,
            max_register: 0,
            cache: CacheKind::None,
            defaults: &[],
            wr_table: None,
            rd_table: None,
            volatile_table: None,
            wr_noinc_table: None,
            windows: &[],
            num_banks: 0,
            bank_stride: 0,
            strict_ranges: true,
            use_single_write: false,
        }
    }
}

/// One staged no-increment burst, kept until a sync or serializer pass.
pub(crate) struct NoincRun {
    pub(crate) reg: u32,
    pub(crate) offset: u32,
    pub(crate) select_reg: u32,
    pub(crate) select_val: u32,
    pub(crate) offset_reg: u32,
    pub(crate) vals: Vec<u32, NOINC_BURST_MAX>,
}

/// The register map core: one instance per physical IP block.
///
/// Routes every register transaction through access validation, then
/// either the cache shadow or the [`RegIo`] backend. Not internally
/// synchronized; the owning driver serializes access (see
/// [`SharedRegmap`](crate::regmap::SharedRegmap) for the thread/ISR
/// sharing pattern).
///
/// `N` is the number of register slots and must cover
/// `max_register / 4 + 1`.
pub struct Regmap<'c, B, const N: usize>
where
    B: RegIo,
    BitsImpl<N>: Bits,
{
    backend: B,
    name: &'c str,
    phys_base: u32,
    max_register: u32,
    wr_table: Option<&'c AccessTable<'c>>,
    rd_table: Option<&'c AccessTable<'c>>,
    volatile_table: Option<&'c AccessTable<'c>>,
    wr_noinc_table: Option<&'c AccessTable<'c>>,
    windows: &'c [Window<'c>],
    defaults: &'c [RegDefault],
    pub(crate) cache: CacheState<N>,
    cache_bypass: bool,
    cache_only: bool,
    pub(crate) cache_dirty: bool,
    no_sync_defaults: bool,
    relaxed_io: bool,
    use_single_write: bool,
    strict_ranges: bool,
    num_banks: u32,
    bank_stride: u32,
    bank_mask: u32,
    pub(crate) noinc_runs: Vec<NoincRun, MAX_NOINC_RUNS>,
}

impl<'c, B, const N: usize> Regmap<'c, B, N>
where
    B: RegIo,
    BitsImpl<N>: Bits,
{
    /// Builds a map from a validated config.
    ///
    /// Fails with [`RegmapError::BadConfig`] on any malformed table, an
    /// oversized bank count, a misaligned or out-of-range default, an
    /// undersized slot count `N`, or an invalid window; nothing is
    /// constructed on failure.
    pub fn new(backend: B, cfg: &RegmapConfig<'c>) -> Result<Self, RegmapError> {
        if cfg.num_banks > MAX_NUM_BANKS {
            return Err(RegmapError::BadConfig);
        }
        let bank_mask = if cfg.num_banks >= 2 {
            if cfg.bank_stride == 0 || !cfg.bank_stride.is_power_of_two() {
                return Err(RegmapError::BadConfig);
            }
            (cfg.num_banks.next_power_of_two() - 1)
                .checked_mul(cfg.bank_stride)
                .ok_or(RegmapError::BadConfig)?
        } else {
            0
        };

        if cfg.max_register % REG_STRIDE != 0 || (cfg.max_register >> 2) as usize >= N {
            return Err(RegmapError::BadConfig);
        }

        for table in [
            cfg.wr_table,
            cfg.rd_table,
            cfg.volatile_table,
            cfg.wr_noinc_table,
        ]
        .into_iter()
        .flatten()
        {
            table.validate()?;
        }
        for window in cfg.windows {
            window.validate()?;
        }

        let cache = if cfg.cache == CacheKind::None {
            CacheState::Disabled
        } else {
            if cfg.defaults.is_empty() {
                return Err(RegmapError::BadConfig);
            }
            for d in cfg.defaults {
                if d.reg % REG_STRIDE != 0 || d.reg > cfg.max_register {
                    return Err(RegmapError::BadConfig);
                }
            }
            let mut store = FlatStore::new();
            store.seed(cfg.defaults);
            if cfg.cache == CacheKind::Flat {
                CacheState::Flat(store)
            } else {
                CacheState::FlatThin(store)
            }
        };
        // A cache-less map short-circuits every cache hit check.
        let cache_bypass = !cache.enabled();

        Ok(Self {
            backend,
            name: cfg.name,
            phys_base: cfg.phys_base,
            max_register: cfg.max_register,
            wr_table: cfg.wr_table,
            rd_table: cfg.rd_table,
            volatile_table: cfg.volatile_table,
            wr_noinc_table: cfg.wr_noinc_table,
            windows: cfg.windows,
            defaults: cfg.defaults,
            cache,
            cache_bypass,
            cache_only: false,
            cache_dirty: false,
            no_sync_defaults: false,
            relaxed_io: false,
            use_single_write: cfg.use_single_write,
            strict_ranges: cfg.strict_ranges,
            num_banks: cfg.num_banks,
            bank_stride: cfg.bank_stride,
            bank_mask,
            noinc_runs: Vec::new(),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name
    }

    #[inline]
    pub fn phys_base(&self) -> u32 {
        self.phys_base
    }

    #[inline]
    pub fn max_register(&self) -> u32 {
        self.max_register
    }

    #[inline]
    pub fn num_banks(&self) -> u32 {
        self.num_banks
    }

    #[inline]
    pub fn bank_mask(&self) -> u32 {
        self.bank_mask
    }

    /// Composes the offset addressing `reg` in shadow bank `bank`.
    /// Bank 0 is the live copy, so the offset comes back unchanged.
    #[inline]
    pub fn bank_reg(&self, bank: u32, reg: u32) -> u32 {
        reg | (bank * self.bank_stride)
    }

    #[inline]
    pub fn relaxed_io(&self) -> bool {
        self.relaxed_io
    }

    /// Makes every access skip ordering fences, as if the relaxed
    /// variants were used throughout.
    pub fn set_relaxed_io(&mut self, relaxed: bool) {
        self.relaxed_io = relaxed;
    }

    pub fn set_use_single_write(&mut self, single: bool) {
        self.use_single_write = single;
    }

    #[inline]
    pub fn is_cache_dirty(&self) -> bool {
        self.cache_dirty
    }

    #[inline]
    pub fn is_cache_only(&self) -> bool {
        self.cache_only
    }

    #[inline]
    pub fn is_cache_bypass(&self) -> bool {
        self.cache_bypass
    }

    /// Direct access to the backend, for delay hooks or test harness
    /// inspection. Bypasses every table and cache.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn writeable(&self, reg: u32) -> bool {
        self.wr_table.map_or(true, |t| t.allows(reg))
    }

    pub fn readable(&self, reg: u32) -> bool {
        self.rd_table.map_or(true, |t| t.allows(reg))
    }

    pub fn is_volatile(&self, reg: u32) -> bool {
        self.volatile_table.is_some_and(|t| t.allows(reg))
    }

    pub fn writeable_noinc(&self, reg: u32) -> bool {
        self.wr_noinc_table.is_some_and(|t| t.allows(reg))
    }

    /// Strips shadow-bank bits, yielding the offset used for access
    /// validation and cache indexing.
    #[inline]
    fn debank(&self, reg: u32) -> u32 {
        reg & !self.bank_mask
    }

    fn index_of(&self, base: u32) -> Result<usize, RegmapError> {
        if base % REG_STRIDE != 0 || base > self.max_register {
            return Err(RegmapError::Denied);
        }
        Ok((base >> 2) as usize)
    }

    fn hw_read(&mut self, reg: u32, relaxed: bool) -> Result<u32, RegmapError> {
        if relaxed || self.relaxed_io {
            self.backend.read_relaxed(reg)
        } else {
            self.backend.read(reg)
        }
    }

    fn hw_write(&mut self, reg: u32, val: u32, relaxed: bool) -> Result<(), RegmapError> {
        if relaxed || self.relaxed_io {
            self.backend.write_relaxed(reg, val)
        } else {
            self.backend.write(reg, val)
        }
    }

    pub fn read(&mut self, reg: u32) -> Result<u32, RegmapError> {
        self.read_impl(reg, false)
    }

    pub fn read_relaxed(&mut self, reg: u32) -> Result<u32, RegmapError> {
        self.read_impl(reg, true)
    }

    fn read_impl(&mut self, reg: u32, relaxed: bool) -> Result<u32, RegmapError> {
        let base = self.debank(reg);
        if self.strict_ranges && !self.readable(base) {
            return Err(RegmapError::Denied);
        }
        let idx = self.index_of(base)?;

        let from_cache = base == reg && !self.cache_bypass && !self.is_volatile(base);
        if from_cache {
            if let Some(val) = self.cache.store().and_then(|s| s.read(idx)) {
                return Ok(val);
            }
        }
        if self.cache_only {
            // Nothing may touch hardware while writes are being staged.
            return Err(RegmapError::Conflict);
        }
        self.hw_read(reg, relaxed)
    }

    pub fn write(&mut self, reg: u32, val: u32) -> Result<(), RegmapError> {
        self.write_impl(reg, val, false)
    }

    pub fn write_relaxed(&mut self, reg: u32, val: u32) -> Result<(), RegmapError> {
        self.write_impl(reg, val, true)
    }

    fn write_impl(&mut self, reg: u32, val: u32, relaxed: bool) -> Result<(), RegmapError> {
        let base = self.debank(reg);
        if self.strict_ranges && !self.writeable(base) {
            return Err(RegmapError::Denied);
        }
        let idx = self.index_of(base)?;

        let to_cache =
            base == reg && self.cache.enabled() && !self.cache_bypass && !self.is_volatile(base);

        if self.cache_only {
            if !to_cache {
                return Err(RegmapError::Conflict);
            }
            let on_change = self.cache.on_change();
            if let Some(store) = self.cache.store_mut() {
                if store.write(idx, val, on_change) {
                    self.cache_dirty = true;
                }
            }
            return Ok(());
        }

        self.hw_write(reg, val, relaxed)?;
        if to_cache {
            if let Some(store) = self.cache.store_mut() {
                store.store_clean(idx, val);
            }
        }
        Ok(())
    }

    /// Writes `vals` to consecutive registers starting at `reg`.
    pub fn bulk_write(&mut self, reg: u32, vals: &[u32]) -> Result<(), RegmapError> {
        if vals.is_empty() {
            return Err(RegmapError::InvalidLength);
        }
        for (i, val) in vals.iter().enumerate() {
            self.write(reg + i as u32 * REG_STRIDE, *val)?;
        }
        Ok(())
    }

    /// Reads consecutive registers starting at `reg` into `out`.
    pub fn bulk_read(&mut self, reg: u32, out: &mut [u32]) -> Result<(), RegmapError> {
        if out.is_empty() {
            return Err(RegmapError::InvalidLength);
        }
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.read(reg + i as u32 * REG_STRIDE)?;
        }
        Ok(())
    }

    /// Applies a sequence of arbitrary register writes in order,
    /// honoring each entry's settle-time hint.
    pub fn multi_write(&mut self, seq: &[RegSeq]) -> Result<(), RegmapError> {
        if seq.is_empty() {
            return Err(RegmapError::InvalidLength);
        }
        for entry in seq {
            self.write(entry.reg, entry.val)?;
            if entry.delay_us > 0 {
                self.backend.delay_us(entry.delay_us);
            }
        }
        Ok(())
    }

    /// Like [`multi_write`](Self::multi_write) but straight to hardware,
    /// leaving any configured cache untouched.
    pub fn multi_write_bypassed(&mut self, seq: &[RegSeq]) -> Result<(), RegmapError> {
        if seq.is_empty() {
            return Err(RegmapError::InvalidLength);
        }
        for entry in seq {
            let base = self.debank(entry.reg);
            if self.strict_ranges && !self.writeable(base) {
                return Err(RegmapError::Denied);
            }
            self.index_of(base)?;
            self.hw_write(entry.reg, entry.val, false)?;
            if entry.delay_us > 0 {
                self.backend.delay_us(entry.delay_us);
            }
        }
        Ok(())
    }

    /// Byte-exact block write starting at `reg`; words are little-endian.
    pub fn raw_write(&mut self, reg: u32, bytes: &[u8]) -> Result<(), RegmapError> {
        if bytes.is_empty() || bytes.len() % REG_STRIDE as usize != 0 {
            return Err(RegmapError::InvalidLength);
        }
        for (i, chunk) in bytes.chunks_exact(REG_STRIDE as usize).enumerate() {
            let val = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            self.write(reg + i as u32 * REG_STRIDE, val)?;
        }
        Ok(())
    }

    /// Byte-exact block read starting at `reg`.
    pub fn raw_read(&mut self, reg: u32, out: &mut [u8]) -> Result<(), RegmapError> {
        if out.is_empty() || out.len() % REG_STRIDE as usize != 0 {
            return Err(RegmapError::InvalidLength);
        }
        for (i, chunk) in out.chunks_exact_mut(REG_STRIDE as usize).enumerate() {
            let val = self.read(reg + i as u32 * REG_STRIDE)?;
            chunk.copy_from_slice(&val.to_le_bytes());
        }
        Ok(())
    }

    /// Bursts `vals` into the no-increment window containing `reg`,
    /// starting at slot `offset`.
    ///
    /// The window's internal pointer is seeked first by programming its
    /// select/offset control registers. `vals` must be a whole number of
    /// window slots and fit the window past `offset`. In cache-only mode
    /// the burst is staged in write order for the next sync or
    /// serializer pass and hardware stays untouched.
    pub fn noinc_write(&mut self, reg: u32, offset: u32, vals: &[u32]) -> Result<(), RegmapError> {
        if vals.is_empty() {
            return Err(RegmapError::InvalidLength);
        }
        if self.strict_ranges && !self.writeable_noinc(reg) {
            return Err(RegmapError::Denied);
        }
        let window = *self
            .windows
            .iter()
            .find(|w| w.contains(reg))
            .ok_or(RegmapError::Denied)?;

        let stride = window.stride as usize;
        if vals.len() % stride != 0 {
            return Err(RegmapError::InvalidLength);
        }
        let slots = (vals.len() / stride) as u32;
        if offset.checked_add(slots).is_none_or(|end| end > window.count) {
            return Err(RegmapError::InvalidLength);
        }

        if self.cache_only {
            let mut staged = Vec::new();
            staged
                .extend_from_slice(vals)
                .map_err(|_| RegmapError::StageFull)?;
            self.noinc_runs
                .push(NoincRun {
                    reg,
                    offset,
                    select_reg: window.select_reg,
                    select_val: window.select_val,
                    offset_reg: window.offset_reg,
                    vals: staged,
                })
                .map_err(|_| RegmapError::StageFull)?;
            self.cache_dirty = true;
            return Ok(());
        }

        self.hw_write(window.select_reg, window.select_val, false)?;
        self.hw_write(window.offset_reg, offset, false)?;
        for val in vals {
            self.hw_write(reg, *val, false)?;
        }
        Ok(())
    }

    /// Returns whether every bit of `mask` is set in `reg`.
    pub fn test_bits(&mut self, reg: u32, mask: u32) -> Result<bool, RegmapError> {
        Ok((self.read(reg)? & mask) == mask)
    }

    /// Read-modify-write of the masked bits; returns whether the
    /// register value changed.
    pub fn update_bits(&mut self, reg: u32, mask: u32, val: u32) -> Result<bool, RegmapError> {
        self.update_bits_impl(reg, mask, val, false)
    }

    fn update_bits_impl(
        &mut self,
        reg: u32,
        mask: u32,
        val: u32,
        force: bool,
    ) -> Result<bool, RegmapError> {
        let old = self.read(reg)?;
        let new = (old & !mask) | (val & mask);
        let changed = new != old;
        if changed || force {
            self.write(reg, new)?;
        }
        Ok(changed)
    }

    /// Reads one bit-field of `reg`.
    ///
    /// The register offset is explicit so the same field can be read
    /// through a shadow-bank offset; `field.reg` is the home offset only.
    pub fn field_read(&mut self, reg: u32, field: &Field) -> Result<u32, RegmapError> {
        Ok(field.decode(self.read(reg)?))
    }

    /// Writes one bit-field of `reg`, leaving all other bits untouched.
    pub fn field_write(&mut self, reg: u32, field: &Field, val: u32) -> Result<(), RegmapError> {
        self.update_bits_impl(reg, field.mask, val << field.shift, false)
            .map(|_| ())
    }

    /// Updates the masked bits of a field, field-relative; returns
    /// whether the register changed. Skips the hardware write when
    /// nothing changes.
    pub fn field_update_bits(
        &mut self,
        reg: u32,
        field: &Field,
        mask: u32,
        val: u32,
    ) -> Result<bool, RegmapError> {
        self.field_update_impl(reg, field, mask, val, false)
    }

    /// Like [`field_update_bits`](Self::field_update_bits) but writes
    /// even when the value is unchanged.
    pub fn field_update_bits_force(
        &mut self,
        reg: u32,
        field: &Field,
        mask: u32,
        val: u32,
    ) -> Result<bool, RegmapError> {
        self.field_update_impl(reg, field, mask, val, true)
    }

    fn field_update_impl(
        &mut self,
        reg: u32,
        field: &Field,
        mask: u32,
        val: u32,
        force: bool,
    ) -> Result<bool, RegmapError> {
        let fmask = (mask << field.shift) & field.mask;
        self.update_bits_impl(reg, fmask, val << field.shift, force)
    }

    /// Reads the shadow without touching hardware.
    pub fn cache_read(&self, reg: u32) -> Result<u32, RegmapError> {
        let store = self.cache.store().ok_or(RegmapError::NoCache)?;
        let idx = self.index_of(self.debank(reg))?;
        store.read(idx).ok_or(RegmapError::NotCached)
    }

    /// Updates the shadow and marks the slot dirty. Benign no-op on a
    /// cache-less map.
    pub fn cache_write(&mut self, reg: u32, val: u32) -> Result<(), RegmapError> {
        let idx = self.index_of(self.debank(reg))?;
        let on_change = self.cache.on_change();
        if let Some(store) = self.cache.store_mut() {
            if store.write(idx, val, on_change) {
                self.cache_dirty = true;
            }
        }
        Ok(())
    }

    /// Distinguishes "never cached" ([`RegmapError::NotCached`]) from a
    /// populated slot, without the access-table verdicts of
    /// [`read`](Self::read).
    pub fn cache_lookup(&self, reg: u32) -> Result<u32, RegmapError> {
        let store = self.cache.store().ok_or(RegmapError::NoCache)?;
        let idx = self
            .index_of(self.debank(reg))
            .map_err(|_| RegmapError::NotCached)?;
        store.read(idx).ok_or(RegmapError::NotCached)
    }

    /// Whether the shadow currently holds a trustworthy value for `reg`.
    /// Always false outside the readable ranges and on cache-less maps.
    pub fn cached(&self, reg: u32) -> bool {
        let base = self.debank(reg);
        if !self.readable(base) {
            return false;
        }
        let Ok(idx) = self.index_of(base) else {
            return false;
        };
        self.cache.store().is_some_and(|s| s.is_cached(idx))
    }

    /// Pushes every dirty slot and staged burst out to hardware, then
    /// clears the dirty state. Idempotent when nothing is dirty.
    ///
    /// Dirty runs go out register-by-register when single-write mode is
    /// set (or when default-valued slots must be skipped after
    /// [`cache_mark_dirty`](Self::cache_mark_dirty)), otherwise as
    /// contiguous bursts through [`RegIo::write_block`].
    pub fn cache_sync(&mut self) -> Result<(), RegmapError> {
        if !self.cache_dirty {
            return Ok(());
        }
        let relaxed = self.relaxed_io;
        let single = self.use_single_write || self.no_sync_defaults;
        let skip_defaults = self.no_sync_defaults;
        let defaults = self.defaults;

        if let CacheState::Flat(store) | CacheState::FlatThin(store) = &mut self.cache {
            let backend = &mut self.backend;
            let mut next = store.first_dirty();
            while let Some(start) = next {
                if single {
                    let reg = (start as u32) << 2;
                    let val = store.value(start);
                    let at_default = defaults.iter().any(|d| d.reg == reg && d.val == val);
                    if !(skip_defaults && at_default) {
                        io_write(backend, reg, val, relaxed)?;
                    }
                    next = store.next_dirty(start);
                    continue;
                }
                let mut end = start;
                let mut after = store.next_dirty(end);
                while let Some(idx) = after {
                    if idx != end + 1 {
                        break;
                    }
                    end = idx;
                    after = store.next_dirty(idx);
                }
                backend.write_block((start as u32) << 2, store.run(start, end))?;
                next = after;
            }
            store.clear_dirty();
        }

        let runs = core::mem::take(&mut self.noinc_runs);
        for run in &runs {
            self.hw_write(run.select_reg, run.select_val, relaxed)?;
            self.hw_write(run.offset_reg, run.offset, relaxed)?;
            for val in &run.vals {
                self.hw_write(run.reg, *val, relaxed)?;
            }
        }

        self.cache_dirty = false;
        self.no_sync_defaults = false;
        Ok(())
    }

    /// Flags the whole cache as needing a sync, typically after the
    /// device lost state (power collapse). Slots still holding their
    /// default value are not re-pushed by the following sync.
    pub fn cache_mark_dirty(&mut self) {
        self.cache_dirty = true;
        self.no_sync_defaults = true;
    }

    /// Reseeds the shadow from the configured defaults and clears all
    /// dirty state, including staged bursts.
    pub fn reset_cache(&mut self) -> Result<(), RegmapError> {
        let defaults = self.defaults;
        match &mut self.cache {
            CacheState::Disabled => Err(RegmapError::NoCache),
            CacheState::Flat(store) | CacheState::FlatThin(store) => {
                store.reset(defaults);
                self.cache_dirty = false;
                self.no_sync_defaults = false;
                self.noinc_runs.clear();
                Ok(())
            }
        }
    }

    /// Forgets cached state for the inclusive register range, so stale
    /// values are re-fetched from hardware.
    pub fn cache_drop_region(&mut self, first: u32, last: u32) -> Result<(), RegmapError> {
        if first > last {
            return Err(RegmapError::InvalidLength);
        }
        let lo = self.index_of(self.debank(first))?;
        let hi = self.index_of(self.debank(last))?;
        match &mut self.cache {
            CacheState::Disabled => Err(RegmapError::NoCache),
            CacheState::Flat(store) | CacheState::FlatThin(store) => {
                store.drop_region(lo, hi);
                Ok(())
            }
        }
    }

    /// Byte-exact block write into the shadow only, marking the written
    /// slots dirty. Degrades to a direct hardware write on a cache-less
    /// map.
    pub fn cache_raw_write(&mut self, reg: u32, bytes: &[u8]) -> Result<(), RegmapError> {
        if !self.cache.enabled() {
            return self.raw_write(reg, bytes);
        }
        if bytes.is_empty() || bytes.len() % REG_STRIDE as usize != 0 {
            return Err(RegmapError::InvalidLength);
        }
        let idx = self.index_of(self.debank(reg))?;
        self.index_of(self.debank(reg) + bytes.len() as u32 - REG_STRIDE)?;
        let on_change = self.cache.on_change();
        if let Some(store) = self.cache.store_mut() {
            for (i, chunk) in bytes.chunks_exact(REG_STRIDE as usize).enumerate() {
                let val = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                if store.write(idx + i, val, on_change) {
                    self.cache_dirty = true;
                }
            }
        }
        Ok(())
    }

    /// Byte-exact block read from the shadow only. Degrades to a direct
    /// hardware read on a cache-less map.
    pub fn cache_raw_read(&mut self, reg: u32, out: &mut [u8]) -> Result<(), RegmapError> {
        if !self.cache.enabled() {
            return self.raw_read(reg, out);
        }
        if out.is_empty() || out.len() % REG_STRIDE as usize != 0 {
            return Err(RegmapError::InvalidLength);
        }
        let idx = self.index_of(self.debank(reg))?;
        if let Some(store) = self.cache.store() {
            for (i, chunk) in out.chunks_exact_mut(REG_STRIDE as usize).enumerate() {
                let val = store.read(idx + i).ok_or(RegmapError::NotCached)?;
                chunk.copy_from_slice(&val.to_le_bytes());
            }
        }
        Ok(())
    }

    /// Confines subsequent writes to the shadow, pending a sync or
    /// serializer pass. Refused while bypass is active.
    pub fn cache_set_only(&mut self, enable: bool) -> Result<(), RegmapError> {
        if enable && self.cache_bypass {
            return Err(RegmapError::Conflict);
        }
        self.cache_only = enable;
        Ok(())
    }

    /// Sends every access straight to hardware, ignoring the shadow.
    /// Refused while cache-only staging is active.
    pub fn cache_set_bypass(&mut self, enable: bool) -> Result<(), RegmapError> {
        if enable && self.cache_only {
            return Err(RegmapError::Conflict);
        }
        self.cache_bypass = enable;
        Ok(())
    }
}

fn io_write<B: RegIo>(backend: &mut B, reg: u32, val: u32, relaxed: bool) -> Result<(), RegmapError> {
    if relaxed {
        backend.write_relaxed(reg, val)
    } else {
        backend.write(reg, val)
    }
}
