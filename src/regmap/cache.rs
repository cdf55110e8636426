use bitmaps::{Bitmap, Bits, BitsImpl};

use crate::regmap::types::RegDefault;

/// Value store with per-slot `cached`/`dirty` flags, one slot per
/// register at stride granularity.
///
/// A slot is `cached` once seeded from a default or written; only
/// `cached` slots are trustworthy reads. `dirty` marks slots that still
/// need to reach hardware through a sync or serializer pass.
pub(crate) struct FlatStore<const N: usize>
where
    BitsImpl<N>: Bits,
{
    values: [u32; N],
    cached: Bitmap<N>,
    dirty: Bitmap<N>,
}

impl<const N: usize> FlatStore<N>
where
    BitsImpl<N>: Bits,
{
    pub(crate) fn new() -> Self {
        Self {
            values: [0; N],
            cached: Bitmap::new(),
            dirty: Bitmap::new(),
        }
    }

    /// Seeds slots as cached-clean. Indices are validated by the caller.
    pub(crate) fn seed(&mut self, defaults: &[RegDefault]) {
        for d in defaults {
            let idx = (d.reg >> 2) as usize;
            self.values[idx] = d.val;
            self.cached.set(idx, true);
        }
    }

    pub(crate) fn reset(&mut self, defaults: &[RegDefault]) {
        self.values = [0; N];
        self.cached = Bitmap::new();
        self.dirty = Bitmap::new();
        self.seed(defaults);
    }

    #[inline]
    pub(crate) fn is_cached(&self, idx: usize) -> bool {
        self.cached.get(idx)
    }

    pub(crate) fn read(&self, idx: usize) -> Option<u32> {
        self.cached.get(idx).then(|| self.values[idx])
    }

    /// Stores a value, returning whether the slot was marked dirty.
    ///
    /// With `on_change` set, rewriting the value a slot already holds is
    /// absorbed without dirtying it.
    pub(crate) fn write(&mut self, idx: usize, val: u32, on_change: bool) -> bool {
        if on_change && self.cached.get(idx) && self.values[idx] == val {
            return false;
        }
        self.values[idx] = val;
        self.cached.set(idx, true);
        self.dirty.set(idx, true);
        true
    }

    /// Stores a write-through value: the slot becomes cached but not
    /// dirty, since the value is already on its way to hardware.
    pub(crate) fn store_clean(&mut self, idx: usize, val: u32) {
        self.values[idx] = val;
        self.cached.set(idx, true);
    }

    pub(crate) fn drop_region(&mut self, first: usize, last: usize) {
        for idx in first..=last {
            self.cached.set(idx, false);
            self.dirty.set(idx, false);
        }
    }

    pub(crate) fn first_dirty(&self) -> Option<usize> {
        self.dirty.first_index()
    }

    pub(crate) fn next_dirty(&self, idx: usize) -> Option<usize> {
        self.dirty.next_index(idx)
    }

    #[inline]
    pub(crate) fn value(&self, idx: usize) -> u32 {
        self.values[idx]
    }

    /// Values of an inclusive slot run, for burst writes.
    #[inline]
    pub(crate) fn run(&self, first: usize, last: usize) -> &[u32] {
        &self.values[first..=last]
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = Bitmap::new();
    }
}

/// Cache fidelity selected at construction and never re-dispatched.
pub(crate) enum CacheState<const N: usize>
where
    BitsImpl<N>: Bits,
{
    Disabled,
    Flat(FlatStore<N>),
    FlatThin(FlatStore<N>),
}

impl<const N: usize> CacheState<N>
where
    BitsImpl<N>: Bits,
{
    #[inline]
    pub(crate) fn enabled(&self) -> bool {
        !matches!(self, CacheState::Disabled)
    }

    /// Whether writes dirty only on value change.
    #[inline]
    pub(crate) fn on_change(&self) -> bool {
        matches!(self, CacheState::FlatThin(_))
    }

    pub(crate) fn store(&self) -> Option<&FlatStore<N>> {
        match self {
            CacheState::Disabled => None,
            CacheState::Flat(s) | CacheState::FlatThin(s) => Some(s),
        }
    }

    pub(crate) fn store_mut(&mut self) -> Option<&mut FlatStore<N>> {
        match self {
            CacheState::Disabled => None,
            CacheState::Flat(s) | CacheState::FlatThin(s) => Some(s),
        }
    }
}
