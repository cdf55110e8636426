use core::cell::RefCell;

use bitmaps::{Bits, BitsImpl};
use critical_section::Mutex;

use crate::regmap::{core::Regmap, io::RegIo};

/// Shares one register map between thread and interrupt contexts.
///
/// The map itself is not internally synchronized; this wrapper provides
/// the one sharing pattern the crate supports, scoped exclusive access
/// inside a critical section. Anything more elaborate belongs to the
/// owning driver's own locking.
pub struct SharedRegmap<'c, B, const N: usize>
where
    B: RegIo,
    BitsImpl<N>: Bits,
{
    inner: Mutex<RefCell<Regmap<'c, B, N>>>,
}

impl<'c, B, const N: usize> SharedRegmap<'c, B, N>
where
    B: RegIo,
    BitsImpl<N>: Bits,
{
    pub fn new(map: Regmap<'c, B, N>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(map)),
        }
    }

    /// Runs `f` with exclusive access to the map.
    ///
    /// Interrupts are masked for the duration, so keep the closure to
    /// the register work itself.
    pub fn with<R>(&self, f: impl FnOnce(&mut Regmap<'c, B, N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Unwraps the map once sharing is over.
    pub fn into_inner(self) -> Regmap<'c, B, N> {
        self.inner.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regmap::test_support::*;
    use crate::regmap::types::CacheKind;

    #[test]
    fn shared_map_round_trips_through_scoped_access() {
        let shared = SharedRegmap::new(test_map(CacheKind::None));

        shared.with(|map| map.write(R_RW, 0xCAFE_BABE)).unwrap();
        let val = shared.with(|map| map.read(R_RW)).unwrap();
        assert_eq!(val, 0xCAFE_BABE);

        let map = shared.into_inner();
        assert_eq!(map.name(), "fixture");
    }
}
