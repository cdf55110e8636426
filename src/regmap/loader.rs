//! Serialization of staged register state into DMA-loader records.
//!
//! A loader block is one fixed-size header plus one fixed-size payload
//! record, consumed pairwise and in array order by a hardware DMA engine
//! that applies the described writes in a single burst at the next frame
//! boundary. The record layout is a device contract and must stay
//! byte-stable:
//!
//! ```text
//! header word 0   tag: bit 19 block-valid, bit 16 pair-format,
//!                 bit 17 repeat (no-increment burst)
//! header word 1   byte offset of the block's payload record
//! header word 2   phys_base + first register offset of the block
//!                 (bare phys_base for extra-CR blocks, whose payload
//!                 carries every address explicitly)
//! header word 3   valid mask: bit 2*i set per used payload word i
//! payload         16 words; run values, or (address, value) pairs
//! ```
//!
//! Value-run blocks hold up to 16 registers, pair blocks up to 8 pairs.

use bitmaps::{Bits, BitsImpl};

use crate::regmap::{
    RegmapError,
    cache::CacheState,
    core::Regmap,
    io::RegIo,
    types::{CrPair, Formatter},
};

/// Words per header record.
pub const HEADER_WORDS: usize = 4;
/// Words per payload record.
pub const PAYLOAD_WORDS: usize = 16;
/// Address/value pairs fitting one payload record.
pub const PAIRS_PER_BLOCK: usize = PAYLOAD_WORDS / 2;

/// Header tag bit: the block is populated.
pub const TAG_VALID: u32 = 1 << 19;
/// Header tag bit: payload is (address, value) pairs.
pub const TAG_PAIR: u32 = 1 << 16;
/// Header tag bit: payload replays a no-increment burst.
pub const TAG_REPEAT: u32 = 1 << 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct LoaderHeader(pub [u32; HEADER_WORDS]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct LoaderPayload(pub [u32; PAYLOAD_WORDS]);

impl Default for LoaderPayload {
    fn default() -> Self {
        Self([0; PAYLOAD_WORDS])
    }
}

/// Caller-allocated output records plus block-building state.
///
/// `num_headers` counts closed blocks. A partially filled pair block
/// stays open with its pair count in `num_pairs`, so later passes can
/// keep packing into it; [`finalize`](Self::finalize) closes it before
/// the records are handed to the device.
pub struct LoaderBuffer<'b> {
    headers: &'b mut [LoaderHeader],
    payloads: &'b mut [LoaderPayload],
    pub num_headers: u32,
    pub num_pairs: u32,
    /// Device-visible address of the header array, recorded here for the
    /// command that points the DMA engine at the blob.
    pub header_dva: u64,
}

impl<'b> LoaderBuffer<'b> {
    pub fn new(headers: &'b mut [LoaderHeader], payloads: &'b mut [LoaderPayload]) -> Self {
        Self {
            headers,
            payloads,
            num_headers: 0,
            num_pairs: 0,
            header_dva: 0,
        }
    }

    /// Closes the open pair block, if any.
    pub fn finalize(&mut self) {
        if self.num_pairs > 0 {
            self.num_headers += 1;
            self.num_pairs = 0;
        }
    }

    /// Closed blocks, ready for the device. Call
    /// [`finalize`](Self::finalize) first.
    pub fn used_headers(&self) -> &[LoaderHeader] {
        &self.headers[..self.num_headers as usize]
    }

    pub fn used_payloads(&self) -> &[LoaderPayload] {
        &self.payloads[..self.num_headers as usize]
    }

    fn block_slot(&self) -> Result<usize, RegmapError> {
        let slot = self.num_headers as usize;
        if slot >= self.headers.len() || slot >= self.payloads.len() {
            return Err(RegmapError::LoaderFull);
        }
        Ok(slot)
    }

    /// Emits one closed value-run block.
    fn emit_run(&mut self, tag: u32, base: u32, vals: &[u32]) -> Result<(), RegmapError> {
        let slot = self.block_slot()?;
        let payload = &mut self.payloads[slot];
        payload.0 = [0; PAYLOAD_WORDS];
        payload.0[..vals.len()].copy_from_slice(vals);
        self.headers[slot] = LoaderHeader([
            tag,
            (slot * size_of::<LoaderPayload>()) as u32,
            base,
            valid_mask(vals.len()),
        ]);
        self.num_headers += 1;
        Ok(())
    }

    /// Appends one pair to the open pair block, closing it when full.
    fn push_pair(&mut self, addr: u32, val: u32) -> Result<(), RegmapError> {
        let slot = self.block_slot()?;
        if self.num_pairs == 0 {
            self.payloads[slot].0 = [0; PAYLOAD_WORDS];
        }
        let pair = self.num_pairs as usize;
        self.payloads[slot].0[2 * pair] = addr;
        self.payloads[slot].0[2 * pair + 1] = val;
        self.num_pairs += 1;

        self.headers[slot] = LoaderHeader([
            TAG_VALID | TAG_PAIR,
            (slot * size_of::<LoaderPayload>()) as u32,
            self.payloads[slot].0[0],
            valid_mask(2 * self.num_pairs as usize),
        ]);
        if self.num_pairs as usize == PAIRS_PER_BLOCK {
            self.num_headers += 1;
            self.num_pairs = 0;
        }
        Ok(())
    }

    /// Emits one closed pair block from pre-resolved pairs.
    fn emit_pair_block(&mut self, base: u32, phys: u32, pairs: &[CrPair]) -> Result<(), RegmapError> {
        let slot = self.block_slot()?;
        let payload = &mut self.payloads[slot];
        payload.0 = [0; PAYLOAD_WORDS];
        for (i, pair) in pairs.iter().enumerate() {
            payload.0[2 * i] = phys + pair.reg;
            payload.0[2 * i + 1] = pair.val;
        }
        self.headers[slot] = LoaderHeader([
            TAG_VALID | TAG_PAIR,
            (slot * size_of::<LoaderPayload>()) as u32,
            base,
            valid_mask(2 * pairs.len()),
        ]);
        self.num_headers += 1;
        Ok(())
    }
}

fn valid_mask(words: usize) -> u32 {
    (0..words).fold(0, |mask, i| mask | 1 << (2 * i))
}

impl<'c, B, const N: usize> Regmap<'c, B, N>
where
    B: RegIo,
    BitsImpl<N>: Bits,
{
    /// Flattens the dirty register set and any staged no-increment
    /// bursts into loader blocks, then clears the dirty state.
    ///
    /// Dirty registers are walked in ascending address order.
    /// [`Formatter::Inc`] emits one closed block per physically
    /// contiguous run; [`Formatter::Pair`] packs explicit pairs and
    /// leaves the final partial block open (see
    /// [`LoaderBuffer::finalize`]). Staged bursts close the open block
    /// and follow as repeat blocks in write order. Output is
    /// deterministic for identical staged state.
    ///
    /// Fails [`RegmapError::NoCache`] without a cache, and
    /// [`RegmapError::LoaderFull`] rather than overflowing the records:
    /// a truncated blob would misprogram the device.
    pub fn cache_fsync(
        &mut self,
        clb: &mut LoaderBuffer<'_>,
        fmt: Formatter,
    ) -> Result<(), RegmapError> {
        let phys = self.phys_base();
        let store = match &mut self.cache {
            CacheState::Disabled => return Err(RegmapError::NoCache),
            CacheState::Flat(s) | CacheState::FlatThin(s) => s,
        };

        match fmt {
            Formatter::Inc => {
                let mut next = store.first_dirty();
                while let Some(start) = next {
                    let mut end = start;
                    let mut after = store.next_dirty(end);
                    while let Some(idx) = after {
                        if idx != end + 1 || end - start + 1 == PAYLOAD_WORDS {
                            break;
                        }
                        end = idx;
                        after = store.next_dirty(idx);
                    }
                    clb.emit_run(TAG_VALID, phys + ((start as u32) << 2), store.run(start, end))?;
                    next = after;
                }
            }
            Formatter::Pair => {
                let mut next = store.first_dirty();
                while let Some(idx) = next {
                    clb.push_pair(phys + ((idx as u32) << 2), store.value(idx))?;
                    next = store.next_dirty(idx);
                }
            }
        }
        store.clear_dirty();

        let runs = core::mem::take(&mut self.noinc_runs);
        for run in &runs {
            clb.finalize();
            for chunk in run.vals.chunks(PAYLOAD_WORDS) {
                clb.emit_run(TAG_VALID | TAG_PAIR | TAG_REPEAT, phys + run.reg, chunk)?;
            }
        }

        self.cache_dirty = false;
        Ok(())
    }

    /// Appends caller-computed `(register, value)` pairs on top of a
    /// prior serializer pass, e.g. settings produced outside the cache
    /// that must join the same atomic burst.
    ///
    /// Closes the open pair block first, then packs the extras into
    /// closed pair blocks, growing `num_headers` accordingly.
    pub fn cache_fsync_ext(
        &mut self,
        clb: &mut LoaderBuffer<'_>,
        extra: &[CrPair],
    ) -> Result<(), RegmapError> {
        let phys = self.phys_base();
        clb.finalize();
        for chunk in extra.chunks(PAIRS_PER_BLOCK) {
            clb.emit_pair_block(phys, phys, chunk)?;
        }
        Ok(())
    }
}
