//! A `no_std`, no-alloc register map for memory-mapped hardware.
//!
//! This crate routes every register transaction of a device block
//! through one façade object: access tables validate the offset, a
//! configurable shadow cache absorbs or serves the access, and the
//! hardware itself sits behind a small backend trait.
//!
//! # Features
//!
//! - **Zero heap allocation** - storage sized by const generics
//! - **Access tables** - allow/deny ranges per access kind
//! - **Bit-field accessors** - derived once, shift/mask applied per call
//! - **Register shadow** - flat or change-detecting cache with dirty
//!   tracking, sync, and staged (cache-only) writes
//! - **Loader serialization** - dirty state flattened into header/payload
//!   records a DMA engine applies in one burst at a frame boundary
//! - **Shadow banks** - double-buffered register copies addressed by
//!   offset bits
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐   staged writes   ┌───────────────────────────┐
//! │  Driver code   │──────────────────▶│  Regmap                   │
//! │                │                   │   access tables           │
//! │  write()       │   cache_fsync()   │   shadow cache (dirty)    │
//! │  field_write() │◀──────────────────│   loader serializer       │
//! └────────────────┘   loader records  └─────────────┬─────────────┘
//!                                                    │ RegIo
//!                                            ┌───────▼────────┐
//!                                            │ MMIO / bus     │
//!                                            └────────────────┘
//! ```
//!
//! Direct mode writes through to hardware and keeps the shadow warm.
//! For frame-synchronized blocks the driver flips the map into
//! cache-only mode, stages a whole configuration, and serializes it
//! with [`Regmap::cache_fsync`](regmap::Regmap::cache_fsync) into
//! records a hardware loader applies atomically, without the CPU
//! pacing hundreds of writes against a frame tick.
//!
//! # Example
//!
//! ```rust
//! use embedded_regmap::prelude::*;
//!
//! // Registers live behind the RegIo seam; tests and simulators can
//! // back them with plain memory.
//! struct Mem([u32; 64]);
//! impl RegIo for Mem {
//!     fn read(&mut self, reg: u32) -> Result<u32, RegmapError> {
//!         Ok(self.0[(reg >> 2) as usize])
//!     }
//!     fn write(&mut self, reg: u32, val: u32) -> Result<(), RegmapError> {
//!         self.0[(reg >> 2) as usize] = val;
//!         Ok(())
//!     }
//! }
//!
//! let defaults = [RegDefault { reg: 0x00, val: 0 }];
//! let config = RegmapConfig {
//!     name: "scaler",
//!     max_register: 0xFC,
//!     cache: CacheKind::Flat,
//!     defaults: &defaults,
//!     ..RegmapConfig::default()
//! };
//! let mut map: Regmap<'_, Mem, 64> = Regmap::new(Mem([0; 64]), &config).unwrap();
//!
//! // Stage a frame setting without touching hardware.
//! map.cache_set_only(true).unwrap();
//! map.write(0x00, 0x1).unwrap();
//! map.write(0x10, 0xCAFE).unwrap();
//!
//! // Flatten it into loader records for the DMA engine.
//! let mut headers = [LoaderHeader::default(); 8];
//! let mut payloads = [LoaderPayload::default(); 8];
//! let mut clb = LoaderBuffer::new(&mut headers, &mut payloads);
//! map.cache_fsync(&mut clb, Formatter::Pair).unwrap();
//! clb.finalize();
//! assert_eq!(clb.num_headers, 1);
//! ```

#![deny(unsafe_code)]
#![no_std]

pub mod regmap;

#[doc(hidden)]
pub use paste as __paste;

pub mod prelude {
    pub use crate::regmap::prelude::*;
}
