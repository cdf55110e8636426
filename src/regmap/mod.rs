pub mod access;
pub(crate) mod cache;
pub mod core;
pub mod error;
pub mod field;
pub mod io;
pub mod loader;
mod macros;
pub mod shared;
pub mod types;

#[cfg(test)]
mod test_support;

pub use self::core::{Regmap, RegmapConfig};
pub use access::{AccessTable, RegRange, Window};
pub use error::RegmapError;
pub use field::{Field, FieldBulk, FieldDesc};
pub use io::{MmioSpace, RegIo};
pub use loader::{LoaderBuffer, LoaderHeader, LoaderPayload};
pub use shared::SharedRegmap;
pub use types::{CacheKind, CrPair, CrSet, Formatter, RegDefault, RegSeq};

pub mod prelude {
    pub use super::{
        AccessTable, CacheKind, CrPair, CrSet, Field, FieldBulk, FieldDesc, Formatter,
        LoaderBuffer, LoaderHeader, LoaderPayload, MmioSpace, RegDefault, RegIo, RegRange, RegSeq,
        Regmap, RegmapConfig, RegmapError, SharedRegmap, Window,
    };
}
