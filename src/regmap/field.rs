use core::ops::Index;

use heapless::Vec;

use crate::regmap::RegmapError;

/// Declarative form of a register bit-field: home register plus the
/// inclusive `lsb..=msb` bit span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDesc {
    pub reg: u32,
    pub lsb: u8,
    pub msb: u8,
}

impl FieldDesc {
    pub const fn new(reg: u32, lsb: u8, msb: u8) -> Self {
        Self { reg, lsb, msb }
    }
}

/// Ready-to-use bit-field accessor, derived once from a [`FieldDesc`].
///
/// Immutable after derivation; no hardware access happens here, the
/// shift/mask arithmetic is resolved up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub reg: u32,
    pub shift: u32,
    pub mask: u32,
}

impl Field {
    /// Derives the shift/mask pair.
    ///
    /// Fails with [`RegmapError::BadConfig`] when `msb < lsb` or the span
    /// does not fit a 32-bit register.
    pub fn from_desc(desc: &FieldDesc) -> Result<Self, RegmapError> {
        if desc.msb < desc.lsb || desc.msb > 31 {
            return Err(RegmapError::BadConfig);
        }
        let width = u32::from(desc.msb - desc.lsb) + 1;
        let low = if width == 32 { u32::MAX } else { (1 << width) - 1 };
        Ok(Self {
            reg: desc.reg,
            shift: u32::from(desc.lsb),
            mask: low << desc.lsb,
        })
    }

    /// Extracts this field from a raw register value.
    #[inline]
    pub fn decode(&self, raw: u32) -> u32 {
        (raw & self.mask) >> self.shift
    }

    /// Merges a field value into a raw register value.
    #[inline]
    pub fn encode(&self, raw: u32, val: u32) -> u32 {
        (raw & !self.mask) | ((val << self.shift) & self.mask)
    }
}

/// Owned collection of derived fields, built atomically from a
/// descriptor table.
///
/// Either every descriptor derives or nothing is kept; dropping the bulk
/// releases all fields at once.
#[derive(Debug)]
pub struct FieldBulk<const F: usize> {
    fields: Vec<Field, F>,
}

impl<const F: usize> FieldBulk<F> {
    /// Derives all descriptors in order.
    ///
    /// An empty table fails [`RegmapError::InvalidLength`]; a table
    /// larger than the capacity `F` fails [`RegmapError::StageFull`]; any
    /// underivable descriptor fails [`RegmapError::BadConfig`].
    pub fn from_descs(descs: &[FieldDesc]) -> Result<Self, RegmapError> {
        if descs.is_empty() {
            return Err(RegmapError::InvalidLength);
        }
        let mut fields = Vec::new();
        for desc in descs {
            let field = Field::from_desc(desc)?;
            fields.push(field).map_err(|_| RegmapError::StageFull)?;
        }
        Ok(Self { fields })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field by anything indexable, e.g. a
    /// [`field_table!`](crate::field_table) enum variant.
    #[inline]
    pub fn at(&self, idx: impl Into<usize>) -> &Field {
        &self.fields[idx.into()]
    }
}

impl<const F: usize> Index<usize> for FieldBulk<F> {
    type Output = Field;

    #[inline]
    fn index(&self, idx: usize) -> &Field {
        &self.fields[idx]
    }
}
