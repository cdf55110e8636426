/// Declares a named field table: an enum of field names next to the
/// descriptor array backing it, the shape per-IP register maps use to
/// keep field indices and bit spans in one place.
///
/// Variants are listed as `Name => (register, lsb, msb)` and index the
/// generated descriptor table in declaration order, so a
/// [`FieldBulk`](crate::regmap::FieldBulk) built from the table can be
/// addressed by variant.
///
/// ```
/// use embedded_regmap::field_table;
/// use embedded_regmap::prelude::*;
///
/// field_table! {
///     pub ScalerField: SCALER_FIELD_DESCS {
///         Enable => (0x0000, 0, 0),
///         Bypass => (0x0000, 1, 1),
///         Width  => (0x0004, 0, 15),
///         Height => (0x0004, 16, 31),
///     }
/// }
///
/// let fields: FieldBulk<4> = FieldBulk::from_descs(SCALER_FIELD_DESCS).unwrap();
/// assert_eq!(fields.at(ScalerField::Width).mask, 0x0000_FFFF);
/// assert_eq!(fields.at(ScalerField::Height).shift, 16);
/// ```
#[macro_export]
macro_rules! field_table {
    ($vis:vis $name:ident: $descs:ident {
        $($variant:ident => ($reg:expr, $lsb:expr, $msb:expr)),+ $(,)?
    }) => {
        $crate::__paste::paste! {
            #[doc = "Field names of the [`" $descs "`] table."]
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            $vis enum $name {
                $($variant),+
            }

            #[doc = "Field descriptors backing [`" $name "`]."]
            $vis const $descs: &[$crate::regmap::FieldDesc] = &[
                $($crate::regmap::FieldDesc::new($reg, $lsb, $msb)),+
            ];

            impl From<$name> for usize {
                #[inline]
                fn from(field: $name) -> usize {
                    field as usize
                }
            }
        }
    };
}
