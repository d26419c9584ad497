//! Text handling for section conversion: extraction to plain text,
//! diacritic normalization, and the non-destructive title peek.

pub mod extract;
pub mod normalize;
pub mod peek;

pub use extract::{EbookConvert, TextExtractor};
pub use normalize::{Iconv, Normalizer};
pub use peek::{peek, title_from_preview};
