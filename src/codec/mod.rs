//! Mapping between application values and tagged wire values.
//!
//! Encoding goes through [`ToCqlValue`] (or [`encode_dyn`] when the kind is only known at
//! runtime); decoding goes through [`FromCqlValue`] and the [`ScanTarget`] destinations used by
//! row scanning.

pub mod decode;
pub mod encode;

pub use decode::{FromCqlValue, ScanTarget, check_column, decode, decode_column};
pub use encode::{ToCqlValue, encode_dyn, encode_json};
