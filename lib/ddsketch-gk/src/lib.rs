//! Conversion of DDSketch payloads into Greenwald-Khanna rank summaries.
//!
//! Trace statistics carry latency distributions as pairs of protobuf-encoded DDSketches: one for successful requests
//! and one for failed requests. [`ddsketch_to_gk`] decodes such a pair and turns it into two epsilon-approximate
//! [`RankSummary`] values, one for every request ("hits") and one for failed requests alone ("errors"), which can then
//! answer quantile queries with a bounded rank error.
//!
//! Only the subset of the DDSketch format emitted by trace agents is supported: positive values stored contiguously, a
//! zero index offset, and one of the logarithmic, linearly interpolated, or cubically interpolated index mappings.
#![deny(warnings)]
#![deny(missing_docs)]

mod common;

mod convert;
pub use self::convert::{ddsketch_to_gk, GkSummaries};

mod decode;
pub use self::decode::{decode, DecodedSketch};

mod error;
pub use self::error::ConversionError;

pub mod mapping;

mod summary;
pub use self::summary::{Entry, RankSummary, EPSILON};
