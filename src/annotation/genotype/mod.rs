//! Built-in per-sample (FORMAT) annotations.

mod balance;
mod depth;

pub use balance::{AlleleBalanceBySample, MappingQualityZeroBySample};
pub use depth::{DepthPerAlleleBySample, DepthPerSampleHC};
