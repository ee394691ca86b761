//! Feature extraction (C2): turns raw audio frames into per-tick feature snapshots.

pub mod bands;
pub mod envelope;
mod extractor;
pub mod snapshot;

pub use extractor::FeatureExtractor;
pub use snapshot::FeatureSnapshot;
