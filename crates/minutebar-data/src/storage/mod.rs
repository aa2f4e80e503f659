//! 파일 기반 저장소.

pub mod partition;

pub use partition::{PartitionKey, PartitionedStore};
