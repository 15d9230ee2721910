//! Rendering objects back to text and writing collections to their
//! partitions.

mod partition;
mod render;

pub use partition::{Destination, FileDestination, PartitionedWriter, WriteReport, WriterConfig};
pub use render::Sorted;
