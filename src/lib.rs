//! # nagioscfg
//!
//! Reads and writes Nagios-style object configuration: text made of
//! `define <kind> { key value ... }` blocks.
//!
//! ## Core Concepts
//!
//! - **ConfigObject**: one block; a kind, string properties, the partition
//!   key it is written back to and an optional identity
//! - **ObjectReader**: streaming parser, pulled as an iterator or pushed from
//!   a background thread through a bounded channel
//! - **ObjectMap**: identity-keyed collection, built from one or many sources
//! - **PartitionedWriter**: writes every partition of a collection
//!   concurrently, one thread per partition
//!
//! ## Usage
//!
//! ```rust
//! use nagioscfg::{ObjectKind, ObjectReader};
//!
//! let text = "\
//! define host {
//!     host_name   web01
//!     address     10.0.0.1
//! }
//! ";
//!
//! let mut reader = ObjectReader::new(text.as_bytes()).with_partition_key("hosts.cfg");
//! let map = reader.read_all_map()?;
//! let host = map.values().next().unwrap();
//! assert_eq!(host.kind(), ObjectKind::Host);
//! assert_eq!(host.get("address"), Some("10.0.0.1"));
//! assert_eq!(host.partition_key, "hosts.cfg");
//! # Ok::<(), nagioscfg::BuildError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod collection;
pub mod error;
pub mod identity;
pub mod keys;
pub mod kind;
pub mod object;
pub mod output;
pub mod parse;

pub use collection::{MultiReader, ObjectMap};
pub use error::{
    BuildError, MultiSourceError, NagiosError, NagiosResult, ParseError, SourceFailure,
    ValidationError,
};
pub use identity::{IdentityGenerator, ObjectId, RandomIdentity, SequentialIdentity};
pub use kind::ObjectKind;
pub use object::{ConfigObject, Layout};
pub use output::{Destination, FileDestination, PartitionedWriter, WriteReport, WriterConfig};
pub use parse::{ObjectReader, ObjectStream, Position, ReaderConfig, Scanner};
