//! SQA Cross-Reference Graph
//!
//! Links every identifier mention across a corpus into one node per
//! `(kind, key)` and derives typed edges:
//! - `implements`: task to requirement or success criterion
//! - `references`: co-occurrence on one line
//! - `depends-on`: task to task
//! - `duplicates-value`: constants sharing a normalized value
//!
//! Constant keys asserted with different values across documents are kept
//! as [`ValueConflict`] records. Construction never fails; rejected edges
//! and parse anomalies are counted in [`GraphWarnings`].

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod builder;
pub mod drift;
pub mod error;
pub mod graph;
pub mod warnings;

pub use builder::{build, GraphBuilder};
pub use drift::{ValueConflict, ValueVariant};
pub use error::{GraphError, GraphResult};
pub use graph::{CrossReferenceGraph, Edge, EdgeKind};
pub use warnings::GraphWarnings;
