//! A dynamically growing tree with a bounded ancestor history window and
//! four interchangeable reclamation strategies (naive, stop-the-world
//! mark, amortized mark, real-time incremental).
//!
//! The engine owns the tree and its reclamation policy; it does not own a
//! REPL, a wire protocol, or file I/O — those are a caller's job. See
//! [`stats::StatsSink`] for the one piece of I/O the engine does perform
//! (writing append-only statistics lines to a sink the caller provides).

mod config;
mod error;
mod list;
mod logging;
mod node;
mod stats;
mod tree;

pub use config::{Algorithm, TreeBufferConfig};
pub use error::{ConfigError, Result, TreeBufferError};
pub use logging::init_logging;
pub use node::{get_data, make_node, Node, NodeId};
pub use stats::Tag;
pub use tree::Tree;
