//! The append-only `TAG count\n` statistics wire format.
//!
//! One line is emitted at the end of every public mutation/query if a sink is
//! attached, plus `S +1` / `S -1` lines around node creation and reclamation
//! so that node-count-over-time can be reconstructed post hoc from the
//! stream alone.

use std::io::Write;

/// Stable tag for a statistics line. Never change the text of these without
/// bumping a format version externally: downstream tooling parses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// add_child
    Add,
    /// deactivate
    Deactivate,
    /// history
    History,
    /// dispose (final)
    Final,
}

impl Tag {
    fn as_str(&self) -> &'static str {
        match self {
            Tag::Add => "TA",
            Tag::Deactivate => "TD",
            Tag::History => "TH",
            Tag::Final => "TF",
        }
    }
}

/// An append-only sink for statistics lines, held by a [`crate::Tree`] for its
/// lifetime. The tree never reads from it and never closes it.
pub struct StatsSink {
    writer: Box<dyn Write + Send>,
}

impl StatsSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Emits `"<tag> <mems>\n"`, the per-operation cost line.
    pub(crate) fn emit_op(&mut self, tag: Tag, mems: u64) -> std::io::Result<()> {
        writeln!(self.writer, "{} {}", tag.as_str(), mems)
    }

    /// Emits `"S +1\n"` when a node is created.
    pub(crate) fn emit_node_created(&mut self) -> std::io::Result<()> {
        writeln!(self.writer, "S +1")
    }

    /// Emits `"S -1\n"` when a node is freed.
    pub(crate) fn emit_node_freed(&mut self) -> std::io::Result<()> {
        writeln!(self.writer, "S -1")
    }
}
