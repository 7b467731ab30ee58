//! The owning container and the four reclamation strategies.
//!
//! `Tree` exposes the five public mutation/query operations of the engine
//! (`initialize` is a free function returning a `Tree`, the rest are
//! methods) plus frontier iteration and statistics sink control. Which of
//! the four algorithms a `Tree` runs is fixed at construction and checked as
//! a plain tag at each operation site, mirroring the source: the four
//! strategies share nearly all of their call sequence and differ only in a
//! handful of branches, so a trait-object capability interface would mostly
//! forward to shared code.

use slotmap::SlotMap;
use tracing::Level;

use crate::config::Algorithm;
use crate::error::{ConfigError, Result, TreeBufferError};
use crate::list::{self, Link, ListHead};
use crate::node::{Node, NodeData, NodeId};
use crate::stats::{StatsSink, Tag};

/// A tree-buffer instance: one rooted tree, one reclamation algorithm, one
/// arena of nodes.
pub struct Tree {
    history: u32,
    algorithm: Algorithm,
    arena: SlotMap<NodeId, NodeData>,
    frontier: ListHead,
    pending_delete: ListHead,
    node_count: u64,
    last_gc_node_count: u64,
    op_mems: u64,
    stats_sink: Option<StatsSink>,
}

impl Tree {
    /// Builds a tree with `root` installed as the sole frontier node at
    /// depth 0. Fails only if `history == 0`.
    pub fn initialize(history: u32, algorithm: Algorithm, root: Node) -> Result<(Tree, NodeId)> {
        if history == 0 {
            return Err(ConfigError::ZeroHistory.into());
        }

        let mut arena: SlotMap<NodeId, NodeData> = SlotMap::with_key();
        let root_id = arena.insert_with_key(|id| NodeData::new(id, root.data));

        let mut frontier = ListHead::new();
        list::push_front(&mut arena, &mut frontier, root_id);

        // Set unconditionally, regardless of algorithm: harmless bookkeeping
        // for the three algorithms that never consult it.
        arena[root_id].representative = Some(root_id);
        arena[root_id].active_count = 1;

        let tree = Tree {
            history,
            algorithm,
            arena,
            frontier,
            pending_delete: ListHead::new(),
            node_count: 1,
            last_gc_node_count: 1,
            op_mems: 0,
            stats_sink: None,
        };
        Ok((tree, root_id))
    }

    pub fn history_bound(&self) -> u32 {
        self.history
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// `op_mems` accumulated by the most recently completed public entry.
    pub fn last_op_mems(&self) -> u64 {
        self.op_mems
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    fn bump(&mut self, n: u64) {
        self.op_mems += n;
    }

    fn check_owned(&self, node: NodeId) -> Result<()> {
        if !self.arena.contains_key(node) {
            return Err(TreeBufferError::precondition(
                "node handle is not owned by this tree",
            ));
        }
        Ok(())
    }

    fn check_owned_active(&self, node: NodeId) -> Result<()> {
        self.check_owned(node)?;
        if !self.arena[node].active {
            return Err(TreeBufferError::precondition("node is not active"));
        }
        Ok(())
    }

    fn frontier_snapshot(&self) -> Vec<NodeId> {
        list::iter(&self.arena, &self.frontier).collect()
    }

    fn emit_op(&mut self, tag: Tag) -> Result<()> {
        let mems = self.op_mems;
        if let Some(sink) = &mut self.stats_sink {
            sink.emit_op(tag, mems)?;
        }
        self.op_mems = 0;
        Ok(())
    }

    fn emit_created(&mut self) -> Result<()> {
        if let Some(sink) = &mut self.stats_sink {
            sink.emit_node_created()?;
        }
        Ok(())
    }

    fn emit_freed(&mut self) -> Result<()> {
        if let Some(sink) = &mut self.stats_sink {
            sink.emit_node_freed()?;
        }
        Ok(())
    }

    /// Reads a node's payload. Does not require the node to be active.
    pub fn get_data(&self, node: NodeId) -> Result<i64> {
        self.check_owned(node)?;
        Ok(self.arena[node].data)
    }

    /// The head of the active frontier, or `None` if it is empty (never true
    /// for a tree that still has its root).
    pub fn active(&self) -> Option<NodeId> {
        self.frontier.front()
    }

    /// The next node after `node` in frontier order, or `None` at the end.
    /// `node` must currently be on the frontier; this is not checked, as in
    /// the source.
    pub fn next_active(&self, node: NodeId) -> Option<NodeId> {
        match self.arena[node].next {
            Link::Head => None,
            Link::Node(id) => Some(id),
        }
    }

    /// Iterates the active frontier front-to-back. Do not mutate the tree
    /// while holding this iterator.
    pub fn iter_frontier(&self) -> impl Iterator<Item = NodeId> + '_ {
        list::iter(&self.arena, &self.frontier)
    }

    /// Attaches a statistics sink. Fails if one is already attached.
    pub fn start_stats(&mut self, sink: impl std::io::Write + Send + 'static) -> Result<()> {
        if self.stats_sink.is_some() {
            return Err(TreeBufferError::precondition(
                "a statistics sink is already attached",
            ));
        }
        self.stats_sink = Some(StatsSink::new(sink));
        Ok(())
    }

    /// Detaches the statistics sink without closing it.
    pub fn stop_stats(&mut self) {
        self.stats_sink = None;
    }

    /// Installs `child` under `parent`, appends it to the frontier, and runs
    /// the algorithm-specific tail (amortized sweep trigger / real-time
    /// bookkeeping and bounded reclamation).
    pub fn add_child(&mut self, parent: NodeId, child: Node) -> Result<NodeId> {
        let span = tracing::span!(Level::DEBUG, "add_child", algorithm = ?self.algorithm);
        let _entered = span.enter();

        self.op_mems = 0;
        self.check_owned_active(parent)?;
        let nodes_before = self.arena.len();

        let child_id = self.arena.insert_with_key(|id| NodeData::new(id, child.data));
        self.arena[child_id].parent = Some(parent);
        self.bump(1);
        self.arena[parent].children += 1;
        self.bump(1);
        list::push_front(&mut self.arena, &mut self.frontier, child_id);
        self.bump(4);

        match self.algorithm {
            Algorithm::Naive | Algorithm::Mark => {}
            Algorithm::Amortized => {
                self.node_count += 1;
                self.bump(1);
                if self.node_count >= 2 * self.last_gc_node_count {
                    self.mark_sweep()?;
                }
            }
            Algorithm::RealTime => {
                self.delete_one()?;
                let parent_depth = self.arena[parent].depth;
                self.bump(1);
                self.arena[child_id].depth = parent_depth + 1;
                self.bump(1);
                let representative = if self.arena[child_id].depth % self.history == 0 {
                    self.bump(1);
                    child_id
                } else {
                    self.bump(1);
                    self.arena[parent].representative.expect(
                        "every node reachable under real-time has a representative",
                    )
                };
                self.bump(1);
                self.arena[child_id].representative = Some(representative);
                self.bump(1);
                self.arena[representative].active_count += 1;
                self.bump(1);
            }
        }

        self.emit_created()?;
        let op_mems = self.op_mems;
        self.emit_op(Tag::Add)?;
        let freed = (nodes_before + 1).saturating_sub(self.arena.len());
        tracing::debug!(op_mems, nodes_freed = freed, "add_child complete");
        Ok(child_id)
    }

    /// Removes `node` from the frontier. If it has no children it becomes
    /// immediately eligible for reclamation; otherwise it becomes an
    /// internal node, reachable only through its (still active or
    /// not-yet-reclaimed) descendants.
    pub fn deactivate(&mut self, node: NodeId) -> Result<()> {
        let span = tracing::span!(Level::DEBUG, "deactivate", algorithm = ?self.algorithm);
        let _entered = span.enter();

        self.op_mems = 0;
        self.check_owned_active(node)?;
        let nodes_before = self.arena.len();

        self.arena[node].active = false;
        self.bump(1);
        list::unlink(&mut self.arena, &mut self.frontier, node);
        self.bump(2);

        let children = self.arena[node].children;
        self.bump(1);
        if children == 0 {
            list::push_front(&mut self.arena, &mut self.pending_delete, node);
            self.bump(4);
        }

        match self.algorithm {
            Algorithm::Naive | Algorithm::Amortized => {}
            Algorithm::Mark => {
                self.mark_sweep()?;
            }
            Algorithm::RealTime => {
                let representative = self.arena[node]
                    .representative
                    .expect("every node reachable under real-time has a representative");
                self.bump(1);
                self.arena[representative].active_count -= 1;
                self.bump(1);
                if self.arena[representative].active_count == 0 {
                    self.bump(1);
                    self.cut_parent(representative);
                }
            }
        }

        let op_mems = self.op_mems;
        self.emit_op(Tag::Deactivate)?;
        let freed = nodes_before.saturating_sub(self.arena.len());
        tracing::debug!(op_mems, nodes_freed = freed, "deactivate complete");
        Ok(())
    }

    /// `add_child(tree, parent, c)` for every `c` in `children`, followed by
    /// `deactivate(tree, parent)`. There is no partial rollback: once a
    /// `Node` value is handed in it is consumed.
    pub fn expand(&mut self, parent: NodeId, children: Vec<Node>) -> Result<Vec<NodeId>> {
        let span = tracing::span!(Level::DEBUG, "expand", algorithm = ?self.algorithm);
        let _entered = span.enter();

        let mut ids = Vec::with_capacity(children.len());
        for child in children {
            ids.push(self.add_child(parent, child)?);
        }
        self.deactivate(parent)?;

        tracing::debug!(
            children = ids.len(),
            op_mems = self.op_mems,
            "expand complete"
        );
        Ok(ids)
    }

    /// Writes at most `history` ancestor payloads into `out`, starting with
    /// `node` itself and walking `parent` links.
    pub fn history(&mut self, node: NodeId, out: &mut Vec<i64>) -> Result<()> {
        let span = tracing::span!(Level::DEBUG, "history", algorithm = ?self.algorithm);
        let _entered = span.enter();

        self.op_mems = 0;
        self.check_owned_active(node)?;

        out.clear();
        let mut current = Some(node);
        let mut remaining = self.history;
        self.bump(1);
        while let Some(id) = current {
            if remaining == 0 {
                break;
            }
            out.push(self.arena[id].data);
            self.bump(1);
            current = self.arena[id].parent;
            self.bump(1);
            remaining -= 1;
        }

        let op_mems = self.op_mems;
        self.emit_op(Tag::History)?;
        tracing::debug!(op_mems, entries = out.len(), "history complete");
        Ok(())
    }

    /// Moves the frontier into the pending-delete list, then repeatedly
    /// cuts and frees one node at a time until nothing remains. Works the
    /// same regardless of which algorithm the tree was built with: whatever
    /// the algorithm left un-reclaimed is cleaned up here.
    pub fn dispose(mut self) -> Result<()> {
        let span = tracing::span!(Level::DEBUG, "dispose", algorithm = ?self.algorithm);
        let _entered = span.enter();

        self.op_mems = 0;
        let mut nodes_freed = 0u64;
        let frontier_ids = self.frontier_snapshot();
        for id in frontier_ids {
            list::unlink(&mut self.arena, &mut self.frontier, id);
            self.bump(2);
            list::push_front(&mut self.arena, &mut self.pending_delete, id);
            self.bump(4);
        }

        while let Some(x) = self.pending_delete.front() {
            self.bump(2);
            list::unlink(&mut self.arena, &mut self.pending_delete, x);
            self.bump(2);
            self.cut_parent(x);
            self.arena.remove(x);
            self.bump(1);
            self.emit_freed()?;
            nodes_freed += 1;
        }

        let op_mems = self.op_mems;
        self.emit_op(Tag::Final)?;
        tracing::info!(op_mems, nodes_freed, "dispose complete");
        Ok(())
    }

    // ---- Reclamation --------------------------------------------------

    /// Detaches `y` from its parent, decrementing the parent's child count
    /// and, if the parent is now childless and inactive, queuing it for
    /// deletion. Does not free `y` itself; the caller owns that decision.
    fn cut_parent(&mut self, y: NodeId) {
        let x = self.arena[y].parent;
        self.bump(1);
        if let Some(x_id) = x {
            self.arena[x_id].children -= 1;
            self.bump(1);
            let childless = self.arena[x_id].children == 0;
            let inactive = !self.arena[x_id].active;
            self.bump(1);
            if childless && inactive {
                list::push_front(&mut self.arena, &mut self.pending_delete, x_id);
                self.bump(4);
            }
        }
        self.arena[y].parent = None;
        self.bump(1);
    }

    /// Real-time's bounded reclamation step: frees at most one node from
    /// `pending_delete`. Called once per `add_child`.
    fn delete_one(&mut self) -> Result<()> {
        let Some(x) = self.pending_delete.front() else {
            self.bump(1);
            return Ok(());
        };
        self.bump(2);
        list::unlink(&mut self.arena, &mut self.pending_delete, x);
        self.bump(2);
        self.cut_parent(x);
        self.arena.remove(x);
        self.bump(1);
        self.emit_freed()
    }

    /// `gc_node`: frees `x`, which must already be unreachable (unseen,
    /// inactive, childless).
    fn gc_node(&mut self, x: NodeId) -> Result<()> {
        debug_assert!(!self.arena[x].seen);
        debug_assert!(!self.arena[x].active);
        debug_assert_eq!(self.arena[x].children, 0);

        self.gc_parent(x)?;
        self.arena.remove(x);
        self.bump(1);
        if self.algorithm == Algorithm::Amortized {
            self.node_count -= 1;
            self.bump(1);
        }
        self.emit_freed()
    }

    /// `gc_parent`: cuts `y`'s parent link; if the parent becomes childless
    /// and was never marked `seen` by the current sweep, it is unreachable
    /// too and is freed recursively.
    fn gc_parent(&mut self, y: NodeId) -> Result<()> {
        let x = self.arena[y].parent;
        self.bump(1);
        self.arena[y].parent = None;
        self.bump(1);
        if let Some(x_id) = x {
            self.arena[x_id].children -= 1;
            self.bump(1);
            let childless = self.arena[x_id].children == 0;
            let unseen = !self.arena[x_id].seen;
            self.bump(1);
            if childless && unseen {
                self.gc_node(x_id)?;
            }
        }
        Ok(())
    }

    /// Pushes `y`'s parent onto `todo` if it has one and it is not already
    /// marked `seen`, marking it in the process. `gc_todo_parent` in the
    /// source.
    fn push_unseen_parent(&mut self, todo: &mut ListHead, y: NodeId) {
        let x = self.arena[y].parent;
        self.bump(1);
        if let Some(x_id) = x {
            if self.arena[x_id].seen {
                self.bump(1);
                return;
            }
            self.bump(1);
            self.arena[x_id].seen = true;
            self.bump(1);
            list::push_front(&mut self.arena, todo, x_id);
            self.bump(4);
        }
    }

    /// The mark-and-reclaim sweep shared by the `mark` and `amortized`
    /// algorithms: everything within `history - 1` parent-edges of the
    /// frontier survives, the rest (plus whatever was already queued in
    /// `pending_delete`) is freed.
    fn mark_sweep(&mut self) -> Result<()> {
        for id in self.frontier_snapshot() {
            self.arena[id].seen = true;
            self.bump(1);
        }

        let mut now = ListHead::new();
        let mut todo = ListHead::new();
        let mut middle = ListHead::new();

        for id in self.frontier_snapshot() {
            self.push_unseen_parent(&mut todo, id);
        }

        let mut layer = 2;
        while layer < self.history && !todo.is_empty() {
            std::mem::swap(&mut now, &mut todo);
            let now_ids: Vec<NodeId> = list::iter(&self.arena, &now).collect();
            for id in now_ids {
                self.push_unseen_parent(&mut todo, id);
            }
            list::splice_all(&mut self.arena, &mut now, &mut middle);
            layer += 1;
        }

        // Every node still in `todo` sits at exactly `history` edges above
        // the frontier: it is kept, but its own parent chain is severed
        // (and freed, if that makes the parent unreachable).
        let todo_ids: Vec<NodeId> = list::iter(&self.arena, &todo).collect();
        for id in todo_ids {
            self.gc_parent(id)?;
        }

        let pending_ids: Vec<NodeId> = list::iter(&self.arena, &self.pending_delete).collect();
        for id in pending_ids {
            self.gc_node(id)?;
        }
        self.pending_delete = ListHead::new();

        for id in list::iter(&self.arena, &middle).collect::<Vec<_>>() {
            self.arena[id].seen = false;
            self.bump(1);
        }
        for id in list::iter(&self.arena, &todo).collect::<Vec<_>>() {
            self.arena[id].seen = false;
            self.bump(1);
        }
        for id in self.frontier_snapshot() {
            self.arena[id].seen = false;
            self.bump(1);
        }

        if self.algorithm == Algorithm::Amortized {
            self.last_gc_node_count = self.node_count;
            self.bump(1);
        }
        Ok(())
    }
}
