//! Arena-resident node representation.
//!
//! The tree is represented with a [`slotmap`] arena and [`NodeId`] handles
//! rather than raw pointers or `Rc<RefCell<..>>`: handles make the list
//! discipline and the sweep invariants checkable, and they erase the
//! distinction the C original had to track by hand between "owned by the
//! tree" and "owned by the caller" (see the crate-level design notes).

use slotmap::new_key_type;

use crate::list::Link;

new_key_type! {
    /// Opaque handle to a node owned by some [`crate::Tree`]. Handles from one
    /// tree must never be passed to another; the engine has no way to detect
    /// this (slotmap keys do not carry the arena's identity) so it is a
    /// documented caller contract, not a runtime check.
    pub struct NodeId;
}

/// A freshly made, not-yet-owned node. Plain data: it has no identity until
/// it is consumed by [`crate::Tree::initialize`] or [`crate::Tree::add_child`],
/// at which point the returned [`NodeId`] is the only way to refer to it.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub(crate) data: i64,
}

/// Creates a fresh, unowned node carrying `data`. Infallible: no allocation
/// happens here beyond an ordinary stack value.
pub fn make_node(data: i64) -> Node {
    Node { data }
}

/// Returns the payload of a freshly made node that was never consumed by a
/// tree. Once a node is owned, read its data with [`crate::Tree::get_data`]
/// instead.
pub fn get_data(node: &Node) -> i64 {
    node.data
}

/// The arena-resident record for one tree vertex.
#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: u32,
    pub(crate) active: bool,
    pub(crate) data: i64,

    // List-cell pair: exactly one of frontier / pending_delete / a scratch
    // list owns this node at a time, or it is a detached singleton
    // (prev == next == Link::Node(self)).
    pub(crate) prev: Link,
    pub(crate) next: Link,

    // Real-time bookkeeping; unused (left at their defaults) by the other
    // three algorithms.
    pub(crate) depth: u32,
    pub(crate) representative: Option<NodeId>,
    pub(crate) active_count: u32,

    // Mark-sweep transient bit.
    pub(crate) seen: bool,
}

impl NodeData {
    pub(crate) fn new(id: NodeId, data: i64) -> Self {
        Self {
            id,
            parent: None,
            children: 0,
            active: true,
            data,
            prev: Link::Node(id),
            next: Link::Node(id),
            depth: 0,
            representative: None,
            active_count: 0,
            seen: false,
        }
    }
}
