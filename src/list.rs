//! A generic intrusive circular doubly-linked list over the node arena.
//!
//! Every list (the active frontier, the pending-delete queue, and the
//! transient scratch lists used by the mark sweep) is circular, doubly
//! linked, and owns a dedicated sentinel [`ListHead`]. A detached node's
//! `prev`/`next` both point back at itself. Splicing is a fixed small number
//! of field writes and the list carries no count, matching the C original.
//!
//! Because nodes live in a [`slotmap`] arena instead of behind raw pointers,
//! a link target is either the list's own sentinel ([`Link::Head`]) or a
//! node handle ([`Link::Node`]); the splice primitives below thread the arena
//! through so that sentinel links and node links are mutated uniformly.

use slotmap::SlotMap;

use crate::node::{NodeData, NodeId};

/// One end of a list edge: either the owning list's sentinel, or a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
    Head,
    Node(NodeId),
}

/// The sentinel of one intrusive list. Owned by the [`crate::tree::Tree`] for
/// long-lived lists (frontier, pending-delete) or by a local variable for the
/// mark sweep's transient scratch lists.
#[derive(Debug)]
pub(crate) struct ListHead {
    prev: Link,
    next: Link,
}

impl ListHead {
    pub(crate) fn new() -> Self {
        Self {
            prev: Link::Head,
            next: Link::Head,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(self.next, Link::Head)
    }

    pub(crate) fn front(&self) -> Option<NodeId> {
        match self.next {
            Link::Head => None,
            Link::Node(id) => Some(id),
        }
    }
}

type Arena = SlotMap<NodeId, NodeData>;

fn get_next(arena: &Arena, head: &ListHead, at: Link) -> Link {
    match at {
        Link::Head => head.next,
        Link::Node(id) => arena[id].next,
    }
}

fn get_prev(arena: &Arena, head: &ListHead, at: Link) -> Link {
    match at {
        Link::Head => head.prev,
        Link::Node(id) => arena[id].prev,
    }
}

fn set_next(arena: &mut Arena, head: &mut ListHead, at: Link, val: Link) {
    match at {
        Link::Head => head.next = val,
        Link::Node(id) => arena[id].next = val,
    }
}

fn set_prev(arena: &mut Arena, head: &mut ListHead, at: Link, val: Link) {
    match at {
        Link::Head => head.prev = val,
        Link::Node(id) => arena[id].prev = val,
    }
}

/// Splices `node` into `head`'s list immediately after `after` (which may be
/// `Link::Head` itself, i.e. head-insert).
pub(crate) fn splice_after(arena: &mut Arena, head: &mut ListHead, after: Link, node: Link) {
    let following = get_next(arena, head, after);
    set_next(arena, head, after, node);
    set_prev(arena, head, node, after);
    set_next(arena, head, node, following);
    set_prev(arena, head, following, node);
}

/// Head-inserts `node` into `head`'s list.
pub(crate) fn push_front(arena: &mut Arena, head: &mut ListHead, node: NodeId) {
    splice_after(arena, head, Link::Head, Link::Node(node));
}

/// Removes `node` from whichever list it currently occupies (identified by
/// `head`) and leaves it as a detached singleton.
pub(crate) fn unlink(arena: &mut Arena, head: &mut ListHead, node: NodeId) {
    let at = Link::Node(node);
    let prev = get_prev(arena, head, at);
    let next = get_next(arena, head, at);
    set_next(arena, head, prev, next);
    set_prev(arena, head, next, prev);
    arena[node].prev = Link::Node(node);
    arena[node].next = Link::Node(node);
}

/// Splices every element of `src` onto the back of `dst`, leaving `src` empty.
/// Used by the mark sweep to move a completed layer from `now` into `middle`.
pub(crate) fn splice_all(arena: &mut Arena, src: &mut ListHead, dst: &mut ListHead) {
    if src.is_empty() {
        return;
    }
    let src_first = src.next;
    let src_last = src.prev;
    let dst_last = dst.prev;

    set_next(arena, dst, dst_last, src_first);
    set_prev(arena, dst, src_first, dst_last);
    set_next(arena, dst, src_last, Link::Head);
    set_prev(arena, dst, Link::Head, src_last);

    src.next = Link::Head;
    src.prev = Link::Head;
}

/// Iterates the nodes of `head`'s list from front to back. Mutating the list
/// while iterating it is not supported, matching the engine's documented
/// contract for frontier iteration.
pub(crate) fn iter<'a>(arena: &'a Arena, head: &'a ListHead) -> ListIter<'a> {
    ListIter {
        arena,
        current: head.next,
    }
}

pub(crate) struct ListIter<'a> {
    arena: &'a Arena,
    current: Link,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        match self.current {
            Link::Head => None,
            Link::Node(id) => {
                self.current = self.arena[id].next;
                Some(id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_arena_with(n: usize) -> (Arena, Vec<NodeId>) {
        let mut arena: Arena = SlotMap::with_key();
        let mut ids = Vec::new();
        for i in 0..n {
            let id = arena.insert_with_key(|id| NodeData::new(id, i as i64));
            ids.push(id);
        }
        (arena, ids)
    }

    #[test]
    fn empty_list_has_no_front() {
        let head = ListHead::new();
        assert!(head.is_empty());
        assert_eq!(head.front(), None);
    }

    #[test]
    fn push_front_then_iter_is_reverse_insertion_order() {
        let (mut arena, ids) = fresh_arena_with(3);
        let mut head = ListHead::new();
        for &id in &ids {
            push_front(&mut arena, &mut head, id);
        }
        let collected: Vec<_> = iter(&arena, &head).collect();
        assert_eq!(collected, vec![ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn unlink_removes_exactly_one_node() {
        let (mut arena, ids) = fresh_arena_with(3);
        let mut head = ListHead::new();
        for &id in &ids {
            push_front(&mut arena, &mut head, id);
        }
        unlink(&mut arena, &mut head, ids[1]);
        let collected: Vec<_> = iter(&arena, &head).collect();
        assert_eq!(collected, vec![ids[2], ids[0]]);
        // The unlinked node is now a detached singleton.
        assert_eq!(arena[ids[1]].next, Link::Node(ids[1]));
        assert_eq!(arena[ids[1]].prev, Link::Node(ids[1]));
    }

    #[test]
    fn unlink_last_node_empties_list() {
        let (mut arena, ids) = fresh_arena_with(1);
        let mut head = ListHead::new();
        push_front(&mut arena, &mut head, ids[0]);
        unlink(&mut arena, &mut head, ids[0]);
        assert!(head.is_empty());
    }

    #[test]
    fn splice_all_moves_everything_and_empties_source() {
        let (mut arena, ids) = fresh_arena_with(4);
        let mut src = ListHead::new();
        let mut dst = ListHead::new();
        push_front(&mut arena, &mut src, ids[0]);
        push_front(&mut arena, &mut src, ids[1]);
        push_front(&mut arena, &mut dst, ids[2]);
        push_front(&mut arena, &mut dst, ids[3]);

        splice_all(&mut arena, &mut src, &mut dst);
        assert!(src.is_empty());
        let collected: Vec<_> = iter(&arena, &dst).collect();
        assert_eq!(collected, vec![ids[3], ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn splice_all_from_empty_source_is_noop() {
        let (mut arena, ids) = fresh_arena_with(2);
        let mut src = ListHead::new();
        let mut dst = ListHead::new();
        push_front(&mut arena, &mut dst, ids[0]);
        push_front(&mut arena, &mut dst, ids[1]);

        splice_all(&mut arena, &mut src, &mut dst);
        let collected: Vec<_> = iter(&arena, &dst).collect();
        assert_eq!(collected, vec![ids[1], ids[0]]);
    }
}
