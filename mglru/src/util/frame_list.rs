/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use crate::frame::{FrameId, FramePosition};

const NIL: u32 = u32::MAX;

struct FrameListNode {
    id: FrameId,
    prev: u32,
    next: u32,

    /// Incremented every time this slot is released, so stale positions can be detected
    stamp: u32,
    occupied: bool,
}

/// Index of the slot appended to an arena of `len` slots.
///
/// ### Panics
///
/// If the index does not fit into a `u32` or would collide with `NIL`.
fn new_slot_index(len: usize) -> u32 {
    match u32::try_from(len) {
        Ok(slot) if slot != NIL => slot,
        _ => panic!("frame list is full ({} slots)", len),
    }
}

/// Doubly linked list of frame ids whose nodes live in a `Vec` arena.
///
/// Links are slot indices instead of pointers. Released slots are recycled through
/// `free_slots`, so a [`FramePosition`] handed out by [`FrameList::push_front`] stays valid
/// until exactly that element is removed.
pub(crate) struct FrameList {
    nodes: Vec<FrameListNode>,
    free_slots: Vec<u32>,
    head: u32,
    tail: u32,
    len: usize,
}

impl FrameList {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free_slots: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `id` in front of the current head
    pub(crate) fn push_front(&mut self, id: FrameId) -> FramePosition {
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                let node = &mut self.nodes[slot as usize];
                debug_assert!(!node.occupied, "recycled slot is still occupied");

                node.id = id;
                node.prev = NIL;
                node.next = self.head;
                node.occupied = true;
                slot
            }
            None => {
                let slot = new_slot_index(self.nodes.len());

                self.nodes.push(FrameListNode {
                    id,
                    prev: NIL,
                    next: self.head,
                    stamp: 0,
                    occupied: true,
                });
                slot
            }
        };

        if self.head != NIL {
            self.nodes[self.head as usize].prev = slot;
        } else {
            self.tail = slot;
        }
        self.head = slot;
        self.len += 1;

        FramePosition {
            slot,
            stamp: self.nodes[slot as usize].stamp,
        }
    }

    /// Unlinks the element at `position` and returns its id.
    ///
    /// Returns `None` if `position` does not point to a live element of this list.
    pub(crate) fn remove(&mut self, position: FramePosition) -> Option<FrameId> {
        if !self.contains(position) {
            return None;
        }

        let (id, prev, next) = {
            let node = &mut self.nodes[position.slot as usize];
            node.occupied = false;
            node.stamp = node.stamp.wrapping_add(1);
            (node.id, node.prev, node.next)
        };

        match prev {
            NIL => self.head = next,
            prev => self.nodes[prev as usize].next = next,
        }
        match next {
            NIL => self.tail = prev,
            next => self.nodes[next as usize].prev = prev,
        }

        self.free_slots.push(position.slot);
        self.len -= 1;

        Some(id)
    }

    /// Returns `true` if `position` points to a live element of this list
    pub(crate) fn contains(&self, position: FramePosition) -> bool {
        match self.nodes.get(position.slot as usize) {
            Some(node) => node.occupied && node.stamp == position.stamp,
            None => false,
        }
    }

    /// Returns the id stored at `position`
    pub(crate) fn get(&self, position: FramePosition) -> Option<FrameId> {
        match self.contains(position) {
            true => Some(self.nodes[position.slot as usize].id),
            false => None,
        }
    }

    /// Iterates from the head (most recently inserted) to the tail
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }
}

/// Double ended iterator over the ids of a [`FrameList`]
pub struct Iter<'a> {
    list: &'a FrameList,
    front: u32,
    back: u32,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = FrameId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = &self.list.nodes[self.front as usize];
        self.front = node.next;
        self.remaining -= 1;

        Some(node.id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = &self.list.nodes[self.back as usize];
        self.back = node.prev;
        self.remaining -= 1;

        Some(node.id)
    }
}

impl ExactSizeIterator for Iter<'_> {}

#[cfg(test)]
mod test {
    use super::{new_slot_index, FrameList, NIL};

    #[test]
    fn test_push_front_order() {
        let mut list = FrameList::new();
        for id in [100, 200, 300] {
            list.push_front(id);
        }

        assert_eq!(list.len(), 3);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![300, 200, 100]);
        assert_eq!(list.iter().rev().collect::<Vec<_>>(), vec![100, 200, 300]);
    }

    #[test]
    fn test_positions_survive_other_removals() {
        let mut list = FrameList::new();
        let positions: Vec<_> = (0..10).map(|id| (id, list.push_front(id))).collect();

        // remove every even element, odd positions have to stay usable
        for (id, position) in positions.iter().filter(|(id, _)| id % 2 == 0) {
            assert_eq!(list.remove(*position), Some(*id));
        }

        // these inserts reuse the released slots
        let reused: Vec<_> = (10..15).map(|id| (id, list.push_front(id))).collect();

        for (id, position) in positions.iter().filter(|(id, _)| id % 2 == 1) {
            assert!(list.contains(*position));
            assert_eq!(list.remove(*position), Some(*id));
        }

        assert_eq!(list.iter().collect::<Vec<_>>(), vec![14, 13, 12, 11, 10]);

        for (id, position) in reused {
            assert_eq!(list.remove(position), Some(id));
        }
        assert!(list.is_empty());
        assert_eq!(list.iter().next(), None);
    }

    #[test]
    fn test_stale_position_is_rejected() {
        let mut list = FrameList::new();
        let first = list.push_front(1);
        assert_eq!(list.remove(first), Some(1));

        // same slot, new stamp
        let second = list.push_front(2);
        assert_eq!(first.slot, second.slot);

        assert!(!list.contains(first));
        assert_eq!(list.remove(first), None);
        assert_eq!(list.remove(second), Some(2));
    }

    #[test]
    fn test_slot_index_limit() {
        assert_eq!(new_slot_index(0), 0);
        assert_eq!(new_slot_index(NIL as usize - 1), NIL - 1);
    }

    #[test]
    #[should_panic]
    fn test_slot_index_never_collides_with_nil() {
        new_slot_index(NIL as usize);
    }

    #[test]
    #[should_panic]
    #[cfg(target_pointer_width = "64")]
    fn test_slot_index_does_not_wrap() {
        new_slot_index(u32::MAX as usize + 1);
    }
}
