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

use std::collections::{HashMap, VecDeque};

use crate::frame::FrameId;

/// Remembers the last `capacity` evicted frames.
///
/// Every eviction gets a sequence number so that a queue entry whose frame was forgotten
/// and evicted again later does not drop the newer record.
pub(crate) struct RefaultWindow {
    capacity: usize,
    sequence: u64,
    order: VecDeque<(FrameId, u64)>,
    evicted: HashMap<FrameId, u64>,
}

impl RefaultWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);

        Self {
            capacity,
            sequence: 0,
            order: VecDeque::with_capacity(capacity),
            evicted: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn record_eviction(&mut self, id: FrameId) {
        self.sequence += 1;
        self.evicted.insert(id, self.sequence);
        self.order.push_back((id, self.sequence));

        while self.evicted.len() > self.capacity {
            match self.order.pop_front() {
                Some((old_id, old_sequence)) => {
                    if self.evicted.get(&old_id) == Some(&old_sequence) {
                        self.evicted.remove(&old_id);
                    }
                }
                None => break,
            }
        }

        // stale entries pile up if frames keep getting forgotten
        if self.order.len() > 2 * self.capacity {
            let evicted = &self.evicted;
            self.order
                .retain(|(id, sequence)| evicted.get(id) == Some(sequence));
        }
    }

    /// Forgets `id`, returns `true` if it was in the window
    pub(crate) fn forget(&mut self, id: FrameId) -> bool {
        self.evicted.remove(&id).is_some()
    }

    #[allow(unused)]
    pub(crate) fn len(&self) -> usize {
        self.evicted.len()
    }
}
