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

use crate::{
    frame::{FrameId, FramePosition},
    util::frame_list::{FrameList, Iter},
};

use super::access_tracker::AccessTracker;

/// An aging cohort of resident frames.
///
/// New frames are inserted at the head. Scans walk from the tail, where the frames that
/// have been in this generation the longest are.
pub struct Generation {
    index: usize,
    pages: FrameList,
    tracker: AccessTracker,
}

impl Generation {
    pub fn new(index: usize, tracker_words: usize) -> Self {
        Self {
            index,
            pages: FrameList::new(),
            tracker: AccessTracker::new(tracker_words),
        }
    }

    /// Adds a frame to the head of this generation
    pub fn add_page(&mut self, id: FrameId) -> FramePosition {
        self.pages.push_front(id)
    }

    /// Removes the frame at `position` and returns its id
    pub fn remove_page(&mut self, position: FramePosition) -> Option<FrameId> {
        let removed = self.pages.remove(position);
        debug_assert!(
            removed.is_some(),
            "stale position {:?} in generation {}",
            position,
            self.index
        );

        removed
    }

    pub fn get_tracker(&self) -> &AccessTracker {
        &self.tracker
    }

    /// Frames of this generation from head to tail.
    ///
    /// Use `.rev()` to start at the tail.
    pub fn pages(&self) -> Iter<'_> {
        self.pages.iter()
    }

    /// Returns the frame at `position` if that position is still live
    pub fn page_at(&self, position: FramePosition) -> Option<FrameId> {
        self.pages.get(position)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}
