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

use std::collections::HashMap;

use log::{debug, trace};

use crate::frame::{FrameId, FrameMetadata};

pub mod access_tracker;
pub mod generation;


use generation::Generation;

/// Outcome of one [`ReclaimEngine::scan_and_reclaim`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclaimResult {
    pub evicted_pages: Vec<FrameId>,
    pub promoted_pages_count: usize,
    pub scanned_pages_count: usize,
}

/// Cumulative counters of a [`ReclaimEngine`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineCounters {
    pub scanned: u64,
    pub evicted: u64,
    pub promoted: u64,
    pub agings: u64,
}

/// Multi-generational LRU core.
///
/// Generation `0` is the youngest, generation `num_generations - 1` the oldest.
/// Accesses only set a bit; all reordering happens in [`ReclaimEngine::scan_and_reclaim`]
/// and [`ReclaimEngine::age_generations`].
///
/// All methods take `&mut self` except for the access path, so a caller sharing an engine
/// between threads has to serialize them (see [`FrameAllocator`](crate::FrameAllocator)).
pub struct ReclaimEngine {
    generations: Vec<Generation>,
    page_table: HashMap<FrameId, FrameMetadata>,
    counters: EngineCounters,
}

impl ReclaimEngine {
    /// ### Panics
    ///
    /// If `num_generations` is zero or `tracker_words_per_generation` is not a power of two.
    pub fn new(num_generations: usize, tracker_words_per_generation: usize) -> Self {
        assert!(num_generations > 0, "at least one generation is required");

        Self {
            generations: (0..num_generations)
                .map(|index| Generation::new(index, tracker_words_per_generation))
                .collect(),
            page_table: HashMap::new(),
            counters: EngineCounters::default(),
        }
    }

    #[inline]
    fn oldest_index(&self) -> usize {
        self.generations.len() - 1
    }

    /// Makes `id` resident in the youngest generation.
    ///
    /// `id` must not be resident already.
    pub fn on_page_added(&mut self, id: FrameId) {
        debug_assert!(
            !self.page_table.contains_key(&id),
            "frame {} is already resident",
            id
        );

        let position = self.generations[0].add_page(id);
        self.page_table.insert(
            id,
            FrameMetadata {
                id,
                generation_index: 0,
                position,
            },
        );

        self.debug_check_frame(id);
    }

    /// Records an access to `id` in the tracker of its current generation.
    ///
    /// Does not move the frame. Unknown ids are ignored.
    #[inline]
    pub fn on_page_accessed(&self, id: FrameId) {
        match self.page_table.get(&id) {
            Some(metadata) => self.generations[metadata.generation_index]
                .get_tracker()
                .set(id),
            None => trace!("Access to non resident frame {}", id),
        }
    }

    /// Scans up to `budget` frames from the tail of the oldest generation.
    ///
    /// Accessed frames get promoted one generation, all others get evicted.
    pub fn scan_and_reclaim(&mut self, budget: usize) -> ReclaimResult {
        let mut result = ReclaimResult::default();
        let oldest = self.oldest_index();

        if self.generations[oldest].is_empty() {
            debug!("Oldest generation is empty, aging instead of scanning");
            self.age_generations();
            return result;
        }

        // collect first, the list gets modified below
        let candidates: Vec<FrameId> = self.generations[oldest]
            .pages()
            .rev()
            .take(budget)
            .collect();

        for &id in candidates.iter() {
            let metadata = match self.page_table.get(&id) {
                Some(metadata) => *metadata,
                None => {
                    debug_assert!(false, "frame {} in generation but not in page table", id);
                    continue;
                }
            };
            debug_assert_eq!(metadata.generation_index, oldest);

            if self.generations[oldest].get_tracker().check_and_clear(id) {
                self.promote_page(metadata);
                result.promoted_pages_count += 1;
            } else {
                self.generations[oldest].remove_page(metadata.position);
                self.page_table.remove(&id);
                result.evicted_pages.push(id);
            }
        }

        result.scanned_pages_count = candidates.len();

        self.counters.scanned += result.scanned_pages_count as u64;
        self.counters.evicted += result.evicted_pages.len() as u64;
        self.counters.promoted += result.promoted_pages_count as u64;

        debug!(
            "Scanned {} frame(s): evicted={}, promoted={}",
            result.scanned_pages_count,
            result.evicted_pages.len(),
            result.promoted_pages_count
        );

        // refill the oldest generation for the next call
        if self.generations[oldest].len() < budget / 4 {
            self.age_generations();
        }

        self.debug_check_sizes();
        result
    }

    /// Moves a frame of the oldest generation one generation younger.
    ///
    /// With a single generation there is nowhere to go and the frame stays where it is.
    fn promote_page(&mut self, metadata: FrameMetadata) {
        let current = metadata.generation_index;
        if current == 0 {
            return;
        }

        let younger = current - 1;
        self.generations[current].remove_page(metadata.position);
        let position = self.generations[younger].add_page(metadata.id);

        self.page_table.insert(
            metadata.id,
            FrameMetadata {
                id: metadata.id,
                generation_index: younger,
                position,
            },
        );
        self.debug_check_frame(metadata.id);
    }

    /// Shifts every frame one generation older and starts a new tracking epoch.
    ///
    /// Generations are processed from `num_generations - 2` down to `0`, so no frame moves
    /// more than one generation per call. Relative order inside a generation is kept.
    pub fn age_generations(&mut self) {
        let oldest = self.oldest_index();

        for index in (0..oldest).rev() {
            let moving: Vec<FrameId> = self.generations[index].pages().rev().collect();

            for id in moving {
                let metadata = match self.page_table.get_mut(&id) {
                    Some(metadata) => metadata,
                    None => {
                        debug_assert!(false, "frame {} in generation but not in page table", id);
                        continue;
                    }
                };

                let (younger, older) = self.generations.split_at_mut(index + 1);
                younger[index].remove_page(metadata.position);
                metadata.position = older[0].add_page(id);
                metadata.generation_index = index + 1;
            }

            self.generations[index].get_tracker().clear();
        }

        self.generations[oldest].get_tracker().clear();
        self.counters.agings += 1;

        debug!("Aged generations: {:?}", self.generation_sizes());
        self.debug_check_sizes();
    }

    /// Removes a frame outside of a scan, e.g. because it was freed explicitly
    pub fn on_page_removed(&mut self, metadata: FrameMetadata) {
        match self.page_table.get(&metadata.id) {
            Some(stored) if *stored == metadata => {}
            _ => {
                trace!("Ignoring removal of non resident frame {}", metadata.id);
                return;
            }
        }

        self.generations[metadata.generation_index].remove_page(metadata.position);
        self.page_table.remove(&metadata.id);

        self.debug_check_frame(metadata.id);
    }

    /// Looks up `id` and removes it.
    ///
    /// Returns `false` if `id` was not resident.
    pub fn remove_page(&mut self, id: FrameId) -> bool {
        match self.metadata(id) {
            Some(metadata) => {
                self.on_page_removed(metadata);
                true
            }
            None => false,
        }
    }

    pub fn metadata(&self, id: FrameId) -> Option<FrameMetadata> {
        self.page_table.get(&id).copied()
    }

    #[inline]
    pub fn is_resident(&self, id: FrameId) -> bool {
        self.page_table.contains_key(&id)
    }

    #[inline]
    pub fn resident_count(&self) -> usize {
        self.page_table.len()
    }

    #[inline]
    pub fn num_generations(&self) -> usize {
        self.generations.len()
    }

    pub fn generation(&self, index: usize) -> Option<&Generation> {
        self.generations.get(index)
    }

    pub fn generation_sizes(&self) -> Vec<usize> {
        self.generations.iter().map(|gen| gen.len()).collect()
    }

    pub fn counters(&self) -> EngineCounters {
        self.counters
    }

    /// Checks the generation sizes against the page table, `O(num_generations)`
    #[inline]
    fn debug_check_sizes(&self) {
        #[cfg(debug_assertions)]
        self.check_sizes();
    }

    /// Like [`Self::debug_check_sizes`], plus the bookkeeping of the single frame `id`
    #[inline]
    fn debug_check_frame(&self, id: FrameId) {
        #[cfg(debug_assertions)]
        {
            self.check_sizes();
            self.check_frame(id);
        }
        #[cfg(not(debug_assertions))]
        let _ = id;
    }

    fn check_sizes(&self) {
        let total: usize = self.generations.iter().map(|gen| gen.len()).sum();
        assert_eq!(
            total,
            self.page_table.len(),
            "generations hold {} frame(s) but page table has {}",
            total,
            self.page_table.len()
        );
    }

    fn check_frame(&self, id: FrameId) {
        if let Some(metadata) = self.page_table.get(&id) {
            assert_eq!(id, metadata.id);
            assert_eq!(
                self.generations[metadata.generation_index].page_at(metadata.position),
                Some(id),
                "frame {} not found in generation {}",
                id,
                metadata.generation_index
            );
        }
    }

    /// Panics if the page table and the generations disagree.
    ///
    /// Walks every resident frame, mutations only run the cheap checks above.
    pub(crate) fn check_invariants(&self) {
        self.check_sizes();

        for id in self.page_table.keys() {
            self.check_frame(*id);
        }
    }
}
