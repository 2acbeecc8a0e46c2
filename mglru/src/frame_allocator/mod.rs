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

use std::{
    collections::VecDeque,
    sync::Arc,
    thread::{self, JoinHandle},
};

use log::{debug, info, trace, warn};
use parking_lot::{Condvar, Mutex};
use static_assertions::assert_impl_all;

use crate::{
    frame::FrameId,
    mglru_config::{MglruConfig, MglruError},
    modules::scan_control::{ScanControlModule, ScanIntensityController},
    reclaim_engine::{ReclaimEngine, ReclaimResult},
    reclaim_stats::ReclaimStats,
    util::{ceil_div, percent_of},
};

mod reclaim_daemon;
mod refault_window;

#[cfg(test)]
mod test;

use refault_window::RefaultWindow;

const RECLAIM_THREAD_NAME: &str = "kreclaimd";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReclaimTrigger {
    Background,
    /// Bounded retry loop of `direct_reclaim`, also used by `allocate_page`
    Direct,
    /// Single pass asked for through `reclaim` or `proactive_reclaim`
    Requested,
}

#[derive(Debug, Default, Clone, Copy)]
struct AllocatorCounters {
    refaults: u64,
    background_passes: u64,
    direct_reclaim_passes: u64,
    requested_passes: u64,
    failed_allocations: u64,
}

/// Everything that is guarded by the allocator lock
pub(crate) struct AllocatorState<C: ScanControlModule> {
    engine: ReclaimEngine,
    free_list: VecDeque<FrameId>,
    scan_control: C,
    refault_window: RefaultWindow,

    /// Refaults since the last report to `scan_control`
    pending_refaults: usize,

    counters: AllocatorCounters,
    capacity: usize,
    stop: bool,
}

impl<C: ScanControlModule> AllocatorState<C> {
    #[inline]
    pub(crate) fn used(&self) -> usize {
        self.capacity - self.free_list.len()
    }

    /// Runs one scan and hands every evicted frame back to the free list.
    ///
    /// The caller holds the lock for the whole pass.
    pub(crate) fn reclaim_pass(&mut self, budget: usize, trigger: ReclaimTrigger) -> ReclaimResult {
        let result = self.engine.scan_and_reclaim(budget);

        for &id in result.evicted_pages.iter() {
            self.free_list.push_back(id);
            self.refault_window.record_eviction(id);
        }

        // passes that only aged say nothing about reclaim efficiency
        if result.scanned_pages_count > 0 {
            let refaults = core::mem::take(&mut self.pending_refaults);
            self.scan_control.update_metrics(
                refaults,
                result.scanned_pages_count,
                result.evicted_pages.len(),
            );
        }

        match trigger {
            ReclaimTrigger::Background => self.counters.background_passes += 1,
            ReclaimTrigger::Direct => self.counters.direct_reclaim_passes += 1,
            ReclaimTrigger::Requested => self.counters.requested_passes += 1,
        }

        debug!(
            "{:?} reclaim pass (budget={}): {} frame(s) reclaimed, {} in use",
            trigger,
            budget,
            result.evicted_pages.len(),
            self.used()
        );
        self.debug_check_conservation();

        result
    }

    /// Repeats passes until something got evicted.
    ///
    /// A pass that finds the oldest generation empty only ages, so up to `num_generations`
    /// passes may be needed before frames reach the oldest generation.
    pub(crate) fn direct_reclaim(&mut self, budget: usize) -> usize {
        for _ in 0..self.engine.num_generations() {
            let reclaimed = self
                .reclaim_pass(budget, ReclaimTrigger::Direct)
                .evicted_pages
                .len();

            if reclaimed > 0 {
                return reclaimed;
            }
            if self.engine.resident_count() == 0 {
                break;
            }
        }

        0
    }

    #[inline]
    fn debug_check_conservation(&self) {
        debug_assert_eq!(
            self.free_list.len() + self.engine.resident_count(),
            self.capacity,
            "free and resident frames do not add up to the capacity"
        );
    }

    /// Panics if a frame is lost, duplicated, or both free and resident
    pub(crate) fn check_invariants(&self) {
        self.engine.check_invariants();

        let mut seen = vec![false; self.capacity];
        for &id in self.free_list.iter() {
            let slot = &mut seen[id as usize];
            assert!(!*slot, "frame {} is in the free list twice", id);
            assert!(!self.engine.is_resident(id), "frame {} is free and resident", id);
            *slot = true;
        }

        for (id, seen) in seen.iter().enumerate() {
            assert!(
                *seen || self.engine.is_resident(id as FrameId),
                "frame {} is neither free nor resident",
                id
            );
        }
        assert_eq!(self.free_list.len() + self.engine.resident_count(), self.capacity);
    }
}

/// State shared with the background reclaim thread
pub(crate) struct Shared<C: ScanControlModule> {
    state: Mutex<AllocatorState<C>>,
    wakeup: Condvar,
    high_watermark: usize,
    low_watermark: usize,
}

/// Fixed pool of frames `0..capacity` with generational reclaim.
///
/// Every operation takes the allocator lock, including complete reclaim passes. Unless
/// disabled in [`MglruConfig`], a background thread reclaims frames from the moment more
/// than the high watermark is in use until usage is back at the low watermark.
pub struct FrameAllocator<C: ScanControlModule + Send + 'static = ScanIntensityController> {
    shared: Arc<Shared<C>>,
    reclaim_thread: Option<JoinHandle<()>>,
    capacity: usize,
    direct_reclaim_budget: usize,
}

assert_impl_all!(FrameAllocator: Send, Sync);

impl FrameAllocator {
    /// Creates an allocator with `capacity` frames and default settings.
    ///
    /// ### Panics
    ///
    /// If `capacity` or `num_generations` is zero, or if the reclaim thread cannot be spawned.
    pub fn new(capacity: usize, num_generations: usize) -> Self {
        match Self::with_config(MglruConfig::new(capacity, num_generations)) {
            Ok(allocator) => allocator,
            Err(err) => panic!("could not create frame allocator: {}", err),
        }
    }

    pub fn with_config(config: MglruConfig) -> Result<Self, MglruError> {
        let scan_control = ScanIntensityController::new(config.pid);
        Self::with_scan_control(config, scan_control)
    }
}

impl<C: ScanControlModule + Send + 'static> FrameAllocator<C> {
    pub fn with_scan_control(config: MglruConfig, scan_control: C) -> Result<Self, MglruError> {
        config.validate()?;

        let capacity = config.capacity;
        let high_watermark = percent_of(capacity, config.high_watermark_percent);
        let low_watermark = percent_of(capacity, config.low_watermark_percent);
        let refault_window = config.refault_window.unwrap_or(ceil_div(capacity, 4));

        let state = AllocatorState {
            engine: ReclaimEngine::new(config.num_generations, config.tracker_words),
            free_list: (0..capacity as FrameId).collect(),
            scan_control,
            refault_window: RefaultWindow::new(refault_window),
            pending_refaults: 0,
            counters: AllocatorCounters::default(),
            capacity,
            stop: false,
        };

        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            wakeup: Condvar::new(),
            high_watermark,
            low_watermark,
        });

        let reclaim_thread = if config.background_reclaim {
            let shared = shared.clone();
            Some(
                thread::Builder::new()
                    .name(RECLAIM_THREAD_NAME.into())
                    .spawn(move || reclaim_daemon::reclaim_loop(shared))?,
            )
        } else {
            None
        };

        info!(
            "Frame allocator ready: capacity={}, generations={}, watermarks={}/{}, background reclaim={}",
            capacity,
            config.num_generations,
            low_watermark,
            high_watermark,
            config.background_reclaim
        );

        Ok(Self {
            shared,
            reclaim_thread,
            capacity,
            direct_reclaim_budget: config.direct_reclaim_budget,
        })
    }

    /// Hands out a free frame.
    ///
    /// If no frame is free, a bounded reclaim pass runs on the calling thread first.
    /// Returns `None` if that did not free anything.
    pub fn allocate_page(&self) -> Option<FrameId> {
        let mut state = self.shared.state.lock();

        if state.free_list.is_empty() {
            state.direct_reclaim(self.direct_reclaim_budget);
        }

        let id = match state.free_list.pop_front() {
            Some(id) => id,
            None => {
                state.counters.failed_allocations += 1;
                warn!("Out of frames: all {} frames are in use", self.capacity);
                return None;
            }
        };

        state.refault_window.forget(id);
        state.engine.on_page_added(id);
        trace!("Allocated frame {}", id);

        if state.used() > self.shared.high_watermark && self.reclaim_thread.is_some() {
            self.shared.wakeup.notify_one();
        }

        Some(id)
    }

    /// Marks `id` as accessed.
    ///
    /// Unknown ids are ignored. If `id` was evicted recently, this counts as a refault.
    pub fn access_page(&self, id: FrameId) {
        let mut state = self.shared.state.lock();

        if state.engine.is_resident(id) {
            state.engine.on_page_accessed(id);
        } else if state.refault_window.forget(id) {
            trace!("Refault of frame {}", id);
            state.pending_refaults += 1;
            state.counters.refaults += 1;
        }
    }

    /// Returns `id` to the free list.
    ///
    /// Frames that are not resident (never allocated, already freed or reclaimed) are
    /// ignored, so a frame can never be in the free list twice.
    pub fn free_page(&self, id: FrameId) {
        let mut state = self.shared.state.lock();

        if state.engine.remove_page(id) {
            state.free_list.push_back(id);
            trace!("Freed frame {}", id);
        } else {
            trace!("Ignoring free of non resident frame {}", id);
        }
    }

    /// Share of frames that are in use, between `0.0` and `1.0`
    pub fn get_memory_usage(&self) -> f64 {
        let state = self.shared.state.lock();
        state.used() as f64 / self.capacity as f64
    }

    /// Runs a single reclaim pass of up to `budget` frames on the calling thread
    pub fn reclaim(&self, budget: usize) -> ReclaimResult {
        self.shared
            .state
            .lock()
            .reclaim_pass(budget, ReclaimTrigger::Requested)
    }

    /// Reclaims on the calling thread until at least one frame was freed or every
    /// generation was aged once. Returns the number of reclaimed frames.
    pub fn direct_reclaim(&self, budget: usize) -> usize {
        self.shared.state.lock().direct_reclaim(budget)
    }

    /// Runs a reclaim pass sized by the scan control module
    pub fn proactive_reclaim(&self) -> usize {
        let mut state = self.shared.state.lock();
        let budget = state.scan_control.get_scan_intensity();

        state
            .reclaim_pass(budget, ReclaimTrigger::Requested)
            .evicted_pages
            .len()
    }

    /// Batch size currently recommended by the scan control module
    pub fn scan_intensity(&self) -> usize {
        self.shared.state.lock().scan_control.get_scan_intensity()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `(high, low)` watermarks in frames
    #[inline]
    pub fn watermarks(&self) -> (usize, usize) {
        (self.shared.high_watermark, self.shared.low_watermark)
    }

    pub fn is_resident(&self, id: FrameId) -> bool {
        self.shared.state.lock().engine.is_resident(id)
    }

    pub fn stats(&self) -> ReclaimStats {
        let state = self.shared.state.lock();
        let engine_counters = state.engine.counters();

        ReclaimStats {
            capacity: self.capacity,
            free_frames: state.free_list.len(),
            resident_frames: state.engine.resident_count(),
            high_watermark: self.shared.high_watermark,
            low_watermark: self.shared.low_watermark,
            generation_sizes: state.engine.generation_sizes(),
            scanned: engine_counters.scanned,
            evicted: engine_counters.evicted,
            promoted: engine_counters.promoted,
            agings: engine_counters.agings,
            refaults: state.counters.refaults,
            background_passes: state.counters.background_passes,
            direct_reclaim_passes: state.counters.direct_reclaim_passes,
            requested_passes: state.counters.requested_passes,
            failed_allocations: state.counters.failed_allocations,
            scan_intensity: state.scan_control.get_scan_intensity(),
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.shared.state.lock().check_invariants();
    }
}

impl<C: ScanControlModule + Send + 'static> Drop for FrameAllocator<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.reclaim_thread.take() {
            self.shared.state.lock().stop = true;
            self.shared.wakeup.notify_all();

            if handle.join().is_err() {
                warn!("Background reclaim thread panicked");
            }
        }

        info!("Frame allocator shut down");
    }
}
