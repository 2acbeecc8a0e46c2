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

use std::collections::VecDeque;

use rand_xoshiro::{
    rand_core::{RngCore, SeedableRng},
    Xoshiro128StarStar,
};
use serde::Serialize;

use crate::{modules::scan_control::ScanControlModule, FrameAllocator, FrameId};

use super::{get_bench_allocator, AllocatorOptions, Benchmark, Timer};

const CONTROL_SEED: [u8; 16] = [
    149, 228, 163, 172, 175, 184, 104, 86, 131, 185, 95, 73, 18, 58, 248, 111,
];

const HOT_ACCESS_PERCENT: u32 = 70;
const PROACTIVE_RECLAIM_INTERVAL: usize = 64;
const WORKLOAD_GENERATIONS: usize = 4;

#[derive(Serialize)]
pub struct HotColdWorkloadBenchmarkOptions {
    allocator: AllocatorOptions,
    hot_frames: usize,
    iterations: usize,
    hot_access_percent: u32,
}

/// Mixed workload: a small hot set is accessed most of the time, the rest of the time a
/// cold frame is allocated and touched once.
///
/// Hot frames that got reclaimed are accessed anyway (a refault) and then replaced by a
/// fresh allocation. Every few iterations a proactive reclaim pass runs.
pub struct HotColdWorkloadBenchmark<C: ScanControlModule + Send + 'static> {
    allocator: FrameAllocator<C>,
    capacity: usize,
    hot: Vec<FrameId>,
    cold: VecDeque<FrameId>,
    iterations: usize,
    rng: Xoshiro128StarStar,
}

impl<C: ScanControlModule + Send + 'static> HotColdWorkloadBenchmark<C> {
    pub fn new(capacity: usize, hot_frames: usize, iterations: usize, scan_control: C) -> Self {
        assert!(hot_frames > 0 && hot_frames < capacity);

        let allocator = get_bench_allocator(capacity, WORKLOAD_GENERATIONS, scan_control);
        let hot = (0..hot_frames)
            .filter_map(|_| allocator.allocate_page())
            .collect();

        Self {
            allocator,
            capacity,
            hot,
            cold: VecDeque::new(),
            iterations,
            rng: Xoshiro128StarStar::from_seed(CONTROL_SEED),
        }
    }

    fn touch_hot(&mut self) {
        let index = self.rng.next_u32() as usize % self.hot.len();
        let id = self.hot[index];

        self.allocator.access_page(id);
        if !self.allocator.is_resident(id) {
            if let Some(replacement) = self.allocator.allocate_page() {
                self.hot[index] = replacement;
            }
        }
    }

    fn touch_cold(&mut self) {
        if let Some(id) = self.allocator.allocate_page() {
            self.allocator.access_page(id);
            self.cold.push_back(id);
        }

        // the caller lets go of its oldest cold frames, reclaimed or not
        while self.hot.len() + self.cold.len() > self.capacity {
            if let Some(id) = self.cold.pop_front() {
                self.allocator.free_page(id);
            }
        }
    }
}

impl<C: ScanControlModule + Send + 'static> Benchmark<HotColdWorkloadBenchmarkOptions>
    for HotColdWorkloadBenchmark<C>
{
    #[inline]
    fn get_name(&self) -> &'static str {
        "hot_cold_workload"
    }

    #[inline]
    fn execute<T: Timer>(&mut self) -> u32 {
        let timer = T::start();

        for i in 0..self.iterations {
            if self.rng.next_u32() % 100 < HOT_ACCESS_PERCENT {
                self.touch_hot();
            } else {
                self.touch_cold();
            }

            if i % PROACTIVE_RECLAIM_INTERVAL == 0 {
                self.allocator.proactive_reclaim();
            }
        }

        timer.stop()
    }

    fn get_bench_options(&self) -> HotColdWorkloadBenchmarkOptions {
        HotColdWorkloadBenchmarkOptions {
            allocator: AllocatorOptions::new::<C>(self.capacity, WORKLOAD_GENERATIONS),
            hot_frames: self.hot.len(),
            iterations: self.iterations,
            hot_access_percent: HOT_ACCESS_PERCENT,
        }
    }
}
