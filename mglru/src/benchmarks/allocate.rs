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

use core::hint::black_box;

use serde::Serialize;

use crate::{modules::scan_control::ScanIntensityController, FrameAllocator};

use super::{get_bench_allocator, AllocatorOptions, Benchmark, Timer};

#[derive(Serialize)]
pub struct AllocateBenchmarkOptions {
    allocator: AllocatorOptions,
    exhausted: bool,
}

/// Latency of a single `allocate_page` call.
///
/// With `exhausted` set, the pool is full and every allocation has to reclaim first.
pub struct AllocateBenchmark {
    allocator: FrameAllocator,
    capacity: usize,
    num_generations: usize,
    exhausted: bool,
}

impl AllocateBenchmark {
    pub fn new(capacity: usize, num_generations: usize, exhausted: bool) -> Self {
        let allocator =
            get_bench_allocator(capacity, num_generations, ScanIntensityController::default());

        if exhausted {
            while allocator.get_memory_usage() < 1.0 {
                allocator.allocate_page();
            }
        }

        Self {
            allocator,
            capacity,
            num_generations,
            exhausted,
        }
    }
}

impl Benchmark<AllocateBenchmarkOptions> for AllocateBenchmark {
    #[inline]
    fn get_name(&self) -> &'static str {
        if self.exhausted {
            "allocate_exhausted"
        } else {
            "allocate_free"
        }
    }

    #[inline]
    fn execute<T: Timer>(&mut self) -> u32 {
        let timer = T::start();
        let id = black_box(self.allocator.allocate_page());
        let res = timer.stop();

        // an exhausted pool stays full, the new frame replaces the evicted one
        if let (Some(id), false) = (id, self.exhausted) {
            self.allocator.free_page(id);
        }

        res
    }

    fn get_bench_options(&self) -> AllocateBenchmarkOptions {
        AllocateBenchmarkOptions {
            allocator: AllocatorOptions::new::<ScanIntensityController>(
                self.capacity,
                self.num_generations,
            ),
            exhausted: self.exhausted,
        }
    }
}
