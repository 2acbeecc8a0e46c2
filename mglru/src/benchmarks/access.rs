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

use rand_xoshiro::{
    rand_core::{RngCore, SeedableRng},
    Xoshiro128StarStar,
};
use serde::Serialize;

use crate::{modules::scan_control::ScanIntensityController, FrameAllocator, FrameId};

use super::{get_bench_allocator, AllocatorOptions, Benchmark, Timer};

const ACCESS_SEED: [u8; 16] = [
    52, 187, 3, 201, 96, 17, 240, 85, 133, 9, 164, 78, 222, 41, 119, 250,
];

#[derive(Serialize)]
pub struct AccessBenchmarkOptions {
    allocator: AllocatorOptions,
    iterations: usize,
}

/// Time for `iterations` accesses to random resident frames
pub struct AccessBenchmark {
    allocator: FrameAllocator,
    frames: Vec<FrameId>,
    rng: Xoshiro128StarStar,
    num_generations: usize,
    iterations: usize,
}

impl AccessBenchmark {
    pub fn new(capacity: usize, num_generations: usize, iterations: usize) -> Self {
        let allocator =
            get_bench_allocator(capacity, num_generations, ScanIntensityController::default());
        let frames: Vec<FrameId> = (0..capacity)
            .filter_map(|_| allocator.allocate_page())
            .collect();

        Self {
            allocator,
            frames,
            rng: Xoshiro128StarStar::from_seed(ACCESS_SEED),
            num_generations,
            iterations,
        }
    }
}

impl Benchmark<AccessBenchmarkOptions> for AccessBenchmark {
    #[inline]
    fn get_name(&self) -> &'static str {
        "access"
    }

    #[inline]
    fn execute<T: Timer>(&mut self) -> u32 {
        let targets: Vec<FrameId> = (0..self.iterations)
            .map(|_| self.frames[self.rng.next_u32() as usize % self.frames.len()])
            .collect();

        let timer = T::start();
        for id in targets {
            self.allocator.access_page(black_box(id));
        }
        timer.stop()
    }

    fn get_bench_options(&self) -> AccessBenchmarkOptions {
        AccessBenchmarkOptions {
            allocator: AllocatorOptions::new::<ScanIntensityController>(
                self.frames.len(),
                self.num_generations,
            ),
            iterations: self.iterations,
        }
    }
}
