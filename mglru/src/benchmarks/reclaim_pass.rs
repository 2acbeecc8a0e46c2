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

use crate::{util::percent_of, FrameId, MglruConfig, ReclaimEngine};

use super::{Benchmark, Timer};

const SELECTION_SEED: [u8; 16] = [
    201, 14, 77, 163, 38, 250, 119, 6, 92, 145, 31, 188, 57, 230, 102, 69,
];

#[derive(Serialize)]
pub struct ReclaimPassBenchmarkOptions {
    resident_frames: usize,
    num_generations: usize,
    budget: usize,
    accessed_percent: u8,
}

/// One `scan_and_reclaim` call on an engine whose frames all sit in the oldest generation
pub struct ReclaimPassBenchmark {
    resident_frames: usize,
    num_generations: usize,
    budget: usize,
    accessed_percent: u8,
    rng: Xoshiro128StarStar,
}

impl ReclaimPassBenchmark {
    pub fn new(
        resident_frames: usize,
        num_generations: usize,
        budget: usize,
        accessed_percent: u8,
    ) -> Self {
        assert!(accessed_percent <= 100);

        Self {
            resident_frames,
            num_generations,
            budget,
            accessed_percent,
            rng: Xoshiro128StarStar::from_seed(SELECTION_SEED),
        }
    }

    fn prepare_engine(&mut self) -> ReclaimEngine {
        let mut engine =
            ReclaimEngine::new(self.num_generations, MglruConfig::default().tracker_words);

        for id in 0..self.resident_frames as FrameId {
            engine.on_page_added(id);
        }
        for _ in 1..self.num_generations {
            engine.age_generations();
        }

        for _ in 0..percent_of(self.resident_frames, self.accessed_percent) {
            let id = self.rng.next_u32() as usize % self.resident_frames;
            engine.on_page_accessed(id as FrameId);
        }

        engine
    }
}

impl Benchmark<ReclaimPassBenchmarkOptions> for ReclaimPassBenchmark {
    #[inline]
    fn get_name(&self) -> &'static str {
        "reclaim_pass"
    }

    #[inline]
    fn execute<T: Timer>(&mut self) -> u32 {
        let mut engine = self.prepare_engine();

        let timer = T::start();
        let result = black_box(engine.scan_and_reclaim(self.budget));
        let res = timer.stop();

        debug_assert_eq!(
            result.scanned_pages_count,
            self.budget.min(self.resident_frames)
        );
        res
    }

    fn get_bench_options(&self) -> ReclaimPassBenchmarkOptions {
        ReclaimPassBenchmarkOptions {
            resident_frames: self.resident_frames,
            num_generations: self.num_generations,
            budget: self.budget,
            accessed_percent: self.accessed_percent,
        }
    }
}
