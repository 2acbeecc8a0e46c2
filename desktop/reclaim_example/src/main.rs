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

use std::{thread, time::Duration};

use env_logger::{Builder, Env};
use log::info;
use mglru::{FrameAllocator, FrameId, MglruConfig};
use rand::{rngs::SmallRng, RngCore, SeedableRng};

const SEED: u64 = 5446535461589659585;
const CAPACITY: usize = 4096;
const WORKERS: u64 = 4;
const ROUNDS: usize = 10;
const OPERATIONS_PER_ROUND: usize = 20_000;

/// Hot frames are touched on almost every operation, everything else once
const HOT_FRAMES_PER_WORKER: usize = 128;

fn worker(allocator: &FrameAllocator, seed: u64) {
    let mut rand = SmallRng::seed_from_u64(seed);
    let mut hot: Vec<FrameId> = (0..HOT_FRAMES_PER_WORKER)
        .filter_map(|_| allocator.allocate_page())
        .collect();

    for _ in 0..OPERATIONS_PER_ROUND {
        match rand.next_u32() % 10 {
            0..=6 if !hot.is_empty() => {
                let index = rand.next_u32() as usize % hot.len();
                allocator.access_page(hot[index]);

                if !allocator.is_resident(hot[index]) {
                    if let Some(id) = allocator.allocate_page() {
                        hot[index] = id;
                    }
                }
            }
            7 | 8 => {
                if let Some(id) = allocator.allocate_page() {
                    allocator.access_page(id);
                }
            }
            _ => {
                let id = (rand.next_u32() as usize % CAPACITY) as FrameId;
                allocator.free_page(id);
            }
        }
    }

    for id in hot {
        allocator.free_page(id);
    }
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_module_path(false)
        .init();

    let allocator = match FrameAllocator::with_config(MglruConfig::new(CAPACITY, 4)) {
        Ok(allocator) => allocator,
        Err(err) => {
            log::error!("Could not create frame allocator: {}", err);
            return;
        }
    };

    let (high, low) = allocator.watermarks();
    info!("{} frames, watermarks {}/{}", allocator.capacity(), low, high);

    for round in 0..ROUNDS {
        thread::scope(|scope| {
            for worker_index in 0..WORKERS {
                let allocator = &allocator;
                let seed = SEED ^ ((round as u64) << 8 | worker_index);
                scope.spawn(move || worker(allocator, seed));
            }
        });

        // give the background thread a moment to catch up
        thread::sleep(Duration::from_millis(10));

        let stats = allocator.stats();
        info!(
            "round {}: usage={:.2} generations={:?} evicted={} refaults={} intensity={}",
            round,
            stats.usage(),
            stats.generation_sizes,
            stats.evicted,
            stats.refaults,
            stats.scan_intensity
        );
    }

    info!("final stats: {:#?}", allocator.stats());
}
