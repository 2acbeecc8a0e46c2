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

use std::thread;

use rand::{rngs::SmallRng, RngCore, SeedableRng};

use crate::FrameId;

use super::get_test_allocator;

#[test]
fn test_concurrent_allocate_access_free() {
    const SEED: u64 = 3548712496305128847;
    const CAPACITY: usize = 256;
    const THREADS: u64 = 4;
    const OPERATIONS: usize = 5000;

    let allocator = get_test_allocator(CAPACITY, 4);

    thread::scope(|scope| {
        for thread_index in 0..THREADS {
            let allocator = &allocator;

            scope.spawn(move || {
                let mut rand = SmallRng::seed_from_u64(SEED + thread_index);
                let mut held: Vec<FrameId> = Vec::new();

                for _ in 0..OPERATIONS {
                    match rand.next_u32() % 4 {
                        0 | 1 => {
                            if let Some(id) = allocator.allocate_page() {
                                held.push(id);
                            }
                        }
                        2 if !held.is_empty() => {
                            // may have been reclaimed in the meantime
                            let index = rand.next_u32() as usize % held.len();
                            allocator.free_page(held.swap_remove(index));
                        }
                        _ => {
                            if !held.is_empty() {
                                let index = rand.next_u32() as usize % held.len();
                                allocator.access_page(held[index]);
                            }
                        }
                    }

                    let usage = allocator.get_memory_usage();
                    assert!((0.0..=1.0).contains(&usage));
                }
            });
        }
    });

    allocator.check_invariants();

    let stats = allocator.stats();
    assert_eq!(stats.free_frames + stats.resident_frames, CAPACITY);
    assert_eq!(
        stats.generation_sizes.iter().sum::<usize>(),
        stats.resident_frames
    );
}

#[test]
fn test_reclaimed_frames_are_never_resident_twice() {
    const CAPACITY: usize = 64;

    let allocator = get_test_allocator(CAPACITY, 2);

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..2000 {
                    if let Some(id) = allocator.allocate_page() {
                        assert!(id < CAPACITY as FrameId);
                        allocator.access_page(id);
                    }
                }
            });
        }

        scope.spawn(|| {
            for _ in 0..200 {
                allocator.proactive_reclaim();
            }
        });
    });

    allocator.check_invariants();
}
