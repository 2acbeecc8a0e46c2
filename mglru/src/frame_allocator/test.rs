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

use std::{collections::HashSet, sync::Arc};

use parking_lot::Mutex;
use rand::{rngs::SmallRng, RngCore, SeedableRng};

use crate::{
    modules::scan_control::{FixedScanControlModule, ScanControlModule},
    ConfigError, FrameAllocator, FrameId, MglruConfig, MglruError,
};

fn test_config(capacity: usize, num_generations: usize) -> MglruConfig {
    MglruConfig {
        background_reclaim: false,
        ..MglruConfig::new(capacity, num_generations)
    }
}

fn get_test_allocator(capacity: usize, num_generations: usize) -> FrameAllocator {
    FrameAllocator::with_config(test_config(capacity, num_generations)).unwrap()
}

/// Keeps every report so tests can look at what the allocator fed in
#[derive(Clone, Default)]
struct RecordingScanControl {
    reports: Arc<Mutex<Vec<(usize, usize, usize)>>>,
}

impl ScanControlModule for RecordingScanControl {
    fn update_metrics(&mut self, refaults: usize, scanned: usize, reclaimed: usize) {
        self.reports.lock().push((refaults, scanned, reclaimed));
    }

    fn get_scan_intensity(&self) -> usize {
        1
    }
}

#[test]
fn test_allocate_hands_out_every_frame_once() {
    let allocator = get_test_allocator(16, 4);

    let ids: HashSet<FrameId> = (0..16).map(|_| allocator.allocate_page().unwrap()).collect();
    assert_eq!(ids, (0..16).collect());
    assert_eq!(allocator.get_memory_usage(), 1.0);

    allocator.check_invariants();
}

#[test]
fn test_allocation_fails_if_nothing_can_be_reclaimed() {
    let allocator = get_test_allocator(4, 1);

    for _ in 0..4 {
        allocator.allocate_page().unwrap();
    }
    for id in 0..4 {
        allocator.access_page(id);
    }

    // every frame was accessed, the only pass promotes all of them in place
    assert_eq!(allocator.allocate_page(), None);
    assert_eq!(allocator.stats().failed_allocations, 1);

    // the scan above cleared the access bits
    assert!(allocator.allocate_page().is_some());
    allocator.check_invariants();
}

#[test]
fn test_direct_reclaim_ages_before_giving_up() {
    let allocator = get_test_allocator(8, 4);
    for _ in 0..8 {
        allocator.allocate_page().unwrap();
    }

    assert_eq!(allocator.direct_reclaim(10), 8);

    let stats = allocator.stats();
    // three agings before the scan, one refill after it
    assert_eq!(stats.agings, 4);
    assert_eq!(stats.direct_reclaim_passes, 4);
    assert_eq!(stats.free_frames, 8);
}

#[test]
fn test_exhausted_pool_reclaims_on_allocation() {
    let allocator = get_test_allocator(8, 4);
    for _ in 0..8 {
        allocator.allocate_page().unwrap();
    }

    let id = allocator.allocate_page().unwrap();
    assert!(id < 8);
    assert!(allocator.is_resident(id));
    allocator.check_invariants();
}

#[test]
fn test_no_double_allocation() {
    const SEED: u64 = 1652354862846358452;
    const CAPACITY: usize = 64;

    let allocator = get_test_allocator(CAPACITY, 4);
    let mut rand = SmallRng::seed_from_u64(SEED);
    let mut held: Vec<FrameId> = Vec::new();

    for i in 0..10_000 {
        match rand.next_u32() % 3 {
            0 if held.len() < CAPACITY => {
                let id = allocator.allocate_page().unwrap();
                assert!(!held.contains(&id), "frame {} handed out twice", id);
                held.push(id);
            }
            1 if !held.is_empty() => {
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

        if i % 100 == 0 {
            allocator.check_invariants();
        }
    }

    let stats = allocator.stats();
    assert_eq!(stats.resident_frames, held.len());
    assert_eq!(stats.free_frames + stats.resident_frames, CAPACITY);
}

#[test]
fn test_conservation_under_pressure() {
    const SEED: u64 = 8746513548735188785;
    const CAPACITY: usize = 32;

    let allocator = get_test_allocator(CAPACITY, 3);
    let mut rand = SmallRng::seed_from_u64(SEED);

    for _ in 0..2000 {
        if let Some(id) = allocator.allocate_page() {
            assert!(allocator.is_resident(id));
        }

        let id = (rand.next_u32() as usize % CAPACITY) as FrameId;
        if rand.next_u32() % 4 == 0 {
            allocator.free_page(id);
        } else {
            allocator.access_page(id);
        }

        allocator.check_invariants();
    }
}

#[test]
fn test_free_of_evicted_frame_is_ignored() {
    let allocator = get_test_allocator(4, 1);
    for _ in 0..4 {
        allocator.allocate_page().unwrap();
    }

    assert_eq!(allocator.reclaim(4).evicted_pages, vec![0, 1, 2, 3]);

    allocator.free_page(0);
    allocator.free_page(0);
    allocator.free_page(1000);

    let stats = allocator.stats();
    assert_eq!(stats.free_frames, 4);
    assert_eq!(stats.resident_frames, 0);
    allocator.check_invariants();
}

#[test]
fn test_freed_frame_is_reused() {
    let allocator = get_test_allocator(2, 2);
    let first = allocator.allocate_page().unwrap();
    let second = allocator.allocate_page().unwrap();

    allocator.free_page(first);
    assert!(!allocator.is_resident(first));
    assert_eq!(allocator.get_memory_usage(), 0.5);

    assert_eq!(allocator.allocate_page(), Some(first));
    assert!(allocator.is_resident(second));
}

#[test]
fn test_refaults_are_counted() {
    let allocator = FrameAllocator::with_config(MglruConfig {
        refault_window: Some(4),
        ..test_config(4, 1)
    })
    .unwrap();

    for _ in 0..4 {
        allocator.allocate_page().unwrap();
    }
    allocator.reclaim(4);

    allocator.access_page(0);
    allocator.access_page(1);
    // already counted
    allocator.access_page(0);
    assert_eq!(allocator.stats().refaults, 2);

    assert_eq!(allocator.allocate_page(), Some(0));
    assert_eq!(allocator.allocate_page(), Some(1));
    assert_eq!(allocator.allocate_page(), Some(2));

    // 2 is resident again, 3 is still in the window
    allocator.access_page(2);
    allocator.access_page(3);
    assert_eq!(allocator.stats().refaults, 3);
}

#[test]
fn test_refaults_are_reported_to_scan_control() {
    let scan_control = RecordingScanControl::default();
    let config = MglruConfig {
        refault_window: Some(4),
        ..test_config(4, 1)
    };
    let allocator = FrameAllocator::with_scan_control(config, scan_control.clone()).unwrap();

    for _ in 0..4 {
        allocator.allocate_page().unwrap();
    }

    assert_eq!(allocator.reclaim(2).evicted_pages, vec![0, 1]);
    allocator.access_page(0);
    assert_eq!(allocator.reclaim(2).evicted_pages, vec![2, 3]);

    // nothing left to scan, not reported
    allocator.reclaim(2);

    assert_eq!(
        *scan_control.reports.lock(),
        vec![(0, 2, 2), (1, 2, 2)]
    );
}

#[test]
fn test_default_refault_window_keeps_last_evictions() {
    // ceil(4 / 4) = 1 entry
    let allocator = get_test_allocator(4, 1);
    for _ in 0..4 {
        allocator.allocate_page().unwrap();
    }

    // 1 is evicted last and pushes 0 out of the window
    assert_eq!(allocator.reclaim(2).evicted_pages, vec![0, 1]);
    allocator.access_page(0);
    assert_eq!(allocator.stats().refaults, 0);

    allocator.access_page(1);
    assert_eq!(allocator.stats().refaults, 1);

    assert_eq!(allocator.reclaim(2).evicted_pages, vec![2, 3]);
    allocator.access_page(2);
    assert_eq!(allocator.stats().refaults, 1);
    allocator.access_page(3);
    assert_eq!(allocator.stats().refaults, 2);
}

#[test]
fn test_requested_passes_are_counted_apart_from_direct_reclaim() {
    let allocator =
        FrameAllocator::with_scan_control(test_config(8, 1), FixedScanControlModule::new(2))
            .unwrap();
    for _ in 0..8 {
        allocator.allocate_page().unwrap();
    }

    allocator.reclaim(2);
    allocator.proactive_reclaim();
    let stats = allocator.stats();
    assert_eq!(stats.requested_passes, 2);
    assert_eq!(stats.direct_reclaim_passes, 0);

    // pool is not empty, only the explicit direct path counts
    allocator.direct_reclaim(2);
    let stats = allocator.stats();
    assert_eq!(stats.requested_passes, 2);
    assert_eq!(stats.direct_reclaim_passes, 1);
    assert_eq!(stats.background_passes, 0);
}

#[test]
fn test_proactive_reclaim_uses_scan_intensity() {
    let allocator =
        FrameAllocator::with_scan_control(test_config(10, 1), FixedScanControlModule::new(3))
            .unwrap();

    for _ in 0..10 {
        allocator.allocate_page().unwrap();
    }

    assert_eq!(allocator.scan_intensity(), 3);
    assert_eq!(allocator.proactive_reclaim(), 3);
    assert_eq!(allocator.get_memory_usage(), 0.7);
}

#[test]
fn test_hot_frames_survive_reclaim_rounds() {
    let allocator = get_test_allocator(100, 4);
    for _ in 0..95 {
        allocator.allocate_page().unwrap();
    }

    for _ in 0..10 {
        for id in 0..20 {
            allocator.access_page(id);
        }
        allocator.reclaim(10);
    }

    for id in 0..20 {
        assert!(allocator.is_resident(id), "hot frame {} was evicted", id);
    }

    // three rounds age, two promote the hot frames, five evict
    let stats = allocator.stats();
    assert_eq!(stats.evicted, 50);
    assert!((20..95).any(|id| !allocator.is_resident(id)));
    assert!(stats.resident_frames <= stats.high_watermark);
    assert_eq!(allocator.get_memory_usage(), 0.45);
    allocator.check_invariants();
}

#[test]
fn test_watermarks() {
    assert_eq!(get_test_allocator(100, 4).watermarks(), (90, 70));
    assert_eq!(get_test_allocator(10, 4).watermarks(), (9, 7));
    assert_eq!(get_test_allocator(1, 4).watermarks(), (0, 0));
}

#[test]
fn test_stats_snapshot() {
    let allocator = get_test_allocator(10, 2);
    for _ in 0..4 {
        allocator.allocate_page().unwrap();
    }

    let stats = allocator.stats();
    assert_eq!(stats.capacity, 10);
    assert_eq!(stats.free_frames, 6);
    assert_eq!(stats.resident_frames, 4);
    assert_eq!(stats.generation_sizes, vec![4, 0]);
    assert_eq!(stats.scan_intensity, 32);
    assert_eq!(stats.usage(), 0.4);
}

#[test]
fn test_invalid_config_is_rejected() {
    assert!(matches!(
        FrameAllocator::with_config(test_config(0, 4)),
        Err(MglruError::InvalidConfig(ConfigError::ZeroCapacity))
    ));
    assert!(matches!(
        FrameAllocator::with_config(test_config(10, 0)),
        Err(MglruError::InvalidConfig(ConfigError::ZeroGenerations))
    ));
}

#[test]
#[should_panic]
fn test_new_panics_without_generations() {
    FrameAllocator::new(10, 0);
}
