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

#[cfg(feature = "benchmarks")]
use serde::Serialize;

/// Point in time snapshot of a [`FrameAllocator`](crate::FrameAllocator).
///
/// Counters are cumulative since construction, all other fields describe the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "benchmarks", derive(Serialize))]
pub struct ReclaimStats {
    pub capacity: usize,
    pub free_frames: usize,
    pub resident_frames: usize,
    pub high_watermark: usize,
    pub low_watermark: usize,

    /// Resident frames per generation, youngest first
    pub generation_sizes: Vec<usize>,

    pub scanned: u64,
    pub evicted: u64,
    pub promoted: u64,
    pub agings: u64,

    /// Accesses to frames shortly after they were evicted
    pub refaults: u64,

    pub background_passes: u64,
    /// Passes run by `direct_reclaim`, including the ones of an allocation on an empty pool
    pub direct_reclaim_passes: u64,

    /// Passes run by `reclaim` and `proactive_reclaim`
    pub requested_passes: u64,

    /// Allocations that returned `None`
    pub failed_allocations: u64,

    pub scan_intensity: usize,
}

impl ReclaimStats {
    /// Share of the pool that is in use
    pub fn usage(&self) -> f64 {
        self.resident_frames as f64 / self.capacity as f64
    }
}
