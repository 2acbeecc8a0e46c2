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

//! Generational page-frame reclamation.
//!
//! [`ReclaimEngine`] keeps resident frames in a small number of generations and decides
//! during a scan which frames of the oldest generation get promoted and which get evicted.
//! [`FrameAllocator`] turns this into a fixed-capacity frame allocator with
//! watermark-triggered background reclaim.

mod frame;
mod frame_allocator;
mod mglru_config;
mod reclaim_engine;
mod reclaim_stats;
mod util;

#[cfg(test)]
mod test;

#[cfg(feature = "benchmarks")]
pub mod benchmarks;

pub mod modules;

pub use crate::frame::{FrameId, FrameMetadata, FramePosition};
pub use crate::frame_allocator::FrameAllocator;
pub use crate::reclaim_engine::{
    access_tracker::AccessTracker, generation::Generation, EngineCounters, ReclaimEngine,
    ReclaimResult,
};
pub use crate::reclaim_stats::ReclaimStats;
pub use mglru_config::{ConfigError, MglruConfig, MglruError, PidGains};
