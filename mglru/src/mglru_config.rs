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

use static_assertions::const_assert;
use thiserror::Error;

pub(crate) const DEFAULT_NUM_GENERATIONS: usize = 4;
pub(crate) const DEFAULT_TRACKER_WORDS: usize = 64;
pub(crate) const DEFAULT_HIGH_WATERMARK_PERCENT: u8 = 90;
pub(crate) const DEFAULT_LOW_WATERMARK_PERCENT: u8 = 70;
pub(crate) const DEFAULT_DIRECT_RECLAIM_BUDGET: usize = 10;

const_assert!(DEFAULT_TRACKER_WORDS.is_power_of_two());
const_assert!(DEFAULT_LOW_WATERMARK_PERCENT < DEFAULT_HIGH_WATERMARK_PERCENT);
const_assert!(DEFAULT_HIGH_WATERMARK_PERCENT <= 100);

/// Gains of the PID loop behind [`ScanIntensityController`](crate::modules::scan_control::ScanIntensityController)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 0.1,
            ki: 0.01,
            kd: 0.05,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MglruConfig {
    /// Number of frames in the pool, ids are `0..capacity`
    pub capacity: usize,

    pub num_generations: usize,

    /// Size of every generation's access tracker in 64 bit words (power of two)
    pub tracker_words: usize,

    /// Background reclaim starts once more than this share of the pool is in use
    pub high_watermark_percent: u8,

    /// Background reclaim stops at this share of the pool
    pub low_watermark_percent: u8,

    /// Frames scanned per pass when an allocation finds the free list empty
    pub direct_reclaim_budget: usize,

    /// How many recently evicted frames are remembered for refault detection.
    /// `None` uses a quarter of the capacity.
    pub refault_window: Option<usize>,

    /// Start the background reclaim thread
    pub background_reclaim: bool,

    pub pid: PidGains,
}

impl MglruConfig {
    pub fn new(capacity: usize, num_generations: usize) -> Self {
        Self {
            capacity,
            num_generations,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.num_generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        if !self.tracker_words.is_power_of_two() {
            return Err(ConfigError::TrackerWords(self.tracker_words));
        }
        if self.high_watermark_percent > 100
            || self.low_watermark_percent >= self.high_watermark_percent
        {
            return Err(ConfigError::Watermarks {
                low: self.low_watermark_percent,
                high: self.high_watermark_percent,
            });
        }
        if self.direct_reclaim_budget == 0 {
            return Err(ConfigError::ZeroDirectReclaimBudget);
        }
        if self.refault_window == Some(0) {
            return Err(ConfigError::ZeroRefaultWindow);
        }

        Ok(())
    }
}

impl Default for MglruConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            num_generations: DEFAULT_NUM_GENERATIONS,
            tracker_words: DEFAULT_TRACKER_WORDS,
            high_watermark_percent: DEFAULT_HIGH_WATERMARK_PERCENT,
            low_watermark_percent: DEFAULT_LOW_WATERMARK_PERCENT,
            direct_reclaim_budget: DEFAULT_DIRECT_RECLAIM_BUDGET,
            refault_window: None,
            background_reclaim: true,
            pid: PidGains::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("capacity has to be at least one frame")]
    ZeroCapacity,

    #[error("at least one generation is required")]
    ZeroGenerations,

    #[error("tracker size has to be a power of two (got {0} words)")]
    TrackerWords(usize),

    #[error("invalid watermarks: low={low}% has to be below high={high}% <= 100%")]
    Watermarks { low: u8, high: u8 },

    #[error("direct reclaim budget has to be at least one frame")]
    ZeroDirectReclaimBudget,

    #[error("refault window has to hold at least one frame")]
    ZeroRefaultWindow,
}

#[derive(Debug, Error)]
pub enum MglruError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("could not spawn the background reclaim thread: {0}")]
    SpawnReclaimThread(#[from] std::io::Error),
}
