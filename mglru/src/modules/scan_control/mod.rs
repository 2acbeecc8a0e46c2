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

mod fixed;
mod pid;

pub use fixed::FixedScanControlModule;
pub use pid::ScanIntensityController;

/// Picks the batch size of reclaim passes from the outcome of previous passes.
///
/// Implementations only give advice: they are fed with metrics after a pass and read by
/// whatever drives the next pass. They never call into the reclaim engine.
pub trait ScanControlModule {
    /// Reports the outcome of a reclaim pass.
    ///
    /// `refaults` counts evicted frames that were needed again since the previous report.
    fn update_metrics(&mut self, refaults: usize, scanned: usize, reclaimed: usize);

    /// Recommended number of frames to scan in the next pass
    fn get_scan_intensity(&self) -> usize;
}
