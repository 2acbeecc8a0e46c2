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

use super::ScanControlModule;

/// Always recommends the same batch size
pub struct FixedScanControlModule {
    intensity: usize,
}

impl FixedScanControlModule {
    pub fn new(intensity: usize) -> Self {
        Self {
            intensity: intensity.max(1),
        }
    }
}

impl ScanControlModule for FixedScanControlModule {
    fn update_metrics(&mut self, _refaults: usize, _scanned: usize, _reclaimed: usize) {}

    #[inline]
    fn get_scan_intensity(&self) -> usize {
        self.intensity
    }
}
