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

pub(crate) mod frame_list;

/// Returns `percent` percent of `value`, rounded down
///
/// Integer arithmetic on purpose: `percent_of(100, 90)` has to be exactly `90`.
#[inline]
pub(crate) fn percent_of(value: usize, percent: u8) -> usize {
    // u128 so large capacities don't overflow
    ((value as u128 * percent as u128) / 100) as usize
}

/// efficient way to calculate: ceil(x / y)
#[inline]
pub(crate) fn ceil_div(x: usize, y: usize) -> usize {
    (x + y - 1) / y
}
