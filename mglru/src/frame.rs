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

use static_assertions::assert_eq_size;

/// Identifies one frame of the fixed frame pool
pub type FrameId = u64;

/// Stable handle into the page sequence of a [`Generation`](crate::Generation).
///
/// A position stays valid until the frame it points to is removed from that generation,
/// no matter what else gets inserted or removed in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramePosition {
    pub(crate) slot: u32,
    pub(crate) stamp: u32,
}

assert_eq_size!(FramePosition, u64);

/// Bookkeeping of one resident frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetadata {
    pub id: FrameId,

    /// Index of the generation that currently holds this frame
    pub generation_index: usize,

    /// Position of this frame inside of that generation
    pub position: FramePosition,
}
