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

use crate::{FrameAllocator, MglruConfig};

mod concurrent;

pub(crate) fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn get_test_allocator(capacity: usize, num_generations: usize) -> FrameAllocator {
    init_test_logger();

    FrameAllocator::with_config(MglruConfig::new(capacity, num_generations)).unwrap()
}
