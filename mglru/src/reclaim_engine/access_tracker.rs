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

use core::sync::atomic::{AtomicU64, Ordering};

use crate::frame::FrameId;

const BITS_PER_WORD: u32 = u64::BITS;

/// Approximate "was this frame touched" bitmap.
///
/// Frame `id` maps to bit `id % 64` of word `(id / 64) % words`. Distinct frames can share a
/// bit, so a set bit may be a false positive. An unset bit is never caused by aliasing.
pub struct AccessTracker {
    words: Box<[AtomicU64]>,
    word_mask: usize,
}

impl AccessTracker {
    /// Creates a tracker with `words` 64 bit words.
    ///
    /// ### Panics
    ///
    /// If `words` is not a power of two.
    pub fn new(words: usize) -> Self {
        assert!(
            words.is_power_of_two(),
            "tracker size has to be a power of two (got {})",
            words
        );

        Self {
            words: (0..words).map(|_| AtomicU64::new(0)).collect(),
            word_mask: words - 1,
        }
    }

    #[inline]
    fn locate(&self, id: FrameId) -> (&AtomicU64, u64) {
        let word = ((id / BITS_PER_WORD as u64) as usize) & self.word_mask;
        let bit = 1u64 << (id % BITS_PER_WORD as u64);

        (&self.words[word], bit)
    }

    /// Marks `id` as accessed
    #[inline]
    pub fn set(&self, id: FrameId) {
        let (word, bit) = self.locate(id);
        word.fetch_or(bit, Ordering::Relaxed);
    }

    /// Clears the bit of `id` and returns whether it was set
    #[inline]
    pub fn check_and_clear(&self, id: FrameId) -> bool {
        let (word, bit) = self.locate(id);
        word.fetch_and(!bit, Ordering::AcqRel) & bit != 0
    }

    /// Returns whether the bit of `id` is set without clearing it
    #[inline]
    pub fn is_set(&self, id: FrameId) -> bool {
        let (word, bit) = self.locate(id);
        word.load(Ordering::Acquire) & bit != 0
    }

    /// Clears every bit
    pub fn clear(&self) {
        for word in self.words.iter() {
            word.store(0, Ordering::Release);
        }
    }

    /// Number of 64 bit words of this tracker
    #[inline]
    pub fn words(&self) -> usize {
        self.words.len()
    }
}
