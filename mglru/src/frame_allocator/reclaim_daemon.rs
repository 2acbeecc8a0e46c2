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

use std::sync::Arc;

use log::{debug, info};
use parking_lot::MutexGuard;

use crate::modules::scan_control::ScanControlModule;

use super::{ReclaimTrigger, Shared};

/// Body of the background reclaim thread.
///
/// Sleeps until more than the high watermark is in use, then reclaims down to the low
/// watermark. Returns once `stop` is set.
pub(super) fn reclaim_loop<C: ScanControlModule>(shared: Arc<Shared<C>>) {
    info!("Background reclaim started");

    let mut state = shared.state.lock();
    loop {
        shared.wakeup.wait_while(&mut state, |state| {
            !state.stop && state.used() <= shared.high_watermark
        });

        if state.stop {
            break;
        }

        // once woken, keep going until usage is back at the low watermark
        while !state.stop && state.used() > shared.low_watermark {
            let used = state.used();
            let target = used - shared.low_watermark;
            debug!("Usage at {} frame(s), reclaiming {}", used, target);

            state.reclaim_pass(target, ReclaimTrigger::Background);

            // give waiting callers the lock between two passes
            MutexGuard::bump(&mut state);
        }
    }

    info!("Background reclaim stopped");
}
