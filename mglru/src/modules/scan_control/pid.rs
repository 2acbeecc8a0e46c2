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

use crate::mglru_config::PidGains;

use super::ScanControlModule;

const BASE_INTENSITY: usize = 32;
const MIN_INTENSITY: usize = 1;
const MAX_INTENSITY: usize = 1024;
const OUTPUT_SCALE: f64 = 10.0;

/// Bounds the integral term against windup
const INTEGRAL_LIMIT: f64 = 100.0;

/// Discrete PID loop over the refault ratio (`refaults / reclaimed`).
///
/// The recommended intensity is `32 + max(0, 10 * output)`, clamped to `[1, 1024]`.
pub struct ScanIntensityController {
    gains: PidGains,
    error: f64,
    integral: f64,
    derivative: f64,
}

impl ScanIntensityController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            error: 0.0,
            integral: 0.0,
            derivative: 0.0,
        }
    }

    fn output(&self) -> f64 {
        self.gains.kp * self.error + self.gains.ki * self.integral + self.gains.kd * self.derivative
    }
}

impl Default for ScanIntensityController {
    fn default() -> Self {
        Self::new(PidGains::default())
    }
}

impl ScanControlModule for ScanIntensityController {
    fn update_metrics(&mut self, refaults: usize, _scanned: usize, reclaimed: usize) {
        // TODO: weigh in the scan efficiency (reclaimed / scanned) and tune it with hot_cold_workload
        let error = if reclaimed > 0 {
            refaults as f64 / reclaimed as f64
        } else {
            0.0
        };

        self.integral = (self.integral + error).clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);
        self.derivative = error - self.error;
        self.error = error;
    }

    fn get_scan_intensity(&self) -> usize {
        let adjustment = (self.output() * OUTPUT_SCALE).max(0.0);

        // float to int casts saturate
        BASE_INTENSITY
            .saturating_add(adjustment as usize)
            .clamp(MIN_INTENSITY, MAX_INTENSITY)
    }
}

#[cfg(test)]
mod test {
    use crate::mglru_config::PidGains;

    use super::{ScanControlModule, ScanIntensityController};

    #[test]
    fn test_initial_intensity() {
        let controller = ScanIntensityController::default();
        assert_eq!(controller.get_scan_intensity(), 32);
    }

    #[test]
    fn test_lower_refault_ratio_lowers_intensity() {
        let mut controller = ScanIntensityController::default();

        controller.update_metrics(10, 100, 5);
        let first = controller.get_scan_intensity();
        assert!((1..=1024).contains(&first));
        // error = 2, integral = 2, derivative = 2 -> output 0.32
        assert_eq!(first, 35);

        controller.update_metrics(0, 100, 50);
        let second = controller.get_scan_intensity();
        assert!((1..=1024).contains(&second));
        assert!(second <= first);
        assert_eq!(second, 32);
    }

    #[test]
    fn test_nothing_reclaimed_is_zero_error() {
        let mut controller = ScanIntensityController::default();
        controller.update_metrics(50, 100, 0);
        assert_eq!(controller.get_scan_intensity(), 32);
    }

    #[test]
    fn test_intensity_is_clamped() {
        let mut controller = ScanIntensityController::new(PidGains {
            kp: 1000.0,
            ki: 0.0,
            kd: 0.0,
        });

        controller.update_metrics(1000, 1000, 1);
        assert_eq!(controller.get_scan_intensity(), 1024);

        let mut controller = ScanIntensityController::new(PidGains {
            kp: -1000.0,
            ki: 0.0,
            kd: 0.0,
        });
        controller.update_metrics(1000, 1000, 1);
        assert_eq!(controller.get_scan_intensity(), 32);
    }

    #[test]
    fn test_integral_windup_is_bounded() {
        let mut controller = ScanIntensityController::new(PidGains {
            kp: 0.0,
            ki: 1.0,
            kd: 0.0,
        });

        for _ in 0..1000 {
            controller.update_metrics(10, 10, 1);
        }
        // integral capped at 100 -> 32 + 1000
        assert_eq!(controller.get_scan_intensity(), 1024);

        let mut controller = ScanIntensityController::new(PidGains {
            kp: 0.0,
            ki: 0.1,
            kd: 0.0,
        });
        for _ in 0..1000 {
            controller.update_metrics(10, 10, 1);
        }
        assert_eq!(controller.get_scan_intensity(), 32 + 100);
    }
}
