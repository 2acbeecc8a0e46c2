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

use core::any::type_name;

#[cfg(not(test))]
use std::io::stdout;

use log::warn;
use serde::Serialize;

mod access;
mod allocate;
mod reclaim_pass;
mod workload;

pub use access::*;
pub use allocate::*;
pub use reclaim_pass::*;
pub use workload::*;

use crate::{
    modules::scan_control::{FixedScanControlModule, ScanControlModule, ScanIntensityController},
    FrameAllocator, MglruConfig,
};

pub struct RunAllBenchmarkOptions {
    pub run_allocate_benchmarks: bool,
    pub run_access_benchmarks: bool,
    pub run_reclaim_pass_benchmarks: bool,
    pub run_workload_benchmarks: bool,
}

impl Default for RunAllBenchmarkOptions {
    fn default() -> Self {
        Self {
            run_allocate_benchmarks: false,
            run_access_benchmarks: false,
            run_reclaim_pass_benchmarks: false,
            run_workload_benchmarks: false,
        }
    }
}

impl RunAllBenchmarkOptions {
    pub fn all() -> Self {
        Self {
            run_allocate_benchmarks: true,
            run_access_benchmarks: true,
            run_reclaim_pass_benchmarks: true,
            run_workload_benchmarks: true,
        }
    }
}

#[cfg(not(test))]
const CAPACITIES: [usize; 2] = [1024, 16384];
#[cfg(test)]
const CAPACITIES: [usize; 2] = [64, 256];
const GENERATIONS: [usize; 3] = [1, 2, 4];
const RECLAIM_BUDGETS: [usize; 3] = [8, 64, 512];
const ACCESSED_PERCENT: [u8; 3] = [0, 50, 100];

const ACCESS_ITERATIONS: usize = 1000;
#[cfg(not(test))]
const WORKLOAD_ITERATIONS: usize = 10_000;
#[cfg(test)]
const WORKLOAD_ITERATIONS: usize = 1000;

/// Allocator without background reclaim, so that timings only contain the caller's work
pub(crate) fn get_bench_allocator<C: ScanControlModule + Send + 'static>(
    capacity: usize,
    num_generations: usize,
    scan_control: C,
) -> FrameAllocator<C> {
    let config = MglruConfig {
        background_reclaim: false,
        ..MglruConfig::new(capacity, num_generations)
    };

    match FrameAllocator::with_scan_control(config, scan_control) {
        Ok(allocator) => allocator,
        Err(err) => panic!("invalid benchmark configuration: {}", err),
    }
}

pub fn run_all_benchmarks<TIMER: Timer>(
    mut run_options: BenchmarkRunOptions,
    options: RunAllBenchmarkOptions,
) {
    let mut curr_iteration = 0usize;
    let mut iteration_count = 0;

    let configurations = CAPACITIES.len() * GENERATIONS.len();
    if options.run_allocate_benchmarks {
        iteration_count += 2 * configurations;
    }
    if options.run_access_benchmarks {
        iteration_count += configurations;
    }
    if options.run_reclaim_pass_benchmarks {
        iteration_count += configurations * RECLAIM_BUDGETS.len() * ACCESSED_PERCENT.len();
    }
    if options.run_workload_benchmarks {
        iteration_count += 2 * CAPACITIES.len();
    }

    fn handle_curr_iteration(curr_iteration: &mut usize, iteration_count: usize) {
        let percentage = (100 * *curr_iteration) / (iteration_count);
        print!("[{}%] ", percentage);

        *curr_iteration += 1;
    }

    for capacity in CAPACITIES {
        for num_generations in GENERATIONS {
            if options.run_allocate_benchmarks {
                handle_curr_iteration(&mut curr_iteration, iteration_count);
                AllocateBenchmark::new(capacity, num_generations, false)
                    .run_benchmark::<TIMER>(&mut run_options);

                handle_curr_iteration(&mut curr_iteration, iteration_count);
                AllocateBenchmark::new(capacity, num_generations, true)
                    .run_benchmark::<TIMER>(&mut run_options);
            }

            if options.run_access_benchmarks {
                handle_curr_iteration(&mut curr_iteration, iteration_count);
                AccessBenchmark::new(capacity, num_generations, ACCESS_ITERATIONS)
                    .run_benchmark::<TIMER>(&mut run_options);
            }

            if options.run_reclaim_pass_benchmarks {
                for budget in RECLAIM_BUDGETS {
                    for accessed_percent in ACCESSED_PERCENT {
                        handle_curr_iteration(&mut curr_iteration, iteration_count);
                        ReclaimPassBenchmark::new(
                            capacity,
                            num_generations,
                            budget,
                            accessed_percent,
                        )
                        .run_benchmark::<TIMER>(&mut run_options);
                    }
                }
            }
        }

        if options.run_workload_benchmarks {
            let hot_frames = capacity / 4;

            handle_curr_iteration(&mut curr_iteration, iteration_count);
            HotColdWorkloadBenchmark::new(
                capacity,
                hot_frames,
                WORKLOAD_ITERATIONS,
                ScanIntensityController::default(),
            )
            .run_benchmark::<TIMER>(&mut run_options);

            handle_curr_iteration(&mut curr_iteration, iteration_count);
            HotColdWorkloadBenchmark::new(
                capacity,
                hot_frames,
                WORKLOAD_ITERATIONS,
                FixedScanControlModule::new(32),
            )
            .run_benchmark::<TIMER>(&mut run_options);
        }
    }
}

#[cfg(not(test))]
fn print_json<V: Serialize>(value: &V) {
    if let Err(err) = serde_json::to_writer(stdout(), value) {
        warn!("Could not serialize benchmark output: {}", err);
    }
}

#[cfg(test)]
fn print_json<V: Serialize>(value: &V) {
    if let Err(err) = serde_json::to_string(value) {
        warn!("Could not serialize benchmark output: {}", err);
    }
}

pub trait Benchmark<O: Serialize> {
    fn get_name(&self) -> &'static str;

    fn get_bench_options(&self) -> O;

    fn execute<T: Timer>(&mut self) -> u32;

    #[inline(never)]
    fn run_benchmark<T: Timer>(mut self, options: &mut BenchmarkRunOptions) -> BenchmarkRunResult
    where
        Self: Sized,
    {
        assert_eq!(options.repetitions as usize, options.result_buffer.len());

        print!("Running Benchmark \"{}\" with options ", self.get_name());
        print_json(&self.get_bench_options());
        println!();

        for _ in 0..options.cold_start {
            self.execute::<T>();
        }

        for i in 0..options.result_buffer.len() {
            let res = self.execute::<T>();
            options.result_buffer[i] = res;
        }

        print!("[BENCH-INFO] ");
        let run_info = BenchmarkRunInfo {
            bench_name: self.get_name(),
            bench_options: &self.get_bench_options(),
            machine_name: options.machine_name,
            cold_start: options.cold_start,
            repetitions: options.repetitions,
            ticks_per_ms: T::get_ticks_per_ms(),
            data: &options.result_buffer,
        };
        print_json(&run_info);
        println!();

        let res = BenchmarkRunResult::from_buffer(&options.result_buffer);
        println!(
            "-> Finished {}: mean={}, min={}, max={}",
            self.get_name(),
            res.mean_latency,
            res.min_latency,
            res.max_latency
        );
        println!();

        res
    }
}

pub struct BenchmarkRunOptions<'a> {
    pub repetitions: u32,
    pub result_buffer: &'a mut [u32],
    pub cold_start: u32,
    pub machine_name: &'static str,
}

/// Allocator setup shared by all benchmark options
#[derive(Serialize)]
pub struct AllocatorOptions {
    capacity: usize,
    num_generations: usize,
    scan_control: &'static str,
}

impl AllocatorOptions {
    pub fn new<C: ScanControlModule>(capacity: usize, num_generations: usize) -> Self {
        Self {
            capacity,
            num_generations,
            scan_control: type_name::<C>(),
        }
    }
}

#[derive(Serialize)]
pub struct BenchmarkRunInfo<'a, O: Serialize> {
    bench_name: &'static str,
    bench_options: &'a O,
    machine_name: &'static str,
    cold_start: u32,
    repetitions: u32,
    ticks_per_ms: u32,
    data: &'a [u32],
}

#[derive(Debug, PartialEq, Eq)]
pub struct BenchmarkRunResult {
    pub mean_latency: u32,
    pub min_latency: u32,
    pub max_latency: u32,
}

impl BenchmarkRunResult {
    fn from_buffer(buffer: &[u32]) -> Self {
        if buffer.is_empty() {
            return Self {
                mean_latency: 0,
                min_latency: 0,
                max_latency: 0,
            };
        }

        let sum: u64 = buffer.iter().map(|x| *x as u64).sum();
        Self {
            mean_latency: (sum / buffer.len() as u64) as u32,
            min_latency: buffer.iter().min().copied().unwrap_or(0),
            max_latency: buffer.iter().max().copied().unwrap_or(0),
        }
    }
}

pub trait Timer {
    fn get_ticks_per_ms() -> u32;
    fn start() -> Self;
    fn stop(self) -> u32;
}

#[cfg(test)]
mod test {
    use super::BenchmarkRunResult;

    #[test]
    fn test_run_result_from_buffer() {
        let res = BenchmarkRunResult::from_buffer(&[4, 1, u32::MAX, 3]);
        assert_eq!(res.min_latency, 1);
        assert_eq!(res.max_latency, u32::MAX);
        assert_eq!(res.mean_latency, ((u32::MAX as u64 + 8) / 4) as u32);

        assert_eq!(
            BenchmarkRunResult::from_buffer(&[]),
            BenchmarkRunResult {
                mean_latency: 0,
                min_latency: 0,
                max_latency: 0
            }
        );
    }
}
