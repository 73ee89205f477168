//! Timing and memory instrumentation for both resize paths.

pub mod benchmark;
pub mod performance_analysis;

pub use benchmark::{
    BenchmarkSuite, BenchmarkSummary, GPU_UNAVAILABLE, Method, MethodResult, Scenario, gradient,
    generate_report, report_json, run_benchmark_suite, standard_scenarios,
};
pub use performance_analysis::{PerformanceMetric, estimate_gpu_memory, measure};
