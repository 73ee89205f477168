//! GPU vs CPU benchmark suites over fixed scenarios.
//!
//! Each scenario resizes a synthetic gradient with both methods, end to end
//! including encoding, and averages the wall-clock time. When no GPU context
//! can be acquired the GPU entry reports zero duration and a `GpuUnavailable`
//! marker, so every suite has the same shape.

use std::fmt;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use resize_scale::plan::Size;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::performance_analysis::ms;
use crate::cpu::resize_cpu;
use crate::encode::EncodedImage;
use crate::error::ResizeResult;
use crate::gpu::{ContextProvider, resize_gpu};
use crate::request::ResizeRequest;
use crate::source::SourceImage;

/// Marker stored in place of GPU results when no context exists.
pub const GPU_UNAVAILABLE: &str = "GpuUnavailable";

/// One benchmark case.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: &'static str,
    pub source: Size,
    pub request: ResizeRequest,
}

/// The five standard scenarios.
pub fn standard_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "small downscale",
            source: Size::new(800, 600),
            request: ResizeRequest::exact(400, 300).with_aspect_ratio(true),
        },
        Scenario {
            name: "large downscale",
            source: Size::new(3840, 2160),
            request: ResizeRequest::exact(1920, 1080).with_aspect_ratio(true),
        },
        Scenario {
            name: "upscale",
            source: Size::new(256, 256),
            request: ResizeRequest::exact(512, 512).with_aspect_ratio(true),
        },
        Scenario {
            name: "extreme downscale",
            source: Size::new(4000, 3000),
            request: ResizeRequest::exact(100, 75).with_aspect_ratio(true),
        },
        Scenario {
            name: "aspect-ratio change",
            source: Size::new(1920, 1080),
            request: ResizeRequest::exact(1080, 1080),
        },
    ]
}

/// Horizontal red ramp, vertical green ramp, constant blue.
pub fn gradient(size: Size) -> SourceImage {
    let (w, h) = (size.w.max(1), size.h.max(1));
    let span = |n: u32| (n - 1).max(1);
    let pixels = RgbaImage::from_fn(w, h, |x, y| {
        Rgba([(x * 255 / span(w)) as u8, (y * 255 / span(h)) as u8, 128, 255])
    });
    SourceImage::from_nonempty(pixels)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Gpu,
    Cpu,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Gpu => write!(f, "gpu"),
            Method::Cpu => write!(f, "cpu"),
        }
    }
}

/// Timings of one method in one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodResult {
    pub method: Method,
    pub durations: Vec<Duration>,
    pub average: Duration,
    /// Output dimensions of the last successful run.
    pub output: Option<Size>,
    /// [`GPU_UNAVAILABLE`] or the failure message; timings are zero then.
    pub error: Option<String>,
}

impl MethodResult {
    fn failed(method: Method, error: impl Into<String>) -> Self {
        Self {
            method,
            durations: Vec::new(),
            average: Duration::ZERO,
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSummary {
    pub gpu_average: Duration,
    pub cpu_average: Duration,
    /// `(cpu - gpu) / cpu * 100`; 0 when either side has no timing.
    pub improvement_percent: f64,
    pub webgpu_supported: bool,
}

/// Result of one scenario: one entry per method plus the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSuite {
    pub scenario: String,
    pub source: Size,
    pub results: Vec<MethodResult>,
    pub summary: BenchmarkSummary,
}

impl BenchmarkSuite {
    pub fn result(&self, method: Method) -> Option<&MethodResult> {
        self.results.iter().find(|r| r.method == method)
    }

    pub fn to_json(&self) -> Value {
        let results: Vec<Value> = self
            .results
            .iter()
            .map(|r| {
                json!({
                    "method": r.method.to_string(),
                    "iterations": r.durations.len(),
                    "average_ms": ms(r.average),
                    "durations_ms": r.durations.iter().map(|d| ms(*d)).collect::<Vec<_>>(),
                    "output": r.output.map(|s| json!({ "width": s.w, "height": s.h })),
                    "error": r.error,
                })
            })
            .collect();
        json!({
            "scenario": self.scenario,
            "source": { "width": self.source.w, "height": self.source.h },
            "results": results,
            "summary": {
                "gpu_average_ms": ms(self.summary.gpu_average),
                "cpu_average_ms": ms(self.summary.cpu_average),
                "improvement_percent": self.summary.improvement_percent,
                "webgpu_supported": self.summary.webgpu_supported,
            },
        })
    }
}

fn improvement(gpu: Duration, cpu: Duration) -> f64 {
    if gpu.is_zero() || cpu.is_zero() {
        return 0.0;
    }
    (cpu.as_secs_f64() - gpu.as_secs_f64()) / cpu.as_secs_f64() * 100.0
}

fn average(durations: &[Duration]) -> Duration {
    if durations.is_empty() {
        return Duration::ZERO;
    }
    durations.iter().sum::<Duration>() / durations.len() as u32
}

async fn time_method<F, Fut>(method: Method, iterations: u32, mut run: F) -> MethodResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ResizeResult<EncodedImage>>,
{
    let mut durations = Vec::with_capacity(iterations as usize);
    let mut output = None;
    for _ in 0..iterations {
        let started = Instant::now();
        match run().await {
            Ok(encoded) => {
                durations.push(started.elapsed());
                output = Some(Size::new(encoded.width(), encoded.height()));
            }
            Err(e) => {
                warn!(%method, error = %e, "benchmark run failed");
                return MethodResult::failed(method, e.to_string());
            }
        }
    }
    MethodResult {
        method,
        average: average(&durations),
        durations,
        output,
        error: None,
    }
}

/// Run `scenarios` with `iterations` timed runs per method.
pub async fn run_benchmark_suite(
    contexts: &ContextProvider,
    scenarios: &[Scenario],
    iterations: u32,
) -> Vec<BenchmarkSuite> {
    let webgpu_supported = contexts.acquire().await.is_some();
    let mut suites = Vec::with_capacity(scenarios.len());

    for scenario in scenarios {
        let source = gradient(scenario.source);

        let gpu = if webgpu_supported {
            time_method(Method::Gpu, iterations, || resize_gpu(contexts, &source, &scenario.request)).await
        } else {
            MethodResult::failed(Method::Gpu, GPU_UNAVAILABLE)
        };
        let cpu = time_method(Method::Cpu, iterations, || resize_cpu(&source, &scenario.request)).await;

        let summary = BenchmarkSummary {
            gpu_average: gpu.average,
            cpu_average: cpu.average,
            improvement_percent: improvement(gpu.average, cpu.average),
            webgpu_supported,
        };
        info!(
            scenario = scenario.name,
            gpu_ms = ms(summary.gpu_average),
            cpu_ms = ms(summary.cpu_average),
            improvement = summary.improvement_percent,
            "benchmark scenario finished"
        );
        suites.push(BenchmarkSuite {
            scenario: scenario.name.to_string(),
            source: scenario.source,
            results: vec![gpu, cpu],
            summary,
        });
    }
    suites
}

/// Text report over all suites.
pub fn generate_report(suites: &[BenchmarkSuite]) -> String {
    let mut report = String::from("GPU vs CPU Resize Benchmark\n═══════════════════════════════════\n");
    let supported = suites.first().is_some_and(|s| s.summary.webgpu_supported);
    report.push_str(&format!(
        "GPU: {}\n",
        if supported { "available" } else { "unavailable (CPU only)" }
    ));

    for suite in suites {
        report.push_str(&format!("\n{} ({})\n", suite.scenario, suite.source));
        report.push_str("───────────────────────────\n");
        for result in &suite.results {
            match &result.error {
                None => report.push_str(&format!(
                    "• {}: {:.2} ms avg over {} runs -> {}\n",
                    result.method,
                    ms(result.average),
                    result.durations.len(),
                    result.output.map(|s| s.to_string()).unwrap_or_default(),
                )),
                Some(error) => report.push_str(&format!("• {}: {}\n", result.method, error)),
            }
        }
        report.push_str(&format!(
            "• Improvement: {:.1}%\n",
            suite.summary.improvement_percent
        ));
    }
    report
}

/// JSON array with one object per suite.
pub fn report_json(suites: &[BenchmarkSuite]) -> Value {
    Value::Array(suites.iter().map(BenchmarkSuite::to_json).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scenarios() {
        let scenarios = standard_scenarios();
        let names: Vec<_> = scenarios.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            [
                "small downscale",
                "large downscale",
                "upscale",
                "extreme downscale",
                "aspect-ratio change"
            ]
        );
        for scenario in &scenarios {
            assert!(scenario.request.resolve(scenario.source).is_ok());
        }
        assert!(!scenarios[4].request.preserve_aspect_ratio);
    }

    #[test]
    fn test_improvement() {
        let gpu = Duration::from_millis(25);
        let cpu = Duration::from_millis(100);
        assert!((improvement(gpu, cpu) - 75.0).abs() < 1e-9);
        assert_eq!(improvement(Duration::ZERO, cpu), 0.0);
    }

    #[test]
    fn test_gradient_corners() {
        let source = gradient(Size::new(4, 3));
        assert_eq!(source.pixels().get_pixel(0, 0), &Rgba([0, 0, 128, 255]));
        assert_eq!(source.pixels().get_pixel(3, 2), &Rgba([255, 255, 128, 255]));
    }

    #[test]
    fn test_report_marks_unavailable_gpu() {
        let suite = BenchmarkSuite {
            scenario: "upscale".into(),
            source: Size::new(256, 256),
            results: vec![
                MethodResult::failed(Method::Gpu, GPU_UNAVAILABLE),
                MethodResult {
                    method: Method::Cpu,
                    durations: vec![Duration::from_millis(4)],
                    average: Duration::from_millis(4),
                    output: Some(Size::new(512, 512)),
                    error: None,
                },
            ],
            summary: BenchmarkSummary {
                gpu_average: Duration::ZERO,
                cpu_average: Duration::from_millis(4),
                improvement_percent: 0.0,
                webgpu_supported: false,
            },
        };

        let report = generate_report(std::slice::from_ref(&suite));
        assert!(report.contains("unavailable (CPU only)"));
        assert!(report.contains("gpu: GpuUnavailable"));
        assert!(report.contains("-> 512x512"));

        let json = suite.to_json();
        assert_eq!(json["summary"]["webgpu_supported"], false);
        assert_eq!(json["results"][0]["error"], GPU_UNAVAILABLE);
    }
}
