use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use hybrid_image_resize::gpu::{self, DeviceProvider, NoGpuProvider};
use hybrid_image_resize::instrument::{self, Scenario};
use hybrid_image_resize::{EngineConfig, PowerPreference, ResizeEngine};
use tracing_subscriber::EnvFilter;

/// Compare GPU and CPU resize times over the standard scenarios.
#[derive(Parser, Debug)]
#[command(name = "benchmark")]
#[command(about = "⏱ Benchmark GPU vs CPU image resizing")]
#[command(long_about = "Runs each benchmark scenario on the GPU and the CPU path and prints average
durations and the GPU improvement. Set RUST_LOG=debug for per-stage GPU timings.")]
struct Args {
    /// Timed runs per method and scenario
    #[arg(short, long, default_value_t = 3, help = "Timed runs per method and scenario")]
    iterations: u32,

    /// Skip the GPU entirely
    #[arg(long, help = "Report the GPU as unavailable and only time the CPU path")]
    cpu_only: bool,

    /// Adapter power preference
    #[arg(long, default_value = "high", help = "Adapter preference: high or low")]
    power: String,

    /// Only run scenarios whose name contains this text
    #[arg(short, long)]
    scenario: Option<String>,

    /// Also print per-stage GPU metrics for each scenario
    #[arg(long)]
    metrics: bool,

    /// Emit JSON instead of the text report
    #[arg(long)]
    json: bool,
}

fn parse_power(value: &str) -> Result<PowerPreference> {
    match value.to_ascii_lowercase().as_str() {
        "high" | "high-performance" => Ok(PowerPreference::HighPerformance),
        "low" | "low-power" => Ok(PowerPreference::LowPower),
        other => Err(anyhow!("unknown power preference '{}', expected high or low", other)),
    }
}

fn select_scenarios(filter: Option<&str>) -> Result<Vec<Scenario>> {
    let scenarios: Vec<_> = instrument::standard_scenarios()
        .into_iter()
        .filter(|s| filter.is_none_or(|f| s.name.contains(f)))
        .collect();
    if scenarios.is_empty() {
        return Err(anyhow!("no scenario matches '{}'", filter.unwrap_or_default()));
    }
    Ok(scenarios)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = EngineConfig {
        power_preference: parse_power(&args.power)?,
        benchmark_iterations: args.iterations,
        ..EngineConfig::default()
    };
    let provider: Arc<dyn DeviceProvider> = if args.cpu_only {
        Arc::new(NoGpuProvider)
    } else {
        gpu::default_provider()
    };
    let engine = ResizeEngine::with_provider(config, provider).context("invalid benchmark configuration")?;
    let scenarios = select_scenarios(args.scenario.as_deref())?;

    let suites = engine.run_benchmark_suite_with(&scenarios).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&instrument::report_json(&suites))?);
    } else {
        println!("{}", instrument::generate_report(&suites));
    }

    if args.metrics && engine.is_gpu_available() {
        for scenario in &scenarios {
            let source = instrument::gradient(scenario.source);
            let metric = engine
                .measure(&source, &scenario.request)
                .await
                .with_context(|| format!("measuring '{}'", scenario.name))?;
            println!("\n{}\n{}", scenario.name, metric.generate_report());
        }
    }

    engine.release().await;
    Ok(())
}
