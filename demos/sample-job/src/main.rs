//! Timer-driven job showing traces, exceptions, and operations.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use webjobs_aitracer::bindings::{
    Binding, BindingContext, BindingProvider, ParameterDescriptor, TracerBinding,
    TracerConfigurationOverride, TracerExtension,
};
use webjobs_aitracer::config::INSTRUMENTATION_KEY_VAR;
use webjobs_aitracer::telemetry::sinks::LogTracer;
use webjobs_aitracer::{AggregatedTracer, ExceptionDetails, OperationHandler, Tracer};

#[derive(Debug, Parser)]
#[command(about = "Runs a sample job on a timer and reports its telemetry")]
struct Args {
    /// Instrumentation key; falls back to the environment.
    #[arg(long, env = INSTRUMENTATION_KEY_VAR)]
    instrumentation_key: Option<String>,

    /// Seconds between invocations.
    #[arg(long, default_value_t = 5)]
    interval_secs: u64,

    /// Number of invocations before exiting.
    #[arg(long, default_value_t = 3)]
    iterations: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let args = Args::parse();
    let extension = match &args.instrumentation_key {
        Some(key) => TracerExtension::from_instrumentation_key(key)?,
        None => TracerExtension::from_env()?,
    };
    let provider = extension.initialize(Arc::new(LogTracer::new("Host.Function.SampleJob")));

    let sample = provider
        .try_create(&ParameterDescriptor::tracer("tracer"))
        .await?
        .ok_or_else(|| anyhow!("tracer parameter was not bound"))?;

    let overridden = match &args.instrumentation_key {
        Some(key) => Some(
            provider
                .try_create(
                    &ParameterDescriptor::tracer("tracer").with_override(
                        TracerConfigurationOverride::from_instrumentation_key(key.clone()),
                    ),
                )
                .await?
                .context("override binding was not created")?,
        ),
        None => None,
    };

    let mut timer = tokio::time::interval(Duration::from_secs(args.interval_secs.max(1)));
    for iteration in 1..=args.iterations {
        tokio::select! {
            _ = timer.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted; stopping before the next invocation");
                break;
            }
        }
        info!(iteration, "timer fired");

        let tracer = invoke(&sample, "Functions.SampleJob").await;
        sample_job(tracer);

        if let Some(binding) = &overridden {
            let tracer = invoke(binding, "Functions.OverrideSampleJob").await;
            override_sample_job(&tracer);
        }
    }

    Ok(())
}

async fn invoke(binding: &TracerBinding, function_name: &str) -> AggregatedTracer {
    let context = BindingContext::new(function_name);
    binding.bind(&context).await.into_tracer()
}

fn sample_job(mut tracer: AggregatedTracer) {
    let mut operation = tracer.start_operation("Test Operation");
    operation.trace_information("Function started!");

    if let Err(err) = run_step() {
        operation.report_exception(&ExceptionDetails::from_anyhow(&err));
        operation.mark_as_failure();
    }

    operation.dispatch();
    tracer.flush();
}

fn override_sample_job(tracer: &AggregatedTracer) {
    tracer.trace_information("Function started!");
    tracer.flush();
}

fn run_step() -> Result<()> {
    Err(anyhow!("Test Failure")).context("running sample step")
}
