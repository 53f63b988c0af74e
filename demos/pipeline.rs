use std::time::{Duration, Instant};

use anyhow::Context;
use async_promise::{join, join_all, Builder, Future};
use clap::Parser;
use log::{debug, info};

/// Fan out a number of simulated jobs, join them, and continue with the total.
#[derive(Parser, Debug)]
struct Args {
    /// Number of jobs to run concurrently.
    #[arg(short, long, default_value_t = 8)]
    jobs: u64,

    /// Longest simulated job duration in milliseconds.
    #[arg(short, long, default_value_t = 200)]
    max_delay_ms: u64,

    /// Job number that fails instead of producing a value.
    #[arg(short, long)]
    fail: Option<u64>,
}

fn job(number: u64, max_delay_ms: u64, fail: Option<u64>) -> anyhow::Result<Future<u64, String>> {
    // Later jobs are quicker, so jobs finish in roughly reverse order.
    let delay = Duration::from_millis(max_delay_ms.saturating_sub(number * 10));
    let future = Builder::new()
        .name(format!("job-{number}"))
        .spawn(move || {
            std::thread::sleep(delay);
            debug!("job {number} finished after {delay:?}");
            if fail == Some(number) {
                Err(format!("job {number} failed"))
            } else {
                Ok(number * number)
            }
        })
        .with_context(|| format!("could not start job {number}"))?;
    Ok(future)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let started = Instant::now();

    let jobs = (0..args.jobs)
        .map(|number| job(number, args.max_delay_ms, args.fail))
        .collect::<anyhow::Result<Vec<_>>>()?;
    info!("started {} jobs", jobs.len());

    // Report every failure, not just the first one.
    let total = join_all(jobs, |outcomes| {
        let (values, errors): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(Result::is_ok);
        if errors.is_empty() {
            Ok(values.into_iter().flatten().sum::<u64>())
        } else {
            Err(errors
                .into_iter()
                .filter_map(Result::err)
                .collect::<Vec<_>>()
                .join(", "))
        }
    });

    let mean = total.clone().then({
        let count = args.jobs;
        move |total| total.map(|total| total as f64 / count.max(1) as f64)
    });

    let report = join(total, mean, |total, mean| {
        Ok::<_, String>(format!("sum of squares {}, mean {:.2}", total?, mean?))
    });

    match report.wait() {
        Ok(report) => println!("{report} in {:?}", started.elapsed()),
        Err(error) => anyhow::bail!("pipeline failed: {error}"),
    }

    Ok(())
}
