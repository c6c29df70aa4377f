// `TrendCrab` - Trending phrase detection for short-form posts
//
// Copyright (C) 2025 Daniel Freiermuth
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trendcrab::config::TrendConfig;
use trendcrab::core::{
    JobSummary, JsonSnapshotSink, JsonlOccurrenceSource, JsonlPostStore, PostStore, TrendJob,
};
use trendcrab::trend::TrendEngine;

#[cfg(feature = "ram-profiling")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[derive(Parser, Debug)]
#[command(name = "trendcrab")]
#[command(version)]
#[command(about = "Rank trending words and phrases from occurrence records", long_about = None)]
struct Args {
    /// Occurrence records, one JSON object per line
    #[arg(long, value_name = "FILE")]
    records: PathBuf,

    /// Raw posts, one JSON object per line; enables verified post counts
    #[arg(long, value_name = "FILE")]
    posts: Option<PathBuf>,

    /// Where to write the trend snapshot
    #[arg(short, long, value_name = "FILE", default_value = "trends.json")]
    output: PathBuf,

    /// Reference instant (RFC 3339); defaults to the current time
    #[arg(long, value_name = "TIMESTAMP")]
    now: Option<DateTime<Utc>>,

    /// Config file (defaults to <config dir>/trendcrab/config.json)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Trends published per language partition
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Language partition to rank; repeat for several
    #[arg(long = "language", value_name = "LANG")]
    languages: Vec<String>,

    /// Also print the ranked trends to stdout
    #[arg(long)]
    print: bool,

    /// Path for the DHAT heap profiling output (only used when built with --features ram-profiling)
    #[cfg(feature = "ram-profiling")]
    #[arg(
        long = "profile-output",
        value_name = "PROFILE_FILE",
        default_value = "dhat-heap.json"
    )]
    profile_output: PathBuf,
}

impl Args {
    fn resolve_config(&self) -> Result<TrendConfig> {
        let mut config = match &self.config {
            Some(path) => TrendConfig::load_from(path)?,
            None => TrendConfig::load(),
        };

        if let Some(top) = self.top {
            config.top_n = top;
        }
        if !self.languages.is_empty() {
            config.languages.clone_from(&self.languages);
        }
        Ok(config)
    }
}

fn print_summary(summary: &JobSummary) {
    for partition in &summary.partitions {
        println!("== {}", partition.language.as_deref().unwrap_or("all languages"));
        if partition.trends.is_empty() {
            println!("   (no trends)");
        }
        for trend in &partition.trends {
            println!(
                "{:>3}. {:<32} score {:.4}  posts {:>6}  ({:.1} -> {:.1})",
                trend.rank,
                trend.phrase,
                trend.trend_score,
                trend.display_count(),
                trend.older_count,
                trend.recent_count
            );
        }
    }
}

fn main() -> Result<()> {
    // Set RUST_LOG environment variable to override (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "TrendCrab starting up (version {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let args = Args::parse();

    #[cfg(feature = "ram-profiling")]
    let _profiler = {
        tracing::info!("RAM profiling enabled, output: {:?}", args.profile_output);
        dhat::Profiler::builder()
            .file_name(args.profile_output.clone())
            .build()
    };

    #[cfg(feature = "cpu-profiling")]
    {
        tracing::info!("CPU profiling enabled with Tracy - run Tracy profiler to connect");
    }

    let config = args.resolve_config()?;
    let settings = config
        .engine_settings()
        .context("Refusing to run with an invalid configuration")?;

    let now = args.now.unwrap_or_else(Utc::now);
    let source = JsonlOccurrenceSource::new(&args.records);
    let posts = args
        .posts
        .as_deref()
        .map(JsonlPostStore::open)
        .transpose()
        .context("Failed to load posts for verification")?;
    let mut sink = JsonSnapshotSink::new(&args.output, now);

    let job = TrendJob::new(TrendEngine::new(settings));
    let summary = job
        .run_with_retries(
            now,
            config.max_attempts,
            &source,
            posts.as_ref().map(|p| p as &dyn PostStore),
            &mut sink,
        )
        .with_context(|| format!("Trend run over {} failed", args.records.display()))?;

    if args.print {
        print_summary(&summary);
    }

    tracing::info!(
        "Done: {} trends written to {}{}",
        summary.trends_written,
        args.output.display(),
        if summary.enriched {
            " (verified post counts)"
        } else {
            ""
        }
    );
    Ok(())
}
