//! 🚀 cqlx-cli — the front door, the bouncer, the maitre d' of cqlx.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that loads config,
//! sets up logging, and then lets the real code do the heavy lifting.
//! Like a manager. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cqlx::{RunReport, WriteReport};

/// 🚰 Bulk-load generated accounts into a wide-column store, in batches.
#[derive(Debug, Parser)]
#[command(name = "cqlx", version)]
struct Args {
    /// 🔧 TOML config file. Skipped silently if it doesn't exist; CQLX_* env vars still apply.
    #[arg(default_value = "cqlx.toml")]
    config: PathBuf,

    /// 🏭 How many accounts to generate (overrides runtime.record_count).
    #[arg(long)]
    records: Option<u64>,

    /// 🪣 Records per batch (overrides runtime.batch_size).
    #[arg(long, allow_negative_numbers = true)]
    batch_size: Option<i64>,

    /// 💣 Drop and recreate the table and its types before loading.
    #[arg(long)]
    reset_schema: bool,
}

/// 🚀 main() — where it all begins. The "I pressed F5 and held my breath" moment.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Parse args
/// 3. Load config, apply CLI overrides
/// 4. Run the thing (send it and pray 🙏)
/// 5. Print the report, or the error chain (cry)
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // 🔒 A missing config file is fine. An unreadable path is not.
    let config_file = args.config.as_path();
    let config_file_if_it_exists = match config_file.try_exists().context(format!(
        "💀 Couldn't check whether the configuration file exists. Maybe a permissions thing, maybe \
         a relative path surprise. Use an absolute path to be absolutely certain. Was checking here: '{}'",
        config_file.display()
    ))? {
        true => Some(config_file),
        false => {
            info!(
                "🔧 no config file at '{}', using CQLX_* env vars and defaults",
                config_file.display()
            );
            None
        }
    };

    let mut app_config = cqlx::load_config(config_file_if_it_exists).context(
        "💀 In cqlx-cli, main, we couldn't load the config. Take a look at the file and the CQLX_* \
         env vars. Make sure a [sink_config] is in there somewhere.",
    )?;

    // 🎛️ flags beat files
    if let Some(records) = args.records {
        app_config.runtime.record_count = records;
    }
    if let Some(batch_size) = args.batch_size {
        app_config.runtime.batch_size = batch_size;
    }
    if args.reset_schema {
        app_config.runtime.reset_schema = true;
    }

    match cqlx::run(app_config).await {
        Ok(report) => {
            println!("{}", report_table(&report));
            Ok(())
        }
        Err(err) => {
            report_error(&err);
            // 🗑️ Exit with prejudice. Process exitus maximus.
            std::process::exit(1);
        }
    }
}

/// 📊 The victory lap, in table form. "verified rows" is what the store counted afterwards.
fn report_table(report: &RunReport) -> Table {
    let write = &report.write;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["records", "batches", "elapsed", "records/s", "verified rows"]);
    table.add_row(vec![
        write.record_count.to_string(),
        write.chunk_count.to_string(),
        format!("{:.3}s", write.elapsed.as_secs_f64()),
        format!("{:.0}", write.records_per_sec()),
        report
            .verified_rows()
            .map_or_else(|| "n/a".to_string(), |rows| rows.to_string()),
    ]);
    table
}

/// 💀 Print the error chain, and a hint if it smells like the store isn't there.
fn report_error(err: &anyhow::Error) {
    error!("💀 error: {}", err);
    // -- 🧅 peel the onion of sadness, one tear-jerking layer at a time
    let mut the_vibes_are_giving_connection_issues = false;
    for cause in err.chain().skip(1) {
        error!("⚠️  cause: {}", cause);
        let cause_str = cause.to_string();
        if cause_str.contains("error sending request")
            || cause_str.contains("connection refused")
            || cause_str.contains("Connection refused")
            || cause_str.contains("tcp connect error")
            || cause_str.contains("dns error")
            || cause_str.contains("Could not reach the CQL gateway")
        {
            the_vibes_are_giving_connection_issues = true;
        }
    }

    if the_vibes_are_giving_connection_issues {
        error!(
            "🔧 hint: looks like the CQL gateway isn't reachable. \
            Double-check that the cluster and its gateway are actually running. \
            If you're using Docker, try `docker ps` to see what's up, \
            or `docker compose up -d` to resurrect it. ☕"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn the_one_where_flags_are_parsed_like_a_grown_up() {
        let args = Args::parse_from(["cqlx", "load.toml", "--records", "5", "--batch-size", "-1", "--reset-schema"]);
        assert_eq!(args.config, PathBuf::from("load.toml"));
        assert_eq!(args.records, Some(5));
        assert_eq!(args.batch_size, Some(-1));
        assert!(args.reset_schema);

        let defaults = Args::parse_from(["cqlx"]);
        assert_eq!(defaults.config, PathBuf::from("cqlx.toml"));
        assert!(!defaults.reset_schema);
    }

    #[test]
    fn the_one_where_the_report_table_has_the_numbers() {
        let write = WriteReport {
            record_count: 10_000,
            chunk_count: 100,
            elapsed: Duration::from_secs(4),
        };
        let rendered = report_table(&RunReport {
            write,
            read_back: None,
        })
        .to_string();
        assert!(rendered.contains("10000"));
        assert!(rendered.contains("100"));
        assert!(rendered.contains("2500"));
        assert!(rendered.contains("n/a"));

        let verified = report_table(&RunReport {
            write,
            read_back: Some(cqlx::ReadBack {
                row_count: 9_999,
                sample: vec![],
            }),
        })
        .to_string();
        assert!(verified.contains("9999"));
    }
}
