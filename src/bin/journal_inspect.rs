use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use padsync::journal::Journal;

/// Print the pending operations recorded in a padsync journal.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the journal SQLite file
    #[arg(long, default_value = "padsync.db")]
    journal: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let journal = Journal::open(&args.journal).await?;
    let ops = journal.load_pending().await?;

    if ops.is_empty() {
        println!("journal is empty");
        return Ok(());
    }

    let now = Utc::now();
    for op in ops {
        let age = (now - op.created_at).num_seconds();
        println!(
            "{}  {:<8} {:<6} attempt={} age={}s target={}",
            op.id,
            op.kind.as_str(),
            op.action.as_str(),
            op.attempt,
            age,
            op.target_id,
        );
    }
    Ok(())
}
