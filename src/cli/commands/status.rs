//! `tsi status` command - Record counts of the store

use console::style;
use miette::Result;

use crate::cli::helpers::open_session;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Print counts as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let counts = session.store.counts()?;

    if args.json {
        let map: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(table, count)| (table.to_string(), (*count).into()))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&map).unwrap_or_default()
        );
        return Ok(());
    }

    if !global.quiet {
        println!(
            "{} {}",
            style("Store").bold(),
            style(session.workspace.store_path().display()).dim()
        );
        println!("{}", style("─".repeat(30)).dim());
    }
    for (table, count) in counts {
        let count = if count > 0 {
            style(count).cyan()
        } else {
            style(count).dim()
        };
        println!("  {:<12} {}", table, count);
    }
    Ok(())
}
