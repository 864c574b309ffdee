//! `tsi import` command - Import a CSV or JSON file

use chrono_tz::Tz;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{open_session, truncate_str};
use crate::cli::GlobalOpts;
use crate::import::{self, ImportData, ImportOptions, ImporterKind, InputFormat};

/// Longest cell shown in the row table
const MAX_CELL: usize = 30;

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV or JSON file to import
    #[arg(required_unless_present = "template")]
    pub file: Option<PathBuf>,

    /// Importer to use (default: detected from the header)
    #[arg(long, short = 'i', value_enum)]
    pub importer: Option<ImporterKind>,

    /// Input format (default: from the file extension)
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// CSV delimiter (default: from the configuration, ";")
    #[arg(long, short = 'd')]
    pub delimiter: Option<char>,

    /// Resolve and validate everything without writing to the store
    #[arg(long)]
    pub dry_run: bool,

    /// Create activities for the row's project instead of global ones
    #[arg(long)]
    pub project_activities: bool,

    /// Print an example file for the importer and exit
    #[arg(long, value_enum, value_name = "IMPORTER", conflicts_with = "file")]
    pub template: Option<ImporterKind>,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if let Some(kind) = args.template {
        return generate_template(kind, args.delimiter.unwrap_or(';'));
    }

    let file = args
        .file
        .clone()
        .ok_or_else(|| miette::miette!("File required. Usage: tsi import timesheets.csv"))?;
    if !file.exists() {
        return Err(miette::miette!("File not found: {}", file.display()));
    }

    let mut session = open_session(global)?;
    let config = &session.config;

    let delimiter = match args.delimiter {
        Some(c) if c.is_ascii() => c as u8,
        Some(c) => return Err(miette::miette!("Delimiter must be a single ASCII character, got '{}'", c)),
        None => config.delimiter(),
    };
    let timezone: Tz = config
        .timezone()
        .parse()
        .map_err(|_| miette::miette!("Unknown timezone in configuration: {}", config.timezone()))?;
    let options = ImportOptions {
        dry_run: args.dry_run,
        global_activities: config.global_activities() && !args.project_activities,
        timezone,
        language: config.language(),
        customer_defaults: config.customer_defaults(),
    };

    let input = import::load(&file, args.format, delimiter, config.max_rows())?;
    let kind = import::select(args.importer, &input.header)?;

    if !global.quiet {
        println!(
            "{} Importing {} from {}{}",
            style("→").blue(),
            style(kind).cyan(),
            style(file.display()).yellow(),
            if args.dry_run {
                style(" (dry run)").dim().to_string()
            } else {
                String::new()
            }
        );
        println!();
    }

    let data = import::run(kind, &input, &mut session.store, &options)?;

    print_rows(&data, global.verbose);
    print_summary(&data, global.quiet);
    Ok(())
}

/// Failed rows, or every row with `--verbose`
fn print_rows(data: &ImportData, all: bool) {
    println!("{}", style(&data.title).bold());

    let rows: Vec<_> = data
        .rows
        .iter()
        .filter(|row| all || row.has_error())
        .collect();
    if rows.is_empty() {
        return;
    }

    let mut builder = Builder::default();
    let mut header = vec!["#".to_string()];
    header.extend(data.header.iter().cloned());
    header.push("Errors".to_string());
    builder.push_record(header);

    for row in rows {
        let mut record = vec![row.number.to_string()];
        record.extend(row.values.iter().map(|v| truncate_str(v, MAX_CELL)));
        record.push(row.errors.join("\n"));
        builder.push_record(record);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

fn print_summary(data: &ImportData, quiet: bool) {
    let failed = data.count_errors();
    for line in &data.status {
        let marker = if line.starts_with("failed") {
            style("✗").red()
        } else {
            style("✓").green()
        };
        println!("{} {}", marker, line);
    }
    if quiet {
        return;
    }

    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Rows processed:   {}", style(data.count_rows()).cyan());
    println!("  Records created:  {}", style(data.created.total()).green());
    if data.updated.total() > 0 {
        println!("  Records updated:  {}", style(data.updated.total()).yellow());
    }
    if failed > 0 {
        println!("  Rows failed:      {}", style(failed).red());
    }

    if data.dry_run {
        println!();
        println!(
            "{}",
            style("Dry run complete. Nothing was written to the store.").yellow()
        );
    }
}

/// Header and example row of `kind` on stdout
fn generate_template(kind: ImporterKind, delimiter: char) -> Result<()> {
    let (header, example) = kind.template();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(if delimiter.is_ascii() { delimiter as u8 } else { b';' })
        .from_writer(std::io::stdout());
    writer.write_record(header).into_diagnostic()?;
    writer.write_record(example).into_diagnostic()?;
    writer.flush().into_diagnostic()?;

    // Hint on stderr so it doesn't end up in redirected output
    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: tsi import --template {} > {}.csv",
        style("→").blue(),
        kind,
        kind
    );
    Ok(())
}
