//! `tsi legacy` command - Import a complete legacy installation

use console::style;
use dialoguer::{theme::ColorfulTheme, Password};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{format_runtime, open_session};
use crate::cli::GlobalOpts;
use crate::legacy::{self, InstanceReport, LegacyOptions, LegacySource, MergeOptions};

#[derive(clap::Args, Debug)]
pub struct LegacyArgs {
    /// SQLite database of the legacy installation (opened read-only)
    pub database: PathBuf,

    /// Password for all imported users, at least 8 characters (prompted if missing)
    #[arg(long, env = "TSI_LEGACY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Table prefix of an instance; repeat to import several instances
    #[arg(long = "prefix", short = 'p', default_value = "kimai_")]
    pub prefixes: Vec<String>,

    /// Country code of imported customers (default: from the configuration)
    #[arg(long)]
    pub country: Option<String>,

    /// Currency code of imported customers (default: from the configuration)
    #[arg(long)]
    pub currency: Option<String>,

    /// Timezone of users and customers without one (default: from the configuration)
    #[arg(long)]
    pub timezone: Option<String>,

    /// Language of users without one (default: from the configuration)
    #[arg(long)]
    pub language: Option<String>,

    /// Create every activity globally and ignore project assignments
    #[arg(long)]
    pub global_activities: bool,

    /// Repair known broken UTF-8 sequences in names and comments
    #[arg(long)]
    pub fix_utf8: bool,

    /// Give users without email the address NAME_import@DOMAIN
    #[arg(long, value_name = "DOMAIN")]
    pub fix_email: Option<String>,

    /// Turn records ending before they start into zero-length records
    #[arg(long)]
    pub fix_timesheet: bool,

    /// Skip rates of unknown users instead of refusing the import
    #[arg(long)]
    pub skip_error_rates: bool,

    /// Import customers with the same legacy id only once across instances
    #[arg(long)]
    pub merge_customer: bool,

    /// Import projects with the same legacy id only once across instances
    #[arg(long)]
    pub merge_project: bool,

    /// Import users with the same username and email only once across instances
    #[arg(long)]
    pub merge_user: bool,

    /// Import teams with the same name only once across instances
    #[arg(long)]
    pub merge_team: bool,

    /// Create one team per instance with all its users
    #[arg(long)]
    pub create_team: bool,

    /// Use the user alias as account number
    #[arg(long)]
    pub alias_as_account_number: bool,

    /// Store timesheet comments in this meta field
    #[arg(long, value_name = "NAME")]
    pub meta_comment: Option<String>,

    /// Store timesheet locations in this meta field
    #[arg(long, value_name = "NAME")]
    pub meta_location: Option<String>,

    /// Store timesheet tracking numbers in this meta field
    #[arg(long, value_name = "NAME")]
    pub meta_tracking_number: Option<String>,

    /// Do not import groups
    #[arg(long)]
    pub skip_teams: bool,

    /// Do not grant teams their customers
    #[arg(long)]
    pub skip_team_customers: bool,

    /// Do not grant teams their projects
    #[arg(long)]
    pub skip_team_projects: bool,

    /// Do not grant teams their activities
    #[arg(long)]
    pub skip_team_activities: bool,

    /// Reuse records written by an earlier run of the same instance
    #[arg(long)]
    pub check_already_imported: bool,
}

pub fn run(args: LegacyArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let password = match args.password {
        Some(password) => password,
        None if console::user_attended() => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password for imported users")
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()
            .into_diagnostic()?,
        None => {
            return Err(miette::miette!(
                "Password required. Pass --password or set TSI_LEGACY_PASSWORD"
            ))
        }
    };
    let config = &session.config;
    let defaults = config.customer_defaults();

    let options = LegacyOptions {
        password,
        prefixes: args.prefixes,
        country: args.country.unwrap_or(defaults.country),
        currency: args.currency.unwrap_or(defaults.currency),
        timezone: args.timezone.unwrap_or_else(|| config.timezone()),
        language: args.language.unwrap_or_else(|| config.language()),
        global_activities: args.global_activities,
        fix_utf8: args.fix_utf8,
        fix_email: args.fix_email,
        fix_timesheet: args.fix_timesheet,
        skip_error_rates: args.skip_error_rates,
        merge: MergeOptions {
            customers: args.merge_customer,
            projects: args.merge_project,
            users: args.merge_user,
            teams: args.merge_team,
        },
        instance_team: args.create_team,
        alias_as_account_number: args.alias_as_account_number,
        meta_comment: args.meta_comment,
        meta_location: args.meta_location,
        meta_tracking_number: args.meta_tracking_number,
        skip_teams: args.skip_teams,
        skip_team_customers: args.skip_team_customers,
        skip_team_projects: args.skip_team_projects,
        skip_team_activities: args.skip_team_activities,
        check_already_imported: args.check_already_imported,
        batch_size: config.batch_size(),
    };

    if !args.database.exists() {
        return Err(miette::miette!(
            "Database not found: {}",
            args.database.display()
        ));
    }
    let source = LegacySource::open(&args.database)?;

    if !global.quiet {
        println!(
            "{} Importing {} from {}",
            style("→").blue(),
            style(options.prefixes.join(", ")).cyan(),
            style(args.database.display()).yellow()
        );
        println!();
    }

    let report = legacy::import(&source, &mut session.store, &options)?;

    for instance in &report.instances {
        print_instance(instance, global);
    }

    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Instances:        {}", style(report.instances.len()).cyan());
    println!("  Records imported: {}", style(report.imported()).green());
    println!(
        "  Runtime:          {}",
        style(format_runtime(report.runtime)).dim()
    );
    if report.has_errors() {
        println!();
        println!(
            "{}",
            style("Some records could not be imported, see the errors above.").yellow()
        );
    }
    Ok(())
}

fn print_instance(instance: &InstanceReport, global: &GlobalOpts) {
    println!("{}", style(format!("Instance {}", instance.prefix)).bold());
    for (label, count) in instance.counts.lines() {
        if count > 0 {
            println!("{} Imported {} {}", style("✓").green(), count, label);
        }
    }
    if !global.quiet {
        for warning in &instance.warnings {
            println!("{} {}", style("!").yellow(), warning);
        }
    }
    for error in &instance.errors {
        println!("{} {}", style("✗").red(), error);
    }
    println!();
}
