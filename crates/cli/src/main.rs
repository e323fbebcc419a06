//! `tillbook` command-line front end.
//!
//! Every command opens the JSON document, runs one service call, prints the
//! result as JSON on stdout and exits. Logs go to stderr.

mod args;
mod commands;

use anyhow::Result;
use clap::Parser;

use tillbook_infra::Settings;

use crate::args::{Cli, Commands};
use crate::commands::{
    CliContext, handle_category_command, handle_invoice_command, handle_product_command,
    handle_report_command,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(path) = cli.data_file {
        settings.data_file = path;
    }
    if let Some(format) = cli.log_format {
        settings.log_format = format;
    }
    tillbook_observability::init(settings.log_format);
    tracing::debug!(data_file = %settings.data_file.display(), policy = ?settings.policy, "settings loaded");

    let context = CliContext::open(&settings)?;
    match cli.command {
        Commands::Category(command) => handle_category_command(&context, command)?,
        Commands::Product(command) => handle_product_command(&context, command)?,
        Commands::Invoice(command) => handle_invoice_command(&context, command)?,
        Commands::Report(command) => handle_report_command(&context, command)?,
    }

    Ok(())
}
