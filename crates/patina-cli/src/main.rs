//! Patina CLI entry point

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use patina_cli::{Cli, execute};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    execute(cli)
}
