#[cfg(not(feature = "cli"))]
compile_error!("The `pkv` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;

use pagekv::cli;
use pagekv::cli::app::{Cli, ColorMode, Commands};
use pagekv::KvError;

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, KvError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| KvError::Io(format!("cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Create { path, elements } => cli::create::execute(
            &cli::create::CreateOptions { path, elements },
            &mut writer,
        ),

        Commands::Get { path, key, json } => {
            cli::get::execute(&cli::get::GetOptions { path, key, json }, &mut writer)
        }

        Commands::Set { path, key, value } => {
            cli::set::execute(&cli::set::SetOptions { path, key, value }, &mut writer)
        }

        Commands::Del { path, key } => {
            cli::del::execute(&cli::del::DelOptions { path, key }, &mut writer)
        }

        Commands::Ts { path, key, json } => {
            cli::ts::execute(&cli::ts::TsOptions { path, key, json }, &mut writer)
        }

        Commands::Info { path, json } => {
            cli::info::execute(&cli::info::InfoOptions { path, json }, &mut writer)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
