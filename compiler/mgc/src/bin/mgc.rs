// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![warn(clippy::mod_module_files, clippy::pedantic, clippy::unwrap_used)]

use clap::{crate_version, ArgGroup, Parser};
use mgc::{Emit, FsReader};
use std::{
    io::{self, Read},
    process::ExitCode,
};

#[derive(Debug, Parser)]
#[command(name = "mgc", version = crate_version!())]
#[command(author, about = "mg compiler", next_line_help = true)]
#[command(group(ArgGroup::new("mode").args(["ast", "lower", "check"])))]
struct Cli {
    /// Print the parsed AST in human-readable form.
    #[arg(short = 'a', long)]
    ast: bool,

    /// Print the lowered IR, skipping final validation.
    #[arg(short = 'l', long)]
    lower: bool,

    /// Print the lowered IR after asserting it is structurally valid
    /// (the default).
    #[arg(short = 'c', long)]
    check: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let emit = if cli.ast {
        Emit::Ast
    } else if cli.lower {
        Emit::Lower
    } else {
        Emit::Check
    };

    let mut source = String::new();
    if let Err(error) = io::stdin().read_to_string(&mut source) {
        eprintln!("error: could not read stdin: {error}");
        return ExitCode::FAILURE;
    }

    match mgc::run(&source, &FsReader, emit) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::FAILURE
        }
    }
}
