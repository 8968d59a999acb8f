mod lexico;
mod sin;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "dandy-cli")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a lexer from a lexical specification and tokenize a source file.
    Lexico(lexico::LexicoArgs),
    /// Build an LL(1) recognizer from a grammar and accept/reject a sentence read from stdin.
    Sin(sin::SinArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Lexico(args) => lexico::run(args),
        Command::Sin(args) => sin::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
