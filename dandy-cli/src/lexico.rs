//! The `lexico` subcommand (spec.md §6): build a lexer from a lexical specification JSON file,
//! tokenize a source file, and optionally persist the composed DFA as JSON.

use clap::Args;
use dandy::error::DandyError;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct LexicoArgs {
    /// Lexical specification file (spec.md §6's lex-spec JSON shape).
    spec: PathBuf,
    /// Source file to tokenize.
    source: PathBuf,
    /// Persist the composed, minimized DFA as JSON (spec.md §6's persisted-automaton shape).
    #[arg(long)]
    output: Option<PathBuf>,
}

pub fn run(args: LexicoArgs) -> Result<(), DandyError> {
    let spec_json = fs::read_to_string(&args.spec)?;
    let spec = dandy::json::load_lex_spec(&spec_json)?;
    let lexer = spec.build()?;

    let source = fs::read_to_string(&args.source)?;
    let tokens = lexer.tokenize(&source)?;

    for token in &tokens {
        println!("{}:{}", token.class, token.lexeme);
    }

    if let Some(output) = &args.output {
        let json = dandy::json::dfa_to_json(lexer.dfa())?;
        fs::write(output, json)?;
    }

    Ok(())
}
