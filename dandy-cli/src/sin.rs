//! The `sin` subcommand (spec.md §6): build an LL(1) recognizer from a grammar JSON file,
//! normalize the grammar, and accept/reject a whitespace-separated sentence of terminal names
//! read from stdin.

use clap::Args;
use dandy::cfg::FactorConfig;
use dandy::error::DandyError;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SinArgs {
    /// Grammar file (spec.md §6's grammar JSON shape).
    grammar: PathBuf,
    /// Print FIRST/FOLLOW sets and the LL(1) table before reading the sentence.
    #[arg(long)]
    describe: bool,
}

pub fn run(args: SinArgs) -> Result<(), DandyError> {
    let grammar_json = fs::read_to_string(&args.grammar)?;
    let mut grammar = dandy::json::load_grammar(&grammar_json)?;

    grammar.normalize(&FactorConfig::default())?;
    let table = grammar.build_table()?;

    if args.describe {
        print!("{}", grammar.describe(&table));
    }

    let recognizer = grammar.recognizer(&table);

    let mut sentence = String::new();
    io::stdin().read_to_string(&mut sentence)?;
    let symbols: Vec<&str> = sentence.split_whitespace().collect();

    recognizer.accepts(&symbols)?;
    println!("accept");
    Ok(())
}
