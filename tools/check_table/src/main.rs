//! Validate a Wubi table file and answer code/word queries against it.
//!
//! A table that fails validation (bad frequency field, unreadable file) exits
//! non-zero with the parse error; that is exactly the table the engine would
//! refuse at startup.

use std::path::PathBuf;

use anyhow::Result;
use audime_core::CodeDict;
use clap::Parser;

#[derive(Parser)]
#[command(about = "Validate a Wubi code table and query it")]
struct Args {
    /// Table file in BEGIN_TABLE/END_TABLE format
    table: PathBuf,

    /// Show what this code (and its completions) would produce
    #[arg(long)]
    lookup: Option<String>,

    /// Show the code that produces this word
    #[arg(long)]
    word: Option<String>,

    /// Maximum completions to print per lookup
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let dict = CodeDict::from_path(&args.table)?;
    println!("{}: {} entries", args.table.display(), dict.len());

    if let Some(code) = &args.lookup {
        lookup(&dict, code, args.limit);
    }
    if let Some(word) = &args.word {
        match dict.code_of(word) {
            Some(code) => println!("{word} <- {code}"),
            None => println!("{word}: not in table"),
        }
    }
    Ok(())
}

fn lookup(dict: &CodeDict, code: &str, limit: usize) {
    let Some(node) = dict.search(code) else {
        println!("{code}: no such prefix");
        return;
    };
    if node.is_end() {
        for (freq, words) in node.values().iter().rev() {
            for word in words {
                println!("{code} -> {word} ({freq})");
            }
        }
    } else {
        println!("{code}: prefix only");
    }

    let mut shown = 0;
    'subtree: for (freq, words) in node.collect_subtree().iter().rev() {
        for word in words {
            if shown >= limit {
                println!("  ... (more)");
                break 'subtree;
            }
            println!("{code}.. -> {word} ({freq})");
            shown += 1;
        }
    }
}
