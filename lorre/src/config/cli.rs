use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Location of config file: Default: lorre.toml
    #[arg(short, long, default_value = "lorre.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Subcommand {
    /// Output example config file.
    Init,

    /// Run the indexing loop until terminated.
    Sync,

    /// Run exactly one indexing cycle, then exit.
    Once,

    /// Drop every indexed row above the given block level. The next sync re-fetches from there.
    Rewind { level: i64 },

    /// Print indexing progress: stored head, row counts, checkpoint backlog, latest fees.
    Status,

    /// Print the most recent stored state of an account (and delegate, if the id is one).
    Lookup { id: String },

    /// List the distinct stored values of an attribute, optionally restricted to a prefix.
    Values {
        table: String,
        column: String,
        prefix: Option<String>,
    },

    /// Prints the current version of application
    Version,
}
