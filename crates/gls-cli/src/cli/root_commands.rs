use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Select, close, flatten and sort entries from a JSONL event stream.
    Select(SelectArgs),
    /// Print the effective configuration as TOML.
    Config,
    /// Print the JSON schema of an input or state document.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct SelectArgs {
    /// JSONL file of entry, record and compound events.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Prior selection state; read if present and rewritten after the run.
    #[arg(long)]
    pub prior: Option<PathBuf>,

    /// Leave the prior selection file untouched.
    #[arg(long)]
    pub no_save_prior: bool,
}

/// Documents with a published schema.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SchemaType {
    /// One line of the input stream.
    Event,
    /// The persisted prior selection.
    Prior,
    /// The `[sort]` pass definition.
    SortPass,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Which document to describe.
    #[arg(value_enum, default_value = "event")]
    pub type_name: SchemaType,
}
