use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "flexorm",
    about = "FlexORM: run model operations against fixture data",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a convention-named operation (getPostTitle, theVenue, setEventType)
    Call(CallArgs),
    /// Assign attributes and persist the record
    Set(SetArgs),
    /// List the attributes a schema declares and where they are stored
    ShowSchema(ShowSchemaArgs),
}

/// Where the model and its store contents come from.
#[derive(Args)]
pub struct ModelArgs {
    /// Model schema (TOML)
    #[arg(short, long)]
    pub schema: PathBuf,
    /// Store contents (JSON); stores start empty without one
    #[arg(short, long)]
    pub fixture: Option<PathBuf>,
    /// Record identity; a new record is used when omitted
    #[arg(long)]
    pub id: Option<u64>,
    /// Write the store contents back to the fixture file afterwards
    #[arg(long)]
    pub save: bool,
}

#[derive(Args)]
pub struct CallArgs {
    #[command(flatten)]
    pub model: ModelArgs,
    /// Operation name
    pub operation: String,
    /// Arguments; JSON literals are parsed, anything else is a string
    pub args: Vec<String>,
    /// Persist the record after the operation
    #[arg(long)]
    pub persist: bool,
}

#[derive(Args)]
pub struct SetArgs {
    #[command(flatten)]
    pub model: ModelArgs,
    /// Assignments as attribute=value; values follow the same rules as call arguments
    #[arg(required = true)]
    pub assignments: Vec<String>,
}

#[derive(Args)]
pub struct ShowSchemaArgs {
    /// Model schema (TOML)
    pub schema: PathBuf,
    /// Also list native fields
    #[arg(long)]
    pub native: bool,
}
