// server/src/cli/commands.rs

// Command-line arguments and subcommands for the triage CLI.
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "triage-cli")]
#[command(version)]
#[command(about = "Triage decision engine: train, serve and run the queue classifier")]
pub struct CliArgs {
    /// Configuration file (YAML or TOML).
    #[arg(long, short = 'c', global = true, env = "TRIAGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Train a classifier artifact from graded historical records
    #[command(group(ArgGroup::new("source").required(true).args(["input", "from_store"])))]
    Train {
        /// JSON array or JSON-lines file of patient documents
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        /// Read documents from the configured patients tree instead of a file
        #[arg(long)]
        from_store: bool,
        /// Only use the first N documents
        #[arg(long)]
        limit: Option<usize>,
        /// Where to write the artifact; defaults to `model.path`
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Start the REST API
    Serve {
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },
    /// Run a batch of records through the loaded model and print decisions
    Predict {
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Move appointments in the local store to their new queues
        #[arg(long)]
        apply_update: bool,
    },
    /// Query a running server's health endpoint
    Status {
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },
    /// Load documents from a file into the local store
    Import {
        #[arg(long, short = 'i')]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = TreeKind::Patients)]
        tree: TreeKind,
        /// Document field holding the key; documents without it get a fresh UUID
        #[arg(long, default_value = "_id")]
        id_field: String,
    },
    /// Print the Argon2 hash of an API key for `security.api_key_hash`
    HashKey {
        #[arg(value_name = "KEY")]
        key: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TreeKind {
    Patients,
    Appointments,
}
