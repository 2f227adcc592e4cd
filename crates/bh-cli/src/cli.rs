use std::path::PathBuf;

use bh_types::DATE_FORMAT;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bh",
    about = "BlockHealth: patient records behind a signed pointer",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the object store, ledger file, key and bh.toml
    #[arg(long, global = true, default_value = ".blockhealth")]
    pub data_dir: PathBuf,

    /// Secret key file (overrides bh.toml)
    #[arg(long, global = true)]
    pub key: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a signing key
    Keygen(KeygenArgs),
    /// Show the identity of the configured key
    Whoami,
    /// Register a patient record for this identity
    Register(RegisterArgs),
    /// List the medical history
    History(ReadArgs),
    /// Append a medical history entry
    Add(AddArgs),
    /// Show the full record
    Show(ReadArgs),
    /// Show the ledger pointer and its audit trail
    Pointer(PointerArgs),
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Replace an existing key file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct RegisterArgs {
    pub name: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    /// Date of birth, YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    pub dob: Option<NaiveDate>,
    #[arg(long)]
    pub blood_group: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
}

#[derive(Args)]
pub struct ReadArgs {
    /// Another patient's identity (pt:... or 64 hex chars)
    #[arg(long)]
    pub patient: Option<String>,
}

// Fields stay optional so a missing one is reported by record validation.
#[derive(Args)]
pub struct AddArgs {
    #[arg(long)]
    pub disease: Option<String>,
    /// Diagnosis date, YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,
    /// Treated or Ongoing
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct PointerArgs {
    #[arg(long)]
    pub patient: Option<String>,
    /// Print every accepted pointer move
    #[arg(long)]
    pub trail: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| format!("expected YYYY-MM-DD, got {s:?}"))
}
