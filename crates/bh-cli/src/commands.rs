use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use bh_crypto::SigningKey;
use bh_ledger::{FilePointerLedger, PointerLedger};
use bh_records::RecordOrchestrator;
use bh_session::{KeyringProvider, Session};
use bh_store::{ContentStoreClient, FsContentStore};
use bh_types::{HistoryEntryDraft, Identity, PatientProfile, PatientRecord};
use colored::Colorize;
use tracing::{debug, info};

use crate::cli::*;
use crate::config::CliConfig;

const LEDGER_FILE: &str = "ledger.json";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(&cli.data_dir)?;
    let key_path = config.key_path(&cli.data_dir, cli.key.as_deref());
    let format = cli.format;

    match cli.command {
        Command::Keygen(args) => cmd_keygen(&key_path, args).await,
        Command::Whoami => cmd_whoami(&key_path).await,
        Command::Pointer(args) => cmd_pointer(&cli.data_dir, &config, &key_path, args, format).await,
        Command::Register(args) => {
            let orchestrator = open_orchestrator(&cli.data_dir, &config, &key_path).await?;
            cmd_register(&orchestrator, args).await
        }
        Command::History(args) => {
            let orchestrator = open_orchestrator(&cli.data_dir, &config, &key_path).await?;
            cmd_history(&orchestrator, args, format).await
        }
        Command::Add(args) => {
            let orchestrator = open_orchestrator(&cli.data_dir, &config, &key_path).await?;
            cmd_add(&orchestrator, args).await
        }
        Command::Show(args) => {
            let orchestrator = open_orchestrator(&cli.data_dir, &config, &key_path).await?;
            cmd_show(&orchestrator, args, format).await
        }
    }
}

async fn load_key(path: &Path) -> anyhow::Result<SigningKey> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("no key at {}; run `bh keygen`", path.display()))?;
    SigningKey::from_hex(&text).with_context(|| format!("invalid key in {}", path.display()))
}

async fn open_ledger(data_dir: &Path, config: &CliConfig) -> anyhow::Result<FilePointerLedger> {
    debug!(data_dir = %data_dir.display(), mode = ?config.ledger_mode, "opening ledger");
    FilePointerLedger::open(data_dir.join(LEDGER_FILE), config.ledger_mode)
        .await
        .context("opening ledger")
}

async fn open_orchestrator(
    data_dir: &Path,
    config: &CliConfig,
    key_path: &Path,
) -> anyhow::Result<RecordOrchestrator> {
    let key = load_key(key_path).await?;
    debug!(data_dir = %data_dir.display(), identity = %key.identity().short_id(), "opening records");
    let store = FsContentStore::open(data_dir).await.context("opening object store")?;
    let ledger = open_ledger(data_dir, config).await?;
    let session = Session::new(Arc::new(KeyringProvider::single(key)));
    Ok(RecordOrchestrator::new(
        ContentStoreClient::new(Arc::new(store)),
        Arc::new(ledger),
        Arc::new(session),
    )
    .with_config(config.orchestrator.clone()))
}

fn parse_patient(patient: Option<&str>) -> anyhow::Result<Option<Identity>> {
    patient
        .map(|p| p.parse::<Identity>().with_context(|| format!("invalid patient identity {p:?}")))
        .transpose()
}

async fn cmd_keygen(key_path: &Path, args: KeygenArgs) -> anyhow::Result<()> {
    if !args.force && tokio::fs::try_exists(key_path).await.unwrap_or(false) {
        bail!("{} already exists; pass --force to replace it", key_path.display());
    }
    if let Some(parent) = key_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let key = SigningKey::generate();
    tokio::fs::write(key_path, format!("{}\n", key.to_hex()))
        .await
        .with_context(|| format!("writing {}", key_path.display()))?;
    info!(path = %key_path.display(), identity = %key.identity().short_id(), "generated signing key");
    println!("{} Generated key {}", "✓".green().bold(), key_path.display().to_string().bold());
    println!("  Identity: {}", key.identity().short_id().cyan());
    Ok(())
}

async fn cmd_whoami(key_path: &Path) -> anyhow::Result<()> {
    let identity = load_key(key_path).await?.identity();
    println!("{}", identity.short_id().cyan().bold());
    println!("  {}", identity.to_hex().dimmed());
    Ok(())
}

async fn cmd_register(orchestrator: &RecordOrchestrator, args: RegisterArgs) -> anyhow::Result<()> {
    let profile = PatientProfile {
        name: args.name,
        email: args.email,
        phone: args.phone,
        gender: args.gender,
        date_of_birth: args.dob,
        blood_group: args.blood_group,
        address: args.address,
    };
    let address = orchestrator.register(None, profile).await?;
    println!("{} Registered", "✓".green().bold());
    println!("  Record: {}", address.short_hex().yellow());
    Ok(())
}

async fn cmd_add(orchestrator: &RecordOrchestrator, args: AddArgs) -> anyhow::Result<()> {
    let draft = HistoryEntryDraft {
        disease: args.disease,
        diagnosed_date: args.date,
        status: args.status,
    };
    let address = orchestrator.append_entry(None, draft).await?;
    println!("{} Entry added", "✓".green().bold());
    println!("  Record: {}", address.short_hex().yellow());
    Ok(())
}

async fn read_record(orchestrator: &RecordOrchestrator, args: &ReadArgs) -> anyhow::Result<PatientRecord> {
    let patient = parse_patient(args.patient.as_deref())?;
    Ok(orchestrator.read(patient).await?)
}

async fn cmd_history(
    orchestrator: &RecordOrchestrator,
    args: ReadArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let record = read_record(orchestrator, &args).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&record.medical_history)?);
        return Ok(());
    }
    if record.medical_history.is_empty() {
        println!("No history entries.");
        return Ok(());
    }
    for entry in &record.medical_history {
        let status = match entry.status {
            bh_types::HistoryStatus::Treated => entry.status.to_string().green(),
            bh_types::HistoryStatus::Ongoing => entry.status.to_string().yellow(),
        };
        println!("{}  {:<24} {}", entry.diagnosed_date, entry.disease.bold(), status);
    }
    Ok(())
}

async fn cmd_show(
    orchestrator: &RecordOrchestrator,
    args: ReadArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let record = read_record(orchestrator, &args).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }
    let profile = &record.profile;
    println!("{}", profile.name.bold());
    let fields = [
        ("Email", profile.email.clone()),
        ("Phone", profile.phone.clone()),
        ("Gender", profile.gender.clone()),
        ("Born", profile.date_of_birth.map(|d| d.to_string())),
        ("Blood group", profile.blood_group.clone()),
        ("Address", profile.address.clone()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {label}: {value}");
        }
    }
    println!("  History: {} entries", record.medical_history.len());
    Ok(())
}

async fn cmd_pointer(
    data_dir: &Path,
    config: &CliConfig,
    key_path: &Path,
    args: PointerArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let identity = match parse_patient(args.patient.as_deref())? {
        Some(identity) => identity,
        None => load_key(key_path).await?.identity(),
    };
    let ledger = open_ledger(data_dir, config).await?;
    let pointer = ledger.resolve(&identity).await?;
    let trail = if args.trail { ledger.history(&identity).await? } else { Vec::new() };

    if format == OutputFormat::Json {
        let value = serde_json::json!({
            "identity": identity,
            "pointer": pointer,
            "trail": trail,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    println!("{} -> {}", identity.short_id().cyan(), pointer.to_hex().yellow());
    for update in &trail {
        let previous = update
            .previous
            .map(|p| p.short_hex())
            .unwrap_or_else(|| "(none)".into());
        println!("  #{:<4} {} <- {}", update.seq, update.address.short_hex().yellow(), previous.dimmed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    async fn run(dir: &Path, args: &[&str]) -> anyhow::Result<()> {
        let data_dir = dir.to_str().unwrap();
        let mut argv = vec!["bh", "--data-dir", data_dir];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv)?).await
    }

    #[tokio::test]
    async fn register_add_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["keygen"]).await.unwrap();
        assert!(run(dir.path(), &["keygen"]).await.is_err());
        run(dir.path(), &["register", "Asha Rao", "--blood-group", "O+"]).await.unwrap();
        run(dir.path(), &["add", "--disease", "flu", "--date", "2024-01-15", "--status", "treated"])
            .await
            .unwrap();
        run(dir.path(), &["history"]).await.unwrap();
        run(dir.path(), &["pointer", "--trail", "--format", "json"]).await.unwrap();

        let err = run(dir.path(), &["register", "Someone Else"]).await.unwrap_err();
        assert!(err.to_string().contains("already registered"), "{err}");

        let key = load_key(&dir.path().join("key")).await.unwrap();
        let ledger = open_ledger(dir.path(), &CliConfig::default()).await.unwrap();
        assert_eq!(ledger.history(&key.identity()).await.unwrap().len(), 2);

        let orchestrator = open_orchestrator(dir.path(), &CliConfig::default(), &dir.path().join("key"))
            .await
            .unwrap();
        let record = orchestrator.read(None).await.unwrap();
        assert_eq!(record.profile.blood_group.as_deref(), Some("O+"));
        assert_eq!(record.medical_history[0].disease, "flu");
    }

    #[tokio::test]
    async fn incomplete_entry_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["keygen"]).await.unwrap();
        run(dir.path(), &["register", "Asha Rao"]).await.unwrap();
        let err = run(dir.path(), &["add", "--disease", "flu"]).await.unwrap_err();
        assert!(err.to_string().contains("Editing"), "{err}");
    }

    #[tokio::test]
    async fn missing_key_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(dir.path(), &["whoami"]).await.unwrap_err();
        assert!(err.to_string().contains("bh keygen"), "{err}");
    }

    #[test]
    fn patient_identity_parsing() {
        let id = Identity::from_raw([0xab; 32]);
        assert_eq!(parse_patient(Some(&id.to_hex())).unwrap(), Some(id));
        assert_eq!(parse_patient(None).unwrap(), None);
        assert!(parse_patient(Some("pt:nothex")).is_err());
    }
}
