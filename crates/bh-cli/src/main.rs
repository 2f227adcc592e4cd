use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod config;

/// Crates whose debug events `-v` turns on.
const WORKSPACE_TARGETS: [&str; 7] = [
    "bh",
    "bh_types",
    "bh_crypto",
    "bh_store",
    "bh_ledger",
    "bh_session",
    "bh_records",
];

fn default_filter(verbose: bool) -> String {
    if !verbose {
        return "warn".into();
    }
    let mut directives: Vec<String> =
        WORKSPACE_TARGETS.iter().map(|target| format!("{target}=debug")).collect();
    directives.push("info".into());
    directives.join(",")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    commands::run_command(cli).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_filter_covers_every_workspace_crate() {
        let filter = default_filter(true);
        assert!(EnvFilter::try_new(&filter).is_ok());
        let directives: Vec<&str> = filter.split(',').collect();
        for target in ["bh_store", "bh_ledger", "bh_session", "bh_records"] {
            assert!(directives.contains(&format!("{target}=debug").as_str()), "{filter}");
        }
        assert_eq!(directives.last(), Some(&"info"));
        assert_eq!(default_filter(false), "warn");
    }
}
