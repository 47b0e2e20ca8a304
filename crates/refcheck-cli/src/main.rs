//! # refcheck CLI entry point
//!
//! Parses arguments, assembles settings (environment first, flags on top),
//! runs the validation pipeline, and maps the report to an exit code.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use refcheck_cli::{ExitStatus, OutputFormat, Pipeline, Report, SchemaDraft, Settings};
use refcheck_fetch::config::parse_url;

/// Validate a JSON document against the schema its entity type maps to in
/// a remote schema catalog.
#[derive(Parser, Debug)]
#[command(name = "refcheck", version, about, long_about = None)]
struct Cli {
    /// Input JSON document. Relative paths are looked up in the resource
    /// directory first.
    input: PathBuf,

    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Parent schema URL [env: REFCHECK_CATALOG_URL].
    #[arg(long, value_name = "URL")]
    catalog_url: Option<String>,

    /// Directory input paths are resolved against [env: REFCHECK_RESOURCE_DIR].
    #[arg(long, value_name = "DIR")]
    resource_dir: Option<PathBuf>,

    /// Bound on each schema fetch, in seconds [env: REFCHECK_TIMEOUT_SECS].
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Draft for entity schemas whose `$schema` names no standard draft
    /// [default: 2020-12].
    #[arg(long, value_enum, value_name = "DRAFT")]
    draft: Option<SchemaDraft>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitStatus::Input.into()
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("refcheck v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = match settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("refcheck: {e:#}");
            return ExitStatus::Input.into();
        }
    };

    tracing::debug!(
        catalog = %settings.fetch.catalog_url,
        resource_dir = %settings.resource_dir.display(),
        timeout = ?settings.fetch.timeout,
        draft = ?settings.draft,
        "resolved settings"
    );

    match run(&cli, &settings) {
        Ok(report) => {
            emit(&report, cli.format);
            report.exit_status().into()
        }
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("refcheck: {e:#}");
            ExitStatus::Infrastructure.into()
        }
    }
}

/// Environment settings with command-line overrides applied.
fn settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = Settings::from_env().context("invalid environment configuration")?;
    if let Some(raw) = &cli.catalog_url {
        settings.fetch.catalog_url = parse_url("--catalog-url", raw)?;
    }
    if let Some(dir) = &cli.resource_dir {
        settings.resource_dir = dir.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        settings.fetch.timeout = Duration::from_secs(secs);
    }
    if let Some(draft) = cli.draft {
        settings.draft = draft.into();
    }
    Ok(settings)
}

fn run(cli: &Cli, settings: &Settings) -> anyhow::Result<Report> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let pipeline = Pipeline::new(settings).context("failed to build schema fetcher")?;
    Ok(runtime.block_on(pipeline.run(&cli.input)))
}

fn emit(report: &Report, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", report.to_json()),
        OutputFormat::Text if report.error().is_some() => eprintln!("{}", report.render_text()),
        OutputFormat::Text => println!("{}", report.render_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parse_single_input() {
        let cli = Cli::try_parse_from(["refcheck", "invoice.json"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("invoice.json"));
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.catalog_url.is_none());
        assert!(cli.draft.is_none());
    }

    #[test]
    fn cli_parse_rejects_missing_input() {
        let err = Cli::try_parse_from(["refcheck"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.use_stderr());
    }

    #[test]
    fn cli_parse_rejects_second_input() {
        let err = Cli::try_parse_from(["refcheck", "a.json", "b.json"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn cli_parse_overrides() {
        let cli = Cli::try_parse_from([
            "refcheck",
            "-vv",
            "--catalog-url",
            "http://127.0.0.1:8080/catalog.json",
            "--resource-dir",
            "fixtures",
            "--timeout-secs",
            "2",
            "--format",
            "json",
            "--draft",
            "7",
            "order.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.resource_dir, Some(PathBuf::from("fixtures")));
        assert_eq!(cli.timeout_secs, Some(2));
        assert_eq!(cli.format, OutputFormat::Json);

        let settings = settings(&cli).unwrap();
        assert_eq!(
            settings.fetch.catalog_url.as_str(),
            "http://127.0.0.1:8080/catalog.json"
        );
        assert_eq!(settings.resource_dir, PathBuf::from("fixtures"));
        assert_eq!(settings.fetch.timeout, Duration::from_secs(2));
        assert_eq!(settings.draft, refcheck_schema::Draft::Draft7);
    }

    #[test]
    fn invalid_catalog_url_flag_is_rejected() {
        let cli =
            Cli::try_parse_from(["refcheck", "--catalog-url", "not a url", "x.json"]).unwrap();
        let err = settings(&cli).unwrap_err();
        assert!(err.to_string().contains("--catalog-url"));
    }
}
