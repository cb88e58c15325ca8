use anyhow::Context;
use clap::Parser;
use teamcal_app::cli::{Cli, Command, FeedArgs};
use teamcal_app::commands::Workbench;
use teamcal_core::config::load_config;
use teamcal_core::context::UserContext;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config().context("loading configuration")?;

    tracing::debug!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping info");
    }

    let ctx = match cli.timezone {
        Some(zone) => UserContext::new(zone),
        None => config
            .calendar
            .default_context()
            .context("resolving calendar.timezone")?,
    };
    let bench = Workbench::new(&config.calendar, ctx);

    match cli.command {
        Command::Import(feeds) => {
            let reports = import_all(&bench, &feeds).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Command::List {
            feeds,
            from,
            to,
            expand,
        } => {
            import_all(&bench, &feeds).await?;
            let events = bench.list(feeds.calendar, from, to, expand).await?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        Command::Export { feeds, itip_method } => {
            import_all(&bench, &feeds).await?;
            print!("{}", bench.export(itip_method.as_deref()).await);
        }
        Command::Recurrence(feeds) => {
            import_all(&bench, &feeds).await?;
            println!("{}", serde_json::to_string_pretty(&bench.recurrences().await)?);
        }
    }

    Ok(())
}

async fn import_all(
    bench: &Workbench,
    feeds: &FeedArgs,
) -> anyhow::Result<Vec<teamcal_app::commands::ImportReport>> {
    let mut reports = Vec::with_capacity(feeds.files.len());
    for path in &feeds.files {
        let report = bench
            .import_file(
                path,
                feeds.calendar,
                feeds.method.map(Into::into),
                feeds.ignore_warnings,
            )
            .await?;
        for problem in &report.problems {
            tracing::warn!(file = %report.file, problem = %problem, "Import problem");
        }
        tracing::info!(file = %report.file, summary = ?report.summary, "Feed imported");
        reports.push(report);
    }
    Ok(reports)
}
