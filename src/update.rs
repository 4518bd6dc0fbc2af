use crate::UpdateArgs;
use anyhow::{Context, bail};
use api_client::build_source;
use chrono::{NaiveDateTime, Utc};
use configuration::{AgentConfig, Config};
use core_types::{AgentRecord, AgentStatus, Observation};
use futures::future::join_all;
use indicatif::ProgressStyle;
use ledger::NavLedger;
use rust_decimal::Decimal;
use storage::HistoryRepository;
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// What one successful agent update recorded.
#[derive(Debug)]
struct UpdateSummary {
    agent_id: String,
    nav: Decimal,
    valuation: Decimal,
    drawdown: Decimal,
    status: AgentStatus,
    points: usize,
}

/// Handles the orchestration of the daily update.
///
/// Agents are updated concurrently, each one independently: a failing venue or a
/// rejected observation is reported and does not stop the others. The command
/// fails if any agent failed.
pub async fn handle_update(args: UpdateArgs, config: &Config) -> anyhow::Result<()> {
    let agents = select_agents(&args, config)?;
    if args.valuation.is_some() && agents.len() != 1 {
        bail!("--valuation applies to a single agent; pass exactly one --agent");
    }

    let observed_at = match args.date {
        Some(date) => date.and_time(Utc::now().time()),
        None => Utc::now().naive_utc(),
    };

    let repo = HistoryRepository::new(&config.storage.data_dir);
    let ledger = NavLedger::new(config.ledger.clone());

    tracing::info!(agents = agents.len(), date = %observed_at.date(), "Starting update.");

    // The bar belongs to a span so the indicatif layer can draw log lines above it.
    let progress_span = tracing::info_span!("update");
    progress_span.pb_set_style(
        &ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    progress_span.pb_set_length(agents.len() as u64);
    progress_span.pb_start();

    // Each future owns a distinct agent, so no two writes target the same file.
    let manual = args.valuation;
    let tasks = agents.iter().map(|agent| {
        let repo = &repo;
        let ledger = &ledger;
        let span = &progress_span;
        async move {
            span.pb_set_message(&format!("Updating {}...", agent.id));
            let result = update_agent(agent, config, repo, ledger, manual, observed_at).await;
            span.pb_inc(1);
            (agent.id.clone(), result)
        }
    });

    let results = join_all(tasks).await;
    drop(progress_span);

    let mut failed = Vec::new();
    for (agent_id, result) in results {
        match result {
            Ok(summary) => tracing::info!(
                agent = %summary.agent_id,
                nav = %summary.nav,
                valuation = %summary.valuation,
                drawdown = %summary.drawdown,
                status = %summary.status,
                points = summary.points,
                "Agent updated."
            ),
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::error!(agent = %agent_id, error = %message, "Agent update failed.");
                failed.push(agent_id);
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} of {} agents failed to update: {}", failed.len(), agents.len(), failed.join(", "));
    }
    Ok(())
}

/// Fetch, ingest, persist. Nothing is written unless every earlier step succeeded.
///
/// The history is the source of truth. The equity curve is derived from it and
/// rewritten on every update, so failing to export it only warns.
async fn update_agent(
    agent: &AgentConfig,
    config: &Config,
    repo: &HistoryRepository,
    ledger: &NavLedger,
    manual: Option<f64>,
    observed_at: NaiveDateTime,
) -> anyhow::Result<UpdateSummary> {
    let source = build_source(agent, &config.api, manual)?;
    let snapshot = source
        .fetch_valuation()
        .await
        .with_context(|| format!("fetching valuation from {}", source.venue()))?;

    let observation =
        Observation::new(&agent.id, snapshot.valuation, observed_at).with_pnl(snapshot.pnl);

    let history = repo
        .load(&agent.id)
        .await?
        .map(|record| record.live_data)
        .unwrap_or_default();

    let updated = ledger.ingest(&history, &observation)?;
    let record = AgentRecord::new(updated, snapshot.valuation, snapshot.status);

    repo.save(&agent.id, &record).await?;
    if let Err(e) = repo.export_equity_curve(&agent.id, &record).await {
        tracing::warn!(agent = %agent.id, error = %e, "Equity curve not exported.");
    }

    let last = record
        .live_data
        .last()
        .context("ledger returned an empty history")?;

    Ok(UpdateSummary {
        agent_id: agent.id.clone(),
        nav: last.nav,
        valuation: snapshot.valuation,
        drawdown: last.drawdown,
        status: snapshot.status,
        points: record.live_data.len(),
    })
}

/// Resolves `--agent` filters against the configuration, keeping config order.
fn select_agents<'a>(args: &UpdateArgs, config: &'a Config) -> anyhow::Result<Vec<&'a AgentConfig>> {
    if args.agents.is_empty() {
        return Ok(config.agents.iter().collect());
    }

    for id in &args.agents {
        if config.agent(id).is_none() {
            bail!("unknown agent '{}'", id);
        }
    }

    Ok(config
        .agents
        .iter()
        .filter(|agent| args.agents.contains(&agent.id))
        .collect())
}
