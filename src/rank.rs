use crate::RankArgs;
use analyzer::{AgentNavs, Analyzer, RankedAgent, SkippedAgent};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use configuration::Config;
use rust_decimal::Decimal;
use storage::{DisplayEntry, HistoryRepository, StorageError, write_display_config};

/// Ranks every configured agent from its persisted history and prints the audit report.
pub async fn handle_rank(args: RankArgs, config: &Config) -> anyhow::Result<()> {
    let repo = HistoryRepository::new(&config.storage.data_dir);

    let mut cohort = Vec::with_capacity(config.agents.len());
    let mut unreadable = Vec::new();

    for agent in &config.agents {
        match repo.load_nav_snapshot(&agent.id).await {
            Ok(navs) => cohort.push(AgentNavs::new(&agent.id, navs)),
            Err(StorageError::MissingAgentData(_)) => {
                tracing::warn!(agent = %agent.id, "No history recorded yet. Skipping.");
            }
            Err(e) => {
                tracing::warn!(agent = %agent.id, error = %e, "History could not be read. Skipping.");
                unreadable.push(SkippedAgent {
                    agent_id: agent.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let mut outcome = Analyzer::new(config.ranking.clone()).rank(&cohort);
    outcome.skipped.extend(unreadable);

    println!("{}", report_table(&outcome.ranked, config.ranking.min_data_points));
    if outcome.ranked.iter().any(|a| a.penalized) {
        println!(
            "* fewer than {} data points: score multiplied by {}",
            config.ranking.min_data_points, config.ranking.new_entrant_penalty
        );
    }
    for skipped in &outcome.skipped {
        println!("skipped {}: {}", skipped.agent_id, skipped.reason);
    }

    if args.write_display_config {
        let entries = display_entries(&outcome.ranked, config);
        write_display_config(&config.storage.display_config_path, &entries).await?;
    }

    Ok(())
}

fn report_table(ranked: &[RankedAgent], min_data_points: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Rank", "Agent", "SRS", "ROI %", "Sortino", "Calmar", "Stability", "Max DD %", "Points",
        ]);

    for agent in ranked {
        let name = if agent.penalized {
            format!("{} *", agent.agent_id)
        } else {
            agent.agent_id.clone()
        };
        let points = if agent.penalized {
            format!("{}/{}", agent.factors.history_length, min_data_points)
        } else {
            agent.factors.history_length.to_string()
        };

        table.add_row(vec![
            Cell::new(agent.rank),
            Cell::new(name),
            Cell::new(agent.srs).set_alignment(CellAlignment::Right),
            Cell::new(percent(agent.factors.roi)).set_alignment(CellAlignment::Right),
            Cell::new(agent.factors.sortino.round_dp(3)).set_alignment(CellAlignment::Right),
            Cell::new(agent.factors.calmar.round_dp(3)).set_alignment(CellAlignment::Right),
            Cell::new(agent.factors.stability.round_dp(1)).set_alignment(CellAlignment::Right),
            Cell::new(percent(agent.factors.max_drawdown)).set_alignment(CellAlignment::Right),
            Cell::new(points).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

fn percent(fraction: Decimal) -> Decimal {
    (fraction * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Joins the ranking with each agent's display metadata. Unconfigured ids cannot occur.
fn display_entries(ranked: &[RankedAgent], config: &Config) -> Vec<DisplayEntry> {
    ranked
        .iter()
        .filter_map(|agent| {
            config.agent(&agent.agent_id).map(|meta| DisplayEntry {
                id: meta.id.clone(),
                name: meta.name.clone(),
                protocol: meta.protocol.clone(),
                color: meta.color.clone(),
                srs: agent.srs,
                rank: agent.rank,
            })
        })
        .collect()
}
