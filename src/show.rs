use crate::ShowArgs;
use anyhow::Context;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use configuration::Config;
use storage::HistoryRepository;

/// Prints one agent's NAV history, oldest point first.
pub async fn handle_show(args: ShowArgs, config: &Config) -> anyhow::Result<()> {
    let repo = HistoryRepository::new(&config.storage.data_dir);
    let record = repo
        .load(&args.agent)
        .await?
        .with_context(|| format!("no history recorded for agent '{}'", args.agent))?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Date", "NAV", "Valuation", "PnL", "Drawdown %"]);

    for point in record.live_data.points() {
        table.add_row(vec![
            Cell::new(point.date),
            Cell::new(point.nav).set_alignment(CellAlignment::Right),
            Cell::new(point.valuation.round_dp(2)).set_alignment(CellAlignment::Right),
            Cell::new(
                point
                    .pnl
                    .map(|pnl| pnl.round_dp(2).to_string())
                    .unwrap_or_else(|| "-".to_string()),
            )
            .set_alignment(CellAlignment::Right),
            Cell::new(point.drawdown.round_dp(2)).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}", table);
    println!(
        "{}: {} points, last valuation {}, status {}",
        args.agent,
        record.live_data.len(),
        record.tvl.round_dp(2),
        record.status
    );
    Ok(())
}
