use crate::VenueSnapshot;
use core_types::AgentStatus;
use rust_decimal::Decimal;
use serde::Deserialize;

// Both venues send numbers as JSON strings ("1523.42"). `Decimal`'s default
// deserializer accepts strings and numbers alike.

/// The response from `GET /account?by=index&value=<index>` on Lighter.
#[derive(Debug, Clone, Deserialize)]
pub struct LighterAccountsResponse {
    #[serde(default)]
    pub accounts: Vec<LighterAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LighterAccount {
    #[serde(default)]
    pub collateral: Decimal,
    /// 1 when the account is active.
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub positions: Vec<LighterPosition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LighterPosition {
    #[serde(default)]
    pub unrealized_pnl: Decimal,
    #[serde(default)]
    pub realized_pnl: Decimal,
}

impl LighterAccount {
    pub fn into_snapshot(self) -> VenueSnapshot {
        let pnl = self
            .positions
            .iter()
            .map(|p| p.unrealized_pnl + p.realized_pnl)
            .sum();
        let status = if self.status == 1 || !self.positions.is_empty() {
            AgentStatus::Live
        } else {
            AgentStatus::Offline
        };

        VenueSnapshot {
            valuation: self.collateral,
            pnl: Some(pnl),
            status,
            positions: self.positions.len(),
        }
    }
}

/// The `clearinghouseState` response from Hyperliquid's info endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearinghouseState {
    pub margin_summary: MarginSummary,
    #[serde(default)]
    pub asset_positions: Vec<AssetPosition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginSummary {
    pub account_value: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetPosition {
    pub position: HyperliquidPosition,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HyperliquidPosition {
    pub coin: String,
    /// Signed position size. Zero for a closed position.
    #[serde(default)]
    pub szi: Decimal,
    #[serde(default)]
    pub unrealized_pnl: Decimal,
}

impl ClearinghouseState {
    pub fn into_snapshot(self) -> VenueSnapshot {
        let active: Vec<&HyperliquidPosition> = self
            .asset_positions
            .iter()
            .map(|p| &p.position)
            .filter(|p| !p.szi.is_zero())
            .collect();

        let pnl = active.iter().map(|p| p.unrealized_pnl).sum();
        let valuation = self.margin_summary.account_value;
        let status = if valuation > Decimal::ZERO || !active.is_empty() {
            AgentStatus::Live
        } else {
            AgentStatus::Offline
        };

        VenueSnapshot {
            valuation,
            pnl: Some(pnl),
            status,
            positions: active.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lighter_account_snapshot() {
        let body = r#"{
            "code": 200,
            "total": 1,
            "accounts": [{
                "index": 505549,
                "status": 0,
                "collateral": "15234.118",
                "positions": [
                    {"symbol": "ETH", "unrealized_pnl": "120.5", "realized_pnl": "-20.25", "position_value": "9000"},
                    {"symbol": "BTC", "unrealized_pnl": "-10", "realized_pnl": "4.75", "position_value": "3100"}
                ]
            }]
        }"#;
        let response: LighterAccountsResponse = serde_json::from_str(body).unwrap();
        let snapshot = response.accounts.into_iter().next().unwrap().into_snapshot();

        assert_eq!(snapshot.valuation, dec!(15234.118));
        assert_eq!(snapshot.pnl, Some(dec!(95)));
        // Inactive status flag, but open positions keep it live.
        assert_eq!(snapshot.status, AgentStatus::Live);
        assert_eq!(snapshot.positions, 2);
    }

    #[test]
    fn test_idle_lighter_account_is_offline() {
        let body = r#"{"accounts": [{"status": 0, "collateral": "0", "positions": []}]}"#;
        let response: LighterAccountsResponse = serde_json::from_str(body).unwrap();
        let snapshot = response.accounts[0].clone().into_snapshot();

        assert_eq!(snapshot.status, AgentStatus::Offline);
        assert_eq!(snapshot.pnl, Some(Decimal::ZERO));
    }

    #[test]
    fn test_clearinghouse_state_snapshot() {
        let body = r#"{
            "marginSummary": {"accountValue": "48211.07", "totalNtlPos": "90000.0", "totalRawUsd": "-41788.9"},
            "assetPositions": [
                {"type": "oneWay", "position": {"coin": "BTC", "szi": "0.75", "unrealizedPnl": "812.4"}},
                {"type": "oneWay", "position": {"coin": "SOL", "szi": "-120.0", "unrealizedPnl": "-64.1"}},
                {"type": "oneWay", "position": {"coin": "DOGE", "szi": "0.0", "unrealizedPnl": "999"}}
            ],
            "withdrawable": "12000.0"
        }"#;
        let state: ClearinghouseState = serde_json::from_str(body).unwrap();
        let snapshot = state.into_snapshot();

        assert_eq!(snapshot.valuation, dec!(48211.07));
        // The closed DOGE position does not count.
        assert_eq!(snapshot.pnl, Some(dec!(748.3)));
        assert_eq!(snapshot.positions, 2);
        assert_eq!(snapshot.status, AgentStatus::Live);
    }

    #[test]
    fn test_empty_hyperliquid_wallet_is_offline() {
        let body = r#"{"marginSummary": {"accountValue": "0.0"}, "assetPositions": []}"#;
        let state: ClearinghouseState = serde_json::from_str(body).unwrap();
        let snapshot = state.into_snapshot();

        assert_eq!(snapshot.valuation, Decimal::ZERO);
        assert_eq!(snapshot.status, AgentStatus::Offline);
    }
}
