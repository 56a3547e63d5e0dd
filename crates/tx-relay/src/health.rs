use std::collections::BTreeMap;

use ethers::providers::Middleware;
use ethers::types::U256;
use ethers::utils::{format_ether, parse_ether};
use futures::future::join_all;
use router_relayer_context::RelayerContext;
use router_relayer_utils::Result;
use serde::Serialize;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Every relayer account holds at least its chain's minimum balance.
    pub is_healthy: bool,
    /// Native balance of the relayer account per chain, in whole tokens,
    /// or why it could not be read.
    pub balances: BTreeMap<String, String>,
}

/// Reads the relayer account balance on every enabled chain.
///
/// A chain whose balance cannot be read makes the relayer unhealthy, it
/// does not fail the report.
pub async fn health(ctx: &RelayerContext) -> Result<HealthReport> {
    let chains = ctx.config.chains.values().filter(|c| c.enabled);
    let balances = join_all(chains.map(|c| async move {
        let balance = async {
            let client = ctx.evm_client(&c.name)?;
            Ok::<_, router_relayer_utils::Error>(
                client.get_balance(client.address(), None).await?,
            )
        }
        .await;
        (c.name.clone(), balance, c.min_balance)
    }))
    .await;
    assess(balances)
}

fn assess(balances: Vec<(String, Result<U256>, f64)>) -> Result<HealthReport> {
    let mut is_healthy = true;
    let mut report = BTreeMap::new();
    for (chain, balance, min_balance) in balances {
        let balance = match balance {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(%chain, error = %e, "Failed to read relayer balance");
                is_healthy = false;
                report.insert(chain, format!("unavailable: {e}"));
                continue;
            }
        };
        if balance < parse_ether(min_balance)? {
            tracing::warn!(%chain, %balance, min_balance, "Relayer balance is low");
            is_healthy = false;
        }
        report.insert(chain, format_ether(balance));
    }
    Ok(HealthReport {
        is_healthy,
        balances: report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhealthy_when_any_chain_is_low() {
        let report = assess(vec![
            ("acala".into(), Ok(parse_ether(3).unwrap()), 1.0),
            ("karura".into(), Ok(parse_ether("0.5").unwrap()), 1.0),
        ])
        .unwrap();
        assert!(!report.is_healthy);
        assert_eq!(report.balances["acala"], "3.000000000000000000");
        assert_eq!(report.balances["karura"], "0.500000000000000000");
    }

    #[test]
    fn minimum_is_inclusive() {
        let report =
            assess(vec![("karura".into(), Ok(parse_ether("0.5").unwrap()), 0.5)])
                .unwrap();
        assert!(report.is_healthy);
        let body = serde_json::to_value(&report).unwrap();
        assert_eq!(body["isHealthy"], true);
    }

    #[test]
    fn unreachable_chain_is_unhealthy() {
        let report = assess(vec![
            ("acala".into(), Ok(parse_ether(3).unwrap()), 1.0),
            (
                "karura".into(),
                Err(router_relayer_utils::Error::ChainNotFound {
                    chain_id: "karura".into(),
                }),
                1.0,
            ),
        ])
        .unwrap();
        assert!(!report.is_healthy);
        assert_eq!(report.balances["acala"], "3.000000000000000000");
        assert!(report.balances["karura"].starts_with("unavailable: "));
    }
}
