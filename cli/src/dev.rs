//! Seeded in-memory ledger for `dumblyd --dev`
//!
//! Creates the asset, the treasury, the three distribution sinks and one
//! market, deploys the tax program and replays a few taxed sells so the
//! treasury has something to distribute.

use dumbly_core::{
    AccountRole, Address, AssetId, LedgerError, LedgerGateway, LedgerResult, TaxRate, ASSET_DECIMALS,
    ASSET_UNIT_NAME, TOTAL_SUPPLY,
};
use dumbly_crypto::KeyPair;
use dumbly_ledger::InMemoryLedger;
use dumbly_program::{ProgramSetup, SellOrder, SellPolicy};
use std::sync::Arc;
use treasury::DistributionTargets;

pub struct DevLedger {
    pub ledger: Arc<InMemoryLedger>,
    pub asset_id: AssetId,
    pub program_id: u64,
    pub treasury: KeyPair,
    pub targets: DistributionTargets,
}

pub async fn seed_dev_ledger(sells: &[u64]) -> LedgerResult<DevLedger> {
    let ledger = Arc::new(InMemoryLedger::new());
    let admin = KeyPair::generate();
    let treasury = KeyPair::generate();
    let market = KeyPair::generate();
    let seller = KeyPair::generate();
    let sinks = [KeyPair::generate(), KeyPair::generate(), KeyPair::generate()];

    let asset_id = ledger
        .create_asset(&Address::of(&admin), TOTAL_SUPPLY, ASSET_DECIMALS, ASSET_UNIT_NAME)
        .await;
    for account in [&treasury, &market, &seller].into_iter().chain(sinks.iter()) {
        ledger.opt_in(account, asset_id).await?;
    }

    let targets = DistributionTargets {
        burn: Address::of(&sinks[0]),
        lp: Address::of(&sinks[1]),
        rewards: Address::of(&sinks[2]),
    };
    let policy = SellPolicy::new(asset_id, Address::of(&treasury))
        .with_market(Address::of(&market))
        .with_role(targets.burn.clone(), AccountRole::Burn)
        .with_role(targets.lp.clone(), AccountRole::Lp)
        .with_role(targets.rewards.clone(), AccountRole::Rewards);
    let program_id = ledger
        .deploy_tax_program(
            &Address::of(&admin),
            ProgramSetup {
                rate: TaxRate::default(),
                policy,
            },
        )
        .await?;
    let config = ledger
        .program_config(program_id)
        .await
        .ok_or_else(|| LedgerError::Malformed("tax program not initialized".to_string()))?;

    let total: u64 = sells.iter().sum();
    ledger
        .transfer(&admin, &Address::of(&seller), asset_id, total)
        .await?;

    for (nonce, amount) in sells.iter().enumerate() {
        let signed = SellOrder::new(Address::of(&seller), Address::of(&market), *amount)
            .build_group(&config, program_id, nonce as u64)
            .and_then(|group| group.sign(&[&seller]).map_err(Into::into))
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;
        ledger.submit_group(&signed).await?;
    }

    let balance = ledger
        .account_balance(&Address::of(&treasury), asset_id)
        .await?;
    tracing::info!(
        asset_id,
        program_id,
        treasury = %Address::of(&treasury),
        treasury_balance = balance,
        "dev ledger seeded"
    );

    Ok(DevLedger {
        ledger,
        asset_id,
        program_id,
        treasury,
        targets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_treasury_holds_tax() {
        let dev = seed_dev_ledger(&[1_000, 2_000, 55]).await.unwrap();
        let balance = dev
            .ledger
            .account_balance(&Address::of(&dev.treasury), dev.asset_id)
            .await
            .unwrap();
        // 90 + 180 + 4
        assert_eq!(balance, 274);

        for sink in [&dev.targets.burn, &dev.targets.lp, &dev.targets.rewards] {
            assert!(dev.ledger.is_opted_in(sink, dev.asset_id).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_no_sells() {
        let dev = seed_dev_ledger(&[]).await.unwrap();
        let balance = dev
            .ledger
            .account_balance(&Address::of(&dev.treasury), dev.asset_id)
            .await
            .unwrap();
        assert_eq!(balance, 0);
    }
}
