//! Transfer Classifier
//!
//! A sell is a transfer of the taxed asset from an ordinary participant to
//! a registered market address. Everything else is exempt: opt-ins,
//! treasury movements, tax legs, distribution sinks and plain
//! participant-to-participant transfers.

use crate::error::ClassificationError;
use dumbly_core::{AccountRole, Address, Amount, AssetId, TransferIntent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExemptReason {
    ZeroAmount,
    /// Paying the treasury; taxing it would tax the tax
    TaxLeg,
    TreasuryMovement,
    NotASell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Taxable,
    Exempt(ExemptReason),
}

impl Classification {
    pub fn is_taxable(&self) -> bool {
        matches!(self, Classification::Taxable)
    }
}

/// Role-level view of one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferShape {
    pub sender_role: AccountRole,
    pub receiver_role: AccountRole,
    pub amount: Amount,
}

impl TransferShape {
    /// The single place that says what a sell looks like
    pub fn classify(&self) -> Classification {
        if self.amount == 0 {
            return Classification::Exempt(ExemptReason::ZeroAmount);
        }
        if self.receiver_role == AccountRole::Treasury {
            return Classification::Exempt(ExemptReason::TaxLeg);
        }
        if self.sender_role == AccountRole::Treasury {
            return Classification::Exempt(ExemptReason::TreasuryMovement);
        }
        if self.sender_role == AccountRole::Participant && self.receiver_role == AccountRole::Market
        {
            return Classification::Taxable;
        }
        Classification::Exempt(ExemptReason::NotASell)
    }
}

/// Account roles known to the program; unknown addresses are participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellPolicy {
    asset_id: AssetId,
    treasury: Address,
    roles: BTreeMap<Address, AccountRole>,
}

impl SellPolicy {
    pub fn new(asset_id: AssetId, treasury: Address) -> Self {
        let mut roles = BTreeMap::new();
        roles.insert(treasury.clone(), AccountRole::Treasury);
        Self {
            asset_id,
            treasury,
            roles,
        }
    }

    /// Register a sell destination. An address keeps the first role it was given.
    pub fn with_market(self, market: Address) -> Self {
        self.with_role(market, AccountRole::Market)
    }

    pub fn with_role(mut self, address: Address, role: AccountRole) -> Self {
        self.roles.entry(address).or_insert(role);
        self
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    pub fn treasury(&self) -> &Address {
        &self.treasury
    }

    pub fn role_of(&self, address: &Address) -> AccountRole {
        self.roles
            .get(address)
            .copied()
            .unwrap_or(AccountRole::Participant)
    }

    pub fn markets(&self) -> impl Iterator<Item = &Address> {
        self.roles
            .iter()
            .filter(|(_, role)| **role == AccountRole::Market)
            .map(|(address, _)| address)
    }

    pub fn shape_of(&self, intent: &TransferIntent) -> TransferShape {
        TransferShape {
            sender_role: self.role_of(&intent.sender),
            receiver_role: self.role_of(&intent.receiver),
            amount: intent.amount,
        }
    }

    pub fn classify(&self, intent: &TransferIntent) -> Result<Classification, ClassificationError> {
        if intent.asset_id != self.asset_id {
            return Err(ClassificationError::ForeignAsset {
                expected: self.asset_id,
                found: intent.asset_id,
            });
        }
        Ok(self.shape_of(intent).classify())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dumbly_crypto::KeyPair;

    const ASSET: AssetId = 42;

    struct Fixture {
        policy: SellPolicy,
        treasury: Address,
        market: Address,
        lp: Address,
        alice: Address,
        bob: Address,
    }

    fn fixture() -> Fixture {
        let treasury = Address::of(&KeyPair::generate());
        let market = Address::of(&KeyPair::generate());
        let lp = Address::of(&KeyPair::generate());
        let policy = SellPolicy::new(ASSET, treasury.clone())
            .with_market(market.clone())
            .with_role(lp.clone(), AccountRole::Lp);
        Fixture {
            policy,
            treasury,
            market,
            lp,
            alice: Address::of(&KeyPair::generate()),
            bob: Address::of(&KeyPair::generate()),
        }
    }

    fn intent(sender: &Address, receiver: &Address, amount: Amount) -> TransferIntent {
        TransferIntent {
            sender: sender.clone(),
            receiver: receiver.clone(),
            asset_id: ASSET,
            amount,
        }
    }

    #[test]
    fn test_participant_to_market_is_taxable() {
        let f = fixture();
        let result = f.policy.classify(&intent(&f.alice, &f.market, 1000)).unwrap();
        assert_eq!(result, Classification::Taxable);
    }

    #[test]
    fn test_exempt_shapes() {
        let f = fixture();
        let cases = [
            (intent(&f.alice, &f.market, 0), ExemptReason::ZeroAmount),
            (intent(&f.alice, &f.alice, 0), ExemptReason::ZeroAmount),
            (intent(&f.alice, &f.treasury, 90), ExemptReason::TaxLeg),
            (intent(&f.treasury, &f.lp, 500), ExemptReason::TreasuryMovement),
            (intent(&f.treasury, &f.market, 500), ExemptReason::TreasuryMovement),
            (intent(&f.alice, &f.bob, 1000), ExemptReason::NotASell),
            (intent(&f.lp, &f.market, 1000), ExemptReason::NotASell),
            (intent(&f.market, &f.alice, 1000), ExemptReason::NotASell),
        ];

        for (intent, reason) in cases {
            assert_eq!(
                f.policy.classify(&intent).unwrap(),
                Classification::Exempt(reason),
                "{:?}",
                intent
            );
        }
    }

    #[test]
    fn test_foreign_asset_is_an_error() {
        let f = fixture();
        let mut foreign = intent(&f.alice, &f.market, 1000);
        foreign.asset_id = ASSET + 1;
        assert_eq!(
            f.policy.classify(&foreign),
            Err(ClassificationError::ForeignAsset {
                expected: ASSET,
                found: ASSET + 1
            })
        );
    }

    #[test]
    fn test_classification_is_stable() {
        let f = fixture();
        let sell = intent(&f.alice, &f.market, 777);
        let first = f.policy.classify(&sell).unwrap();
        for _ in 0..100 {
            assert_eq!(f.policy.classify(&sell).unwrap(), first);
        }
    }

    #[test]
    fn test_treasury_role_cannot_be_overwritten() {
        let f = fixture();
        let policy = f.policy.with_market(f.treasury.clone());
        assert_eq!(policy.role_of(&f.treasury), AccountRole::Treasury);
        assert_eq!(policy.markets().count(), 1);
    }

    #[test]
    fn test_unknown_address_is_participant() {
        let f = fixture();
        assert_eq!(f.policy.role_of(&f.bob), AccountRole::Participant);
    }
}
