//! Tax Enforcement Program
//!
//! `Uninitialized -> Active` on the setup call, then `Active` for good.
//! Each evaluation is a pure function of the configuration and the group.

use crate::classifier::{Classification, SellPolicy};
use crate::error::{ProgramError, ProgramResult, TaxMismatch};
use dumbly_core::{
    Address, AssetTransfer, ProgramId, TaxRate, TaxSplit, TransactionGroup, TransferIntent, TxKind,
};
use serde::{Deserialize, Serialize};

/// Arguments of the one-time setup call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSetup {
    pub rate: TaxRate,
    pub policy: SellPolicy,
}

/// Configuration recorded at setup; immutable afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub admin: Address,
    pub rate: TaxRate,
    pub policy: SellPolicy,
}

impl ProgramConfig {
    pub fn treasury(&self) -> &Address {
        self.policy.treasury()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramState {
    Uninitialized,
    Active(ProgramConfig),
}

/// Outcome of an approved evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub classification: Classification,
    /// Present for taxable groups
    pub split: Option<TaxSplit>,
}

#[derive(Debug, Clone)]
pub struct TaxProgram {
    id: ProgramId,
    state: ProgramState,
}

impl TaxProgram {
    pub fn new(id: ProgramId) -> Self {
        Self {
            id,
            state: ProgramState::Uninitialized,
        }
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn state(&self) -> &ProgramState {
        &self.state
    }

    pub fn config(&self) -> Option<&ProgramConfig> {
        match &self.state {
            ProgramState::Active(config) => Some(config),
            ProgramState::Uninitialized => None,
        }
    }

    /// Record the creator as admin along with treasury, rate and sell policy
    pub fn initialize(&mut self, creator: Address, setup: ProgramSetup) -> ProgramResult<&ProgramConfig> {
        if let ProgramState::Active(_) = self.state {
            return Err(ProgramError::AlreadyInitialized);
        }
        if setup.policy.markets().next().is_none() {
            return Err(ProgramError::InvalidSetup(
                "no market addresses registered".to_string(),
            ));
        }

        self.state = ProgramState::Active(ProgramConfig {
            admin: creator,
            rate: setup.rate,
            policy: setup.policy,
        });

        match &self.state {
            ProgramState::Active(config) => Ok(config),
            ProgramState::Uninitialized => Err(ProgramError::NotInitialized),
        }
    }

    /// Approve or reject a group that calls this program.
    ///
    /// Every transfer of the taxed asset is classified on the amount it
    /// actually moves, in any order. At most one may be a sell; its gross
    /// amount is the `declared_amount` of the call and it must deliver
    /// exactly `net`. The only other transfer allowed next to a sell is the
    /// tax leg of exactly `tax` from the seller to the treasury. A zero tax
    /// needs no tax leg.
    pub fn evaluate(&self, group: &TransactionGroup) -> ProgramResult<Approval> {
        let config = self.config().ok_or(ProgramError::NotInitialized)?;

        let declared_amount = self.declared_amount(group)?;

        let transfers: Vec<AssetTransfer<'_>> = group.transfers().collect();
        match transfers.len() {
            0 => {
                return Err(ProgramError::MalformedGroup(
                    "no asset transfer".to_string(),
                ))
            }
            1 | 2 => {}
            _ => {
                return Err(ProgramError::MalformedGroup(
                    "more than two asset transfers".to_string(),
                ))
            }
        }

        let asset_id = config.policy.asset_id();
        let mut sells = Vec::with_capacity(1);
        let mut first_exempt = None;
        for (index, transfer) in transfers.iter().enumerate() {
            if transfer.asset_id != asset_id {
                continue;
            }
            match config.policy.classify(&intent_of(transfer))? {
                Classification::Taxable => sells.push(index),
                exempt => {
                    first_exempt.get_or_insert(exempt);
                }
            }
        }

        let sell_index = match sells.as_slice() {
            [] => {
                // only foreign transfers left: classifying one reports it
                let classification = match first_exempt {
                    Some(classification) => classification,
                    None => config.policy.classify(&intent_of(&transfers[0]))?,
                };
                return Ok(Approval {
                    classification,
                    split: None,
                });
            }
            [index] => *index,
            _ => {
                return Err(ProgramError::MalformedGroup(
                    "more than one sell in group".to_string(),
                ))
            }
        };

        let sell = &transfers[sell_index];
        let split = config.rate.split(declared_amount);
        if sell.amount != split.net {
            return Err(TaxMismatch::NetAmount {
                expected: split.net,
                found: sell.amount,
            }
            .into());
        }

        let companion = transfers
            .iter()
            .enumerate()
            .find(|(index, _)| *index != sell_index)
            .map(|(_, leg)| leg);
        match companion {
            Some(leg) => Self::check_tax_leg(config, sell, leg, split)?,
            None if split.tax == 0 => {}
            None => return Err(TaxMismatch::MissingTaxLeg { expected: split.tax }.into()),
        }

        Ok(Approval {
            classification: Classification::Taxable,
            split: Some(split),
        })
    }

    /// Screen a group that moves this program's asset without calling it.
    /// Only exempt transfers may skip the program; an uninitialized program
    /// guards nothing.
    pub fn screen_uncalled(&self, group: &TransactionGroup) -> ProgramResult<()> {
        let Some(config) = self.config() else {
            return Ok(());
        };

        let asset_id = config.policy.asset_id();
        for transfer in group.transfers().filter(|t| t.asset_id == asset_id) {
            if config.policy.classify(&intent_of(&transfer))?.is_taxable() {
                return Err(ProgramError::MissingCall(self.id));
            }
        }
        Ok(())
    }

    fn declared_amount(&self, group: &TransactionGroup) -> ProgramResult<u64> {
        let mut calls = group.transactions().iter().filter_map(|tx| match tx.kind {
            TxKind::ProgramCall {
                program_id,
                declared_amount,
            } if program_id == self.id => Some(declared_amount),
            _ => None,
        });

        match (calls.next(), calls.next()) {
            (Some(amount), None) => Ok(amount),
            (None, _) => Err(ProgramError::MalformedGroup(format!(
                "no call to program {}",
                self.id
            ))),
            (Some(_), Some(_)) => Err(ProgramError::MalformedGroup(format!(
                "more than one call to program {}",
                self.id
            ))),
        }
    }

    fn check_tax_leg(
        config: &ProgramConfig,
        outer: &AssetTransfer<'_>,
        leg: &AssetTransfer<'_>,
        split: TaxSplit,
    ) -> Result<(), TaxMismatch> {
        if leg.receiver != config.treasury() {
            return Err(TaxMismatch::WrongRecipient {
                found: leg.receiver.clone(),
            });
        }
        if leg.asset_id != config.policy.asset_id() {
            return Err(TaxMismatch::WrongAsset {
                expected: config.policy.asset_id(),
                found: leg.asset_id,
            });
        }
        if leg.sender != outer.sender {
            return Err(TaxMismatch::WrongPayer {
                expected: outer.sender.clone(),
                found: leg.sender.clone(),
            });
        }
        if leg.amount != split.tax {
            return Err(TaxMismatch::TaxAmount {
                expected: split.tax,
                found: leg.amount,
            });
        }
        Ok(())
    }
}

fn intent_of(transfer: &AssetTransfer<'_>) -> TransferIntent {
    TransferIntent {
        sender: transfer.sender.clone(),
        receiver: transfer.receiver.clone(),
        asset_id: transfer.asset_id,
        amount: transfer.amount,
    }
}
