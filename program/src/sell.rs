//! Construction side of a sell
//!
//! Builds groups with the same split the program recomputes, so a group
//! built here is accepted as long as the configuration matches.

use crate::classifier::Classification;
use crate::error::ProgramResult;
use crate::program::ProgramConfig;
use dumbly_core::{Address, Amount, ProgramId, Transaction, TransactionGroup, TransferIntent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellOrder {
    pub seller: Address,
    pub receiver: Address,
    /// Gross amount leaving the seller
    pub amount: Amount,
}

impl SellOrder {
    pub fn new(seller: Address, receiver: Address, amount: Amount) -> Self {
        Self {
            seller,
            receiver,
            amount,
        }
    }

    pub fn intent(&self, config: &ProgramConfig) -> TransferIntent {
        TransferIntent {
            sender: self.seller.clone(),
            receiver: self.receiver.clone(),
            asset_id: config.policy.asset_id(),
            amount: self.amount,
        }
    }

    /// Net transfer, tax transfer to the treasury when taxable, then the
    /// program call declaring the gross amount. `nonce` seeds the member nonces.
    pub fn build_group(
        &self,
        config: &ProgramConfig,
        program_id: ProgramId,
        nonce: u64,
    ) -> ProgramResult<TransactionGroup> {
        let asset_id = config.policy.asset_id();
        let classification = config.policy.classify(&self.intent(config))?;

        let mut members = Vec::with_capacity(3);
        match classification {
            Classification::Taxable => {
                let split = config.rate.split(self.amount);
                members.push(Transaction::asset_transfer(
                    self.seller.clone(),
                    self.receiver.clone(),
                    asset_id,
                    split.net,
                    nonce,
                ));
                members.push(Transaction::asset_transfer(
                    self.seller.clone(),
                    config.treasury().clone(),
                    asset_id,
                    split.tax,
                    nonce.wrapping_add(1),
                ));
            }
            Classification::Exempt(_) => {
                members.push(Transaction::asset_transfer(
                    self.seller.clone(),
                    self.receiver.clone(),
                    asset_id,
                    self.amount,
                    nonce,
                ));
            }
        }
        members.push(Transaction::program_call(
            self.seller.clone(),
            program_id,
            self.amount,
            nonce.wrapping_add(2),
        ));

        Ok(TransactionGroup::new(members)?)
    }
}
