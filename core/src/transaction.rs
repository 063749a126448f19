//! Transactions and atomic transaction groups
//!
//! A [`TransactionGroup`] is the unit of settlement: the ledger commits
//! every member or none of them.

use crate::constants::MAX_GROUP_SIZE;
use crate::error::{CoreError, Result};
use crate::types::{Address, Amount, AssetId, GroupId, ProgramId, TxId};
use dumbly_crypto::{hash_sha256, KeyPair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    /// Move `amount` of an asset. A zero-amount transfer to oneself is an opt-in.
    AssetTransfer {
        receiver: Address,
        asset_id: AssetId,
        amount: Amount,
    },
    /// Invoke a deployed program. `declared_amount` is the gross sell amount.
    ProgramCall {
        program_id: ProgramId,
        declared_amount: Amount,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Address,
    pub kind: TxKind,
    /// Distinguishes otherwise identical transactions
    pub nonce: u64,
    pub group: Option<GroupId>,
}

/// Borrowed view of an asset transfer member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetTransfer<'a> {
    pub sender: &'a Address,
    pub receiver: &'a Address,
    pub asset_id: AssetId,
    pub amount: Amount,
}

impl AssetTransfer<'_> {
    pub fn is_opt_in(&self) -> bool {
        self.sender == self.receiver && self.amount == 0
    }
}

impl Transaction {
    pub fn asset_transfer(
        sender: Address,
        receiver: Address,
        asset_id: AssetId,
        amount: Amount,
        nonce: u64,
    ) -> Self {
        Self {
            sender,
            kind: TxKind::AssetTransfer {
                receiver,
                asset_id,
                amount,
            },
            nonce,
            group: None,
        }
    }

    pub fn opt_in(account: Address, asset_id: AssetId, nonce: u64) -> Self {
        Self::asset_transfer(account.clone(), account, asset_id, 0, nonce)
    }

    pub fn program_call(
        sender: Address,
        program_id: ProgramId,
        declared_amount: Amount,
        nonce: u64,
    ) -> Self {
        Self {
            sender,
            kind: TxKind::ProgramCall {
                program_id,
                declared_amount,
            },
            nonce,
            group: None,
        }
    }

    pub fn as_transfer(&self) -> Option<AssetTransfer<'_>> {
        match &self.kind {
            TxKind::AssetTransfer {
                receiver,
                asset_id,
                amount,
            } => Some(AssetTransfer {
                sender: &self.sender,
                receiver,
                asset_id: *asset_id,
                amount: *amount,
            }),
            TxKind::ProgramCall { .. } => None,
        }
    }

    /// Canonical encoding; this is what gets hashed and signed
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CoreError::Encoding(e.to_string()))
    }

    pub fn id(&self) -> Result<TxId> {
        Ok(hex::encode(hash_sha256(&self.encode()?)))
    }
}

/// Ordered members of one atomic group, all stamped with the same group id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionGroup {
    id: GroupId,
    transactions: Vec<Transaction>,
}

impl TransactionGroup {
    pub fn new(mut transactions: Vec<Transaction>) -> Result<Self> {
        if transactions.is_empty() {
            return Err(CoreError::EmptyGroup);
        }
        if transactions.len() > MAX_GROUP_SIZE {
            return Err(CoreError::GroupTooLarge(transactions.len()));
        }

        for tx in transactions.iter_mut() {
            tx.group = None;
        }
        let id = Self::compute_id(&transactions)?;
        for tx in transactions.iter_mut() {
            tx.group = Some(id.clone());
        }

        Ok(Self { id, transactions })
    }

    /// sha256 over the concatenated hashes of the ungrouped members
    fn compute_id(transactions: &[Transaction]) -> Result<GroupId> {
        let mut preimage = Vec::with_capacity(transactions.len() * 32);
        for tx in transactions {
            let mut ungrouped = tx.clone();
            ungrouped.group = None;
            preimage.extend_from_slice(&hash_sha256(&ungrouped.encode()?));
        }
        Ok(hex::encode(hash_sha256(&preimage)))
    }

    pub fn id(&self) -> &GroupId {
        &self.id
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Asset transfer members in group order
    pub fn transfers(&self) -> impl Iterator<Item = AssetTransfer<'_>> {
        self.transactions.iter().filter_map(Transaction::as_transfer)
    }

    /// Sign every member with the credential of its sender
    pub fn sign(self, signers: &[&KeyPair]) -> Result<SignedGroup> {
        let mut signatures = Vec::with_capacity(self.transactions.len());
        for tx in &self.transactions {
            let signer = signers
                .iter()
                .find(|k| k.address() == tx.sender.as_str())
                .ok_or_else(|| CoreError::MissingSigner(tx.sender.clone()))?;
            signatures.push(hex::encode(signer.sign(&tx.encode()?)));
        }

        Ok(SignedGroup {
            group: self,
            signatures,
        })
    }
}

/// A group carrying one signature per member, ready for submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedGroup {
    pub group: TransactionGroup,
    pub signatures: Vec<String>,
}

impl SignedGroup {
    /// Check the group id, membership stamps and every signature
    pub fn verify(&self) -> Result<()> {
        let transactions = self.group.transactions();
        if transactions.is_empty() {
            return Err(CoreError::EmptyGroup);
        }
        if transactions.len() > MAX_GROUP_SIZE {
            return Err(CoreError::GroupTooLarge(transactions.len()));
        }
        if self.signatures.len() != transactions.len() {
            return Err(CoreError::InvalidGroup(format!(
                "{} signatures for {} transactions",
                self.signatures.len(),
                transactions.len()
            )));
        }

        let expected = TransactionGroup::compute_id(transactions)?;
        if &expected != self.group.id() {
            return Err(CoreError::InvalidGroup("group id mismatch".to_string()));
        }

        for (tx, signature) in transactions.iter().zip(&self.signatures) {
            if tx.group.as_ref() != Some(&expected) {
                return Err(CoreError::InvalidGroup(
                    "member not stamped with group id".to_string(),
                ));
            }
            let signature = hex::decode(signature)
                .map_err(|_| CoreError::Crypto(dumbly_crypto::CryptoError::InvalidSignature))?;
            dumbly_crypto::verify(tx.sender.as_str(), &tx.encode()?, &signature)?;
        }

        Ok(())
    }

    /// The ledger reports a group under the id of its first member
    pub fn tx_id(&self) -> Result<TxId> {
        self.group
            .transactions()
            .first()
            .ok_or(CoreError::EmptyGroup)?
            .id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(keypair: &KeyPair) -> Address {
        Address::of(keypair)
    }

    fn sample_group(from: &KeyPair, to: &KeyPair) -> TransactionGroup {
        TransactionGroup::new(vec![
            Transaction::asset_transfer(addr(from), addr(to), 7, 910, 1),
            Transaction::asset_transfer(addr(from), addr(to), 7, 90, 2),
        ])
        .unwrap()
    }

    #[test]
    fn test_group_stamps_members() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let group = sample_group(&a, &b);

        assert_eq!(group.len(), 2);
        for tx in group.transactions() {
            assert_eq!(tx.group.as_ref(), Some(group.id()));
        }
    }

    #[test]
    fn test_group_id_is_deterministic_and_order_sensitive() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let first = sample_group(&a, &b);
        let again = sample_group(&a, &b);
        assert_eq!(first.id(), again.id());

        let mut reversed = first.transactions().to_vec();
        reversed.reverse();
        let reversed = TransactionGroup::new(reversed).unwrap();
        assert_ne!(first.id(), reversed.id());
    }

    #[test]
    fn test_empty_and_oversized_groups() {
        assert_eq!(TransactionGroup::new(vec![]), Err(CoreError::EmptyGroup));

        let a = KeyPair::generate();
        let txs: Vec<_> = (0..=MAX_GROUP_SIZE as u64)
            .map(|n| Transaction::opt_in(addr(&a), 1, n))
            .collect();
        assert_eq!(
            TransactionGroup::new(txs),
            Err(CoreError::GroupTooLarge(MAX_GROUP_SIZE + 1))
        );
    }

    #[test]
    fn test_sign_and_verify() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let signed = sample_group(&a, &b).sign(&[&a]).unwrap();
        assert!(signed.verify().is_ok());
        assert_eq!(signed.tx_id().unwrap(), signed.group.transactions()[0].id().unwrap());
    }

    #[test]
    fn test_sign_requires_every_sender() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let err = sample_group(&a, &b).sign(&[&b]).unwrap_err();
        assert_eq!(err, CoreError::MissingSigner(addr(&a)));
    }

    #[test]
    fn test_tampered_member_fails_verification() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let mut signed = sample_group(&a, &b).sign(&[&a]).unwrap();

        let mut transactions = signed.group.transactions().to_vec();
        if let TxKind::AssetTransfer { amount, .. } = &mut transactions[0].kind {
            *amount = 920;
        }
        signed.group = TransactionGroup {
            id: signed.group.id().clone(),
            transactions,
        };

        assert!(matches!(signed.verify(), Err(CoreError::InvalidGroup(_))));
    }

    #[test]
    fn test_opt_in_shape() {
        let a = KeyPair::generate();
        let tx = Transaction::opt_in(addr(&a), 3, 0);
        assert!(tx.as_transfer().unwrap().is_opt_in());

        let call = Transaction::program_call(addr(&a), 1, 1000, 0);
        assert!(call.as_transfer().is_none());
    }
}
