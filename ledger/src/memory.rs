//! In-memory ledger
//!
//! Commits groups all-or-nothing: every member is checked against a scratch
//! copy of the holdings and the copy replaces the live state only when the
//! whole group passes.

use async_trait::async_trait;
use dumbly_core::{
    Address, Amount, AssetId, Confirmation, LedgerError, LedgerGateway, LedgerResult, ProgramId,
    SignedGroup, Transaction, TransactionGroup, TxId, TxKind,
};
use dumbly_crypto::KeyPair;
use dumbly_program::{ProgramConfig, ProgramSetup, TaxProgram};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Asset parameters fixed at creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    pub creator: Address,
    pub total_supply: Amount,
    pub decimals: u32,
    pub unit_name: String,
}

#[derive(Debug, Default)]
struct LedgerState {
    round: u64,
    next_id: u64,
    assets: HashMap<AssetId, AssetInfo>,
    /// An entry exists once the account has opted in
    holdings: HashMap<(Address, AssetId), Amount>,
    programs: HashMap<ProgramId, TaxProgram>,
    /// Transaction id -> round in which its confirmation becomes visible
    committed: HashMap<TxId, u64>,
    accepted_groups: u64,
}

impl LedgerState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    available: AtomicBool,
    confirmation_lag: AtomicU64,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            available: AtomicBool::new(true),
            confirmation_lag: AtomicU64::new(0),
        }
    }

    /// Simulate the node going down or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Rounds between commit and visible confirmation
    pub fn set_confirmation_lag(&self, rounds: u64) {
        self.confirmation_lag.store(rounds, Ordering::SeqCst);
    }

    pub async fn round(&self) -> u64 {
        self.state.read().await.round
    }

    /// Number of groups the ledger has committed
    pub async fn accepted_groups(&self) -> u64 {
        self.state.read().await.accepted_groups
    }

    /// Create an asset; the creator is opted in and holds the full supply
    pub async fn create_asset(
        &self,
        creator: &Address,
        total_supply: Amount,
        decimals: u32,
        unit_name: &str,
    ) -> AssetId {
        let mut state = self.state.write().await;
        let asset_id = state.allocate_id();
        state.assets.insert(
            asset_id,
            AssetInfo {
                creator: creator.clone(),
                total_supply,
                decimals,
                unit_name: unit_name.to_string(),
            },
        );
        state
            .holdings
            .insert((creator.clone(), asset_id), total_supply);

        tracing::info!(asset_id, supply = total_supply, "asset created");
        asset_id
    }

    pub async fn asset(&self, asset_id: AssetId) -> Option<AssetInfo> {
        self.state.read().await.assets.get(&asset_id).cloned()
    }

    /// Deploy the tax program and run its one-time setup
    pub async fn deploy_tax_program(
        &self,
        creator: &Address,
        setup: ProgramSetup,
    ) -> LedgerResult<ProgramId> {
        let mut state = self.state.write().await;
        if !state.assets.contains_key(&setup.policy.asset_id()) {
            return Err(LedgerError::Rejected(format!(
                "asset {} does not exist",
                setup.policy.asset_id()
            )));
        }

        let program_id = state.allocate_id();
        let mut program = TaxProgram::new(program_id);
        program
            .initialize(creator.clone(), setup)
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;
        state.programs.insert(program_id, program);

        tracing::info!(program_id, "tax program deployed");
        Ok(program_id)
    }

    pub async fn program_config(&self, program_id: ProgramId) -> Option<ProgramConfig> {
        let state = self.state.read().await;
        state
            .programs
            .get(&program_id)
            .and_then(|p| p.config().cloned())
    }

    /// Zero-amount self transfer, submitted like any other group
    pub async fn opt_in(&self, account: &KeyPair, asset_id: AssetId) -> LedgerResult<TxId> {
        let tx = Transaction::opt_in(Address::of(account), asset_id, rand::random());
        self.submit_single(tx, account).await
    }

    /// Plain transfer outside of any program
    pub async fn transfer(
        &self,
        from: &KeyPair,
        to: &Address,
        asset_id: AssetId,
        amount: Amount,
    ) -> LedgerResult<TxId> {
        let tx = Transaction::asset_transfer(
            Address::of(from),
            to.clone(),
            asset_id,
            amount,
            rand::random(),
        );
        self.submit_single(tx, from).await
    }

    async fn submit_single(&self, tx: Transaction, signer: &KeyPair) -> LedgerResult<TxId> {
        let signed = TransactionGroup::new(vec![tx])
            .and_then(|g| g.sign(&[signer]))
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;
        self.submit_group(&signed).await
    }

    fn ensure_available(&self) -> LedgerResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LedgerError::Unavailable("node offline".to_string()))
        }
    }

    /// Run every program the group calls and let the others screen it
    fn evaluate_programs(state: &LedgerState, group: &TransactionGroup) -> LedgerResult<()> {
        let called: BTreeSet<ProgramId> = group
            .transactions()
            .iter()
            .filter_map(|tx| match tx.kind {
                TxKind::ProgramCall { program_id, .. } => Some(program_id),
                TxKind::AssetTransfer { .. } => None,
            })
            .collect();

        for (program_id, program) in state.programs.iter() {
            if called.contains(program_id) {
                continue;
            }
            program.screen_uncalled(group).map_err(|e| {
                tracing::warn!(program_id, group = %group.id(), "uncalled program refused group: {}", e);
                LedgerError::Rejected(e.to_string())
            })?;
        }

        for program_id in called {
            let program = state
                .programs
                .get(&program_id)
                .ok_or_else(|| LedgerError::Rejected(format!("unknown program {}", program_id)))?;

            match program.evaluate(group) {
                Ok(approval) => {
                    tracing::debug!(program_id, ?approval, group = %group.id(), "program approved group");
                }
                Err(e) => {
                    tracing::warn!(program_id, group = %group.id(), "program rejected group: {}", e);
                    return Err(LedgerError::Rejected(format!(
                        "program {} rejected group: {}",
                        program_id, e
                    )));
                }
            }
        }

        Ok(())
    }

    /// Apply every transfer to a scratch copy of the holdings
    fn apply_transfers(
        state: &LedgerState,
        group: &TransactionGroup,
    ) -> LedgerResult<HashMap<(Address, AssetId), Amount>> {
        let mut scratch = state.holdings.clone();

        for transfer in group.transfers() {
            if !state.assets.contains_key(&transfer.asset_id) {
                return Err(LedgerError::Rejected(format!(
                    "asset {} does not exist",
                    transfer.asset_id
                )));
            }

            if transfer.is_opt_in() {
                scratch
                    .entry((transfer.sender.clone(), transfer.asset_id))
                    .or_insert(0);
                continue;
            }

            let sender_key = (transfer.sender.clone(), transfer.asset_id);
            let receiver_key = (transfer.receiver.clone(), transfer.asset_id);

            if !scratch.contains_key(&receiver_key) {
                return Err(LedgerError::Rejected(format!(
                    "{} is not opted in to asset {}",
                    transfer.receiver, transfer.asset_id
                )));
            }

            let sender_balance = scratch.get(&sender_key).copied().ok_or_else(|| {
                LedgerError::Rejected(format!(
                    "{} is not opted in to asset {}",
                    transfer.sender, transfer.asset_id
                ))
            })?;
            if sender_balance < transfer.amount {
                return Err(LedgerError::Rejected(format!(
                    "{} holds {}, cannot send {}",
                    transfer.sender, sender_balance, transfer.amount
                )));
            }

            scratch.insert(sender_key, sender_balance - transfer.amount);
            let receiver_balance = scratch.entry(receiver_key).or_insert(0);
            *receiver_balance = receiver_balance
                .checked_add(transfer.amount)
                .ok_or_else(|| LedgerError::Rejected("balance overflow".to_string()))?;
        }

        Ok(scratch)
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn account_balance(&self, address: &Address, asset_id: AssetId) -> LedgerResult<Amount> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state
            .holdings
            .get(&(address.clone(), asset_id))
            .copied()
            .unwrap_or(0))
    }

    async fn is_opted_in(&self, address: &Address, asset_id: AssetId) -> LedgerResult<bool> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.holdings.contains_key(&(address.clone(), asset_id)))
    }

    async fn submit_group(&self, signed: &SignedGroup) -> LedgerResult<TxId> {
        self.ensure_available()?;
        signed
            .verify()
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;

        let group = &signed.group;
        let tx_ids = group
            .transactions()
            .iter()
            .map(Transaction::id)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;

        let mut state = self.state.write().await;
        if let Some(duplicate) = tx_ids.iter().find(|id| state.committed.contains_key(*id)) {
            return Err(LedgerError::Rejected(format!(
                "transaction {} already in ledger",
                duplicate
            )));
        }

        Self::evaluate_programs(&state, group)?;
        let holdings = Self::apply_transfers(&state, group)?;

        state.holdings = holdings;
        state.round += 1;
        state.accepted_groups += 1;
        let visible_at = state.round + self.confirmation_lag.load(Ordering::SeqCst);
        for id in &tx_ids {
            state.committed.insert(id.clone(), visible_at);
        }

        tracing::debug!(group = %group.id(), members = group.len(), round = state.round, "group committed");
        Ok(tx_ids[0].clone())
    }

    async fn wait_for_confirmation(
        &self,
        tx_id: &TxId,
        max_rounds: u64,
    ) -> LedgerResult<Confirmation> {
        self.ensure_available()?;

        let mut waited = 0;
        loop {
            {
                let state = self.state.read().await;
                let visible_at = *state
                    .committed
                    .get(tx_id)
                    .ok_or_else(|| LedgerError::Malformed(format!("unknown transaction {}", tx_id)))?;
                if state.round >= visible_at {
                    return Ok(Confirmation::Confirmed { round: visible_at });
                }
            }

            if waited >= max_rounds {
                return Ok(Confirmation::TimedOut {
                    rounds_waited: waited,
                });
            }

            self.state.write().await.round += 1;
            waited += 1;
            tokio::task::yield_now().await;
        }
    }
}
