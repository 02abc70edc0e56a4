//! # Timelock Contract
//!
//! Executes stored governance proposals exactly once.
//!
//! A proposal moves from pending (present in the proposal store) to executed,
//! which is terminal. `execute` performs every call of the proposal in index
//! order; if any of them fails the host unwinds the whole invocation,
//! including the executed flag, so the proposal stays pending.

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, log, token,
    xdr::{FromXdr, ScErrorType},
    Address, Env, Error, Val, Vec,
};

use crate::proposal_store::{Proposal, ProposalStoreClient};

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors of the timelock.
///
/// `execute` reports a failed call outside this enum: codes from
/// [`SUBCALL_FAILED_BASE`] upward are `SubcallFailed(index)`, with the index
/// of the failing call added to the base. See [`subcall_failed`] and
/// [`failed_call_index`].
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum TimelockError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    InvalidProposalId = 3,
    AlreadyExecuted = 4,
}

/// First contract error code of the `SubcallFailed(index)` range.
pub const SUBCALL_FAILED_BASE: u32 = 100;

/// Contract error reporting that call `index` of a proposal failed.
pub fn subcall_failed(index: u32) -> Error {
    Error::from_contract_error(SUBCALL_FAILED_BASE.saturating_add(index))
}

/// Index of the failed call carried by `err`, if it is a `SubcallFailed`.
pub fn failed_call_index(err: &Error) -> Option<u32> {
    if !err.is_type(ScErrorType::Contract) {
        return None;
    }
    err.get_code().checked_sub(SUBCALL_FAILED_BASE)
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct ProposalExecutedEvent {
    #[topic]
    pub id: u64,
    pub calls: u32,
}

// ── Storage types ─────────────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    ProposalStore,
    NativeToken,
    Executed(u64),
}

#[contract]
pub struct TimelockContract;

#[contractimpl]
impl TimelockContract {
    /// Bind the timelock to the proposal store it executes from and to the
    /// token used for call values.
    pub fn initialize(
        env: Env,
        proposal_store: Address,
        native_token: Address,
    ) -> Result<(), TimelockError> {
        if env.storage().instance().has(&DataKey::ProposalStore) {
            return Err(TimelockError::AlreadyInitialized);
        }
        env.storage()
            .instance()
            .set(&DataKey::ProposalStore, &proposal_store);
        env.storage()
            .instance()
            .set(&DataKey::NativeToken, &native_token);
        Ok(())
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn load(env: &Env, key: &DataKey) -> Result<Address, TimelockError> {
        env.storage()
            .instance()
            .get(key)
            .ok_or(TimelockError::NotInitialized)
    }

    /// A proposal is runnable when it is the one asked for and its four
    /// sequences line up with at least one call.
    fn is_well_formed(proposal: &Proposal, id: u64) -> bool {
        let calls = proposal.targets.len();
        proposal.id == id
            && calls > 0
            && proposal.values.len() == calls
            && proposal.signatures.len() == calls
            && proposal.calldatas.len() == calls
    }

    fn dispatch(
        env: &Env,
        token: &token::Client,
        proposal: &Proposal,
        i: u32,
    ) -> Result<(), Error> {
        let failed = subcall_failed(i);
        let target = proposal.targets.get(i).ok_or(failed)?;
        let value = proposal.values.get(i).ok_or(failed)?;
        let func = proposal.signatures.get(i).ok_or(failed)?;
        let calldata = proposal.calldatas.get(i).ok_or(failed)?;

        if value > 0 {
            let sent = token.try_transfer(&env.current_contract_address(), &target, &value);
            if !matches!(sent, Ok(Ok(()))) {
                return Err(failed);
            }
        }

        let args = Vec::<Val>::from_xdr(env, &calldata).map_err(|_| failed)?;
        match env.try_invoke_contract::<Val, Error>(&target, &func, args) {
            Ok(Ok(_)) => Ok(()),
            _ => Err(failed),
        }
    }

    // ── execute ───────────────────────────────────────────────────────────────

    /// Anyone: run every call of proposal `id`, once.
    ///
    /// # Errors
    /// - `InvalidProposalId` - the store has no usable proposal `id`
    /// - `AlreadyExecuted` - proposal `id` has already run
    /// - `SubcallFailed(index)` - call `index` failed; nothing from this
    ///   execution persists
    pub fn execute(env: Env, id: u64) -> Result<(), Error> {
        let store = Self::load(&env, &DataKey::ProposalStore)?;
        let proposal = match ProposalStoreClient::new(&env, &store).try_get_proposal(&id) {
            Ok(Ok(proposal)) if Self::is_well_formed(&proposal, id) => proposal,
            _ => return Err(TimelockError::InvalidProposalId.into()),
        };

        let key = DataKey::Executed(id);
        if env.storage().persistent().get(&key).unwrap_or(false) {
            return Err(TimelockError::AlreadyExecuted.into());
        }
        // flag first so a call back into execute(id) sees it
        env.storage().persistent().set(&key, &true);

        let token = token::Client::new(&env, &Self::load(&env, &DataKey::NativeToken)?);
        let calls = proposal.targets.len();
        for i in 0..calls {
            if let Err(err) = Self::dispatch(&env, &token, &proposal, i) {
                log!(&env, "execute {} subcall {} failed", id, i);
                return Err(err);
            }
        }

        ProposalExecutedEvent { id, calls }.publish(&env);
        log!(&env, "execute {} calls={}", id, calls);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn is_executed(env: Env, id: u64) -> bool {
        env.storage()
            .persistent()
            .get(&DataKey::Executed(id))
            .unwrap_or(false)
    }

    pub fn proposal_store(env: Env) -> Result<Address, TimelockError> {
        Self::load(&env, &DataKey::ProposalStore)
    }

    pub fn native_token(env: Env) -> Result<Address, TimelockError> {
        Self::load(&env, &DataKey::NativeToken)
    }
}
