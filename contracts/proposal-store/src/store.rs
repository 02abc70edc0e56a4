use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, log, symbol_short, Address,
    Bytes, Env, String, Symbol, Vec,
};

// ── Error type ────────────────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum StoreError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    /// Sequence lengths disagree, the proposal is empty, the id is zero or a
    /// value is negative.
    InvalidProposal = 4,
    DuplicateId = 5,
    NotFound = 6,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct ProposalAddedEvent {
    #[topic]
    pub id: u64,
    pub title: String,
    pub calls: u32,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct StoreAdminChangedEvent {
    pub previous: Address,
    pub admin: Address,
}

const ADMIN_KEY: Symbol = symbol_short!("ADMIN");

// ── Storage types ─────────────────────────────────────────────────────────────

/// A bundle of calls executed together by the timelock.
///
/// `targets`, `values`, `signatures` and `calldatas` are parallel sequences:
/// call `i` invokes `signatures[i]` on `targets[i]` with the arguments encoded
/// in `calldatas[i]`, after attaching `values[i]` of the native token.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Proposal {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub targets: Vec<Address>,
    pub values: Vec<i128>,
    pub signatures: Vec<Symbol>,
    /// XDR-encoded `Vec<Val>` argument lists.
    pub calldatas: Vec<Bytes>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Proposal(u64),
    ProposalCount,
}

#[contract]
pub struct ProposalStoreContract;

#[contractimpl]
impl ProposalStoreContract {
    pub fn initialize(env: Env, admin: Address) -> Result<(), StoreError> {
        if env.storage().instance().has(&ADMIN_KEY) {
            return Err(StoreError::AlreadyInitialized);
        }
        env.storage().instance().set(&ADMIN_KEY, &admin);
        env.storage().instance().set(&DataKey::ProposalCount, &0u32);
        Ok(())
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn load_admin(env: &Env) -> Result<Address, StoreError> {
        env.storage()
            .instance()
            .get(&ADMIN_KEY)
            .ok_or(StoreError::NotInitialized)
    }

    fn require_admin(env: &Env, caller: &Address) -> Result<(), StoreError> {
        caller.require_auth();
        if *caller != Self::load_admin(env)? {
            return Err(StoreError::Unauthorized);
        }
        Ok(())
    }

    fn validate(proposal: &Proposal) -> Result<(), StoreError> {
        let n = proposal.targets.len();
        if proposal.id == 0
            || n == 0
            || proposal.values.len() != n
            || proposal.signatures.len() != n
            || proposal.calldatas.len() != n
        {
            return Err(StoreError::InvalidProposal);
        }
        if proposal.values.iter().any(|v| v < 0) {
            return Err(StoreError::InvalidProposal);
        }
        Ok(())
    }

    // ── add_proposal ──────────────────────────────────────────────────────────

    /// Admin: insert a new proposal under `id`.
    ///
    /// Proposals are immutable once stored, so an id can be used only once.
    pub fn add_proposal(
        env: Env,
        caller: Address,
        id: u64,
        title: String,
        description: String,
        targets: Vec<Address>,
        values: Vec<i128>,
        signatures: Vec<Symbol>,
        calldatas: Vec<Bytes>,
    ) -> Result<(), StoreError> {
        Self::require_admin(&env, &caller)?;

        let proposal = Proposal {
            id,
            title,
            description,
            targets,
            values,
            signatures,
            calldatas,
        };
        Self::validate(&proposal)?;

        let key = DataKey::Proposal(id);
        if env.storage().persistent().has(&key) {
            return Err(StoreError::DuplicateId);
        }
        env.storage().persistent().set(&key, &proposal);

        let count: u32 = env
            .storage()
            .instance()
            .get(&DataKey::ProposalCount)
            .unwrap_or(0);
        env.storage()
            .instance()
            .set(&DataKey::ProposalCount, &(count + 1));

        ProposalAddedEvent {
            id,
            title: proposal.title.clone(),
            calls: proposal.targets.len(),
        }
        .publish(&env);
        log!(&env, "add_proposal {} calls={}", id, proposal.targets.len());
        Ok(())
    }

    // ── set_admin ─────────────────────────────────────────────────────────────

    /// Admin: hand the insertion right to another address.
    pub fn set_admin(env: Env, caller: Address, new_admin: Address) -> Result<(), StoreError> {
        Self::require_admin(&env, &caller)?;
        env.storage().instance().set(&ADMIN_KEY, &new_admin);
        StoreAdminChangedEvent {
            previous: caller,
            admin: new_admin.clone(),
        }
        .publish(&env);
        log!(&env, "set_admin new={}", new_admin);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn get_proposal(env: Env, id: u64) -> Result<Proposal, StoreError> {
        env.storage()
            .persistent()
            .get(&DataKey::Proposal(id))
            .ok_or(StoreError::NotFound)
    }

    pub fn has_proposal(env: Env, id: u64) -> bool {
        env.storage().persistent().has(&DataKey::Proposal(id))
    }

    pub fn proposal_count(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::ProposalCount)
            .unwrap_or(0)
    }

    pub fn admin(env: Env) -> Result<Address, StoreError> {
        Self::load_admin(&env)
    }
}
