use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, log, token, Address, Env,
};

use crate::ownership::OwnershipRegistryClient;

// ── Error type ────────────────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum TurnstileError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    AlreadyRegistered = 4,
    UnknownIdentifier = 5,
    NotOwner = 6,
    InvalidAmount = 7,
    InsufficientBalance = 8,
    TransferFailed = 9,
    Overflow = 10,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct RegisterEvent {
    #[topic]
    pub smart_contract: Address,
    pub recipient: Address,
    pub token_id: u64,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct DistributeFeesEvent {
    #[topic]
    pub token_id: u64,
    pub amount: i128,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct WithdrawEvent {
    #[topic]
    pub token_id: u64,
    pub recipient: Address,
    pub amount: i128,
}

// ── Storage types ─────────────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TurnstileEntry {
    pub registered_address: Address,
    /// Credited fees not yet withdrawn. Never negative.
    pub balance: i128,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Registry,
    FeeToken,
    /// Next identifier to assign
    Counter,
    Entry(u64),
    TokenId(Address),
}

#[contract]
pub struct TurnstileContract;

#[contractimpl]
impl TurnstileContract {
    pub fn initialize(
        env: Env,
        admin: Address,
        ownership_registry: Address,
        fee_token: Address,
    ) -> Result<(), TurnstileError> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(TurnstileError::AlreadyInitialized);
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&DataKey::Registry, &ownership_registry);
        env.storage().instance().set(&DataKey::FeeToken, &fee_token);
        env.storage().instance().set(&DataKey::Counter, &0u64);
        Ok(())
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn load_address(env: &Env, key: &DataKey) -> Result<Address, TurnstileError> {
        env.storage()
            .instance()
            .get(key)
            .ok_or(TurnstileError::NotInitialized)
    }

    fn require_admin(env: &Env, caller: &Address) -> Result<(), TurnstileError> {
        caller.require_auth();
        if *caller != Self::load_address(env, &DataKey::Admin)? {
            return Err(TurnstileError::Unauthorized);
        }
        Ok(())
    }

    fn load_entry(env: &Env, token_id: u64) -> Result<TurnstileEntry, TurnstileError> {
        env.storage()
            .persistent()
            .get(&DataKey::Entry(token_id))
            .ok_or(TurnstileError::UnknownIdentifier)
    }

    fn save_entry(env: &Env, token_id: u64, entry: &TurnstileEntry) {
        env.storage()
            .persistent()
            .set(&DataKey::Entry(token_id), entry);
    }

    fn registry(env: &Env) -> Result<OwnershipRegistryClient<'_>, TurnstileError> {
        let id = Self::load_address(env, &DataKey::Registry)?;
        Ok(OwnershipRegistryClient::new(env, &id))
    }

    fn fee_token(env: &Env) -> Result<token::Client<'_>, TurnstileError> {
        let id = Self::load_address(env, &DataKey::FeeToken)?;
        Ok(token::Client::new(env, &id))
    }

    // ── register ──────────────────────────────────────────────────────────────

    /// Contract: register `smart_contract` and mint its identifier to
    /// `recipient`. Returns the new identifier.
    pub fn register(
        env: Env,
        smart_contract: Address,
        recipient: Address,
    ) -> Result<u64, TurnstileError> {
        smart_contract.require_auth();

        let index_key = DataKey::TokenId(smart_contract.clone());
        if env.storage().persistent().has(&index_key) {
            return Err(TurnstileError::AlreadyRegistered);
        }

        let token_id: u64 = env
            .storage()
            .instance()
            .get(&DataKey::Counter)
            .ok_or(TurnstileError::NotInitialized)?;
        let next = token_id.checked_add(1).ok_or(TurnstileError::Overflow)?;
        env.storage().instance().set(&DataKey::Counter, &next);

        Self::save_entry(
            &env,
            token_id,
            &TurnstileEntry {
                registered_address: smart_contract.clone(),
                balance: 0,
            },
        );
        env.storage().persistent().set(&index_key, &token_id);

        Self::registry(&env)?.mint(&recipient, &token_id);

        RegisterEvent {
            smart_contract: smart_contract.clone(),
            recipient,
            token_id,
        }
        .publish(&env);
        log!(&env, "register {} token_id={}", smart_contract, token_id);
        Ok(token_id)
    }

    // ── distribute_fees ───────────────────────────────────────────────────────

    /// Admin: credit `amount` of the fee token to identifier `token_id`.
    ///
    /// The tokens are pulled from `caller` into the turnstile before the
    /// identifier's balance is increased.
    pub fn distribute_fees(
        env: Env,
        caller: Address,
        token_id: u64,
        amount: i128,
    ) -> Result<(), TurnstileError> {
        Self::require_admin(&env, &caller)?;
        if amount <= 0 {
            return Err(TurnstileError::InvalidAmount);
        }
        let mut entry = Self::load_entry(&env, token_id)?;

        Self::fee_token(&env)?.transfer(&caller, &env.current_contract_address(), &amount);

        entry.balance = entry
            .balance
            .checked_add(amount)
            .ok_or(TurnstileError::Overflow)?;
        Self::save_entry(&env, token_id, &entry);

        DistributeFeesEvent { token_id, amount }.publish(&env);
        Ok(())
    }

    // ── withdraw ──────────────────────────────────────────────────────────────

    /// Owner: send `amount` of the credited fees of `token_id` to `recipient`.
    /// Returns the balance left on the identifier.
    ///
    /// The balance is written down before the token transfer; a failed
    /// transfer fails the call and restores it.
    pub fn withdraw(
        env: Env,
        caller: Address,
        token_id: u64,
        recipient: Address,
        amount: i128,
    ) -> Result<i128, TurnstileError> {
        caller.require_auth();
        if amount <= 0 {
            return Err(TurnstileError::InvalidAmount);
        }
        let mut entry = Self::load_entry(&env, token_id)?;

        if Self::registry(&env)?.owner_of(&token_id) != caller {
            return Err(TurnstileError::NotOwner);
        }
        if amount > entry.balance {
            return Err(TurnstileError::InsufficientBalance);
        }

        entry.balance = entry
            .balance
            .checked_sub(amount)
            .ok_or(TurnstileError::Overflow)?;
        Self::save_entry(&env, token_id, &entry);

        let sent = Self::fee_token(&env)?.try_transfer(
            &env.current_contract_address(),
            &recipient,
            &amount,
        );
        if !matches!(sent, Ok(Ok(()))) {
            log!(&env, "withdraw {} transfer to {} failed", token_id, recipient);
            return Err(TurnstileError::TransferFailed);
        }

        WithdrawEvent {
            token_id,
            recipient: recipient.clone(),
            amount,
        }
        .publish(&env);
        log!(&env, "withdraw {} -> {} amount={}", token_id, recipient, amount);
        Ok(entry.balance)
    }

    // ── set_admin ─────────────────────────────────────────────────────────────

    /// Admin: hand the fee-distributor role to `new_admin`.
    pub fn set_admin(env: Env, caller: Address, new_admin: Address) -> Result<(), TurnstileError> {
        Self::require_admin(&env, &caller)?;
        env.storage().instance().set(&DataKey::Admin, &new_admin);
        log!(&env, "set_admin new={}", new_admin);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn get_token_id(env: Env, smart_contract: Address) -> Result<u64, TurnstileError> {
        env.storage()
            .persistent()
            .get(&DataKey::TokenId(smart_contract))
            .ok_or(TurnstileError::UnknownIdentifier)
    }

    pub fn is_registered(env: Env, smart_contract: Address) -> bool {
        env.storage()
            .persistent()
            .has(&DataKey::TokenId(smart_contract))
    }

    pub fn registered_address(env: Env, token_id: u64) -> Result<Address, TurnstileError> {
        Ok(Self::load_entry(&env, token_id)?.registered_address)
    }

    /// Credited, unwithdrawn fees of `token_id`; zero for unknown identifiers.
    pub fn balances(env: Env, token_id: u64) -> i128 {
        Self::load_entry(&env, token_id)
            .map(|entry| entry.balance)
            .unwrap_or(0)
    }

    /// The identifier the next registration will receive.
    pub fn current_counter_id(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::Counter)
            .unwrap_or(0)
    }

    pub fn owner_of(env: Env, token_id: u64) -> Result<Address, TurnstileError> {
        Self::load_entry(&env, token_id)?;
        Ok(Self::registry(&env)?.owner_of(&token_id))
    }

    /// The turnstile admin, which alone may distribute fees.
    pub fn owner(env: Env) -> Result<Address, TurnstileError> {
        Self::load_address(&env, &DataKey::Admin)
    }
}
