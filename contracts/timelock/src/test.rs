#![cfg(test)]

use crate::{
    failed_call_index, subcall_failed, Proposal, TimelockContract, TimelockContractClient,
    TimelockError,
};
use dexgov_policy::command::ProtocolCmd;
use dexgov_policy::testutils::{MockExchange, MockExchangeClient};
use dexgov_policy::{PolicyContract, PolicyContractClient};
use dexgov_proposal_store::{ProposalStoreContract, ProposalStoreContractClient};
use soroban_sdk::token::{StellarAssetClient, TokenClient};
use soroban_sdk::{
    contract, contractimpl, contracttype, testutils::Address as _, vec, xdr::ToXdr, Address,
    Bytes, Env, Error, IntoVal, String, Symbol, Val, Vec,
};

struct Setup {
    env: Env,
    store: ProposalStoreContractClient<'static>,
    store_admin: Address,
    timelock: TimelockContractClient<'static>,
    policy: PolicyContractClient<'static>,
    dex: MockExchangeClient<'static>,
    token: TokenClient<'static>,
    token_admin: StellarAssetClient<'static>,
}

/// Deploys store, timelock, policy and exchange, then hands every policy
/// role to the timelock the way a deployer would.
fn setup() -> Setup {
    let env = Env::default();
    env.mock_all_auths();

    let store_id = env.register(ProposalStoreContract, ());
    let store = ProposalStoreContractClient::new(&env, &store_id);
    let store_admin = Address::generate(&env);
    store.initialize(&store_admin);

    let issuer = Address::generate(&env);
    let sac = env.register_stellar_asset_contract_v2(issuer);
    let token = TokenClient::new(&env, &sac.address());
    let token_admin = StellarAssetClient::new(&env, &sac.address());

    let timelock_id = env.register(TimelockContract, ());
    let timelock = TimelockContractClient::new(&env, &timelock_id);
    timelock.initialize(&store_id, &sac.address());

    let policy_id = env.register(PolicyContract, ());
    let policy = PolicyContractClient::new(&env, &policy_id);
    let deployer = Address::generate(&env);
    policy.initialize(&deployer);

    let dex_id = env.register(MockExchange, ());
    let dex = MockExchangeClient::new(&env, &dex_id);
    dex.init(&policy_id);

    policy.transfer_governance(&deployer, &timelock_id, &timelock_id, &timelock_id);

    Setup {
        env,
        store,
        store_admin,
        timelock,
        policy,
        dex,
        token,
        token_admin,
    }
}

fn err(e: TimelockError) -> Error {
    e.into()
}

fn encode(env: &Env, args: Vec<Val>) -> Bytes {
    args.to_xdr(env)
}

fn text(env: &Env, v: &str) -> String {
    String::from_str(env, v)
}

impl Setup {
    fn add_proposal(
        &self,
        id: u64,
        targets: Vec<Address>,
        values: Vec<i128>,
        signatures: Vec<Symbol>,
        calldatas: Vec<Bytes>,
    ) {
        self.store.add_proposal(
            &self.store_admin,
            &id,
            &text(&self.env, "governance test"),
            &text(&self.env, "governance test"),
            &targets,
            &values,
            &signatures,
            &calldatas,
        );
    }

    fn add_single(&self, id: u64, target: &Address, func: &str, args: Vec<Val>) {
        self.add_proposal(
            id,
            vec![&self.env, target.clone()],
            vec![&self.env, 0i128],
            vec![&self.env, Symbol::new(&self.env, func)],
            vec![&self.env, encode(&self.env, args)],
        );
    }

    fn transfer_governance_args(&self, caller: &Address, to: &Address) -> Vec<Val> {
        (caller.clone(), to.clone(), to.clone(), to.clone()).into_val(&self.env)
    }

    fn halt_args(&self) -> Vec<Val> {
        (
            self.timelock.address.clone(),
            self.dex.address.clone(),
            text(&self.env, "emergency halt test"),
        )
            .into_val(&self.env)
    }
}

// ── initialize ────────────────────────────────────────────────────────────────

#[test]
fn initialize_binds_store_and_token() {
    let t = setup();
    assert_eq!(t.timelock.proposal_store(), t.store.address);
    assert_eq!(t.timelock.native_token(), t.token.address);
    assert_eq!(t.policy.ops_authority(), t.timelock.address);
    assert_eq!(t.policy.treasury_authority(), t.timelock.address);
    assert_eq!(t.policy.emergency_authority(), t.timelock.address);
}

#[test]
#[should_panic(expected = "Error(Contract, #1)")]
fn initialize_twice_panics() {
    let t = setup();
    t.timelock.initialize(&t.store.address, &t.token.address);
}

#[test]
fn execute_before_initialize_fails() {
    let env = Env::default();
    let id = env.register(TimelockContract, ());
    let timelock = TimelockContractClient::new(&env, &id);
    assert_eq!(timelock.try_execute(&1), Err(Ok(err(TimelockError::NotInitialized))));
}

// ── execute ───────────────────────────────────────────────────────────────────

#[test]
fn unknown_proposal_id_fails() {
    let t = setup();
    assert_eq!(
        t.timelock.try_execute(&1),
        Err(Ok(err(TimelockError::InvalidProposalId)))
    );
    assert!(!t.timelock.is_executed(&1));
}

#[test]
fn proposal_transfers_policy_governance() {
    let t = setup();
    let new_timelock = Address::generate(&t.env);
    let args = t.transfer_governance_args(&t.timelock.address, &new_timelock);
    t.add_single(1, &t.policy.address, "transfer_governance", args);

    assert!(!t.timelock.is_executed(&1));
    t.timelock.execute(&1);

    assert!(t.timelock.is_executed(&1));
    assert_eq!(t.policy.ops_authority(), new_timelock);
    assert_eq!(t.policy.treasury_authority(), new_timelock);
    assert_eq!(t.policy.emergency_authority(), new_timelock);
}

#[test]
fn cannot_execute_same_proposal_twice() {
    let t = setup();
    let new_timelock = Address::generate(&t.env);
    let args = t.transfer_governance_args(&t.timelock.address, &new_timelock);
    t.add_single(1, &t.policy.address, "transfer_governance", args);

    t.timelock.execute(&1);
    assert_eq!(
        t.timelock.try_execute(&1),
        Err(Ok(err(TimelockError::AlreadyExecuted)))
    );
    assert_eq!(t.policy.ops_authority(), new_timelock);
}

#[test]
fn emergency_halt_through_proposal() {
    let t = setup();
    let args = t.halt_args();
    t.add_single(1, &t.policy.address, "emergency_halt", args);

    t.timelock.execute(&1);

    assert!(!t.dex.hot_path_open());
    assert!(t.dex.safe_mode());
}

#[test]
fn module_upgrade_through_treasury_resolution() {
    let t = setup();
    let new_cold_path = Address::generate(&t.env);
    let boot_path = 0u32;
    let cold_path_slot = 3u16;
    let cmd = ProtocolCmd::ModuleUpgrade {
        module: new_cold_path.clone(),
        slot: cold_path_slot,
    }
    .encode(&t.env);
    let args: Vec<Val> = (
        t.timelock.address.clone(),
        t.dex.address.clone(),
        boot_path,
        cmd,
        true,
    )
        .into_val(&t.env);
    t.add_single(1, &t.policy.address, "treasury_resolution", args);

    t.timelock.execute(&1);

    assert_eq!(t.dex.module(&3), Some(new_cold_path));
    assert_eq!(t.dex.last_path(), Some(boot_path));
}

#[test]
fn later_failure_rolls_back_earlier_calls() {
    let t = setup();
    let stranger = Address::generate(&t.env);
    let halt = encode(&t.env, t.halt_args());
    // stranger does not hold the treasury role, so the second call fails
    let bad_transfer = encode(&t.env, t.transfer_governance_args(&stranger, &stranger));

    t.add_proposal(
        1,
        vec![&t.env, t.policy.address.clone(), t.policy.address.clone()],
        vec![&t.env, 0i128, 0i128],
        vec![
            &t.env,
            Symbol::new(&t.env, "emergency_halt"),
            Symbol::new(&t.env, "transfer_governance"),
        ],
        vec![&t.env, halt, bad_transfer],
    );

    assert_eq!(
        t.timelock.try_execute(&1),
        Err(Ok(subcall_failed(1)))
    );
    assert!(!t.timelock.is_executed(&1));
    assert!(t.dex.hot_path_open());
    assert!(!t.dex.safe_mode());
    assert_eq!(t.dex.cmd_count(), 0);
    assert_eq!(t.policy.treasury_authority(), t.timelock.address);

    // a structurally broken proposal never succeeds on retry
    assert_eq!(
        t.timelock.try_execute(&1),
        Err(Ok(subcall_failed(1)))
    );
}

#[test]
fn failed_execution_can_be_retried_once_target_recovers() {
    let t = setup();
    let other_id = t.env.register(MockExchange, ());
    let other = MockExchangeClient::new(&t.env, &other_id);
    other.init(&Address::generate(&t.env));

    let args: Vec<Val> = (
        t.timelock.address.clone(),
        other_id.clone(),
        text(&t.env, "halt second deployment"),
    )
        .into_val(&t.env);
    t.add_single(1, &t.policy.address, "emergency_halt", args);

    assert_eq!(
        t.timelock.try_execute(&1),
        Err(Ok(subcall_failed(0)))
    );
    assert!(!t.timelock.is_executed(&1));

    // the second deployment now trusts the policy
    other.init(&t.policy.address);
    t.timelock.execute(&1);
    assert!(other.safe_mode());
    assert!(t.timelock.is_executed(&1));
}

#[test]
fn calls_run_in_stored_order() {
    let t = setup();
    let new_timelock = Address::generate(&t.env);
    let halt = encode(&t.env, t.halt_args());
    let handover = encode(
        &t.env,
        t.transfer_governance_args(&t.timelock.address, &new_timelock),
    );

    // halting after the hand-over would fail: the timelock is no longer
    // the emergency authority by then
    t.add_proposal(
        1,
        vec![&t.env, t.policy.address.clone(), t.policy.address.clone()],
        vec![&t.env, 0i128, 0i128],
        vec![
            &t.env,
            Symbol::new(&t.env, "transfer_governance"),
            Symbol::new(&t.env, "emergency_halt"),
        ],
        vec![&t.env, handover.clone(), halt.clone()],
    );
    assert_eq!(
        t.timelock.try_execute(&1),
        Err(Ok(subcall_failed(1)))
    );

    t.add_proposal(
        2,
        vec![&t.env, t.policy.address.clone(), t.policy.address.clone()],
        vec![&t.env, 0i128, 0i128],
        vec![
            &t.env,
            Symbol::new(&t.env, "emergency_halt"),
            Symbol::new(&t.env, "transfer_governance"),
        ],
        vec![&t.env, halt, handover],
    );
    t.timelock.execute(&2);
    assert!(t.dex.safe_mode());
    assert_eq!(t.policy.emergency_authority(), new_timelock);
}

#[test]
fn value_is_attached_to_call() {
    let t = setup();
    t.token_admin.mint(&t.timelock.address, &1_000);

    t.add_proposal(
        1,
        vec![&t.env, t.dex.address.clone()],
        vec![&t.env, 400i128],
        vec![&t.env, Symbol::new(&t.env, "cmd_count")],
        vec![&t.env, encode(&t.env, Vec::new(&t.env))],
    );
    t.timelock.execute(&1);

    assert_eq!(t.token.balance(&t.dex.address), 400);
    assert_eq!(t.token.balance(&t.timelock.address), 600);
}

#[test]
fn value_above_timelock_balance_fails() {
    let t = setup();
    t.token_admin.mint(&t.timelock.address, &100);

    t.add_proposal(
        1,
        vec![&t.env, t.dex.address.clone()],
        vec![&t.env, 400i128],
        vec![&t.env, Symbol::new(&t.env, "cmd_count")],
        vec![&t.env, encode(&t.env, Vec::new(&t.env))],
    );
    assert_eq!(
        t.timelock.try_execute(&1),
        Err(Ok(subcall_failed(0)))
    );
    assert_eq!(t.token.balance(&t.timelock.address), 100);
    assert_eq!(t.token.balance(&t.dex.address), 0);
}

#[test]
fn unknown_function_fails() {
    let t = setup();
    t.add_single(1, &t.policy.address, "no_such_fn", Vec::new(&t.env));
    assert_eq!(
        t.timelock.try_execute(&1),
        Err(Ok(subcall_failed(0)))
    );
}

#[test]
fn failed_call_reports_its_index() {
    let t = setup();
    let noop = encode(&t.env, Vec::new(&t.env));
    let calls = |first: &str, second: &str| {
        vec![
            &t.env,
            Symbol::new(&t.env, first),
            Symbol::new(&t.env, second),
        ]
    };
    let targets = vec![&t.env, t.dex.address.clone(), t.dex.address.clone()];
    let values = vec![&t.env, 0i128, 0i128];
    let calldatas = vec![&t.env, noop.clone(), noop];

    t.add_proposal(
        1,
        targets.clone(),
        values.clone(),
        calls("no_such_fn", "cmd_count"),
        calldatas.clone(),
    );
    t.add_proposal(
        2,
        targets,
        values,
        calls("cmd_count", "no_such_fn"),
        calldatas,
    );

    let first = t.timelock.try_execute(&1).unwrap_err().unwrap();
    let second = t.timelock.try_execute(&2).unwrap_err().unwrap();
    assert_ne!(first, second);
    assert_eq!(failed_call_index(&first), Some(0));
    assert_eq!(failed_call_index(&second), Some(1));
    assert_eq!(failed_call_index(&err(TimelockError::AlreadyExecuted)), None);
}

#[test]
fn proposal_calling_back_into_execute_fails_without_effects() {
    let t = setup();
    let halt = encode(&t.env, t.halt_args());
    let reenter = encode(&t.env, (1u64,).into_val(&t.env));

    t.add_proposal(
        1,
        vec![&t.env, t.policy.address.clone(), t.timelock.address.clone()],
        vec![&t.env, 0i128, 0i128],
        vec![
            &t.env,
            Symbol::new(&t.env, "emergency_halt"),
            Symbol::new(&t.env, "execute"),
        ],
        vec![&t.env, halt, reenter],
    );

    assert_eq!(t.timelock.try_execute(&1), Err(Ok(subcall_failed(1))));
    assert!(!t.timelock.is_executed(&1));
    assert!(t.dex.hot_path_open());
    assert!(!t.dex.safe_mode());
    assert_eq!(t.dex.cmd_count(), 0);
}

// ── untrusted store ───────────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone)]
enum StubKey {
    Proposal,
}

/// Store that answers every lookup with whatever proposal it was handed.
#[contract]
pub struct StubStore;

#[contractimpl]
impl StubStore {
    pub fn put(env: Env, proposal: Proposal) {
        env.storage().instance().set(&StubKey::Proposal, &proposal);
    }

    pub fn get_proposal(env: Env, _id: u64) -> Proposal {
        env.storage().instance().get(&StubKey::Proposal).unwrap()
    }
}

fn stub_backed_timelock(env: &Env) -> (StubStoreClient<'_>, TimelockContractClient<'_>) {
    let store = StubStoreClient::new(env, &env.register(StubStore, ()));
    let timelock = TimelockContractClient::new(env, &env.register(TimelockContract, ()));
    timelock.initialize(&store.address, &Address::generate(env));
    (store, timelock)
}

fn stub_proposal(env: &Env, id: u64) -> Proposal {
    Proposal {
        id,
        title: text(env, "stub"),
        description: text(env, "stub"),
        targets: vec![env, Address::generate(env)],
        values: vec![env, 0i128],
        signatures: vec![env, Symbol::new(env, "cmd_count")],
        calldatas: vec![env, encode(env, Vec::new(env))],
    }
}

#[test]
fn proposal_with_other_id_is_rejected() {
    let env = Env::default();
    let (store, timelock) = stub_backed_timelock(&env);
    store.put(&stub_proposal(&env, 2));

    assert_eq!(
        timelock.try_execute(&1),
        Err(Ok(err(TimelockError::InvalidProposalId)))
    );
    assert!(!timelock.is_executed(&1));
}

#[test]
fn proposal_with_uneven_sequences_is_rejected() {
    let env = Env::default();
    let (store, timelock) = stub_backed_timelock(&env);

    let mut extra_value = stub_proposal(&env, 1);
    extra_value.values.push_back(5);
    store.put(&extra_value);
    assert_eq!(
        timelock.try_execute(&1),
        Err(Ok(err(TimelockError::InvalidProposalId)))
    );

    let mut no_calls = stub_proposal(&env, 1);
    no_calls.targets = Vec::new(&env);
    no_calls.values = Vec::new(&env);
    no_calls.signatures = Vec::new(&env);
    no_calls.calldatas = Vec::new(&env);
    store.put(&no_calls);
    assert_eq!(
        timelock.try_execute(&1),
        Err(Ok(err(TimelockError::InvalidProposalId)))
    );
    assert!(!timelock.is_executed(&1));
}
