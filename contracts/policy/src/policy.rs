//! # Policy Module
//!
//! Holds the three governance roles and translates governance actions into
//! privileged exchange commands.
//!
//! | Role      | Entry points                                      |
//! |-----------|---------------------------------------------------|
//! | treasury  | `transfer_governance`, `treasury_resolution`      |
//! | ops       | `ops_resolution`                                  |
//! | emergency | `emergency_halt`                                  |
//!
//! The role set is stored as one value and only `transfer_governance` writes
//! it, so the three holders always change together.

use soroban_sdk::{
    contracterror, contractevent, contracttype, log, Address, Bytes, Env, String,
};

use crate::command::{self, ProtocolCmd};
use crate::exchange::ExchangeClient;

/// Errors that can occur during policy operations
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum PolicyError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    /// Caller is not the ops authority
    UnauthorizedOps = 3,
    /// Caller is not the treasury authority
    UnauthorizedTreasury = 4,
    /// Caller is not the emergency authority
    UnauthorizedEmergency = 5,
    /// Command is empty or needs sudo on a non-sudo path
    InvalidCommand = 6,
}

/// Storage keys for policy data
#[contracttype]
#[derive(Clone)]
pub enum PolicyDataKey {
    Authorities,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthoritySet {
    pub ops: Address,
    pub treasury: Address,
    pub emergency: Address,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Role {
    Ops,
    Treasury,
    Emergency,
}

impl Role {
    fn holder(self, set: &AuthoritySet) -> &Address {
        match self {
            Role::Ops => &set.ops,
            Role::Treasury => &set.treasury,
            Role::Emergency => &set.emergency,
        }
    }

    fn unauthorized(self) -> PolicyError {
        match self {
            Role::Ops => PolicyError::UnauthorizedOps,
            Role::Treasury => PolicyError::UnauthorizedTreasury,
            Role::Emergency => PolicyError::UnauthorizedEmergency,
        }
    }
}

/// Proxy index of the exchange's cold path, which handles halt commands.
pub const COLD_PROXY_PATH: u32 = 3;

#[contractevent]
#[derive(Clone, Debug)]
pub struct GovernanceTransferredEvent {
    pub ops: Address,
    pub treasury: Address,
    pub emergency: Address,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct EmergencyHaltEvent {
    #[topic]
    pub target: Address,
    pub reason: String,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct ResolutionEvent {
    #[topic]
    pub target: Address,
    pub path: u32,
    pub opcode: u32,
    pub sudo: bool,
}

/// Set every role to `authority`. Can only be called once.
pub fn initialize(env: &Env, authority: Address) -> Result<(), PolicyError> {
    let key = PolicyDataKey::Authorities;
    if env.storage().instance().has(&key) {
        return Err(PolicyError::AlreadyInitialized);
    }
    let set = AuthoritySet {
        ops: authority.clone(),
        treasury: authority.clone(),
        emergency: authority,
    };
    env.storage().instance().set(&key, &set);
    Ok(())
}

pub fn get_authorities(env: &Env) -> Result<AuthoritySet, PolicyError> {
    env.storage()
        .instance()
        .get(&PolicyDataKey::Authorities)
        .ok_or(PolicyError::NotInitialized)
}

/// Require that `caller` authorized the call and holds `role`
pub fn require_role(env: &Env, caller: &Address, role: Role) -> Result<(), PolicyError> {
    caller.require_auth();
    let set = get_authorities(env)?;
    if role.holder(&set) != caller {
        return Err(role.unauthorized());
    }
    Ok(())
}

/// Replace all three role holders (treasury only)
///
/// # Arguments
/// * `env` - The contract environment
/// * `caller` - Must be the current treasury authority
/// * `ops` - New ops authority
/// * `treasury` - New treasury authority
/// * `emergency` - New emergency authority
pub fn transfer_governance(
    env: &Env,
    caller: Address,
    ops: Address,
    treasury: Address,
    emergency: Address,
) -> Result<(), PolicyError> {
    require_role(env, &caller, Role::Treasury)?;

    let set = AuthoritySet {
        ops,
        treasury,
        emergency,
    };
    env.storage()
        .instance()
        .set(&PolicyDataKey::Authorities, &set);

    GovernanceTransferredEvent {
        ops: set.ops.clone(),
        treasury: set.treasury.clone(),
        emergency: set.emergency.clone(),
    }
    .publish(env);
    log!(env, "transfer_governance treasury={}", set.treasury);
    Ok(())
}

/// Halt swaps on `target` and put it into safe mode (emergency only)
///
/// Both commands go through the cold path with sudo. If the exchange rejects
/// either one the whole call fails and neither takes effect.
pub fn emergency_halt(
    env: &Env,
    caller: Address,
    target: Address,
    reason: String,
) -> Result<(), PolicyError> {
    require_role(env, &caller, Role::Emergency)?;

    let exchange = ExchangeClient::new(env, &target);
    let this = env.current_contract_address();
    for cmd in [ProtocolCmd::HotPath(false), ProtocolCmd::SafeMode(true)] {
        exchange.protocol_cmd(&this, &COLD_PROXY_PATH, &cmd.encode(env), &true);
    }

    EmergencyHaltEvent {
        target: target.clone(),
        reason,
    }
    .publish(env);
    log!(env, "emergency_halt target={}", target);
    Ok(())
}

/// Forward an arbitrary command to `target` (treasury only)
///
/// # Arguments
/// * `env` - The contract environment
/// * `caller` - Must be the current treasury authority
/// * `target` - Exchange receiving the command
/// * `path` - Proxy index that interprets the command
/// * `cmd` - Encoded command, forwarded verbatim
/// * `sudo` - Whether upgrade-class commands are permitted
pub fn treasury_resolution(
    env: &Env,
    caller: Address,
    target: Address,
    path: u32,
    cmd: Bytes,
    sudo: bool,
) -> Result<(), PolicyError> {
    require_role(env, &caller, Role::Treasury)?;
    forward(env, target, path, cmd, sudo)
}

/// Forward a routine command to `target` without sudo (ops only)
pub fn ops_resolution(
    env: &Env,
    caller: Address,
    target: Address,
    path: u32,
    cmd: Bytes,
) -> Result<(), PolicyError> {
    require_role(env, &caller, Role::Ops)?;

    let opcode = command::opcode_of(&cmd).ok_or(PolicyError::InvalidCommand)?;
    if command::is_sudo_opcode(opcode) {
        return Err(PolicyError::InvalidCommand);
    }
    forward(env, target, path, cmd, false)
}

fn forward(
    env: &Env,
    target: Address,
    path: u32,
    cmd: Bytes,
    sudo: bool,
) -> Result<(), PolicyError> {
    let opcode = command::opcode_of(&cmd).ok_or(PolicyError::InvalidCommand)?;

    ExchangeClient::new(env, &target).protocol_cmd(
        &env.current_contract_address(),
        &path,
        &cmd,
        &sudo,
    );

    ResolutionEvent {
        target,
        path,
        opcode: opcode as u32,
        sudo,
    }
    .publish(env);
    Ok(())
}
