//! Mock exchange for contract tests.
//!
//! Accepts the privileged commands in [`crate::command`] from its current
//! authority and records their effects so tests can observe them.

use soroban_sdk::{contract, contractimpl, contracttype, Address, Bytes, Env};

use crate::command::ProtocolCmd;

#[contracttype]
#[derive(Clone)]
enum MockKey {
    Authority,
    Module(u32),
    HotOpen,
    SafeMode,
    CmdCount,
    LastPath,
}

#[contract]
pub struct MockExchange;

#[contractimpl]
impl MockExchange {
    pub fn init(env: Env, authority: Address) {
        env.storage().instance().set(&MockKey::Authority, &authority);
        env.storage().instance().set(&MockKey::HotOpen, &true);
    }

    pub fn protocol_cmd(env: Env, caller: Address, path: u32, cmd: Bytes, sudo: bool) {
        caller.require_auth();
        if caller != Self::authority(env.clone()) {
            panic!("caller is not the exchange authority");
        }
        let parsed = match ProtocolCmd::decode(&env, &cmd) {
            Ok(parsed) => parsed,
            Err(_) => panic!("malformed protocol command"),
        };
        if parsed.requires_sudo() && !sudo {
            panic!("sudo required");
        }

        let store = env.storage().instance();
        match parsed {
            ProtocolCmd::AuthorityTransfer(auth) => store.set(&MockKey::Authority, &auth),
            ProtocolCmd::ModuleUpgrade { module, slot } => {
                store.set(&MockKey::Module(u32::from(slot)), &module)
            }
            ProtocolCmd::HotPath(open) => store.set(&MockKey::HotOpen, &open),
            ProtocolCmd::SafeMode(on) => store.set(&MockKey::SafeMode, &on),
        }
        let count: u32 = store.get(&MockKey::CmdCount).unwrap_or(0);
        store.set(&MockKey::CmdCount, &(count + 1));
        store.set(&MockKey::LastPath, &path);
    }

    pub fn authority(env: Env) -> Address {
        match env.storage().instance().get(&MockKey::Authority) {
            Some(auth) => auth,
            None => panic!("mock exchange not initialized"),
        }
    }

    /// Module installed at `slot`; slots are `u16` in commands, so wider
    /// values never hold one.
    pub fn module(env: Env, slot: u32) -> Option<Address> {
        u16::try_from(slot).ok()?;
        env.storage().instance().get(&MockKey::Module(slot))
    }

    pub fn hot_path_open(env: Env) -> bool {
        env.storage().instance().get(&MockKey::HotOpen).unwrap_or(true)
    }

    pub fn safe_mode(env: Env) -> bool {
        env.storage().instance().get(&MockKey::SafeMode).unwrap_or(false)
    }

    pub fn cmd_count(env: Env) -> u32 {
        env.storage().instance().get(&MockKey::CmdCount).unwrap_or(0)
    }

    pub fn last_path(env: Env) -> Option<u32> {
        env.storage().instance().get(&MockKey::LastPath)
    }
}
