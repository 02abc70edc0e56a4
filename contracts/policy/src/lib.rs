//! # Exchange Governance Policy Contract
//!
//! Sits between the governance timelock and one or more exchange
//! deployments. The policy contract is the exchange's authority; governance
//! reaches the exchange only through the role-gated entry points below.
//!
//! ## Roles
//! - **Ops**: routine, non-sudo commands
//! - **Treasury**: role hand-over and arbitrary (optionally sudo) commands
//! - **Emergency**: halting an exchange

#![no_std]
#![allow(clippy::too_many_arguments)]
use soroban_sdk::{contract, contractimpl, Address, Bytes, Env, String};

pub mod command;
mod exchange;
mod policy;

pub use exchange::{ExchangeClient, ExchangeInterface};
pub use policy::{AuthoritySet, PolicyError, Role, COLD_PROXY_PATH};

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;


#[contract]
pub struct PolicyContract;

#[contractimpl]
impl PolicyContract {
    /// Initialize the policy with a single authority holding every role.
    ///
    /// Usually the deployer, who then hands the roles to a timelock with
    /// `transfer_governance`.
    pub fn initialize(env: Env, authority: Address) -> Result<(), PolicyError> {
        policy::initialize(&env, authority)
    }

    /// Replace the ops, treasury and emergency authorities together.
    ///
    /// # Errors
    /// - `UnauthorizedTreasury` - caller is not the treasury authority
    pub fn transfer_governance(
        env: Env,
        caller: Address,
        ops: Address,
        treasury: Address,
        emergency: Address,
    ) -> Result<(), PolicyError> {
        policy::transfer_governance(&env, caller, ops, treasury, emergency)
    }

    /// Close the hot path of `target` and switch it to safe mode.
    ///
    /// # Errors
    /// - `UnauthorizedEmergency` - caller is not the emergency authority
    pub fn emergency_halt(
        env: Env,
        caller: Address,
        target: Address,
        reason: String,
    ) -> Result<(), PolicyError> {
        policy::emergency_halt(&env, caller, target, reason)
    }

    /// Send an encoded command to `target` at proxy `path`.
    ///
    /// # Errors
    /// - `UnauthorizedTreasury` - caller is not the treasury authority
    /// - `InvalidCommand` - command is empty
    pub fn treasury_resolution(
        env: Env,
        caller: Address,
        target: Address,
        path: u32,
        cmd: Bytes,
        sudo: bool,
    ) -> Result<(), PolicyError> {
        policy::treasury_resolution(&env, caller, target, path, cmd, sudo)
    }

    /// Send a non-sudo command to `target` at proxy `path`.
    ///
    /// # Errors
    /// - `UnauthorizedOps` - caller is not the ops authority
    /// - `InvalidCommand` - command is empty or upgrade-class
    pub fn ops_resolution(
        env: Env,
        caller: Address,
        target: Address,
        path: u32,
        cmd: Bytes,
    ) -> Result<(), PolicyError> {
        policy::ops_resolution(&env, caller, target, path, cmd)
    }

    pub fn ops_authority(env: Env) -> Result<Address, PolicyError> {
        Ok(policy::get_authorities(&env)?.ops)
    }

    pub fn treasury_authority(env: Env) -> Result<Address, PolicyError> {
        Ok(policy::get_authorities(&env)?.treasury)
    }

    pub fn emergency_authority(env: Env) -> Result<Address, PolicyError> {
        Ok(policy::get_authorities(&env)?.emergency)
    }

    pub fn authorities(env: Env) -> Result<AuthoritySet, PolicyError> {
        policy::get_authorities(&env)
    }
}
