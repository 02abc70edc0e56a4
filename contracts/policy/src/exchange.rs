use soroban_sdk::{contractclient, Address, Bytes, Env};

/// Privileged command entry point of an exchange deployment.
///
/// `caller` must be the exchange's current authority. `path` selects the
/// proxy sidecar that interprets `cmd`; `sudo` permits upgrade-class commands.
#[contractclient(name = "ExchangeClient")]
pub trait ExchangeInterface {
    fn protocol_cmd(env: Env, caller: Address, path: u32, cmd: Bytes, sudo: bool);
}
