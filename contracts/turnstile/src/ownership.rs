use soroban_sdk::{contractclient, Address, Env};

/// Non-fungible identifier registry the turnstile mints into.
///
/// The turnstile must be allowed to mint; transfers between owners happen
/// on the registry and are picked up through `owner_of`.
#[contractclient(name = "OwnershipRegistryClient")]
pub trait OwnershipRegistryInterface {
    fn mint(env: Env, to: Address, token_id: u64);
    fn owner_of(env: Env, token_id: u64) -> Address;
}
