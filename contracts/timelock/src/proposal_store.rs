use soroban_sdk::{contractclient, contracttype, Address, Bytes, Env, String, Symbol, Vec};

/// Proposal as returned by the proposal store.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Proposal {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub targets: Vec<Address>,
    pub values: Vec<i128>,
    pub signatures: Vec<Symbol>,
    pub calldatas: Vec<Bytes>,
}

/// Read side of the proposal store. Fails for unknown ids.
#[contractclient(name = "ProposalStoreClient")]
pub trait ProposalStoreInterface {
    fn get_proposal(env: Env, id: u64) -> Proposal;
}
