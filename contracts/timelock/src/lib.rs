#![no_std]
mod proposal_store;
mod timelock;

pub use proposal_store::{Proposal, ProposalStoreClient};
pub use timelock::{
    failed_call_index, subcall_failed, TimelockContract, TimelockContractClient, TimelockError,
    SUBCALL_FAILED_BASE,
};

#[cfg(test)]
mod test;
