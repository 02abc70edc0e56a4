#![no_std]
#![allow(clippy::too_many_arguments)]
mod store;

pub use store::{DataKey, Proposal, ProposalStoreContract, ProposalStoreContractClient, StoreError};
