//! # Fee Routing Turnstile
//!
//! Binds registered contracts to non-fungible identifiers and routes fee
//! credits to whoever currently owns the identifier.
//!
//! ## Features
//! - **Registration**: a contract registers itself once and receives the next
//!   identifier; the identifier is minted on the ownership registry.
//! - **Fee crediting**: the turnstile admin credits fees to an identifier.
//! - **Withdrawal**: the identifier's current owner withdraws credited fees.

#![no_std]
mod ownership;
mod turnstile;

pub use ownership::{OwnershipRegistryClient, OwnershipRegistryInterface};
pub use turnstile::{TurnstileContract, TurnstileContractClient, TurnstileEntry, TurnstileError};
