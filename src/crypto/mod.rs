//! Cryptographic primitives: one-way secret hashing and identity-bound
//! token signing.

pub mod hasher;
pub mod signer;

pub use hasher::{hash_secret, verify_secret};
pub use signer::{sign, token_for, verify, verify_for, Token};
