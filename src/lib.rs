//! Client SDK for the Finnotech banking API.
//!
//! [`TokenService`] issues and refreshes client-credentials tokens and hands
//! them to a [`TokenStore`] supplied by the application. [`OakClient`] runs
//! the inquiry operations, pulling a bearer token from the same store for
//! each call.
pub mod config;
pub mod error;
pub mod finnotech;
pub mod store;

pub use error::{Error, Result};
pub use finnotech::{
    ClientIdentity, GrantType, InquiryFile, OakClient, OakOperations, Scope, TokenService,
    TokenSet, TokenStore, types,
};
pub use store::{FileTokenStore, MemoryTokenStore};
