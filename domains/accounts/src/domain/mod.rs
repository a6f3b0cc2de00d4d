//! Domain model for the Accounts domain

pub mod entities;

pub use entities::{Account, NewAccount, Profile};
