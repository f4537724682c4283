//! Core domain types for WorkFun.
//!
//! This crate contains pure domain types with no IO, no async, and minimal
//! dependencies. Everything here can be used from any layer of the
//! application: the persisted [`Account`] record, the [`AuthError`] taxonomy
//! produced by the auth service, and the transient [`AuthUiState`] owned by
//! the controller.

mod account;
mod error;
mod ui_state;

pub use account::{Account, AccountId, NewAccount};
pub use error::AuthError;
pub use ui_state::AuthUiState;
