//! Auth domain logic for WorkFun.
//!
//! # Architecture
//!
//! ```text
//! AuthController (UI-facing state machine, transient AuthUiState)
//! ├── AuthService (login/register/logout, the error boundary)
//! │   └── SessionPolicy (single-active-account arbiter)
//! └── SessionObserver (mirrors the directory's active-account feed)
//!             │
//!             v
//!     AccountDirectory (workfun-store)
//! ```
//!
//! The service is the only place storage faults are converted into the
//! user-facing [`workfun_types::AuthError`] taxonomy; everything above it
//! deals exclusively in tagged results and watch-channel snapshots.

mod controller;
mod observer;
mod policy;
mod service;

pub use controller::AuthController;
pub use observer::SessionObserver;
pub use policy::SessionPolicy;
pub use service::AuthService;
