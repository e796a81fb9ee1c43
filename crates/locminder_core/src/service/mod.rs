//! Pure use-case services.
//!
//! # Responsibility
//! - Hold business rules that need no storage or platform access.

pub mod validator;
