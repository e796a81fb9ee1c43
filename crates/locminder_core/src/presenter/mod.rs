//! Reference presenters for the reminder list and save screens.
//!
//! # Responsibility
//! - Consume the repository and registrar through their public contracts.
//! - Publish one explicit view-state snapshot per screen through a single
//!   `watch` channel, recomputed on every transition.
//!
//! # Invariants
//! - View state is only mutated through the owning presenter.
//! - A cancelled save attempt leaves the view state untouched.

pub mod list;
pub mod save;
