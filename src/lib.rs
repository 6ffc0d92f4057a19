//! Household points tracker: a shared ledger of point events, savings goals with a one-shot
//! celebration signal, and role-based permissions, served over HTTP by the `points-tree-server`
//! binary.

pub mod api;
pub mod auth;
pub mod constants;
pub mod db;
pub mod error;
pub mod goals;
pub mod ledger;
pub mod util;
