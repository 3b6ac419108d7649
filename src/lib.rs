//! Discount Exclusion
//!
//! Decides whether a coupon-driven cart price rule may discount a line item
//! that is already discounted by a special price or a catalog rule, and
//! narrates the decisions as shopper-facing messages.
//!
//! Rules either block already-discounted items outright or, with bypass
//! enabled, grant only the part of their discount that exceeds the existing
//! one.

pub mod bypass;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod cycle;
pub mod engine;
pub mod evaluate;
pub mod fixtures;
pub mod guards;
pub mod items;
pub mod messages;
pub mod prelude;
pub mod products;
pub mod report;
pub mod rules;
pub mod strategies;
pub mod sync;
