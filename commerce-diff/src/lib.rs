//! Diff primitives shared by the entity model.
//!
//! - [`diff_keyed`]: added, modified and removed elements of two sequences
//!   whose elements carry a stable string key (addresses, variants, prices)
//! - [`diff_sets`]: added and removed members of two string sets
//!   (permissions, category ids, store keys)
//! - [`sort_by_plan`] and [`retain_in_plan_order`]: put a collection returned
//!   by the remote back into the configured order
//!
//! Results borrow from their inputs. Within each class of a [`KeyedDiff`],
//! `added` and `modified` follow desired order and `removed` follows current
//! order.

mod keyed;
mod resort;
mod set;

pub use keyed::{diff_keyed, diff_keyed_with, Keyed, KeyedDiff, Modified};
pub use resort::{retain_in_plan_order, sort_by_plan};
pub use set::{diff_sets, same_members, SetDiff};
