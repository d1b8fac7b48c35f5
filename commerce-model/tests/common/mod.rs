//! Shared helpers for model tests.
//!
//! Drafts and actions pass through JSON on their way to the remote model, so
//! every helper also exercises the wire encoding.

#![allow(dead_code)]

use commerce_model::{
    ActionContext, Creatable, Materialize, RemoteModel, RemoteObject, Resource, UpdatePlan,
};
use commerce_types::LocalizedString;

pub fn en(text: &str) -> LocalizedString {
    LocalizedString::new().with("en", text)
}

/// Creates `record` on a fresh remote and reads it back, aligned with the plan.
pub fn create<R>(record: &R, ctx: &ActionContext) -> (R, R::Remote)
where
    R: Creatable,
    R::Remote: Materialize<Draft = R::Draft>,
{
    let draft = record.draft(ctx).expect("draft");
    let wire = serde_json::to_value(&draft).expect("encode draft");
    let decoded = serde_json::from_value(wire).expect("decode draft");
    let remote = <R::Remote as Materialize>::materialize(decoded, "id-1".to_string()).expect("materialize");
    let mut stored = R::from_remote(&remote).expect("from_remote");
    stored.align_with_plan(record);
    (stored, remote)
}

/// Applies an update plan the way the remote does: in order, then bumping the version.
pub fn apply<R>(remote: &R::Remote, plan: &UpdatePlan<R::Action>) -> R::Remote
where
    R: Resource,
    R::Remote: RemoteModel<Action = R::Action>,
{
    assert_eq!(plan.version, remote.version(), "plan pinned to a stale version");
    let mut next = remote.clone();
    for action in &plan.actions {
        let wire = serde_json::to_value(action).expect("encode action");
        let decoded: R::Action = serde_json::from_value(wire).expect("decode action");
        next.apply_action(&decoded).expect("apply action");
    }
    next.set_version(remote.version() + 1);
    next
}

/// Diffs `stored` against `desired`, applies the actions and reads back.
pub fn reconcile<R>(stored: &R, remote: &R::Remote, desired: &R, ctx: &ActionContext) -> (Vec<R::Action>, R, R::Remote)
where
    R: Resource,
    R::Remote: RemoteModel<Action = R::Action>,
{
    let plan = stored.update_actions(desired, ctx).expect("update_actions");
    let next = apply::<R>(remote, &plan);
    let mut read = R::from_remote(&next).expect("from_remote");
    read.align_with_plan(desired);
    (plan.actions, read, next)
}

/// Copies the identity of `from` onto `record`.
pub fn with_identity_of<R: Resource>(mut record: R, from: &R) -> R {
    *record.identity_mut() = from.identity().clone();
    record
}
