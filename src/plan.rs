//! Attribute-level planning between prior and proposed state.
//!
//! The host decides that an object needs attention; this module tells it which
//! attributes actually changed once a resource's diff suppression has been
//! applied, and whether any of them force replacement.

use serde_json::{Map, Value};

use crate::resource::ID_KEY;
use crate::schema::{Attribute, Schema};
use crate::types::{AttributeChange, PlanResult};

/// Predicate over `(path, old, new)`; `true` means ignore the difference.
pub type SuppressFn<'a> = &'a (dyn Fn(&str, &str, &str) -> bool + Send + Sync);

/// Plan a create (`prior` is `None`) or an update.
pub fn diff(
    schema: &Schema,
    prior: Option<&Value>,
    proposed: &Value,
    suppress: SuppressFn<'_>,
) -> PlanResult {
    let empty = Map::new();
    let proposed_obj = proposed.as_object().unwrap_or(&empty);

    let Some(prior) = prior.filter(|p| !p.is_null()) else {
        return plan_create(schema, proposed_obj);
    };
    let prior_obj = prior.as_object().unwrap_or(&empty);

    let mut planned = proposed_obj.clone();
    let mut changes = Vec::new();
    let mut requires_replace = false;

    for (name, attr) in &schema.attributes {
        if attr.flags.is_computed_only() {
            if let Some(value) = prior_obj.get(name) {
                planned.insert(name.clone(), value.clone());
            }
            continue;
        }

        let before = declared(prior_obj.get(name), attr);
        let after = match declared(proposed_obj.get(name), attr) {
            Some(value) => Some(value),
            None => {
                apply_default(&mut planned, name, attr);
                declared(attr.default.as_ref(), attr)
            }
        };
        let attr_changes = if attr.attr_type.is_map() {
            diff_map(name, before, after, suppress)
        } else {
            diff_scalar(name, before, after, suppress)
        };

        if attr.force_new && !attr_changes.is_empty() {
            requires_replace = true;
        }
        changes.extend(attr_changes);
    }

    if let Some(id) = prior_obj.get(ID_KEY) {
        planned.insert(ID_KEY.to_string(), id.clone());
    }

    if changes.is_empty() {
        return PlanResult::no_change(prior.clone());
    }
    PlanResult::with_changes(Value::Object(planned), changes, requires_replace)
}

fn plan_create(schema: &Schema, proposed: &Map<String, Value>) -> PlanResult {
    let mut planned = proposed.clone();
    let mut changes = Vec::new();
    for (name, attr) in &schema.attributes {
        match proposed.get(name).filter(|v| !v.is_null()) {
            Some(value) if !attr.flags.is_computed_only() => {
                changes.push(AttributeChange::added(name.clone(), value.clone()));
            }
            None => apply_default(&mut planned, name, attr),
            _ => {}
        }
    }
    PlanResult::with_changes(Value::Object(planned), changes, false)
}

// An optional attribute left empty is the same as one never declared.
fn declared<'a>(value: Option<&'a Value>, attr: &Attribute) -> Option<&'a Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !(s.is_empty() && attr.flags.optional),
        _ => true,
    })
}

fn apply_default(planned: &mut Map<String, Value>, name: &str, attr: &Attribute) {
    if let Some(default) = &attr.default {
        planned.insert(name.to_string(), default.clone());
    }
}

fn diff_scalar(
    name: &str,
    before: Option<&Value>,
    after: Option<&Value>,
    suppress: SuppressFn<'_>,
) -> Vec<AttributeChange> {
    let change = match (before, after) {
        (Some(b), Some(a)) if b == a => return Vec::new(),
        (Some(b), Some(a)) => AttributeChange::modified(name, b.clone(), a.clone()),
        (Some(b), None) => AttributeChange::removed(name, b.clone()),
        (None, Some(a)) => AttributeChange::added(name, a.clone()),
        (None, None) => return Vec::new(),
    };
    if suppressed(&change, suppress) {
        return Vec::new();
    }
    vec![change]
}

fn diff_map(
    name: &str,
    before: Option<&Value>,
    after: Option<&Value>,
    suppress: SuppressFn<'_>,
) -> Vec<AttributeChange> {
    let empty = Map::new();
    let before = before.and_then(Value::as_object).unwrap_or(&empty);
    let after = after.and_then(Value::as_object).unwrap_or(&empty);

    let mut keys: Vec<&String> = before.keys().chain(after.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|key| {
            let path = format!("{}.{}", name, key);
            let change = match (before.get(key), after.get(key)) {
                (Some(b), Some(a)) if b == a => return None,
                (Some(b), Some(a)) => AttributeChange::modified(path, b.clone(), a.clone()),
                (Some(b), None) => AttributeChange::removed(path, b.clone()),
                (None, Some(a)) => AttributeChange::added(path, a.clone()),
                (None, None) => return None,
            };
            (!suppressed(&change, suppress)).then_some(change)
        })
        .collect()
}

fn suppressed(change: &AttributeChange, suppress: SuppressFn<'_>) -> bool {
    let old = change.before.as_ref().map(display).unwrap_or_default();
    let new = change.after.as_ref().map(display).unwrap_or_default();
    suppress(&change.path, &old, &new)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A suppressor that never ignores anything.
pub fn keep_all(_: &str, _: &str, _: &str) -> bool {
    false
}
