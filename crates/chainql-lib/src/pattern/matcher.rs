//! Recursive pattern interpreter.

use serde_json::Value;

use chainql_core::{NodeExt, same_node};

use super::outcome::{Bindings, Outcome, merge};
use super::{Pattern, Slot};

/// Absent fields are matched as `null`.
static ABSENT: Value = Value::Null;

pub(super) fn match_pattern(pattern: &Pattern, value: &Value) -> Outcome<Bindings> {
    match pattern {
        Pattern::Any => Outcome::Match(Bindings::new()),
        Pattern::Literal(expected) => {
            if same_node(expected, value) {
                Outcome::Match(Bindings::new())
            } else {
                Outcome::skip(format!("expected {}, found {}", brief(expected), brief(value)))
            }
        }
        Pattern::Shape(fields) => match_shape(fields, value),
        Pattern::Seq(slots) => match value {
            Value::Array(items) => match_slots(slots, items, Bindings::new()),
            other => Outcome::skip(format!("expected a sequence, found {}", brief(other))),
        },
        Pattern::OneOf(branches) => match_one_of(branches, value),
        Pattern::All(parts) => {
            let mut bindings = Bindings::new();
            for part in parts {
                let inner = crate::matched!(match_pattern(part, value));
                bindings = crate::matched!(extend(bindings, inner));
            }
            Outcome::Match(bindings)
        }
        Pattern::Capture {
            name,
            inner,
            compute,
        } => {
            let mut bindings = match inner {
                Some(inner) => crate::matched!(match_pattern(inner, value)),
                None => Bindings::new(),
            };
            let bound = match compute {
                Some(compute) => compute(value),
                None => value.unparen().clone(),
            };
            let mut own = Bindings::new();
            own.insert(name.clone(), bound);
            if let Err(skip) = merge(&mut bindings, own) {
                return skip.into();
            }
            Outcome::Match(bindings)
        }
        Pattern::Exists { reason, test } => {
            if test(value) {
                Outcome::Match(Bindings::new())
            } else {
                Outcome::skip(reason.clone())
            }
        }
    }
}

fn match_shape(fields: &[(String, Pattern)], value: &Value) -> Outcome<Bindings> {
    let node = value.unparen();
    let Value::Object(map) = node else {
        return Outcome::skip(format!("expected a node, found {}", brief(node)));
    };
    let mut bindings = Bindings::new();
    for (name, pattern) in fields {
        let child = map.get(name).map(NodeExt::unparen).unwrap_or(&ABSENT);
        let inner = match match_pattern(pattern, child) {
            Outcome::Match(inner) => inner,
            Outcome::Skip(skip) => {
                return Outcome::skip(format!("in `{name}`: {}", skip.reason));
            }
        };
        if let Err(skip) = merge(&mut bindings, inner) {
            return skip.into();
        }
    }
    Outcome::Match(bindings)
}

fn match_one_of(branches: &[Pattern], value: &Value) -> Outcome<Bindings> {
    let mut reasons = Vec::with_capacity(branches.len());
    for branch in branches {
        match match_pattern(branch, value) {
            Outcome::Match(bindings) => return Outcome::Match(bindings),
            Outcome::Skip(skip) => reasons.push(skip.reason),
        }
    }
    Outcome::skip(format!("no alternative matched ({})", reasons.join("; ")))
}

fn match_slots(slots: &[Slot], items: &[Value], bindings: Bindings) -> Outcome<Bindings> {
    let Some((slot, remaining)) = slots.split_first() else {
        if items.is_empty() {
            return Outcome::Match(bindings);
        }
        return Outcome::skip(format!("{} unexpected trailing element(s)", items.len()));
    };

    match slot {
        Slot::One(pattern) => {
            let Some((item, rest)) = items.split_first() else {
                return Outcome::skip(format!("expected {} more element(s)", required(slots)));
            };
            let matched = crate::matched!(match_pattern(pattern, item));
            let bindings = crate::matched!(extend(bindings, matched));
            match_slots(remaining, rest, bindings)
        }
        Slot::Optional(pattern) => {
            if let Some((item, rest)) = items.split_first()
                && let Outcome::Match(matched) = match_pattern(pattern, item)
                && let Outcome::Match(extended) = extend(bindings.clone(), matched)
                && let Outcome::Match(done) = match_slots(remaining, rest, extended)
            {
                return Outcome::Match(done);
            }
            match_slots(remaining, items, bindings)
        }
        Slot::Rest { each, capture } => {
            // A rest slot takes everything the slots after it don't need.
            let keep = required(remaining).min(items.len());
            let (taken, rest) = items.split_at(items.len() - keep);
            for (i, item) in taken.iter().enumerate() {
                if let Outcome::Skip(skip) = match_pattern(each, item) {
                    return Outcome::skip(format!("element {i}: {}", skip.reason));
                }
            }
            let mut bindings = bindings;
            if let Some(name) = capture {
                let mut own = Bindings::new();
                own.insert(name.clone(), Value::Array(taken.to_vec()));
                if let Err(skip) = merge(&mut bindings, own) {
                    return skip.into();
                }
            }
            match_slots(remaining, rest, bindings)
        }
    }
}

fn extend(mut bindings: Bindings, incoming: Bindings) -> Outcome<Bindings> {
    match merge(&mut bindings, incoming) {
        Ok(()) => Outcome::Match(bindings),
        Err(skip) => Outcome::Skip(skip),
    }
}

fn required(slots: &[Slot]) -> usize {
    slots.iter().filter(|s| matches!(s, Slot::One(_))).count()
}

/// Short description of a value for skip messages.
fn brief(value: &Value) -> String {
    if let Some(kind) = value.kind() {
        return match value.ident_name() {
            Some(name) => format!("{kind} `{name}`"),
            None => kind.to_owned(),
        };
    }
    match value {
        Value::Null => "nothing".to_owned(),
        Value::Array(items) => format!("{} element(s)", items.len()),
        Value::Object(_) => "an object".to_owned(),
        other => other.to_string(),
    }
}
