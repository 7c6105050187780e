//! Comparator normalization.
//!
//! `sort` accepts hand-written comparators in three idioms and reduces each
//! to a single [`SortDescriptor`]:
//!
//! - relational: `(a, b) => a.f > b.f`
//! - ternary: `(a, b) => a.f > b.f ? 1 : a.f < b.f ? -1 : 0`
//! - subtraction: `(a, b) => a.f - b.f`, optionally negated as `-(...)`
//!
//! Anything else is a `Skip`; exotic comparators are not guessed at.
//!
//! All idioms are decoded with signs. Each operand order contributes `+1`
//! when the parameters appear in declared order and `-1` when swapped; each
//! operator and returned literal contributes its own sign. The product or sum
//! of those decides the direction.

use std::sync::LazyLock;

use serde_json::Value;

use chainql_core::{BINARY_EXPRESSION, CONDITIONAL_EXPRESSION, UNARY_EXPRESSION};

use crate::ir::SortDescriptor;
use crate::pattern::pat::*;
use crate::pattern::{Matched, Outcome, Rule, first_of};
use crate::shapes::{COMPARISON, RELATIONAL, compare, field_of, function, two_params};

#[cfg(test)]
#[path = "sort_tests.rs"]
mod sort_tests;

/// Reduce a comparator function node to a sort descriptor.
pub fn normalize_comparator(function: &Value) -> Outcome<SortDescriptor> {
    first_of(&COMPARATORS, &(), function)
}

static COMPARATORS: LazyLock<Vec<Rule<(), SortDescriptor>>> =
    LazyLock::new(|| vec![relational(), ternary(), subtraction()]);

fn relational() -> Rule<(), SortDescriptor> {
    let pattern = function(two_params("a", "b"), compare(RELATIONAL, "op", "l", "r"));
    Rule::new("relational", pattern, |_, m| {
        let order = crate::matched!(operand_order(&m, "l", "r"));
        let op = crate::matched!(operator_sign(&m, "op"));
        descriptor(&m, op * order)
    })
}

fn ternary() -> Rule<(), SortDescriptor> {
    let inner = node(
        CONDITIONAL_EXPRESSION,
        [
            ("test", compare(COMPARISON, "op2", "l", "r")),
            ("consequent", number_as("n2")),
            ("alternate", number_as("n3")),
        ],
    );
    let body = node(
        CONDITIONAL_EXPRESSION,
        [
            ("test", compare(COMPARISON, "op1", "l", "r")),
            ("consequent", number_as("n1")),
            ("alternate", inner),
        ],
    );
    // Both comparisons capture `l` and `r`, so their operands must agree.
    Rule::new("ternary", function(two_params("a", "b"), body), |_, m| {
        let order = crate::matched!(operand_order(&m, "l", "r"));
        let first = crate::matched!(branch_sign(&m, "op1", "n1")) * order;
        let second = crate::matched!(branch_sign(&m, "op2", "n2")) * order;
        let trailing = literal_sign(m.f64("n3").unwrap_or(0.0));
        match first + second + trailing {
            2 => descriptor(&m, 1),
            -2 => descriptor(&m, -1),
            total => Outcome::skip(format!(
                "ternary comparator does not order consistently (sign total {total})"
            )),
        }
    })
}

fn subtraction() -> Rule<(), SortDescriptor> {
    let difference = node(
        BINARY_EXPRESSION,
        [
            ("operator", lit("-")),
            ("left", field_of("l", "field")),
            ("right", field_of("r", "field")),
        ],
    );
    let body = one_of([
        difference.clone().and(tag("negated", false)),
        node(
            UNARY_EXPRESSION,
            [("operator", lit("-")), ("argument", difference)],
        )
        .and(tag("negated", true)),
    ]);
    Rule::new("subtraction", function(two_params("a", "b"), body), |_, m| {
        let order = crate::matched!(operand_order(&m, "l", "r"));
        let negated = m.get("negated").and_then(Value::as_bool).unwrap_or(false);
        descriptor(&m, if negated { -order } else { order })
    })
}

fn descriptor(m: &Matched, sign: i32) -> Outcome<SortDescriptor> {
    let Some(field) = m.str("field") else {
        return Outcome::skip("comparator does not compare a named property");
    };
    match sign {
        1 => Outcome::Match(SortDescriptor {
            field: field.to_owned(),
            ascending: true,
        }),
        -1 => Outcome::Match(SortDescriptor {
            field: field.to_owned(),
            ascending: false,
        }),
        _ => Outcome::skip("comparator has no direction"),
    }
}

/// `+1` if `<l> <op> <r>` uses the parameters in declared order, `-1` if
/// swapped. Any other identifier pairing is a skip.
fn operand_order(m: &Matched, left: &str, right: &str) -> Outcome<i32> {
    let (Some(a), Some(b)) = (m.str("a"), m.str("b")) else {
        return Outcome::skip("comparator parameters are not identifiers");
    };
    if a == b {
        return Outcome::skip("comparator parameters must be distinct");
    }
    match (m.str(left), m.str(right)) {
        (Some(l), Some(r)) if l == a && r == b => Outcome::Match(1),
        (Some(l), Some(r)) if l == b && r == a => Outcome::Match(-1),
        _ => Outcome::skip(format!(
            "comparison must reference both parameters `{a}` and `{b}`"
        )),
    }
}

fn operator_sign(m: &Matched, op: &str) -> Outcome<i32> {
    match m.str(op) {
        Some(">" | ">=") => Outcome::Match(1),
        Some("<" | "<=") => Outcome::Match(-1),
        Some("==" | "===") => Outcome::Match(0),
        Some(other) => Outcome::skip(format!("`{other}` is not a comparison operator")),
        None => Outcome::skip("missing comparison operator"),
    }
}

fn literal_sign(value: f64) -> i32 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Operator sign times literal sign; the operand order is shared by both
/// branches and applied by the caller.
fn branch_sign(m: &Matched, op: &str, literal: &str) -> Outcome<i32> {
    let op = crate::matched!(operator_sign(m, op));
    let literal = literal_sign(m.f64(literal).unwrap_or(0.0));
    Outcome::Match(op * literal)
}
