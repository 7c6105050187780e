//! Expression shapes shared by several recognizers.

use chainql_core::{
    ARROW_FUNCTION_EXPRESSION, BINARY_EXPRESSION, BLOCK_STATEMENT, FUNCTION_EXPRESSION,
    RETURN_STATEMENT,
};

use chainql_core::NodeExt;

use crate::Pattern;
use crate::pattern::pat::*;

/// Arrow or function expression with the given parameter list and body.
///
/// The body may be the expression itself or a block holding a single
/// `return` of it.
pub(crate) fn function(params: Pattern, body: Pattern) -> Pattern {
    let returned = node(
        BLOCK_STATEMENT,
        [(
            "body",
            seq([one(node(RETURN_STATEMENT, [("argument", body.clone())]))]),
        )],
    );
    let expression = exists("expected an expression body", |v| {
        !v.unparen().is_kind(BLOCK_STATEMENT)
    });
    let body = one_of([expression.and(body), returned]);
    one_of([
        node(
            ARROW_FUNCTION_EXPRESSION,
            [("params", params.clone()), ("body", body.clone())],
        ),
        node(FUNCTION_EXPRESSION, [("params", params), ("body", body)]),
    ])
}

/// Exactly one plain identifier parameter, bound by name.
pub(crate) fn one_param(name: &str) -> Pattern {
    seq([one(ident_as(name))])
}

/// Exactly two plain identifier parameters, bound by name.
pub(crate) fn two_params(first: &str, second: &str) -> Pattern {
    seq([one(ident_as(first)), one(ident_as(second))])
}

/// `<ident>.<field>`, binding the identifier's name and the field name.
pub(crate) fn field_of(object: &str, field: &str) -> Pattern {
    member_as(ident_as(object), field)
}

pub(crate) const RELATIONAL: &[&str] = &[">", ">=", "<", "<="];
pub(crate) const COMPARISON: &[&str] = &[">", ">=", "<", "<=", "==", "==="];

/// `<l>.<field> <op> <r>.<field>` over the operators in `operators`.
///
/// `field` is captured from both sides under one name, so the two property
/// names must agree.
pub(crate) fn compare(
    operators: &'static [&'static str],
    op: &str,
    left: &str,
    right: &str,
) -> Pattern {
    node(
        BINARY_EXPRESSION,
        [
            ("operator", str_in(operators).capture(op)),
            ("left", field_of(left, "field")),
            ("right", field_of(right, "field")),
        ],
    )
}
