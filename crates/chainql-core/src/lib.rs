#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! ESTree expression trees for chainql.
//!
//! Trees are plain JSON documents in the shape produced by ESTree-compatible
//! JavaScript parsers (acorn, espree, babel with the `estree` plugin). The
//! analysis core never mutates them; it only inspects fields and compares
//! subtrees.
//!
//! Two layers:
//! - **Inspection**: [`NodeExt`] accessors and [`same_node`] equality
//! - **Construction**: [`build`] helpers for assembling trees in code

use serde_json::Value;

pub mod build;


/// An expression or statement node.
pub type Node = Value;

/// Keys that carry source positions or formatting trivia.
///
/// Two nodes that differ only in these keys denote the same expression.
pub const TRIVIA_KEYS: &[&str] = &[
    "start",
    "end",
    "loc",
    "range",
    "raw",
    "extra",
    "comments",
    "leadingComments",
    "trailingComments",
    "innerComments",
];

// ============================================================================
// Node kinds
// ============================================================================

pub const IDENTIFIER: &str = "Identifier";
pub const LITERAL: &str = "Literal";
pub const MEMBER_EXPRESSION: &str = "MemberExpression";
pub const CALL_EXPRESSION: &str = "CallExpression";
pub const ASSIGNMENT_EXPRESSION: &str = "AssignmentExpression";
pub const CONDITIONAL_EXPRESSION: &str = "ConditionalExpression";
pub const BINARY_EXPRESSION: &str = "BinaryExpression";
pub const LOGICAL_EXPRESSION: &str = "LogicalExpression";
pub const UNARY_EXPRESSION: &str = "UnaryExpression";
pub const ARROW_FUNCTION_EXPRESSION: &str = "ArrowFunctionExpression";
pub const FUNCTION_EXPRESSION: &str = "FunctionExpression";
pub const OBJECT_EXPRESSION: &str = "ObjectExpression";
pub const PROPERTY: &str = "Property";
pub const SPREAD_ELEMENT: &str = "SpreadElement";
pub const ARRAY_EXPRESSION: &str = "ArrayExpression";
pub const BLOCK_STATEMENT: &str = "BlockStatement";
pub const RETURN_STATEMENT: &str = "ReturnStatement";
pub const VARIABLE_DECLARATOR: &str = "VariableDeclarator";
pub const PARENTHESIZED_EXPRESSION: &str = "ParenthesizedExpression";

/// Babel spells some ESTree kinds differently.
fn canonical_kind(kind: &str) -> &str {
    match kind {
        "NumericLiteral" | "StringLiteral" | "BooleanLiteral" | "NullLiteral" => LITERAL,
        "ObjectProperty" => PROPERTY,
        "OptionalMemberExpression" => MEMBER_EXPRESSION,
        "OptionalCallExpression" => CALL_EXPRESSION,
        other => other,
    }
}

// ============================================================================
// Inspection
// ============================================================================

/// Read-only accessors over ESTree nodes.
pub trait NodeExt {
    /// Canonical node kind (the `type` field), with babel aliases folded.
    fn kind(&self) -> Option<&str>;

    fn is_kind(&self, kind: &str) -> bool {
        self.kind() == Some(kind)
    }

    /// Named child, with parentheses looked through.
    fn field(&self, name: &str) -> Option<&Value>;

    /// Array-valued child (e.g. `arguments`, `params`, `properties`).
    fn items(&self, name: &str) -> &[Value];

    /// Strips `ParenthesizedExpression` wrappers.
    fn unparen(&self) -> &Value;

    /// Name of an `Identifier` node.
    fn ident_name(&self) -> Option<&str>;

    /// Static property name of a member expression or object property key.
    ///
    /// `a.b` and `a["b"]` both yield `b`; `a[b]` yields nothing.
    fn static_property(&self) -> Option<&str>;

    /// Value of a numeric literal, including a negated one (`-1`).
    fn number(&self) -> Option<f64>;

    /// Value of a string literal.
    fn string(&self) -> Option<&str>;

    /// Byte span `[start, end)` if the parser recorded one.
    fn span(&self) -> Option<(u64, u64)>;
}

impl NodeExt for Value {
    fn kind(&self) -> Option<&str> {
        self.get("type").and_then(Value::as_str).map(canonical_kind)
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.unparen().get(name).map(NodeExt::unparen)
    }

    fn items(&self, name: &str) -> &[Value] {
        self.unparen()
            .get(name)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn unparen(&self) -> &Value {
        let mut node = self;
        while node.is_kind(PARENTHESIZED_EXPRESSION) {
            match node.get("expression") {
                Some(inner) => node = inner,
                None => break,
            }
        }
        node
    }

    fn ident_name(&self) -> Option<&str> {
        let node = self.unparen();
        if !node.is_kind(IDENTIFIER) {
            return None;
        }
        node.get("name").and_then(Value::as_str)
    }

    fn static_property(&self) -> Option<&str> {
        let node = self.unparen();
        let (key, computed) = match node.kind()? {
            MEMBER_EXPRESSION => (node.field("property")?, is_computed(node)),
            PROPERTY => (node.field("key")?, is_computed(node)),
            _ => return None,
        };
        if computed {
            return key.string();
        }
        key.ident_name().or_else(|| key.string())
    }

    fn number(&self) -> Option<f64> {
        let node = self.unparen();
        match node.kind()? {
            LITERAL => node.get("value").and_then(Value::as_f64),
            UNARY_EXPRESSION => {
                let operand = node.field("argument")?.number()?;
                match node.get("operator").and_then(Value::as_str)? {
                    "-" => Some(-operand),
                    "+" => Some(operand),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn string(&self) -> Option<&str> {
        let node = self.unparen();
        if !node.is_kind(LITERAL) {
            return None;
        }
        node.get("value").and_then(Value::as_str)
    }

    fn span(&self) -> Option<(u64, u64)> {
        if let (Some(start), Some(end)) = (
            self.get("start").and_then(Value::as_u64),
            self.get("end").and_then(Value::as_u64),
        ) {
            return Some((start, end));
        }
        let range = self.get("range")?.as_array()?;
        match range.as_slice() {
            [start, end] => Some((start.as_u64()?, end.as_u64()?)),
            _ => None,
        }
    }
}

fn is_computed(node: &Value) -> bool {
    node.get("computed").and_then(Value::as_bool).unwrap_or(false)
}

// ============================================================================
// Equality
// ============================================================================

/// Structural equality that ignores source positions, raw text and comments.
///
/// Parentheses are transparent: `(a).b` equals `a.b`.
pub fn same_node(a: &Value, b: &Value) -> bool {
    match (a.unparen(), b.unparen()) {
        (Value::Object(left), Value::Object(right)) => {
            let significant = |(key, _): &(&String, &Value)| !TRIVIA_KEYS.contains(&key.as_str());
            let left: Vec<_> = left.iter().filter(significant).collect();
            let right_len = right.iter().filter(significant).count();
            if left.len() != right_len {
                return false;
            }
            left.into_iter().all(|(key, value)| match (key.as_str(), right.get(key)) {
                ("type", Some(other)) => {
                    value.as_str().map(canonical_kind) == other.as_str().map(canonical_kind)
                }
                (_, Some(other)) => same_node(value, other),
                (_, None) => false,
            })
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len() && left.iter().zip(right).all(|(l, r)| same_node(l, r))
        }
        (Value::Number(left), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (left, right) => left == right,
    }
}
