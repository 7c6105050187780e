//! Constructors for ESTree nodes.
//!
//! These produce the same shapes a parser would, minus positions. Used by
//! tests and by tools that synthesize trees instead of parsing source.

use serde_json::{Value, json};

pub fn ident(name: &str) -> Value {
    json!({ "type": "Identifier", "name": name })
}

pub fn num(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        let int = value as i64;
        if int < 0 {
            return unary("-", json!({ "type": "Literal", "value": -int }));
        }
        return json!({ "type": "Literal", "value": int });
    }
    if value < 0.0 {
        return unary("-", json!({ "type": "Literal", "value": -value }));
    }
    json!({ "type": "Literal", "value": value })
}

pub fn string(value: &str) -> Value {
    json!({ "type": "Literal", "value": value })
}

pub fn boolean(value: bool) -> Value {
    json!({ "type": "Literal", "value": value })
}

/// `object.property`
pub fn member(object: Value, property: &str) -> Value {
    json!({
        "type": "MemberExpression",
        "object": object,
        "property": ident(property),
        "computed": false,
    })
}

/// `object["property"]`
pub fn index(object: Value, property: Value) -> Value {
    json!({
        "type": "MemberExpression",
        "object": object,
        "property": property,
        "computed": true,
    })
}

/// Member access chain from a dotted path: `path("a.b.c")`.
pub fn path(dotted: &str) -> Value {
    let mut parts = dotted.split('.');
    let head = ident(parts.next().unwrap_or_default());
    parts.fold(head, member)
}

pub fn call(callee: Value, arguments: Vec<Value>) -> Value {
    json!({ "type": "CallExpression", "callee": callee, "arguments": arguments })
}

/// `object.method(arguments...)`
pub fn method(object: Value, name: &str, arguments: Vec<Value>) -> Value {
    call(member(object, name), arguments)
}

/// Expression-bodied arrow function.
pub fn arrow(params: &[&str], body: Value) -> Value {
    let params: Vec<Value> = params.iter().map(|p| ident(p)).collect();
    json!({
        "type": "ArrowFunctionExpression",
        "params": params,
        "body": body,
        "expression": true,
    })
}

/// Arrow function whose block body is a single `return`.
pub fn arrow_block(params: &[&str], returned: Value) -> Value {
    let params: Vec<Value> = params.iter().map(|p| ident(p)).collect();
    json!({
        "type": "ArrowFunctionExpression",
        "params": params,
        "body": {
            "type": "BlockStatement",
            "body": [{ "type": "ReturnStatement", "argument": returned }],
        },
        "expression": false,
    })
}

pub fn binary(operator: &str, left: Value, right: Value) -> Value {
    json!({ "type": "BinaryExpression", "operator": operator, "left": left, "right": right })
}

pub fn logical(operator: &str, left: Value, right: Value) -> Value {
    json!({ "type": "LogicalExpression", "operator": operator, "left": left, "right": right })
}

pub fn unary(operator: &str, argument: Value) -> Value {
    json!({ "type": "UnaryExpression", "operator": operator, "prefix": true, "argument": argument })
}

pub fn conditional(test: Value, consequent: Value, alternate: Value) -> Value {
    json!({
        "type": "ConditionalExpression",
        "test": test,
        "consequent": consequent,
        "alternate": alternate,
    })
}

pub fn assign(left: Value, right: Value) -> Value {
    json!({ "type": "AssignmentExpression", "operator": "=", "left": left, "right": right })
}

pub fn paren(expression: Value) -> Value {
    json!({ "type": "ParenthesizedExpression", "expression": expression })
}

/// `key: value` object member.
pub fn prop(key: &str, value: Value) -> Value {
    json!({
        "type": "Property",
        "key": ident(key),
        "value": value,
        "kind": "init",
        "computed": false,
        "shorthand": false,
        "method": false,
    })
}

/// `...argument`
pub fn spread(argument: Value) -> Value {
    json!({ "type": "SpreadElement", "argument": argument })
}

pub fn object(properties: Vec<Value>) -> Value {
    json!({ "type": "ObjectExpression", "properties": properties })
}

pub fn array(elements: Vec<Value>) -> Value {
    json!({ "type": "ArrayExpression", "elements": elements })
}

pub fn expr_stmt(expression: Value) -> Value {
    json!({ "type": "ExpressionStatement", "expression": expression })
}

/// `const name = init;`
pub fn const_decl(name: &str, init: Value) -> Value {
    json!({
        "type": "VariableDeclaration",
        "kind": "const",
        "declarations": [{ "type": "VariableDeclarator", "id": ident(name), "init": init }],
    })
}

pub fn program(body: Vec<Value>) -> Value {
    json!({ "type": "Program", "sourceType": "module", "body": body })
}
