use indoc::indoc;
use serde_json::{Value, json};

use chainql_core::build::*;

use super::{Site, analyze_program, analyze_program_with};
use crate::trace::{PrintTracer, Verbosity};
use crate::{Config, Error};

fn connected() -> Config {
    Config::new().connector("connect")
}

fn dump(sites: &[Site]) -> String {
    sites.iter().map(|site| site.command.dump()).collect()
}

fn declarations() -> Vec<Value> {
    vec![
        const_decl("db", call(ident("connect"), vec![string("app")])),
        const_decl(
            "todos",
            call(ident("connect"), vec![string("app"), string("todos")]),
        ),
    ]
}

#[test]
fn sites_in_source_order() {
    let mut body = declarations();
    body.extend([
        expr_stmt(member(
            method(path("db.users"), "filter", vec![arrow(&["u"], path("u.active"))]),
            "length",
        )),
        expr_stmt(method(
            ident("todos"),
            "sort",
            vec![arrow(&["a", "b"], binary("-", path("a.due"), path("b.due")))],
        )),
        expr_stmt(method(path("console"), "log", vec![path("db.users")])),
    ]);
    let sites = analyze_program(&program(body), &connected()).unwrap();
    assert_eq!(sites.len(), 3);
    insta::assert_snapshot!(dump(&sites), @r"
    Value length
      Query filter <MemberExpression>
        CollectionRef app.users
    Query sort due asc
      CollectionRef app.todos
    CollectionRef app.users
    ");
}

#[test]
fn explicit_roots_need_no_declaration() {
    let config = Config::new().root("db").database("app");
    let body = vec![expr_stmt(member(path("db.todos"), "length"))];
    let sites = analyze_program(&program(body), &config).unwrap();
    insta::assert_snapshot!(dump(&sites), @r"
    Value length
      CollectionRef app.todos
    ");
}

#[test]
fn use_before_declaration_is_not_a_root() {
    let mut body = vec![expr_stmt(member(path("db.todos"), "length"))];
    body.extend(declarations());
    let sites = analyze_program(&program(body), &connected()).unwrap();
    assert!(sites.is_empty());
}

#[test]
fn unconfigured_connector_declares_nothing() {
    let body = vec![
        const_decl("db", call(ident("open"), vec![string("app")])),
        expr_stmt(member(path("db.todos"), "length")),
    ];
    let sites = analyze_program(&program(body), &connected()).unwrap();
    assert!(sites.is_empty());
}

#[test]
fn first_declaration_wins() {
    let body = vec![
        const_decl("db", call(ident("connect"), vec![string("first")])),
        const_decl("db", call(ident("connect"), vec![string("second")])),
        expr_stmt(path("db.todos")),
    ];
    let sites = analyze_program(&program(body), &connected()).unwrap();
    assert_eq!(sites[0].command.root().db, "first");
}

#[test]
fn write_is_one_site() {
    let mut body = declarations();
    body.push(expr_stmt(assign(
        path("db.todos"),
        method(
            path("db.todos"),
            "filter",
            vec![arrow(&["t"], unary("!", path("t.done")))],
        ),
    )));
    let sites = analyze_program(&program(body), &connected()).unwrap();
    insta::assert_snapshot!(dump(&sites), @r"
    Modification remove where <MemberExpression>
      CollectionRef app.todos
    ");
}

#[test]
fn write_onto_another_collection_is_left_alone() {
    let activated = object(vec![spread(ident("t")), prop("active", boolean(true))]);
    let update = arrow(
        &["t"],
        conditional(binary("===", path("t.id"), num(10.0)), activated, ident("t")),
    );
    let mut body = declarations();
    body.push(expr_stmt(assign(
        path("db.todos"),
        method(path("db.users"), "map", vec![update]),
    )));
    body.push(expr_stmt(assign(
        path("db.todos"),
        method(path("db.users"), "filter", vec![arrow(&["u"], path("u.active"))]),
    )));
    let sites = analyze_program(&program(body), &connected()).unwrap();
    assert!(sites.is_empty());
}

#[test]
fn read_assigned_elsewhere_is_reported() {
    let mut body = declarations();
    body.push(expr_stmt(assign(
        path("cache.active"),
        method(path("db.users"), "filter", vec![arrow(&["u"], path("u.active"))]),
    )));
    let sites = analyze_program(&program(body), &connected()).unwrap();
    assert_eq!(
        dump(&sites),
        indoc! {"
            Query filter <MemberExpression>
              CollectionRef app.users
        "}
    );
}

#[test]
fn assignment_targets_are_not_reported() {
    let mut body = declarations();
    body.push(expr_stmt(assign(path("db.todos"), ident("cached"))));
    let sites = analyze_program(&program(body), &connected()).unwrap();
    assert!(sites.is_empty());
}

#[test]
fn site_spans_come_from_the_tree() {
    let mut length = member(path("db.todos"), "length");
    length["start"] = 40.into();
    length["end"] = 55.into();
    let mut body = declarations();
    body.push(expr_stmt(length));
    let sites = analyze_program(&program(body), &connected()).unwrap();
    assert_eq!(sites[0].span, Some((40, 55)));
    assert_eq!(
        serde_json::to_value(&sites[0]).unwrap()["span"],
        json!([40, 55])
    );
}

#[test]
fn fatal_error_aborts_walk() {
    let mut body = declarations();
    body.push(expr_stmt(method(
        path("db.todos"),
        "map",
        vec![arrow(&["t"], path("t.title"))],
    )));
    let err = analyze_program(&program(body), &connected()).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation { .. }));
}

#[test]
fn invalid_config_is_rejected_before_walking() {
    let err = analyze_program(&program(vec![]), &Config::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn tracer_sees_roots_and_sites() {
    let mut body = declarations();
    body.push(expr_stmt(member(ident("todos"), "length")));
    let mut tracer = PrintTracer::new(Verbosity::Default);
    analyze_program_with(&program(body), &connected(), &mut tracer).unwrap();
    insta::assert_snapshot!(tracer.into_output(), @r"
    root db -> app
    root todos -> app.todos
    built CollectionRef app.todos
    built Value length
    ");
}
