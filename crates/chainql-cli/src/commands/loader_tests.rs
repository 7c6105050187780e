use std::io::Write;
use std::path::Path;

use indoc::indoc;

use super::loader::{ConfigInput, LoadError, load_config, load_tree};

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn flags_only() {
    let input = ConfigInput {
        roots: vec!["db".into()],
        database: Some("app".into()),
        ..Default::default()
    };
    let config = load_config(&input).unwrap();
    assert_eq!(config.roots(), ["db"]);
    assert_eq!(config.get_database(), Some("app"));
    assert!(config.validate().is_ok());
}

#[test]
fn flags_extend_config_file() {
    let file = write_temp(indoc! {r#"
        {
          "roots": ["db"],
          "connectors": ["connect"],
          "recursionLimit": 32
        }
    "#});
    let input = ConfigInput {
        config_path: Some(file.path().to_path_buf()),
        connectors: vec!["open".into()],
        recursion_limit: Some(8),
        ..Default::default()
    };
    let config = load_config(&input).unwrap();
    assert_eq!(config.roots(), ["db"]);
    assert_eq!(config.connectors(), ["connect", "open"]);
    assert_eq!(config.get_recursion_limit(), 8);
}

#[test]
fn bad_config_file_names_the_path() {
    let file = write_temp(r#"{"root": "db"}"#);
    let input = ConfigInput {
        config_path: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let err = load_config(&input).unwrap_err();
    assert!(matches!(err, LoadError::Config { .. }));
    assert!(err.to_string().contains("invalid configuration"));
}

#[test]
fn loads_tree() {
    let file = write_temp(indoc! {r#"
        {
          "type": "Program",
          "body": []
        }
    "#});
    let tree = load_tree(file.path()).unwrap();
    assert_eq!(tree["type"], "Program");
}

#[test]
fn invalid_json_is_reported() {
    let file = write_temp("{ not json");
    let err = load_tree(file.path()).unwrap_err();
    assert!(matches!(err, LoadError::Json { .. }));
    assert!(err.to_string().contains("is not valid JSON"));
}

#[test]
fn missing_file_is_reported() {
    let err = load_tree(Path::new("/nonexistent/tree.json")).unwrap_err();
    assert!(err.to_string().starts_with("failed to read '/nonexistent/tree.json'"));
}
