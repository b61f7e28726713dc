use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use otu_dash::config::{Config, ConfigLoader, ConfigOverrides};
use otu_dash::document::DocumentSource;
use otu_dash::error::DashError;

#[test]
fn file_values_resolve() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("otu-dash.json");
    std::fs::write(
        &path,
        r#"{"schema_version": 1, "data": "https://example.org/samples.json", "top_k": 5, "strict": true, "initial_subject": " 0941"}"#,
    )
    .unwrap();

    let resolved =
        ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()).unwrap();
    assert_eq!(
        resolved.data,
        DocumentSource::Url("https://example.org/samples.json".to_string())
    );
    assert_eq!(resolved.top_k, 5);
    assert!(resolved.strict);
    assert_eq!(resolved.initial_subject.unwrap().as_str(), "941");
}

#[test]
fn overrides_win_over_file() {
    let config = Config {
        schema_version: None,
        data: Some("from-file.json".to_string()),
        top_k: Some(5),
        strict: Some(false),
        initial_subject: Some("940".to_string()),
    };
    let overrides = ConfigOverrides {
        data: Some("cli.json.gz".to_string()),
        top_k: Some(20),
        strict: true,
        initial_subject: Some("943".to_string()),
    };
    let resolved = ConfigLoader::resolve_config(config, overrides).unwrap();
    assert_eq!(resolved.schema_version, 1);
    assert_eq!(
        resolved.data,
        DocumentSource::Path(Utf8PathBuf::from("cli.json.gz"))
    );
    assert_eq!(resolved.top_k, 20);
    assert!(resolved.strict);
    assert_eq!(resolved.initial_subject.unwrap().as_str(), "943");
}

#[test]
fn explicit_missing_file_is_an_error() {
    let err = ConfigLoader::resolve(
        Some("/nonexistent/otu-dash.json"),
        ConfigOverrides::default(),
    )
    .unwrap_err();
    assert_matches!(err, DashError::ConfigRead(_));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("otu-dash.json");
    std::fs::write(&path, "{ top_k: ").unwrap();
    assert_matches!(
        ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()),
        Err(DashError::ConfigParse(_))
    );
}

#[test]
fn blank_initial_subject_is_rejected() {
    let config = Config {
        initial_subject: Some("  ".to_string()),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config, ConfigOverrides::default()),
        Err(DashError::InvalidSubjectId(_))
    );
}
