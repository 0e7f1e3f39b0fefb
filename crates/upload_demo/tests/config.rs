use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use upload_core::{LoadMethod, LoaderStatus, UploadMessages};
use upload_demo::config::{load_config, load_or_default, save_config, DemoConfig, ScriptStep};

#[test]
fn partial_config_falls_back_to_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("demo.ron");
    fs::write(
        &path,
        r#"(
    upload_url: Some("/up"),
    load_method: upload,
    files: [
        (
            name: "a.txt",
            mime_type: "text/plain",
            size: 10,
            script: [Status(uploading), Progress(5), Complete("/files/a.txt")],
        ),
        (name: "b.txt", mime_type: "text/plain", size: 3),
    ],
)"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();

    assert_eq!(config.upload_url.as_deref(), Some("/up"));
    assert_eq!(config.load_method, LoadMethod::Upload);
    assert_eq!(config.class_prefix, "cke_upload_");
    assert_eq!(config.messages, UploadMessages::default());
    assert_eq!(
        config.files[0].script,
        vec![
            ScriptStep::Status(LoaderStatus::Uploading),
            ScriptStep::Progress(5),
            ScriptStep::Complete("/files/a.txt".to_string()),
        ]
    );
    assert!(config.files[1].script.is_empty());
}

#[test]
fn saved_config_loads_back() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("demo.ron");
    let config = DemoConfig {
        supported_types: Some("image/.*".to_string()),
        ..DemoConfig::default()
    };

    save_config(&path, &config).unwrap();

    assert_eq!(load_config(&path).unwrap(), config);
}

#[test]
fn missing_file_is_reported_with_its_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.ron");

    let err = load_config(&path).unwrap_err();

    assert!(err.to_string().contains("failed to read demo config"));
    assert!(err.to_string().contains("absent.ron"));
}

#[test]
fn malformed_config_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.ron");
    fs::write(&path, "(files: [").unwrap();

    let err = load_config(&path).unwrap_err();

    assert!(err.to_string().contains("failed to parse demo config"));
}

#[test]
fn no_path_means_the_built_in_scenario() {
    assert_eq!(load_or_default(None).unwrap(), DemoConfig::default());
}
