use pretty_assertions::assert_eq;
use upload_core::{LoaderStatus, NotificationKind};
use upload_demo::config::{DemoConfig, ScriptStep, ScriptedFile};
use upload_demo::scenario::{run, LoaderLine, NotificationLine};

fn init_logging() {
    upload_logging::initialize_for_tests();
}

fn loader(file: &str, status: LoaderStatus, abort_calls: usize) -> LoaderLine {
    LoaderLine {
        file: file.to_string(),
        status,
        abort_calls,
    }
}

fn shown(kind: NotificationKind, message: &str) -> NotificationLine {
    NotificationLine {
        kind,
        message: message.to_string(),
        visible: true,
    }
}

#[test]
fn built_in_scenario_covers_success_failure_and_silent_deletion() {
    init_logging();

    let report = run(&DemoConfig::default()).unwrap();

    assert_eq!(
        report.html,
        "<a href=\"/files/report.pdf\">report.pdf</a>"
    );
    assert_eq!(
        report.loaders,
        vec![
            loader("report.pdf", LoaderStatus::Uploaded, 0),
            loader("photo.png", LoaderStatus::Error, 0),
            loader("notes.txt", LoaderStatus::Abort, 1),
        ]
    );
    assert_eq!(
        report.notifications,
        vec![
            shown(NotificationKind::Success, "File successfully uploaded."),
            shown(NotificationKind::Warning, "File is too big."),
        ]
    );
    assert_eq!(report.live_widgets, 0);
}

#[test]
fn unsupported_files_are_not_uploaded() {
    init_logging();
    let config = DemoConfig {
        supported_types: Some("application/pdf".to_string()),
        ..DemoConfig::default()
    };

    let report = run(&config).unwrap();

    assert_eq!(report.loaders.len(), 1);
    assert_eq!(report.loaders[0].file, "report.pdf");
    assert_eq!(report.notifications.len(), 1);
}

#[test]
fn user_abort_removes_the_placeholder() {
    init_logging();
    let config = DemoConfig {
        files: vec![ScriptedFile {
            name: "big.iso".to_string(),
            mime_type: "application/octet-stream".to_string(),
            size: 10_000,
            script: vec![
                ScriptStep::Status(LoaderStatus::Uploading),
                ScriptStep::Progress(2_500),
                ScriptStep::Abort,
                ScriptStep::Progress(5_000),
            ],
        }],
        ..DemoConfig::default()
    };

    let report = run(&config).unwrap();

    assert_eq!(report.html, "");
    assert_eq!(report.loaders, vec![loader("big.iso", LoaderStatus::Abort, 1)]);
    // The progress notification is hidden once nothing is left to count.
    assert_eq!(report.notifications.len(), 2);
    assert_eq!(report.notifications[0].kind, NotificationKind::Progress);
    assert!(!report.notifications[0].visible);
    assert_eq!(
        report.notifications[1],
        shown(NotificationKind::Info, "Upload aborted by the user.")
    );
}

fn scripted(name: &str, script: Vec<ScriptStep>) -> ScriptedFile {
    ScriptedFile {
        name: name.to_string(),
        mime_type: "text/plain".to_string(),
        size: 100,
        script,
    }
}

#[test]
fn files_sharing_a_name_keep_their_own_scripts() {
    init_logging();
    let config = DemoConfig {
        files: vec![
            scripted(
                "same.txt",
                vec![
                    ScriptStep::Status(LoaderStatus::Uploading),
                    ScriptStep::Complete("/files/first".to_string()),
                ],
            ),
            scripted(
                "same.txt",
                vec![
                    ScriptStep::Status(LoaderStatus::Uploading),
                    ScriptStep::Fail("Second copy refused.".to_string()),
                ],
            ),
        ],
        ..DemoConfig::default()
    };

    let report = run(&config).unwrap();

    assert_eq!(
        report.loaders,
        vec![
            loader("same.txt", LoaderStatus::Uploaded, 0),
            loader("same.txt", LoaderStatus::Error, 0),
        ]
    );
    assert_eq!(report.html, "<a href=\"/files/first\">same.txt</a>");
}

#[test]
fn invalid_type_pattern_fails_the_run() {
    init_logging();
    let config = DemoConfig {
        supported_types: Some("(".to_string()),
        ..DemoConfig::default()
    };

    assert!(run(&config).is_err());
}
