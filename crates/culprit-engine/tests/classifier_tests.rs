use chrono::{TimeZone, Utc};
use culprit_engine::classifier::{
    ComponentClassifier, ComponentClassifierConfig, ComponentInfo, ProjectClassifier,
    ProjectClassifierConfig,
};
use culprit_engine::model::{ChangeLog, Contributor, FileChangeInfo, Suspect};
use culprit_engine::stacktrace::{CallStack, CallStackFormat, StackFrame};
use pretty_assertions::assert_eq;

fn suspect(dep_path: &str, touched: &[&str]) -> Suspect {
    let time = Utc.with_ymd_and_hms(2016, 8, 10, 9, 0, 0).unwrap();
    let changelog = ChangeLog {
        author: Contributor::new("a", "a@chromium.org", time),
        committer: Contributor::new("a", "a@chromium.org", time),
        revision: "r".to_string(),
        commit_position: None,
        message: String::new(),
        touched_files: touched.iter().map(|path| FileChangeInfo::modify(*path)).collect(),
        commit_url: "https://repo/+/r".to_string(),
        code_review_url: None,
        reverted_revision: None,
    };
    Suspect::new(changelog, dep_path)
}

fn project_config() -> ProjectClassifierConfig {
    let mut config = ProjectClassifierConfig {
        host_directories: vec!["src/".to_string(), "src/chrome/browser/resources/".to_string()],
        ..Default::default()
    };
    config
        .function_marker_to_project_name
        .insert("org.chromium".to_string(), "chromium".to_string());
    config
        .function_marker_to_project_name
        .insert("com.google.android.apps.chrome".to_string(), "clank".to_string());
    config
        .file_path_marker_to_project_name
        .insert("googleplex-android/".to_string(), "android_os".to_string());
    config
        .non_chromium_project_rank_priority
        .insert("clank".to_string(), -1);
    config
        .non_chromium_project_rank_priority
        .insert("android_os".to_string(), -2);
    config
}

#[test]
fn test_project_from_dep_path() {
    let classifier = ProjectClassifier::new(Some(project_config()));
    assert_eq!(classifier.project_from_dep_path("src/"), Some("chromium".to_string()));
    assert_eq!(
        classifier.project_from_dep_path("src/v8/"),
        Some("chromium-v8".to_string())
    );
    assert_eq!(
        classifier.project_from_dep_path("src/chrome/browser/resources/"),
        Some("chromium".to_string())
    );
    assert_eq!(
        classifier.project_from_dep_path("third_party/foo/"),
        Some("third_party_foo".to_string())
    );
    assert_eq!(classifier.project_from_dep_path(""), None);
}

#[test]
fn test_classify_frame_marker_order() {
    let classifier = ProjectClassifier::new(Some(project_config()));

    let java = StackFrame::new(
        0,
        "src/",
        "com.google.android.apps.chrome.Main",
        "Main.java",
        "Main.java",
        vec![],
    );
    assert_eq!(classifier.classify_frame(&java), Some("clank".to_string()));

    let android = StackFrame::new(
        1,
        "",
        "android.os.Looper",
        "Looper.java",
        "googleplex-android/frameworks/Looper.java",
        vec![],
    );
    assert_eq!(classifier.classify_frame(&android), Some("android_os".to_string()));

    let plain = StackFrame::new(2, "src/v8/", "v8::Invoke", "a.cc", "a.cc", vec![]);
    assert_eq!(classifier.classify_frame(&plain), Some("chromium-v8".to_string()));
}

#[test]
fn test_classify_prefers_suspects() {
    let classifier = ProjectClassifier::new(Some(project_config()));
    let suspects = vec![
        suspect("src/v8/", &["a.cc"]),
        suspect("src/", &["b.cc"]),
        suspect("src/v8/", &["c.cc"]),
    ];
    assert_eq!(classifier.classify(&suspects, None), "chromium-v8");
}

#[test]
fn test_classify_empty_crash_stack() {
    let classifier = ProjectClassifier::new(Some(project_config()));
    let stack = CallStack::new(0, vec![], CallStackFormat::Default);
    assert_eq!(classifier.classify(&[], Some(&stack)), "");
}

#[test]
fn test_classify_unconfigured_is_empty() {
    let classifier = ProjectClassifier::new(None);
    assert_eq!(classifier.classify(&[suspect("src/", &["a.cc"])], None), "");
}

#[test]
fn test_java_crash_ranks_by_priority() {
    let classifier = ProjectClassifier::new(Some(project_config()));
    let frames = vec![
        StackFrame::new(0, "src/", "org.chromium.Foo.bar", "Foo.java", "Foo.java", vec![]),
        StackFrame::new(1, "src/", "org.chromium.Foo.baz", "Foo.java", "Foo.java", vec![]),
        StackFrame::new(
            2,
            "",
            "android.os.Handler",
            "Handler.java",
            "googleplex-android/Handler.java",
            vec![],
        ),
    ];
    let stack = CallStack::new(0, frames, CallStackFormat::Java);
    assert_eq!(classifier.classify(&[], Some(&stack)), "android_os");
}

fn component_config() -> ComponentClassifierConfig {
    ComponentClassifierConfig {
        component_info: vec![
            ComponentInfo {
                dirs: vec!["src/third_party/WebKit/Source/core/dom/".to_string()],
                function: None,
                component: "Blink>DOM".to_string(),
                team: None,
            },
            ComponentInfo {
                dirs: vec!["src/v8/".to_string()],
                function: Some("v8::internal::".to_string()),
                component: "Blink>JavaScript".to_string(),
                team: None,
            },
        ],
        top_n: 4,
    }
}

#[test]
fn test_component_classify_frame() {
    let classifier = ComponentClassifier::new(Some(component_config()));
    assert!(classifier.is_configured());

    let dom = StackFrame::new(
        0,
        "src/",
        "Node::remove",
        "third_party/WebKit/Source/core/dom/Node.cpp",
        "",
        vec![],
    );
    assert_eq!(classifier.classify_frame(&dom), Some("Blink>DOM".to_string()));

    let v8 = StackFrame::new(1, "src/v8/", "v8::internal::Invoke", "src/execution.cc", "", vec![]);
    assert_eq!(classifier.classify_frame(&v8), Some("Blink>JavaScript".to_string()));

    let v8_other = StackFrame::new(2, "src/v8/", "Builtins::Call", "src/builtins.cc", "", vec![]);
    assert_eq!(classifier.classify_frame(&v8_other), None);

    let explicit = dom.clone().with_component("Blink>Explicit");
    assert_eq!(classifier.classify_frame(&explicit), Some("Blink>Explicit".to_string()));
}

#[test]
fn test_component_classify_suspects() {
    let classifier = ComponentClassifier::new(Some(component_config()));
    let suspects = vec![
        suspect("src/", &["third_party/WebKit/Source/core/dom/Node.cpp", "base/x.cc"]),
        suspect("src/", &["third_party/WebKit/Source/core/dom/Element.cpp"]),
        suspect("src/v8/", &["src/api.cc"]),
    ];
    assert_eq!(
        classifier.classify(&suspects, None),
        vec!["Blink>DOM".to_string(), "Blink>JavaScript".to_string()]
    );
}

#[test]
fn test_component_invalid_pattern_rejected_by_validate() {
    let mut config = component_config();
    config.component_info[1].function = Some("(".to_string());
    assert!(config.validate().is_err());

    let classifier = ComponentClassifier::new(Some(config));
    assert!(classifier.is_configured());
}
