use compose_ls::{
    analyze, parse, resolve_context, suggest, validate, DiagnosticKind, Settings, Severity,
};

fn kinds(diagnostics: &[compose_ls::Diagnostic]) -> Vec<DiagnosticKind> {
    diagnostics.iter().map(|d| d.kind).collect()
}

#[test]
fn minimal_service_is_valid() {
    let text = "services:\n  web:\n    image: nginx\n";
    let document = parse(text);
    assert!(document.diagnostics.is_empty());
    assert!(validate(text, &document).is_empty());

    let analysis = analyze(text, &Settings::default());
    assert!(analysis.is_valid);
    assert!(analysis.diagnostics.is_empty());
}

#[test]
fn shallow_image_is_reported_as_misplaced() {
    let text = "services:\n  web:\n    ports:\n      - \"80:80\"\n  image: nginx\n";
    let analysis = analyze(text, &Settings::default());
    assert!(!analysis.is_valid);

    let misplaced = analysis
        .diagnostics
        .iter()
        .find(|d| d.kind == DiagnosticKind::MisplacedServiceKey)
        .expect("misplaced image diagnostic");
    assert_eq!(misplaced.severity, Severity::Error);
    assert_eq!(misplaced.line, 5);
    assert!(misplaced.message.contains("'image' should be inside a service definition"));
    assert!(misplaced.message.contains("Check indentation"));
}

#[test]
fn root_level_image_is_reported_as_misplaced() {
    let text = "services:\n  web:\n    build: .\nimage: nginx\n";
    let analysis = analyze(text, &Settings::default());
    assert_eq!(kinds(&analysis.diagnostics), vec![DiagnosticKind::MisplacedServiceKey]);
    assert_eq!(analysis.diagnostics[0].line, 4);
}

#[test]
fn tab_in_indentation_is_one_error_and_still_parses() {
    let text = "services:\n  web:\n\t\timage: nginx\n";
    let document = parse(text);
    assert_eq!(kinds(&document.diagnostics), vec![DiagnosticKind::TabCharacter]);
    assert!(document.diagnostics[0].kind.is_structural());
    assert_eq!(document.diagnostics[0].line, 3);
    let root = document.root_mapping().expect("object root");
    assert!(root.contains_key("services"));
}

#[test]
fn deploy_context_and_ranking() {
    let text = "services:\n  web:\n    deploy:\n      ";
    assert_eq!(resolve_context(text, 3), vec!["services", "web", "deploy"]);

    let labels: Vec<String> = suggest(text, 3, 6).into_iter().map(|s| s.label).collect();
    assert_eq!(labels[..4], ["mode", "replicas", "placement", "resources"]);
}

#[test]
fn unknown_version_is_only_a_warning() {
    let text = "version: \"9.9\"\nservices:\n  web:\n    image: nginx\n";
    let analysis = analyze(text, &Settings::default());
    assert_eq!(kinds(&analysis.diagnostics), vec![DiagnosticKind::InvalidVersion]);
    assert_eq!(analysis.diagnostics[0].severity, Severity::Warning);
    assert!(analysis.diagnostics[0].message.contains("3.9"));
    assert!(analysis.is_valid);

    let quiet = Settings {
        report_warnings: false,
        ..Settings::default()
    };
    assert!(analyze(text, &quiet).diagnostics.is_empty());
}

#[test]
fn each_service_without_image_or_build_gets_one_error() {
    let text = "\
services:
  a:
    ports: []
  b:
    image: x
  c:
    command: run
    environment:
      A: b
  d:
    build:
      context: .
";
    let diagnostics = validate(text, &parse(text));
    let missing: Vec<(usize, usize)> = diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::MissingImageOrBuild)
        .map(|d| (d.line, d.column))
        .collect();
    assert_eq!(missing, vec![(2, 3), (6, 3)]);
}

#[test]
fn cursor_below_an_empty_key_is_inside_it() {
    let cases = [
        ("services:\n  ", 1, vec!["services"]),
        ("services:\n  web:\n    healthcheck:\n        ", 3, vec!["services", "web", "healthcheck"]),
        ("networks:\n  front:\n    ipam:\n      ", 3, vec!["networks", "front", "ipam"]),
    ];
    for (text, line, expected) in cases {
        assert_eq!(resolve_context(text, line), expected, "{text:?}");
    }
}

#[test]
fn validation_is_repeatable() {
    let text = "version: \"1\"\nservices:\n  web:\n    restart: maybe\n    deploy:\n      modes: x\nbogus: 1\n";
    let document = parse(text);
    let first = validate(text, &document);
    assert_eq!(first.len(), 5);
    assert_eq!(first, validate(text, &document));
}

#[test]
fn diagnostics_stay_within_the_document() {
    let text = "services:\n  web:\n     image: x\n  - stray\n\tbad line\nextra\n";
    let line_count = text.lines().count();
    let analysis = analyze(text, &Settings::default());
    assert!(!analysis.diagnostics.is_empty());
    for diagnostic in &analysis.diagnostics {
        assert!(diagnostic.line >= 1 && diagnostic.line <= line_count, "{diagnostic:?}");
        assert!(diagnostic.column >= 1);
    }
}

#[test]
fn diagnostics_serialize_to_the_wire_shape() {
    let text = "services:\n  web:\n    image: x\n    restart: sometimes\n";
    let analysis = analyze(text, &Settings::default());
    let value = serde_json::to_value(&analysis.diagnostics).unwrap();
    assert_eq!(
        value,
        serde_json::json!([{
            "line": 4,
            "column": 5,
            "message": "Invalid value 'sometimes' for 'restart'",
            "severity": "warning",
            "validValues": ["no", "always", "on-failure", "unless-stopped"],
        }])
    );
}
