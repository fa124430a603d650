//! End-to-end runs over in-memory snapshots.

use crate::api::{ClauseKind, Context, Outcome, verify, verify_with};
use crate::entity::Device;
use crate::error::Error;
use crate::snapshot::MemorySource;
use crate::{Options, parse_assertion};
use pretty_assertions::assert_eq;

const NOTE_EDITOR: &str = r#"<hierarchy rotation="0">
  <node class="android.widget.FrameLayout" package="com.example.notes" bounds="[0,0][1080,1920]">
    <node class="android.widget.TextView" text="Title" clickable="false" package="com.example.notes" bounds="[40,100][300,180]" />
    <node class="android.widget.EditText" text="Groceries" resource-id="com.example.notes:id/title_input" clickable="true" focused="true" package="com.example.notes" bounds="[40,180][1040,280]" />
    <node class="android.widget.Button" text="Save" resource-id="com.example.notes:id/btn_save" clickable="true" enabled="true" package="com.example.notes" bounds="[40,1700][1040,1820]" />
  </node>
  <node class="android.widget.TextView" text="12:41" package="com.android.systemui" bounds="[0,0][200,60]" />
</hierarchy>"#;

fn layouts(dumps: &[&str]) -> MemorySource {
    let mut source = MemorySource::new();
    for (i, xml) in dumps.iter().enumerate() {
        source.push_layout(format!("layout_{i}"), *xml);
    }
    source
}

fn app_context() -> Context {
    Context { app_package: Some("com.example.notes".into()), label: "scenario".into() }
}

#[test]
fn volume_dropped_between_snapshots() {
    let mut source = MemorySource::new();
    source.push_device(Device { id: "before".into(), volume: Some(7), ..Device::default() });
    source.push_device(Device { id: "after".into(), volume: Some(3), ..Device::default() });

    let report =
        verify("d1 = Device(volume=7) AND d = Device(volume=3) AND less_than(d.volume, d1.volume)", &source).unwrap();
    assert!(report.verdict);
    assert_eq!(report.failures().count(), 0);
    assert_eq!(report.metrics.snapshot_requests, 2);
    assert_eq!(report.diagnostics[2].reason, "d.volume (3) < d1.volume (7)");
}

#[test]
fn missing_widget_makes_the_assertion_unsatisfiable() {
    let source = layouts(&[NOTE_EDITOR]);
    let report = verify_with(
        r#"s = Screen() AND w = Widget(resource_id="btn_ok", clickable=true) AND in_screen(w, s)"#,
        &source,
        &app_context(),
        &Options::default(),
    )
    .unwrap();

    assert!(!report.verdict);
    let outcomes: Vec<_> = report.diagnostics.iter().map(|d| (d.kind, d.outcome)).collect();
    assert_eq!(
        outcomes,
        vec![
            (ClauseKind::Definition, Outcome::Valid),
            (ClauseKind::Definition, Outcome::Invalid),
            (ClauseKind::Predicate, Outcome::Skipped),
        ]
    );
    assert_eq!(report.diagnostics[1].reason, r#"not satisfiable: no node matches resource_id="btn_ok""#);
    assert_eq!(report.metrics.predicates_evaluated, 0);
}

#[test]
fn typing_into_a_field_keeps_the_screen() {
    let typed = NOTE_EDITOR.replace("Groceries", "Groceries and more").replace("12:41", "12:42");
    let source = layouts(&[NOTE_EDITOR, typed.as_str()]);
    let report =
        verify_with("s1 = Screen() AND s = Screen() AND same_screen(s1, s)", &source, &app_context(), &Options::default())
            .unwrap();
    assert!(report.verdict, "{:?}", report.diagnostics);
}

#[test]
fn renamed_button_changes_the_screen() {
    let renamed = NOTE_EDITOR.replace("text=\"Save\"", "text=\"Done\"");
    let source = layouts(&[NOTE_EDITOR, renamed.as_str()]);
    let report = verify("s1 = Screen() AND s = Screen() AND different_screen(s1, s)", &source).unwrap();
    assert!(report.verdict);
}

#[test]
fn undeclared_variable_aborts_before_any_snapshot() {
    let source = MemorySource::new();
    let err = verify("d = Device() AND equal(x.volume, 3)", &source).unwrap_err();
    assert!(matches!(err, Error::UndeclaredVariable { ref name, .. } if name == "x"));
}

#[test]
fn structural_predicates_run_first() {
    let mut source = layouts(&[NOTE_EDITOR]);
    source.push_device(Device { id: "now".into(), volume: Some(5), ..Device::default() });
    let report = verify(
        r#"d = Device() AND s = Screen() AND w = Widget(text="Save") AND equal(d.volume, 5) AND in_screen(w, s)"#,
        &source,
    )
    .unwrap();
    assert!(report.verdict, "{:?}", report.diagnostics);
    let predicates: Vec<_> =
        report.diagnostics.iter().filter(|d| d.kind == ClauseKind::Predicate).map(|d| d.clause.as_str()).collect();
    assert_eq!(predicates, vec!["in_screen(w, s)", "equal(d.volume, 5)"]);
}

#[test]
fn every_false_predicate_is_reported() {
    let mut source = MemorySource::new();
    source.push_device(Device { id: "now".into(), volume: Some(1), log: "I/App: idle".into(), ..Device::default() });
    let report =
        verify(r#"d = Device() AND has_crash(d) AND equal(d.volume, 1) AND log_contains(d, "Exception")"#, &source)
            .unwrap();
    assert!(!report.verdict);
    let failed: Vec<_> = report.failures().map(|d| d.clause.as_str()).collect();
    assert_eq!(failed, vec!["has_crash(d)", r#"log_contains(d, "Exception")"#]);
    assert_eq!(report.metrics.predicates_evaluated, 3);
}

#[test]
fn widget_labels_match_report_wording() {
    let source = layouts(&[NOTE_EDITOR]);
    let report = verify_with(
        r#"w = Widget(resource_id="title_input") AND text_similar(w, "title") AND is_enabled(w)"#,
        &source,
        &app_context(),
        &Options::default(),
    )
    .unwrap();
    // The field has no `enabled` attribute in the dump.
    let outcomes: Vec<_> = report.diagnostics.iter().skip(1).map(|d| d.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::True, Outcome::False]);
}

#[test]
fn normalized_text_parses_to_the_same_assertion() {
    let inputs = [
        r#"d1 = Device(volume=7)   AND d = Device() AND less_than(d.volume,d1.volume)"#,
        r#"w = Widget(text="say \"hi\"", checked=False) AND s = Screen(package='com.x') AND in_screen(w, s)"#,
        "d = Device() AND text_similar(d.log, \"crash\\n\", 0.5)",
        r#"w = Widget() AND text_similar(w, "x", 0.00001)"#,
        "d = Device() AND greater_than(d.volume, 123456789012345678901234.5) AND less_than(d.volume, 2.0)",
    ];
    for input in inputs {
        let parsed = parse_assertion(input).unwrap();
        let reparsed = parse_assertion(&parsed.to_string()).unwrap();
        assert_eq!(parsed, reparsed, "{input}");
    }
    let tiny = parse_assertion(inputs[3]).unwrap();
    assert_eq!(tiny.to_string(), r#"w = Widget() AND text_similar(w, "x", 0.00001)"#);
}

#[test]
fn unreadable_layout_is_an_invalid_binding() {
    let source = layouts(&["<hierarchy><node"]);
    let report = verify("s = Screen() AND keyboard_on(s)", &source).unwrap();
    assert!(!report.verdict);
    assert_eq!(report.diagnostics[0].outcome, Outcome::Invalid);
    assert!(report.diagnostics[0].reason.starts_with("not satisfiable: screen layout_0 is unreadable"));
}
