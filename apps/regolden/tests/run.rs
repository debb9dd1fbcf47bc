use regolden::discover::NameFilter;
use regolden::models::rules::RuleDef;
use regolden::rules::{apply_rule, compile_all, load_rules};
use regolden::{run, RewriteError, RunOptions};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const GIVING: &str = r#"it('should fail when not holding item', () => {
  expectEvent(events, 'action.error', {
    messageId: expect.stringContaining('not_holding'),
  });
});
"#;

fn golden() -> NameFilter {
    NameFilter::new("-golden.test.ts", &[]).unwrap()
}

fn no_item_rules() -> Vec<regolden::Rule> {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    load_rules(&manifest.join("rules/no-item.toml")).unwrap()
}

#[test]
fn rewrites_scoped_file_and_reports_rule() {
    let dir = tempdir().unwrap();
    let actions = dir.path().join("unit/actions");
    fs::create_dir_all(&actions).unwrap();
    fs::write(actions.join("giving-golden.test.ts"), GIVING).unwrap();

    let mut seen = Vec::new();
    let report = run(dir.path(), &golden(), &no_item_rules(), &RunOptions::default(), |f| {
        seen.push(f.to_string())
    })
    .unwrap();

    let after = fs::read_to_string(actions.join("giving-golden.test.ts")).unwrap();
    assert!(after.contains("messageId: expect.stringContaining('no_item')"));
    assert!(!after.contains("not_holding"));
    assert_eq!(seen, vec!["unit/actions/giving-golden.test.ts"]);
    assert_eq!(report.summary.updated, 1);
    assert_eq!(report.results[0].rules_applied, vec!["giving-not-holding"]);
    // the other rules name files that are not present
    let missing: Vec<_> = report.not_found().map(|o| o.rule.as_str()).collect();
    assert_eq!(missing.len(), 2);
}

#[test]
fn untouched_file_keeps_bytes_and_mtime() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("giving-golden.test.ts");
    fs::write(&p, "expect(events).toHaveLength(1);\n").unwrap();
    let before = fs::metadata(&p).unwrap().modified().unwrap();

    let report = run(dir.path(), &golden(), &no_item_rules(), &RunOptions::default(), |_| {}).unwrap();

    assert_eq!(fs::metadata(&p).unwrap().modified().unwrap(), before);
    assert_eq!(
        fs::read_to_string(&p).unwrap(),
        "expect(events).toHaveLength(1);\n"
    );
    assert!(!report.results[0].changed);
    assert_eq!(report.summary.updated, 0);
}

#[test]
fn missing_directory_is_fatal_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let err = run(
        &dir.path().join("absent"),
        &golden(),
        &no_item_rules(),
        &RunOptions::default(),
        |_| {},
    )
    .err()
    .unwrap();
    assert!(matches!(err, RewriteError::Config(_)));
    assert!(err.is_fatal());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn second_run_is_a_no_op() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("giving-golden.test.ts"), GIVING).unwrap();
    fs::write(dir.path().join("throwing-golden.test.ts"), GIVING).unwrap();
    let rules = no_item_rules();

    let first = run(dir.path(), &golden(), &rules, &RunOptions::default(), |_| {}).unwrap();
    let once = fs::read_to_string(dir.path().join("throwing-golden.test.ts")).unwrap();
    let second = run(dir.path(), &golden(), &rules, &RunOptions::default(), |_| {}).unwrap();
    let twice = fs::read_to_string(dir.path().join("throwing-golden.test.ts")).unwrap();

    assert_eq!(first.summary.updated, 2);
    assert_eq!(second.summary.updated, 0);
    assert_eq!(once, twice);
}

#[test]
fn pure_apply_is_idempotent_for_every_rule() {
    let rules = no_item_rules();
    let mut content = GIVING.replace("'not_holding'", "'not_holding_weapon'") + GIVING;
    for rule in &rules {
        content = apply_rule(&content, rule).content.into_owned();
    }
    for rule in &rules {
        assert!(!apply_rule(&content, rule).changed, "rule {} re-matched", rule.name);
    }
}

#[test]
fn updated_count_matches_changed_files() {
    let dir = tempdir().unwrap();
    let bodies = [
        ("giving-golden.test.ts", GIVING),
        ("throwing-golden.test.ts", "nothing to do"),
        ("attacking-golden.test.ts", "messageId: expect.stringContaining('not_holding_weapon')"),
        ("taking-golden.test.ts", GIVING),
    ];
    for (name, body) in bodies {
        fs::write(dir.path().join(name), body).unwrap();
    }
    let report = run(dir.path(), &golden(), &no_item_rules(), &RunOptions::default(), |_| {}).unwrap();

    let actually_changed = bodies
        .iter()
        .filter(|(name, body)| fs::read_to_string(dir.path().join(name)).unwrap() != *body)
        .count();
    assert_eq!(actually_changed, 2);
    assert_eq!(report.summary.updated, actually_changed);
    assert_eq!(report.summary.scanned, 4);
}

#[test]
fn invalid_rule_fails_before_any_file_is_read() {
    let defs = vec![
        RuleDef {
            name: "ok".into(),
            files: vec![],
            pattern: "a".into(),
            replacement: "b".into(),
            literal: false,
        },
        RuleDef {
            name: "broken".into(),
            files: vec![],
            pattern: "(a".into(),
            replacement: "b".into(),
            literal: false,
        },
    ];
    let err = compile_all(&defs).unwrap_err();
    assert!(matches!(err, RewriteError::Pattern { ref rule, .. } if rule == "broken"));
}

#[test]
fn event_rules_rewrite_action_sources() {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    let rules = load_rules(&manifest.join("rules/action-events.yaml")).unwrap();
    let dir = tempdir().unwrap();
    let src = "context.event(\"if.event.error\", { messageId: 'x', messageParams: {} })\n";
    fs::write(dir.path().join("giving.ts"), src).unwrap();
    fs::write(dir.path().join("index.ts"), src).unwrap();

    let filter = NameFilter::new(".ts", &["index.ts".to_string()]).unwrap();
    let report = run(dir.path(), &filter, &rules, &RunOptions::default(), |_| {}).unwrap();

    assert_eq!(report.summary.scanned, 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("giving.ts")).unwrap(),
        "context.event('action.error', { messageId: 'x', params: {} })\n"
    );
    assert_eq!(fs::read_to_string(dir.path().join("index.ts")).unwrap(), src);
}
