use classname_lint::{check_source, AttributeValidator, SourceSyntax};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

fn findings_snapshot(name: &str, source: &str, known: &[&str]) {
    let classes: FxHashSet<SmolStr> = known.iter().map(|n| SmolStr::new(n)).collect();
    let findings = check_source(
        source,
        SourceSyntax::Tsx,
        &AttributeValidator::default(),
        &classes,
    )
    .unwrap();

    let mut output = String::new();
    for f in &findings {
        let text = &source[f.offset as usize..(f.offset + f.length) as usize];
        output.push_str(&format!(
            "{}..{} {:?} {}\n",
            f.offset,
            f.offset + f.length,
            text,
            f.message
        ));
    }
    insta::assert_snapshot!(name, output);
}

#[test]
fn test_snapshot_component() {
    findings_snapshot(
        "component",
        r#"<div className="page"><h1 className="title  subtitle">x</h1></div>"#,
        &["page", "title"],
    );
}

#[test]
fn test_snapshot_all_unknown() {
    findings_snapshot("all_unknown", r#"<b className="a b c" />"#, &[]);
}
