use std::io::Write;

use bigdecimal::BigDecimal;
use mturk_rs::fixture::{DEFAULT_TEMPLATE, escape_question, hit_params};

#[test]
fn default_template_is_escaped_into_the_question() {
    let params = hit_params(DEFAULT_TEMPLATE.as_ref()).unwrap();
    assert!(params.question.starts_with("&lt;HTMLQuestion"));
    assert!(!params.question.contains('<'));
    assert!(params.question.contains("What&#39;s up?"));
    assert!(!params.question.contains("&apos;"));

    assert_eq!(params.hit_type.title, "EXAMPLE");
    assert_eq!(params.hit_type.description, "Answer the questions on the screen");
    assert_eq!(params.hit_type.keywords, "test, HIT");
    assert_eq!(params.hit_type.assignment_duration_in_seconds, 180);
    assert_eq!(params.hit_type.auto_approval_delay_in_seconds, 0);
    assert_eq!(params.max_assignments, 1);
    assert_eq!(params.lifetime_in_seconds, 259_200);
    assert_eq!(params.hit_type.reward.currency_code, "USD");
    assert_eq!(
        params.hit_type.reward.amount,
        "0.01".parse::<BigDecimal>().unwrap()
    );
}

#[test]
fn template_is_read_on_every_call() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "<p>first & only</p>").unwrap();
    let first = hit_params(file.path()).unwrap();
    assert_eq!(first.question, "&lt;p&gt;first &amp; only&lt;/p&gt;");

    std::fs::write(file.path(), "\"second\"").unwrap();
    let second = hit_params(file.path()).unwrap();
    assert_eq!(second.question, "&quot;second&quot;");

    // Everything else stays the same between calls.
    assert_eq!(first.hit_type(), second.hit_type());
}

#[test]
fn unreadable_template_names_the_path() {
    let err = hit_params("/nonexistent/HTMLQuestion.xml".as_ref()).unwrap_err();
    match err {
        mturk_rs::Error::Template { path, .. } => {
            assert_eq!(path.to_str(), Some("/nonexistent/HTMLQuestion.xml"));
        }
        other => panic!("expected Template error, got {other:?}"),
    }
}

#[test]
fn apostrophes_use_the_numeric_entity() {
    assert_eq!(
        escape_question(r#"<b class="x">It's & that</b>"#),
        "&lt;b class=&quot;x&quot;&gt;It&#39;s &amp; that&lt;/b&gt;"
    );
}
