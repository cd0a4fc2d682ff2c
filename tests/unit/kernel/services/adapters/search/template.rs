use super::*;

fn expand(pattern: &str, template: &str, haystack: &str) -> String {
    let regex = Regex::new(pattern).unwrap();
    let template = ReplacementTemplate::parse(template, &regex).unwrap();
    let caps = regex.captures(haystack).unwrap();
    template.expand(&caps)
}

fn parse_err(pattern: &str, template: &str) -> String {
    let regex = Regex::new(pattern).unwrap();
    match ReplacementTemplate::parse(template, &regex) {
        Err(SearchError::InvalidReplacementTemplate(message)) => message,
        other => panic!("expected template error, got {:?}", other),
    }
}

#[test]
fn test_plain_text_is_literal() {
    let regex = Regex::new("a").unwrap();
    let template = ReplacementTemplate::parse("plain", &regex).unwrap();
    assert!(template.is_literal());
}

#[test]
fn test_numeric_and_named_groups() {
    assert_eq!(expand(r"(\d)(\d)", r"\2\1", "12"), "21");
    assert_eq!(expand(r"(\d)(\d)", r"\g<2>-\g<0>", "12"), "2-12");
    assert_eq!(expand(r"(?P<word>\w+)", r"[\g<word>]", "hi"), "[hi]");
}

#[test]
fn test_two_digit_group_reference() {
    let pattern = "(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)";
    assert_eq!(expand(pattern, r"\11", "abcdefghijk"), "k");
}

#[test]
fn test_escapes() {
    assert_eq!(expand("x", r"a\nb\tc\\d", "x"), "a\nb\tc\\d");
    // 非字母转义原样保留
    assert_eq!(expand("x", r"\.", "x"), "\\.");
}

#[test]
fn test_unmatched_group_expands_empty() {
    assert_eq!(expand(r"(a)|(b)", r"[\2]", "a"), "[]");
}

#[test]
fn test_invalid_templates() {
    let message = parse_err("cat", r"\1");
    assert!(message.contains("invalid group reference 1"));
    assert!(message.contains("\\g<index>"));

    assert!(parse_err("cat", "\\").contains("end of template"));
    assert!(parse_err("cat", r"\q").contains("bad escape \\q"));
    assert!(parse_err("(a)", r"\g<2>").contains("invalid group reference 2"));
    assert!(parse_err("(a)", r"\g<nope>").contains("unknown group name"));
    assert!(parse_err("(a)", r"\g<1").contains("unterminated"));
    assert!(parse_err("(a)", r"\g1").contains("missing <"));
}
