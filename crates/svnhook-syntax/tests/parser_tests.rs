use anyhow::Result;
use svnhook_syntax::{ParseError, parse, parse_file};
use std::io::Write;

#[test]
fn test_root_and_children() -> Result<()> {
    let source = r#"<?xml version="1.0"?>
<Actions>
  <SetToken name="happy">joy</SetToken>
  <SendError exitCode="3">I feel ${happy}!</SendError>
</Actions>"#;
    let root = parse(source)?;

    assert_eq!(root.name(), "Actions");
    assert_eq!(root.children().len(), 2);

    let set = &root.children()[0];
    assert_eq!(set.name(), "SetToken");
    assert_eq!(set.attr("name"), Some("happy"));
    assert_eq!(set.text(), Some("joy"));

    let err = &root.children()[1];
    assert_eq!(err.attr("exitCode"), Some("3"));
    assert_eq!(err.text(), Some("I feel ${happy}!"));
    Ok(())
}

#[test]
fn test_text_is_leading_text_only() -> Result<()> {
    let root = parse("<FilterAuthor>\n  <AuthorRegex>x</AuthorRegex>\n  tail\n</FilterAuthor>")?;
    assert_eq!(root.text(), Some("\n  "));
    assert_eq!(root.children().len(), 1);
    Ok(())
}

#[test]
fn test_empty_element_has_no_text() -> Result<()> {
    let root = parse(r#"<Actions><SetToken name="blank"/></Actions>"#)?;
    assert_eq!(root.children()[0].text(), None);
    Ok(())
}

#[test]
fn test_comments_are_not_children() -> Result<()> {
    let root = parse("<Actions><!-- note --><SendError>x</SendError></Actions>")?;
    assert_eq!(root.children().len(), 1);
    Ok(())
}

#[test]
fn test_cdata_text() -> Result<()> {
    let root = parse("<Actions><SendError><![CDATA[a < b]]></SendError></Actions>")?;
    assert_eq!(root.children()[0].text(), Some("a < b"));
    Ok(())
}

#[test]
fn test_spans_are_one_based() -> Result<()> {
    let root = parse("<Actions>\n  <SendError>x</SendError>\n</Actions>")?;
    assert_eq!(root.span().line, 1);
    assert_eq!(root.span().col, 1);
    let child = &root.children()[0];
    assert_eq!(child.span().line, 2);
    assert_eq!(child.span().col, 3);
    Ok(())
}

#[test]
fn test_malformed_reports_location() {
    let err = parse("<Actions>\n  <SendError>\n</Actions>").unwrap_err();
    match err {
        ParseError::Malformed { span, .. } => assert_eq!(span.line, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_blank_document() {
    assert!(matches!(parse("  \n"), Err(ParseError::Empty)));
}

#[test]
fn test_parse_file_includes_excerpt() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, "<Actions>\n  <SendError>\n</Actions>")?;

    let err = parse_file(file.path()).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("--> line 3:"));
    assert!(err.downcast_ref::<ParseError>().is_some());
    Ok(())
}

#[test]
fn test_parse_file_missing() {
    let err = parse_file(std::path::Path::new("/nonexistent/svnhook.xml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read configuration"));
}
