use anyhow::Result;
use std::fs;
use std::process::Command;

fn svnhook() -> Command {
    Command::new(env!("CARGO_BIN_EXE_svnhook"))
}

#[test]
fn test_start_commit_rejection() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let doc = dir.path().join("start-commit.xml");
    fs::write(
        &doc,
        r#"<Actions>
  <FilterUser>
    <UserRegex>^guest$</UserRegex>
    <SendError exitCode="3">Guests (${User}) may not commit.</SendError>
  </FilterUser>
</Actions>"#,
    )?;

    let output = svnhook()
        .args(["start-commit", "/srv/repo", "guest", "mergeinfo", "--cfgfile"])
        .arg(&doc)
        .output()?;
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(String::from_utf8(output.stderr)?, "Guests (guest) may not commit.");
    assert!(dir.path().join("start-commit.log").exists());

    let output = svnhook()
        .args(["start-commit", "/srv/repo", "alice", "mergeinfo", "--cfgfile"])
        .arg(&doc)
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stderr.is_empty());
    Ok(())
}

#[test]
fn test_broken_document_reports_generic_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let doc = dir.path().join("pre-lock.xml");
    fs::write(&doc, "<Actions><SendError>")?;

    let output = svnhook()
        .args(["pre-lock", "/srv/repo", "trunk/a.c", "alice", "", "0", "--cfgfile"])
        .arg(&doc)
        .output()?;
    assert_eq!(output.status.code(), Some(255));
    assert_eq!(
        String::from_utf8(output.stderr)?,
        "Internal hook error. Please notify administrator.\n"
    );

    let log = fs::read_to_string(dir.path().join("pre-lock.log"))?;
    assert!(log.contains("malformed configuration"));
    Ok(())
}

#[test]
fn test_local_settings_choose_log_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let doc = dir.path().join("post-unlock.xml");
    let log = dir.path().join("custom.log");
    fs::write(&doc, "<Actions/>")?;
    fs::write(
        dir.path().join(".svnhookrc"),
        format!("log_level = \"debug\"\nlog_file = {:?}\n", log.display().to_string()),
    )?;

    let output = svnhook()
        .args(["post-unlock", "/srv/repo", "alice", "--cfgfile"])
        .arg(&doc)
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    assert!(log.exists());
    Ok(())
}

#[test]
fn test_check_valid_document() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let doc = dir.path().join("pre-commit.xml");
    fs::write(
        &doc,
        r#"<Actions>
  <FilterCommitList>
    <PathRegex>\.exe$</PathRegex>
    <SendError>No binaries: ${ChgPath}</SendError>
  </FilterCommitList>
</Actions>"#,
    )?;

    let output = svnhook().arg("check").arg("--cfgfile").arg(&doc).output()?;
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8(output.stdout)?.contains("is valid"));
    Ok(())
}

#[test]
fn test_check_reports_problems() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let doc = dir.path().join("pre-commit.xml");
    fs::write(
        &doc,
        r#"<Actions>
  <FilterAuthor/>
  <SendSmtp server="mail.example.com">
    <FromAddress>svn@example.com</FromAddress>
    <Subject>s</Subject>
    <Message>m</Message>
  </SendSmtp>
</Actions>"#,
    )?;

    let output = svnhook().arg("check").arg("--cfgfile").arg(&doc).output()?;
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Required tag missing: AuthorRegex"));
    assert!(stdout.contains("Required tag missing: ToAddress"));
    assert!(stdout.contains("2 problem(s)"));
    Ok(())
}
