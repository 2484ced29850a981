use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TEMPLATE: &str = "<title>$#title#$</title>$#content#$<nav>$#posts#$</nav><nav>$#tags#$</nav>\
                        <p>$#taglist#$</p>$#date#$";

const HELLO: &str = "posts/2024/01/hello/index.md";

fn project(converter: &str) -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("almanac.yaml"),
        format!("locale: en_US\nconverter:\n{}", converter),
    )
    .unwrap();
    fs::write(temp.path().join("template.html"), TEMPLATE).unwrap();
    temp
}

fn markdown_project() -> TempDir {
    project("  kind: markdown\n")
}

fn write_post(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn almanac(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("almanac").unwrap();
    cmd.current_dir(root).env_remove("RUST_LOG");
    cmd
}

#[test]
fn compiles_a_post() {
    let temp = markdown_project();
    write_post(temp.path(), HELLO, "<!-- title=Hello; tags=b,a -->\n\nFirst *post*.\n");

    almanac(temp.path())
        .args([HELLO, "out/2024/01/hello/index.html"])
        .assert()
        .success()
        .stdout("");

    let html = fs::read_to_string(temp.path().join("out/2024/01/hello/index.html")).unwrap();
    assert!(html.starts_with("<title>Hello</title>"));
    assert!(html.contains("<p>First <em>post</em>.</p>"));
    assert!(html.contains(r#"<a href="/posts/2024/01/hello" class="sidebar-link">Hello</a>"#));
    assert!(html.contains("<p>a, b</p>"));

    let index = fs::read_to_string(temp.path().join("post-index.csv")).unwrap();
    assert!(index.starts_with("posts/2024/01/hello/index.md,"));
    assert!(index.ends_with(",Hello,\"a,b\"\r\n"));
}

#[test]
fn reindexing_an_unchanged_post_is_a_no_op() {
    let temp = markdown_project();
    write_post(temp.path(), HELLO, "<!-- Hello; a -->\n");

    almanac(temp.path())
        .args(["index", HELLO])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inserted"));
    let before = fs::read(temp.path().join("post-index.csv")).unwrap();

    almanac(temp.path())
        .args(["index", HELLO])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unchanged"));
    assert_eq!(fs::read(temp.path().join("post-index.csv")).unwrap(), before);
}

#[test]
fn header_changes_update_the_entry() {
    let temp = markdown_project();
    write_post(temp.path(), HELLO, "<!-- Hello; a, b -->\n");
    almanac(temp.path()).args(["index", HELLO]).assert().success();
    let before = fs::read_to_string(temp.path().join("post-index.csv")).unwrap();
    let created = before.split(',').nth(1).unwrap().to_owned();

    write_post(temp.path(), HELLO, "<!-- Hello2; a -->\n");
    almanac(temp.path())
        .args(["index", HELLO])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated"));

    let after = fs::read_to_string(temp.path().join("post-index.csv")).unwrap();
    assert_eq!(after, format!("{},{},Hello2,a\r\n", HELLO, created));
}

#[test]
fn missing_post_fails() {
    let temp = markdown_project();
    almanac(temp.path())
        .args(["posts/nope.md", "out.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: post `posts/nope.md` not found"));
}

#[test]
fn malformed_header_fails() {
    let temp = markdown_project();
    write_post(temp.path(), HELLO, "# Hello\n");
    almanac(temp.path())
        .args([HELLO, "out.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("header"));
    assert!(!temp.path().join("out.html").exists());
}

#[test]
fn malformed_index_fails() {
    let temp = markdown_project();
    write_post(temp.path(), HELLO, "<!-- Hello -->\n");
    fs::write(temp.path().join("post-index.csv"), "only,three,fields\r\n").unwrap();
    almanac(temp.path())
        .args(["index", HELLO])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed index record"));
}

#[test]
fn missing_template_fails() {
    let temp = markdown_project();
    fs::remove_file(temp.path().join("template.html")).unwrap();
    write_post(temp.path(), HELLO, "<!-- Hello -->\n");
    almanac(temp.path())
        .args([HELLO, "out.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("template"));
}

#[cfg(unix)]
#[test]
fn failing_converter_fails() {
    let temp = project("  kind: command\n  program: \"false\"\n");
    write_post(temp.path(), HELLO, "<!-- Hello -->\n");
    almanac(temp.path())
        .args([HELLO, "out.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("converter `false` failed"));
}

#[test]
fn scan_and_merge() {
    let temp = markdown_project();
    write_post(temp.path(), HELLO, "<!-- Hello; a -->\n");
    write_post(temp.path(), "posts/2024/02/two/index.md", "<!-- Two; b -->\n");

    almanac(temp.path())
        .arg("scan")
        .assert()
        .success()
        .stdout("2 new, 0 updated, 0 unchanged, 0 skipped\n");

    fs::write(
        temp.path().join("old-index.csv"),
        "posts/2019/05/old/index.md,2019-05-01\\00:00:00\\UTC+0000,Old,\r\n",
    )
    .unwrap();
    almanac(temp.path())
        .args(["merge", "old-index.csv"])
        .assert()
        .success()
        .stdout("merged 1 entries\n");

    let index = fs::read_to_string(temp.path().join("post-index.csv")).unwrap();
    assert!(index.starts_with("posts/2019/05/old/index.md,"));
    assert_eq!(index.lines().count(), 3);
}

#[test]
fn explicit_config_flag() {
    let temp = markdown_project();
    let site = temp.path().join("site");
    fs::create_dir_all(&site).unwrap();
    fs::write(site.join("custom.yaml"), "index_file: custom.csv\nconverter:\n  kind: markdown\n").unwrap();
    write_post(&site, HELLO, "<!-- Hello -->\n");

    almanac(temp.path())
        .args(["--config", "site/custom.yaml", "index", "site/posts/2024/01/hello/index.md"])
        .assert()
        .success();

    let index = fs::read_to_string(site.join("custom.csv")).unwrap();
    assert!(index.starts_with("posts/2024/01/hello/index.md,"));
}

#[test]
fn relative_spellings_share_one_entry() {
    let temp = markdown_project();
    write_post(temp.path(), HELLO, "<!-- Hello; a -->\n");
    let february = temp.path().join("posts/2024/02");
    fs::create_dir_all(&february).unwrap();

    almanac(temp.path()).args(["index", HELLO]).assert().success();
    almanac(&february)
        .args(["index", "../01/hello/index.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unchanged"));

    let index = fs::read_to_string(temp.path().join("post-index.csv")).unwrap();
    assert_eq!(index.lines().count(), 1);
    assert!(index.starts_with("posts/2024/01/hello/index.md,"));
}
