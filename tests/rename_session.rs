use seqren::config::Config;
use seqren::planner::Padding;
use seqren::prompt::Prompt;
use seqren::renamer::{Outcome, RenameRequest, run_session};
use seqren::{Error, Extractor, Generator, apply, plan};
use std::collections::BTreeSet;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

fn folder_with(parent: &Path, name: &str, files: &[&str]) -> std::path::PathBuf {
    let dir = parent.join(name);
    fs::create_dir(&dir).unwrap();
    for file in files {
        fs::write(dir.join(file), file.as_bytes()).unwrap();
    }
    dir
}

fn listing(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn scripted(input: &str) -> Prompt<Cursor<Vec<u8>>, Vec<u8>> {
    Prompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

fn shown(prompt: &mut Prompt<Cursor<Vec<u8>>, Vec<u8>>) -> String {
    String::from_utf8(prompt.output().clone()).unwrap()
}

fn text(out: &[u8]) -> String {
    String::from_utf8(out.to_vec()).unwrap()
}

#[test]
fn confirmed_session_renames_files_and_folder() {
    let temp = TempDir::new().unwrap();
    folder_with(temp.path(), "Photos", &["image01.img", "image02.img", "image03.img"]);

    let request = RenameRequest {
        path: temp.path().to_path_buf(),
        ..Default::default()
    };
    // folder choice, new folder name, extractor (accept guess), output (accept default), confirm
    let mut prompt = scripted("1\nHawaii\n\n\ny\n");
    let mut report = Vec::new();
    let outcome = run_session(&request, &Config::default(), &mut prompt, &mut report).unwrap();

    assert!(matches!(outcome, Outcome::Committed { files: 3, folder: true }));
    assert!(!temp.path().join("Photos").exists());
    assert_eq!(
        listing(&temp.path().join("Hawaii")),
        BTreeSet::from([
            "Hawaii - 01.img".to_string(),
            "Hawaii - 02.img".to_string(),
            "Hawaii - 03.img".to_string(),
        ])
    );
    let asked = shown(&mut prompt);
    assert!(asked.contains("Original name format [image%s.img]: "));
    assert!(asked.contains("Output name format [Hawaii - %s.img]: "));
    let report = text(&report);
    assert!(report.contains("Folder renamed: Photos -> Hawaii"));
    assert!(report.ends_with("Completed!\n"));
}

#[test]
fn declined_session_restores_files_and_folder() {
    let temp = TempDir::new().unwrap();
    let dir = folder_with(
        temp.path(),
        "Notebook",
        &["my note (1).txt", "my note (2).txt", "my note (13).txt", "cover.png"],
    );
    let before = listing(&dir);

    let request = RenameRequest {
        path: dir.clone(),
        direct: true,
        extract: Some("my note (%s)".into()),
        output: Some("Page %s".into()),
        folder_name: Some("Journal".into()),
        stem: true,
        pad: Some(Padding::Auto),
        ..Default::default()
    };
    let config = request.settings(Config::default());
    let mut prompt = scripted("n\n");
    let mut out = Vec::new();
    let outcome = run_session(&request, &config, &mut prompt, &mut out).unwrap();

    assert!(matches!(outcome, Outcome::Reverted { files: 3, folder: true }));
    assert!(!temp.path().join("Journal").exists());
    assert_eq!(listing(&dir), before);
    assert!(shown(&mut prompt).contains("Confirm changes"));
    let out = text(&out);
    assert!(out.contains("my note (1).txt -> Page 01.txt"));
    assert!(out.contains("my note (13).txt -> Page 13.txt"));
    assert!(out.contains("cover.png (does not match the mask)"));
    assert!(out.contains("renamed back to their original names"));
}

#[test]
fn dry_run_touches_nothing() {
    let temp = TempDir::new().unwrap();
    let dir = folder_with(temp.path(), "Music", &["My_sound-clip #25.mp3", "My_sound-clip #26.mp3"]);
    let before = listing(&dir);

    let request = RenameRequest {
        path: dir.clone(),
        direct: true,
        auto: true,
        output: Some("Clip %s.mp3".into()),
        folder_name: Some(String::new()),
        dry_run: true,
        ..Default::default()
    };
    let mut prompt = scripted("");
    match run_session(&request, &Config::default(), &mut prompt, &mut Vec::new()).unwrap() {
        Outcome::DryRun(plan) => {
            assert_eq!(plan.entries.len(), 2);
            assert_eq!(plan.entries[0].extracted_token, "25");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(listing(&dir), before);
}

#[test]
fn collision_aborts_before_any_rename() {
    let temp = TempDir::new().unwrap();
    let dir = folder_with(temp.path(), "Pages", &["1.txt", "01.txt", "2.txt"]);
    let before = listing(&dir);

    let request = RenameRequest {
        path: dir.clone(),
        direct: true,
        extract: Some("%s.txt".into()),
        output: Some("x%s.txt".into()),
        pad: Some(Padding::Width(2)),
        yes: true,
        ..Default::default()
    };
    let config = request.settings(Config::default());
    let err = run_session(&request, &config, &mut scripted(""), &mut Vec::new()).unwrap_err();

    match err {
        Error::Collision { collisions } => {
            assert_eq!(collisions.len(), 1);
            assert_eq!(collisions[0].originals.len(), 2);
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(listing(&dir), before);
}

#[test]
fn apply_failure_leaves_folder_unchanged() {
    let temp = TempDir::new().unwrap();
    let dir = folder_with(
        temp.path(),
        "Shots",
        &["a1.jpg", "a2.jpg", "a3.jpg", "a4.jpg", "a5.jpg", "b3.jpg"],
    );
    let before = listing(&dir);

    let extractor = Extractor::compile("a%s.jpg", "%s").unwrap();
    let generator = Generator::compile("b%s.jpg", "%s").unwrap();
    let plan = plan(&dir, &extractor, &generator).unwrap();
    assert_eq!(plan.entries.len(), 5);
    assert_eq!(plan.skipped.len(), 1);

    let err = apply(&plan.entries).unwrap_err();
    assert!(matches!(err, Error::Rename { .. }), "{err}");
    assert_eq!(listing(&dir), before);
    assert_eq!(fs::read_to_string(dir.join("a1.jpg")).unwrap(), "a1.jpg");
}

#[test]
fn empty_folder_has_nothing_to_rename() {
    let temp = TempDir::new().unwrap();
    let dir = folder_with(temp.path(), "Empty", &[]);
    let request = RenameRequest {
        path: dir,
        direct: true,
        ..Default::default()
    };
    let mut out = Vec::new();
    let outcome = run_session(&request, &Config::default(), &mut scripted(""), &mut out).unwrap();
    assert!(matches!(outcome, Outcome::NothingToRename));
    assert!(text(&out).starts_with("No files found in"));
}

#[test]
fn closed_input_before_confirmation_undoes() {
    let temp = TempDir::new().unwrap();
    let dir = folder_with(temp.path(), "Scans", &["scan1.pdf", "scan2.pdf"]);
    let before = listing(&dir);

    let request = RenameRequest {
        path: dir.clone(),
        direct: true,
        extract: Some("scan%s.pdf".into()),
        output: Some("Doc %s.pdf".into()),
        folder_name: Some(String::new()),
        ..Default::default()
    };
    let outcome =
        run_session(&request, &Config::default(), &mut scripted(""), &mut Vec::new()).unwrap();
    assert!(matches!(outcome, Outcome::Reverted { files: 2, folder: false }));
    assert_eq!(listing(&dir), before);
}

#[test]
fn json_preview_keeps_questions_off_the_report() {
    let temp = TempDir::new().unwrap();
    let dir = folder_with(temp.path(), "Tracks", &["track1.mp3", "track2.mp3"]);

    let request = RenameRequest {
        path: dir.clone(),
        direct: true,
        dry_run: true,
        format: Some(seqren::preview::PreviewFormat::Json),
        ..Default::default()
    };
    let config = request.settings(Config::default());
    // folder name (skip), extractor (accept guess), output mask
    let mut prompt = scripted("\n\nSong %s.mp3\n");
    let mut report = Vec::new();
    let outcome = run_session(&request, &config, &mut prompt, &mut report).unwrap();

    assert!(matches!(outcome, Outcome::DryRun(_)));
    let plan: serde_json::Value = serde_json::from_slice(&report).unwrap();
    assert_eq!(plan["entries"].as_array().unwrap().len(), 2);
    assert!(shown(&mut prompt).contains("Output name format"));
}
