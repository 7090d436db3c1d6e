//! Selection and labelling against a fake home directory

mod common;

use chrono::{Local, TimeZone};
use common::FakeHome;
use csx2portal::label::{Labeler, DEFAULT_PUBLICATION, DEFAULT_TITLE};
use csx2portal::select::{select_files, Selection};

fn labeler(home: &FakeHome, title: &str) -> Labeler {
    Labeler {
        host: "myMac".into(),
        user: "johndoe".into(),
        home: Some(home.path()),
        upload_time: Local.with_ymd_and_hms(2015, 6, 11, 9, 0, 0).unwrap(),
        title_template: title.into(),
        publication_template: DEFAULT_PUBLICATION.into(),
    }
}

#[test]
fn test_default_title_under_fake_home() {
    let home = FakeHome::new();
    let sel = Selection::Within(home.fakefs().join("proj1"));
    let files = select_files(&sel, &home.path(), Some(home.path().as_path())).unwrap();

    let records = labeler(&home, DEFAULT_TITLE).label_files(&files).unwrap();
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "myMac__linux-psi4-sandbox-fakefs-proj1__dft-psivar",
            "myMac__linux-psi4-sandbox-fakefs-proj1__nu_water_sp2",
        ]
    );
    assert!(records
        .iter()
        .all(|r| r.publication == "linux-psi4-sandbox-fakefs-proj1"));
}

#[test]
fn test_indices_follow_sorted_paths() {
    let home = FakeHome::new();
    let sel = Selection::Within(home.fakefs());
    let mut files = select_files(&sel, &home.path(), Some(home.path().as_path())).unwrap();
    files.reverse();

    let records = labeler(&home, "{job}__{num}").label_files(&files).unwrap();
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["dft-psivar__0", "nu_water_sp2__1", "dft-psivar__2"]
    );
}

#[test]
fn test_indices_use_string_order_of_sibling_directories() {
    let home = FakeHome::new();
    let x = home.write("runs/b/x.csx", b"x");
    let y = home.write("runs/b-c/y.csx", b"y");

    let sel = Selection::Within(home.path().join("runs"));
    let files = select_files(&sel, &home.path(), Some(home.path().as_path())).unwrap();
    assert_eq!(files, vec![y.clone(), x.clone()]);

    let records = labeler(&home, "{job}__{num}")
        .label_files(&[x, y])
        .unwrap();
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["y__0", "x__1"]);
}

#[test]
fn test_upload_time_is_shared_and_mtime_is_per_file() {
    let home = FakeHome::new();
    let sel = Selection::Within(home.fakefs());
    let files = select_files(&sel, &home.path(), Some(home.path().as_path())).unwrap();

    let records = labeler(&home, "{uploaddatetime}|{filemoddatetime}")
        .label_files(&files)
        .unwrap();
    for record in &records {
        let (upload, modified) = record.title.split_once('|').unwrap();
        assert_eq!(upload, "2015-06-11T09:00:00");
        assert_eq!(modified.len(), "2015-06-10T14:22:41".len());
        assert_eq!(&modified[10..11], "T");
    }
}

#[test]
fn test_only_csx_files_are_selected() {
    let home = FakeHome::new();
    let sel = Selection::Files(vec![format!("{}/*/*", home.fakefs().display())]);
    let files = select_files(&sel, &home.path(), Some(home.path().as_path())).unwrap();
    assert_eq!(files.len(), 3);
    assert!(files
        .iter()
        .all(|p| p.extension().and_then(|e| e.to_str()) == Some("csx") && p.is_file()));
}
