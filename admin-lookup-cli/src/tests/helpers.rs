//! Test helpers for staging place files on disk.

use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;
use tempfile::TempDir;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    let mut file = admin_lookup_fs::create_utf8_file(path).expect("create file");
    file.write_all(contents).expect("write file");
}

pub(super) fn read_utf8(path: &Utf8Path) -> String {
    std::fs::read_to_string(path).expect("read file")
}

pub(super) fn workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}
