//! Shared test utilities and fixture generators

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A fake home directory holding the `linux/psi4/sandbox/fakefs` tree used
/// throughout the tests:
///
/// - `proj1/dft-psivar.csx`
/// - `proj1/nu_water_sp2.csx`
/// - `proj2/dft-psivar.csx`
/// - `proj2/readme.txt`
pub struct FakeHome {
    pub dir: TempDir,
}

impl FakeHome {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let home = Self { dir };
        home.write("linux/psi4/sandbox/fakefs/proj1/dft-psivar.csx", b"<csx>dft</csx>");
        home.write("linux/psi4/sandbox/fakefs/proj1/nu_water_sp2.csx", b"<csx>nu</csx>");
        home.write("linux/psi4/sandbox/fakefs/proj2/dft-psivar.csx", b"<csx>dft2</csx>");
        home.write("linux/psi4/sandbox/fakefs/proj2/readme.txt", b"not a csx");
        home
    }

    /// Canonical home path, so it lines up with canonicalized selections.
    pub fn path(&self) -> PathBuf {
        fs::canonicalize(self.dir.path()).unwrap()
    }

    pub fn fakefs(&self) -> PathBuf {
        self.path().join("linux/psi4/sandbox/fakefs")
    }

    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap_or_else(|| Path::new("."))).unwrap();
        fs::write(&path, contents).unwrap();
        fs::canonicalize(path).unwrap()
    }
}
