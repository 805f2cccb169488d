use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::payload::Payload;

pub const ORIGINAL: &str = "original assembly";

/// A fake 140 install plus a payload directory next to it.
pub struct Fixture {
    pub game: TempDir,
    pub payload_dir: TempDir,
}

impl Fixture {
    /// Game with one original file (`140_Data/Managed/Assembly-CSharp.dll`)
    /// and a payload at `version` that replaces it and adds a timer dll.
    pub fn new(version: &str) -> Self {
        let game = tempfile::tempdir().unwrap();
        write(&game.path().join("140.exe"), "MZ");
        write(
            &game.path().join("140_Data/Managed/Assembly-CSharp.dll"),
            ORIGINAL,
        );
        let payload_dir = tempfile::tempdir().unwrap();
        let fixture = Self { game, payload_dir };
        fixture.set_payload(
            version,
            &[
                ("140_Data/Managed/Assembly-CSharp.dll", "patched assembly"),
                ("140_Data/Managed/SpeedrunTimer.dll", "timer"),
            ],
        );
        fixture
    }

    pub fn set_payload(&self, version: &str, files: &[(&str, &str)]) {
        let files_dir = self.payload_dir.path().join("files");
        let _ = std::fs::remove_dir_all(&files_dir);
        write(
            &self.payload_dir.path().join("payload.toml"),
            &format!("version = \"{version}\"\n"),
        );
        for (rel, content) in files {
            write(&files_dir.join(rel), content);
        }
    }

    pub fn payload(&self) -> Payload {
        Payload::load(self.payload_dir.path()).unwrap()
    }

    pub fn dir(&self) -> &Path {
        self.game.path()
    }

    pub fn file(&self, rel: &str) -> PathBuf {
        crate::manifest::join_relative(self.game.path(), rel)
    }

    pub fn read(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.file(rel)).ok()
    }

    /// Every file under the game directory with its content, sorted.
    pub fn snapshot(&self) -> Vec<(String, Vec<u8>)> {
        let mut out: Vec<(String, Vec<u8>)> = walkdir::WalkDir::new(self.game.path())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e
                    .path()
                    .strip_prefix(self.game.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                (rel, std::fs::read(e.path()).unwrap())
            })
            .collect();
        out.sort();
        out
    }
}

pub fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}
