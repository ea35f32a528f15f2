use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// The per-process chat mirror: `iChat_<pid>.txt`, truncated at start and
/// flushed after every line so it can be followed with `tail -f`. Written
/// only by the listener stream; nothing in the protocol reads it back.
pub struct Transcript {
    path: PathBuf,
    file: Mutex<File>,
}

impl Transcript {
    pub fn create() -> io::Result<Self> {
        let path = PathBuf::from(format!("iChat_{}.txt", std::process::id()));
        let file = File::create(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, line: &str) -> io::Result<()> {
        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}
