#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use databridge::{Config, record_shape};
use serde::{Deserialize, Serialize};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Config whose log sink records every message it receives.
pub fn recording_config() -> (Config, Arc<Mutex<Vec<String>>>) {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let config = Config::default().with_logger(move |message| {
        sink.lock().expect("log sink").push(message.to_string());
    });
    (config, messages)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "Age")]
    pub age: i64,
    #[serde(rename = "Active")]
    pub active: bool,
}

record_shape!(Account {
    first_name as "FirstName": String,
    age as "Age": i64,
    active as "Active": bool,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Age")]
    pub age: i64,
}

record_shape!(Member {
    name as "Name": String,
    age as "Age": i64,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    #[serde(default)]
    pub zip: String,
}

record_shape!(Address { city: String, zip: String });

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub tags: Vec<String>,
}

record_shape!(Customer {
    name: String,
    address: Address,
    tags: Vec<String>,
});
