use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::models::{RecurringTemplate, Task};

/// JSON files under one data directory.
///
/// `tasks.json` and `templates.json` hold arrays, `dictionary.json` an object.
/// Missing files read as empty; a file that exists but does not parse is an error.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Store { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tasks_path(&self) -> PathBuf {
        self.dir.join("tasks.json")
    }

    fn templates_path(&self) -> PathBuf {
        self.dir.join("templates.json")
    }

    fn dictionary_path(&self) -> PathBuf {
        self.dir.join("dictionary.json")
    }

    /// Loads all tasks.
    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        Ok(read_json(&self.tasks_path())?.unwrap_or_default())
    }

    /// Overwrites the task file with `tasks`.
    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.write_json(&self.tasks_path(), &tasks)
    }

    /// Loads a single task by its ID.
    pub fn load_task(&self, id: u64) -> Result<Task> {
        self.load_tasks()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(Error::TaskNotFound(id))
    }

    /// Applies `f` to the task with `id` and saves the whole collection.
    pub fn update_task<F>(&self, id: u64, f: F) -> Result<Task>
    where
        F: FnOnce(&mut Task),
    {
        let mut tasks = self.load_tasks()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Error::TaskNotFound(id))?;
        f(task);
        let updated = task.clone();
        self.save_tasks(&tasks)?;
        Ok(updated)
    }

    pub fn load_templates(&self) -> Result<Vec<RecurringTemplate>> {
        Ok(read_json(&self.templates_path())?.unwrap_or_default())
    }

    pub fn save_templates(&self, templates: &[RecurringTemplate]) -> Result<()> {
        self.write_json(&self.templates_path(), &templates)
    }

    pub fn load_dictionary(&self) -> Result<Dictionary> {
        Ok(read_json(&self.dictionary_path())?.unwrap_or_default())
    }

    pub fn save_dictionary(&self, dict: &Dictionary) -> Result<()> {
        self.write_json(&self.dictionary_path(), dict)
    }

    /// Deletes the task, template and dictionary files.
    pub fn reset(&self) -> Result<()> {
        for path in [self.tasks_path(), self.templates_path(), self.dictionary_path()] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let s = serde_json::to_string_pretty(value)?;
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut f = OpenOptions::new().read(true).open(path)?;
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    if s.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&s)
        .map(Some)
        .map_err(|source| Error::Parse { path: path.to_path_buf(), source })
}
