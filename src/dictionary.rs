use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::Task;

/// Known owners and tags, offered as suggestions when editing tasks.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    #[serde(default)]
    pub owners: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Dictionary {
    /// Records the owners and tags of `task`. Returns true if anything was new.
    pub fn register(&mut self, task: &Task) -> bool {
        let mut changed = false;
        for owner in task.owners.iter().map(|o| o.trim()).filter(|o| !o.is_empty()) {
            changed |= self.owners.insert(owner.to_string());
        }
        for tag in task.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            changed |= self.tags.insert(tag.to_string());
        }
        changed
    }

    pub fn register_all<'a>(&mut self, tasks: impl IntoIterator<Item = &'a Task>) -> bool {
        tasks
            .into_iter()
            .fold(false, |changed, task| self.register(task) | changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn registers_trimmed_non_blank_values() {
        let mut task = Task::new(1, "t", NaiveDateTime::default());
        task.owners = vec![" sam ".into(), "".into()];
        task.tags = vec!["errand".into(), "  ".into()];

        let mut dict = Dictionary::default();
        assert!(dict.register(&task));
        assert_eq!(dict.owners.iter().collect::<Vec<_>>(), vec!["sam"]);
        assert_eq!(dict.tags.iter().collect::<Vec<_>>(), vec!["errand"]);
        assert!(!dict.register(&task));
    }
}
