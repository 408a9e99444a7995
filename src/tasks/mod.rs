use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Database;
use crate::effects::Effects;
use crate::events::{AppEvent, Celebration, EventBus};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Storage key of the task snapshot.
pub const TASKS_STORAGE_KEY: &str = "deepFocusTasks";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

/// Decodes a stored snapshot. Anything that is not a JSON array of tasks
/// counts as no tasks.
pub fn parse_snapshot(raw: &str) -> Vec<Task> {
    match serde_json::from_str(raw) {
        Ok(tasks) => tasks,
        Err(err) => {
            log_warn!("discarding unreadable task snapshot: {err}");
            Vec::new()
        }
    }
}

/// Ordered task list. Every mutation rewrites the whole stored snapshot before
/// returning.
pub struct TaskList {
    tasks: Vec<Task>,
    db: Database,
    effects: Arc<dyn Effects>,
    events: EventBus,
}

impl TaskList {
    /// Restores the last snapshot. Missing, unreadable or corrupt data yields
    /// an empty list.
    pub async fn load(db: Database, effects: Arc<dyn Effects>, events: EventBus) -> Self {
        let tasks = match db.get_item(TASKS_STORAGE_KEY).await {
            Ok(Some(raw)) => parse_snapshot(&raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                log_warn!("failed to read task snapshot, starting empty: {err:#}");
                Vec::new()
            }
        };
        log_info!("loaded {} task(s)", tasks.len());

        Self {
            tasks,
            db,
            effects,
            events,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Appends a task unless `text` is blank.
    pub async fn add(&mut self, text: &str) -> Result<Option<Task>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let task = Task {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            completed: false,
        };
        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next).await?;
        Ok(Some(task))
    }

    /// Flips completion. Returns the new state, or `None` for an unknown id.
    pub async fn toggle(&mut self, id: &str) -> Result<Option<bool>> {
        let mut next = self.tasks.clone();
        let Some(task) = next.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        task.completed = !task.completed;
        let completed = task.completed;

        self.commit(next).await?;
        if completed {
            self.effects.celebrate(Celebration::TaskCompleted);
        }
        Ok(Some(completed))
    }

    pub async fn remove(&mut self, id: &str) -> Result<bool> {
        let mut next = self.tasks.clone();
        next.retain(|task| task.id != id);
        if next.len() == self.tasks.len() {
            return Ok(false);
        }
        self.commit(next).await?;
        Ok(true)
    }

    /// Drops every task and the stored snapshot. Returns how many were removed.
    pub async fn clear(&mut self) -> Result<usize> {
        self.db.remove_item(TASKS_STORAGE_KEY).await?;
        let removed = std::mem::take(&mut self.tasks).len();
        self.announce();
        Ok(removed)
    }

    /// Stores `next` and only then makes it the current list, so a failed
    /// write leaves the list as it was.
    async fn commit(&mut self, next: Vec<Task>) -> Result<()> {
        let snapshot = serde_json::to_string(&next).context("failed to serialize task list")?;
        self.db.set_item(TASKS_STORAGE_KEY, snapshot).await?;
        self.tasks = next;
        self.announce();
        Ok(())
    }

    fn announce(&self) {
        self.events.emit(AppEvent::TasksChanged {
            total: self.tasks.len(),
            completed: self.tasks.iter().filter(|task| task.completed).count(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::RecordingEffects;
    use tempfile::TempDir;

    async fn open(dir: &TempDir) -> (TaskList, Arc<RecordingEffects>) {
        let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
        let effects = Arc::new(RecordingEffects::default());
        let list = TaskList::load(db, effects.clone(), EventBus::new()).await;
        (list, effects)
    }

    #[tokio::test]
    async fn blank_text_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (mut list, _) = open(&dir).await;

        assert_eq!(list.add("").await.unwrap(), None);
        assert_eq!(list.add("   ").await.unwrap(), None);
        assert!(list.tasks().is_empty());

        let task = list.add("Buy milk").await.unwrap().unwrap();
        assert_eq!(list.tasks(), &[task.clone()]);
        assert_eq!(task.text, "Buy milk");
        assert!(!task.completed);
    }

    #[tokio::test]
    async fn only_completing_a_task_celebrates() {
        let dir = tempfile::tempdir().unwrap();
        let (mut list, effects) = open(&dir).await;
        let id = list.add("Write report").await.unwrap().unwrap().id;

        assert_eq!(list.toggle(&id).await.unwrap(), Some(true));
        assert_eq!(effects.celebrations(), vec![Celebration::TaskCompleted]);

        assert_eq!(list.toggle(&id).await.unwrap(), Some(false));
        assert_eq!(effects.celebrations().len(), 1);

        assert_eq!(list.toggle("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_ignores_unknown_ids() {
        let dir = tempfile::tempdir().unwrap();
        let (mut list, _) = open(&dir).await;
        let keep = list.add("keep").await.unwrap().unwrap();
        let gone = list.add("gone").await.unwrap().unwrap();

        assert!(!list.remove("missing").await.unwrap());
        assert!(list.remove(&gone.id).await.unwrap());
        assert_eq!(list.tasks(), &[keep]);
    }

    #[tokio::test]
    async fn snapshot_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let saved = {
            let (mut list, _) = open(&dir).await;
            list.add("first").await.unwrap();
            let second = list.add("second").await.unwrap().unwrap();
            list.add("third").await.unwrap();
            list.toggle(&second.id).await.unwrap();
            list.tasks().to_vec()
        };

        let (reloaded, _) = open(&dir).await;
        assert_eq!(reloaded.tasks(), saved.as_slice());
        assert_eq!(reloaded.tasks().len(), 3);
        assert!(reloaded.tasks()[1].completed);
    }

    #[tokio::test]
    async fn corrupt_snapshot_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
            db.set_item(TASKS_STORAGE_KEY, "{\"oops\":".into())
                .await
                .unwrap();
        }

        let (mut list, _) = open(&dir).await;
        assert!(list.tasks().is_empty());
        list.add("fresh start").await.unwrap();
        assert_eq!(list.tasks().len(), 1);
    }

    #[tokio::test]
    async fn failed_writes_leave_the_list_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
        let effects = Arc::new(RecordingEffects::default());
        let mut list = TaskList::load(db.clone(), effects.clone(), EventBus::new()).await;
        let task = list.add("Draft outline").await.unwrap().unwrap();

        db.execute(|conn| Ok(conn.execute_batch("DROP TABLE kv_store")?))
            .await
            .unwrap();

        assert!(list.add("Review notes").await.is_err());
        assert!(list.toggle(&task.id).await.is_err());
        assert!(list.remove(&task.id).await.is_err());
        assert_eq!(list.tasks(), &[task]);
        assert!(effects.celebrations().is_empty());
    }

    #[tokio::test]
    async fn clear_empties_list_and_storage() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (mut list, _) = open(&dir).await;
            list.add("one").await.unwrap();
            list.add("two").await.unwrap();
            assert_eq!(list.clear().await.unwrap(), 2);
            assert!(list.tasks().is_empty());
        }

        let (reloaded, _) = open(&dir).await;
        assert!(reloaded.tasks().is_empty());
    }

    #[test]
    fn snapshot_uses_plain_field_names() {
        let raw = r#"[{"id":"a","text":"Read","completed":true}]"#;
        let tasks = parse_snapshot(raw);
        assert_eq!(tasks[0].id, "a");
        assert!(tasks[0].completed);
        assert_eq!(serde_json::to_string(&tasks).unwrap(), raw);
        assert!(parse_snapshot("42").is_empty());
    }
}
