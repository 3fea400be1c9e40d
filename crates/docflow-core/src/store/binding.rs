//! Form record persistence with debounced saves

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::backend::KeyValueStore;
use crate::error::{Error, Result};
use crate::record::FormRecord;

/// Quiet period before a scheduled save is written
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

struct PendingSave {
    generation: u64,
    record: FormRecord,
    timer: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct PendingSaves {
    next_generation: u64,
    by_key: HashMap<String, PendingSave>,
}

/// Loads and saves [`FormRecord`]s by page key
///
/// `schedule_save` keeps at most one timer per key: each call cancels the
/// previous one, so a burst of edits becomes a single write once the user
/// pauses for the debounce delay.
pub struct TemplateBindingStore {
    backend: Arc<dyn KeyValueStore>,
    delay: Duration,
    pending: Arc<Mutex<PendingSaves>>,
}

impl TemplateBindingStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_delay(backend, DEFAULT_DEBOUNCE)
    }

    pub fn with_delay(backend: Arc<dyn KeyValueStore>, delay: Duration) -> Self {
        Self {
            backend,
            delay,
            pending: Arc::new(Mutex::new(PendingSaves::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record stored under `key`, overlaid on `defaults`
    ///
    /// A scheduled but unwritten record wins over storage. Absent keys,
    /// unreadable storage and corrupt values all yield the defaults.
    pub fn load(&self, key: &str, defaults: &FormRecord) -> FormRecord {
        if let Some(pending) = self.pending.lock().by_key.get(key) {
            return pending.record.clone();
        }

        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return defaults.clone(),
            Err(e) => {
                warn!(key, error = %e, "could not read stored record, using defaults");
                return defaults.clone();
            }
        };

        match serde_json::from_str::<FormRecord>(&raw) {
            Ok(stored) => FormRecord::over_seed(defaults, stored),
            Err(e) => {
                warn!(key, error = %e, "stored record is corrupt, using defaults");
                defaults.clone()
            }
        }
    }

    /// Write `record` now, superseding any scheduled save for `key`
    pub fn save(&self, key: &str, record: &FormRecord) -> Result<()> {
        if let Some(previous) = self.pending.lock().by_key.remove(key) {
            cancel(previous);
        }
        write_record(self.backend.as_ref(), key, record)
    }

    /// Save `record` once `key` has been quiet for the debounce delay
    ///
    /// Outside a tokio runtime there is no timer to arm, so the record is
    /// written immediately.
    pub fn schedule_save(&self, key: &str, record: FormRecord) {
        let Ok(runtime) = Handle::try_current() else {
            debug!(key, "no runtime for a debounced save, writing now");
            if let Err(e) = self.save(key, &record) {
                warn!(key, error = %e, "save failed");
            }
            return;
        };

        let mut pending = self.pending.lock();
        let generation = pending.next_generation;
        pending.next_generation += 1;

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.pending);
        let delay = self.delay;
        let task_key = key.to_string();
        let timer = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let due = {
                let mut pending = shared.lock();
                match pending.by_key.get(&task_key) {
                    Some(entry) if entry.generation == generation => {
                        pending.by_key.remove(&task_key).map(|entry| entry.record)
                    }
                    _ => None,
                }
            };
            if let Some(record) = due {
                if let Err(e) = write_record(backend.as_ref(), &task_key, &record) {
                    warn!(key = %task_key, error = %e, "debounced save failed");
                }
            }
        });

        let entry = PendingSave {
            generation,
            record,
            timer: Some(timer),
        };
        if let Some(previous) = pending.by_key.insert(key.to_string(), entry) {
            cancel(previous);
        }
        debug!(key, generation, "scheduled save");
    }

    /// Whether a save is scheduled for `key`
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.lock().by_key.contains_key(key)
    }

    /// Write every scheduled save now
    pub fn flush(&self) -> Result<()> {
        let drained: Vec<(String, PendingSave)> = self.pending.lock().by_key.drain().collect();
        let mut first_error = None;
        for (key, mut entry) in drained {
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
            if let Err(e) = write_record(self.backend.as_ref(), &key, &entry.record) {
                warn!(key = %key, error = %e, "flush failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Forget the stored record for `key` and any scheduled save
    pub fn reset(&self, key: &str) -> Result<()> {
        if let Some(previous) = self.pending.lock().by_key.remove(key) {
            cancel(previous);
        }
        self.backend.remove(key)
    }
}

impl Drop for TemplateBindingStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "unsaved records lost on drop");
        }
    }
}

fn cancel(mut entry: PendingSave) {
    if let Some(timer) = entry.timer.take() {
        timer.abort();
    }
}

fn write_record(backend: &dyn KeyValueStore, key: &str, record: &FormRecord) -> Result<()> {
    let json = serde_json::to_string(record).map_err(|e| Error::Store(e.to_string()))?;
    backend.set(key, &json)?;
    debug!(key, fields = record.len(), "saved record");
    Ok(())
}
