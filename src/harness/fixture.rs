use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::TestFailure;

/// Shared slot that hooks and test bodies of one suite hand values through.
///
/// Cloning a fixture clones the handle, not the value.
pub struct Fixture<T> {
    slot: Arc<Mutex<Option<T>>>,
    name: &'static str,
}

impl<T> Clone for Fixture<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            name: self.name,
        }
    }
}

impl<T: Send> Fixture<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            name,
        }
    }

    pub async fn set(&self, value: T) {
        *self.slot.lock().await = Some(value);
    }

    pub async fn take(&self) -> Option<T> {
        self.slot.lock().await.take()
    }

    pub async fn is_set(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Clone of the current value, failing the test when the slot is empty
    pub async fn get(&self) -> Result<T, TestFailure>
    where
        T: Clone,
    {
        self.slot.lock().await.clone().ok_or_else(|| {
            TestFailure::assertion(format!("fixture '{}' is not initialized", self.name))
        })
    }

    /// Run `update` against the current value in place
    pub async fn update<F>(&self, update: F)
    where
        F: FnOnce(&mut Option<T>),
    {
        update(&mut *self.slot.lock().await);
    }
}
