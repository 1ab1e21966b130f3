use crate::core::{SignalName, SignalSource, SignalValue};
use crate::utils::error::{DeviceError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<SignalName, SignalValue>,
    writes: Vec<(SignalName, SignalValue)>,
    fail_writes: bool,
}

/// Signal source backed by a map. Unknown signals read as unavailable.
/// Every write is recorded in order.
#[derive(Debug, Default)]
pub struct InMemorySource {
    inner: Mutex<Inner>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set(&self, signal: &SignalName, value: SignalValue) {
        self.lock().values.insert(signal.clone(), value);
    }

    pub fn remove(&self, signal: &SignalName) {
        self.lock().values.remove(signal);
    }

    pub fn writes(&self) -> Vec<(SignalName, SignalValue)> {
        self.lock().writes.clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }
}

#[async_trait]
impl SignalSource for InMemorySource {
    async fn read(&self, signal: &SignalName) -> Result<SignalValue> {
        self.lock()
            .values
            .get(signal)
            .copied()
            .ok_or_else(|| DeviceError::unavailable(signal, "signal not present"))
    }

    async fn write(&self, signal: &SignalName, value: SignalValue) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(DeviceError::unavailable(signal, "writes rejected"));
        }
        inner.writes.push((signal.clone(), value));
        inner.values.insert(signal.clone(), value);
        Ok(())
    }
}
