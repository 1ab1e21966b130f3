use crate::domain::model::{SignalName, SignalValue};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Access to the signals of the underlying PLC device server.
///
/// Failures to reach a signal must be reported as errors, never as a default value.
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn read(&self, signal: &SignalName) -> Result<SignalValue>;
    async fn write(&self, signal: &SignalName, value: SignalValue) -> Result<()>;
}

#[async_trait]
impl<T: SignalSource + ?Sized> SignalSource for std::sync::Arc<T> {
    async fn read(&self, signal: &SignalName) -> Result<SignalValue> {
        (**self).read(signal).await
    }

    async fn write(&self, signal: &SignalName, value: SignalValue) -> Result<()> {
        (**self).write(signal, value).await
    }
}
