use crate::CoreResult;

use async_trait::async_trait;

/// Delivers recognized text to whatever currently has input focus.
#[async_trait]
pub trait TextInjector: Send + Sync {
    /// Reproduce `text` verbatim at the cursor.
    async fn inject(&self, text: &str) -> CoreResult<()>;
}
