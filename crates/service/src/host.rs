use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::descriptor::Descriptor;

/// Contract every configuration backend offers the host.
///
/// Both calls are total: failures are logged by the backend and surface as an
/// empty document (load) or a skipped write (save).
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    async fn load_config(&self, descriptor: &Descriptor) -> Value;
    async fn save_config(&self, descriptor: &Descriptor, config: &Value);
}

/// The host side of backend registration.
pub trait ConfigHost: Send + Sync {
    /// Install `backend` as the active configuration backend, or clear the
    /// slot with `None`.
    fn set_interceptor(&self, backend: Option<Arc<dyn ConfigBackend>>);

    /// Descriptor the host uses for its global configuration.
    fn global_indicator(&self) -> Descriptor { Descriptor::Global }
}
