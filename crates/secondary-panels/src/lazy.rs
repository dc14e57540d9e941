use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::component::{ComponentId, ComponentLoader, PanelComponent};
use crate::error::PanelError;

/// A component resolved at most once, on first use.
///
/// Concurrent first resolutions wait on a single load. A failed load is not
/// cached; the next caller retries. Dropping a resolving future abandons the
/// load without memoizing anything.
pub struct LazyComponent {
    id: ComponentId,
    loader: Arc<dyn ComponentLoader>,
    cell: OnceCell<Arc<dyn PanelComponent>>,
}

impl LazyComponent {
    pub fn new(id: ComponentId, loader: Arc<dyn ComponentLoader>) -> Self {
        Self {
            id,
            loader,
            cell: OnceCell::new(),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn get(&self) -> Option<&Arc<dyn PanelComponent>> {
        self.cell.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn resolve(&self) -> Result<&Arc<dyn PanelComponent>, PanelError> {
        self.cell
            .get_or_try_init(|| async {
                debug!(component = self.id.as_str(), "resolving deferred panel component");
                let component = self.loader.load(self.id).await.inspect_err(|error| {
                    warn!(component = self.id.as_str(), %error, "panel component load failed");
                })?;
                if component.id() != self.id {
                    return Err(PanelError::ComponentMismatch {
                        expected: self.id.as_str(),
                        actual: component.id().as_str(),
                    });
                }
                Ok(component)
            })
            .await
    }
}

impl std::fmt::Debug for LazyComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyComponent")
            .field("id", &self.id)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
