//! Secondary panel registry for the chat workspace file container.
//!
//! Each file type defines a closed set of secondary views. A view maps either
//! to a deferred component (resolved once, with a shared loading placeholder
//! until then) or to an intentionally empty node. A separate visibility table
//! tells the layout whether to mount the region at all.

pub mod component;
pub mod context;
pub mod error;
pub mod lazy;
pub mod placeholder;
pub mod table;
pub mod view;

pub use component::{
    AssetType, BuiltinComponentLoader, ComponentId, ComponentLoader, PanelComponent, PanelProps,
};
pub use context::{PanelContext, SelectedFile};
pub use error::PanelError;
pub use lazy::LazyComponent;
pub use table::{PanelNode, SecondaryPanelTable, should_render};
pub use view::{DashboardView, FileType, MetricView, SecondaryView};
