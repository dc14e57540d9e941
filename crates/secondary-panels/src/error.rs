use crate::component::ComponentId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    #[error("unknown file type '{value}'")]
    UnknownFileType { value: String },
    #[error("view '{key}' is not registered for {file_type} files")]
    UnknownView { file_type: &'static str, key: String },
    #[error("failed to load panel component '{component}': {message}")]
    ComponentLoad {
        component: &'static str,
        message: String,
    },
    #[error("loader returned '{actual}' when '{expected}' was requested")]
    ComponentMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl PanelError {
    pub fn load(component: ComponentId, message: impl Into<String>) -> Self {
        Self::ComponentLoad {
            component: component.as_str(),
            message: message.into(),
        }
    }

    /// True for errors caused by a key outside the registered tables.
    pub fn is_unmapped(&self) -> bool {
        matches!(self, Self::UnknownFileType { .. } | Self::UnknownView { .. })
    }
}
