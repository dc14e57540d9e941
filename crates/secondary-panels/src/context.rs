use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub id: String,
}

/// Render context handed to every panel entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_file: Option<SelectedFile>,
}

impl PanelContext {
    pub fn for_file(id: impl Into<String>) -> Self {
        Self {
            selected_file: Some(SelectedFile { id: id.into() }),
        }
    }

    /// Id of the selected file, or `""` when nothing is selected.
    pub fn selected_file_id(&self) -> &str {
        self.selected_file
            .as_ref()
            .map_or("", |file| file.id.as_str())
    }
}
