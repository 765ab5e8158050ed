use std::fmt;

use serde::{Deserialize, Serialize};

/// Capability tag assigned once at scan time. Resolution and extraction
/// dispatch on it instead of re-inspecting the live element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    Input,
    Button,
    SelectDisplay,
    TextDisplay,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Input => "input",
            ElementType::Button => "button",
            ElementType::SelectDisplay => "select-display",
            ElementType::TextDisplay => "text-display",
        }
    }

    pub fn is_display(&self) -> bool {
        matches!(self, ElementType::SelectDisplay | ElementType::TextDisplay)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element recorded by a scan. Superseded entirely by the next scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    pub index: usize,
    pub label: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
    /// Raw input type, or the tag name for non-inputs.
    #[serde(rename = "type")]
    pub kind: String,
    pub element_type: ElementType,
    pub data_name: Option<String>,
    pub xtype: Option<String>,
    pub container_path: String,
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

/// The durable part of a descriptor the user chose to track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedConfigEntry {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Generated once at save time; never rewritten during resolution.
    #[serde(default)]
    pub container_selector: String,
    #[serde(default)]
    pub fallback_name: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    pub element_type: ElementType,
    #[serde(default)]
    pub data_name: Option<String>,
    #[serde(default)]
    pub xtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_by: Option<String>,
}

impl From<&ElementDescriptor> for SavedConfigEntry {
    fn from(info: &ElementDescriptor) -> Self {
        SavedConfigEntry {
            index: info.index,
            label: info.label.clone(),
            name: info.name.clone(),
            container_selector: info.container_path.clone(),
            fallback_name: info.name.clone(),
            placeholder: info.placeholder.clone(),
            element_type: info.element_type,
            data_name: info.data_name.clone(),
            xtype: info.xtype.clone(),
            button_text: info.button_text.clone(),
            found_by: None,
        }
    }
}

impl SavedConfigEntry {
    /// Name used in logs and reports when the entry has no label.
    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .or(self.fallback_name.as_deref())
            .or(self.name.as_deref())
            .or(self.data_name.as_deref())
            .unwrap_or("<unnamed>")
    }

    /// Name used by the name-attribute strategy.
    pub fn lookup_name(&self) -> Option<&str> {
        self.fallback_name
            .as_deref()
            .or(self.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}
