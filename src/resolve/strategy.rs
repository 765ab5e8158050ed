use std::fmt;

use serde::{Deserialize, Serialize};

use crate::screen::descriptor::ElementType;

/// One self-contained way of re-locating a saved element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Evaluate the saved container path and look inside each match
    Container,
    /// Document-wide `data-name` equality
    DataName,
    /// Document-wide `name` attribute equality
    NameAttribute,
    /// Document-wide `placeholder` equality
    Placeholder,
    /// Document-wide button caption equality
    ButtonText,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Container => "container",
            Strategy::DataName => "data-name",
            Strategy::NameAttribute => "name",
            Strategy::Placeholder => "placeholder",
            Strategy::ButtonText => "button-text",
        }
    }

    /// Strategies applicable to an element type, in the order they are tried.
    pub fn fallback_chain(element_type: ElementType) -> &'static [Strategy] {
        match element_type {
            ElementType::Input => &[
                Strategy::Container,
                Strategy::NameAttribute,
                Strategy::Placeholder,
            ],
            ElementType::Button => &[Strategy::Container, Strategy::ButtonText],
            ElementType::SelectDisplay | ElementType::TextDisplay => {
                &[Strategy::Container, Strategy::DataName]
            }
        }
    }
}

/// Which strategy matched, and how the match was confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoundBy {
    /// Container match; the entry had no label to verify
    #[serde(rename = "container")]
    Container,
    #[serde(rename = "container+label")]
    ContainerLabel,
    /// Container match; the live page has no label to compare against
    #[serde(rename = "container-unverified")]
    ContainerUnverified,
    #[serde(rename = "data-name")]
    DataName,
    #[serde(rename = "data-name+label")]
    DataNameLabel,
    #[serde(rename = "data-name-first")]
    DataNameFirst,
    #[serde(rename = "name")]
    NameAttribute,
    #[serde(rename = "name+label")]
    NameAttributeLabel,
    #[serde(rename = "name-first")]
    NameAttributeFirst,
    #[serde(rename = "placeholder")]
    Placeholder,
    #[serde(rename = "button-text")]
    ButtonText,
    #[serde(rename = "button-text+label")]
    ButtonTextLabel,
}

impl FoundBy {
    pub fn strategy(&self) -> Strategy {
        match self {
            FoundBy::Container | FoundBy::ContainerLabel | FoundBy::ContainerUnverified => {
                Strategy::Container
            }
            FoundBy::DataName | FoundBy::DataNameLabel | FoundBy::DataNameFirst => {
                Strategy::DataName
            }
            FoundBy::NameAttribute | FoundBy::NameAttributeLabel | FoundBy::NameAttributeFirst => {
                Strategy::NameAttribute
            }
            FoundBy::Placeholder => Strategy::Placeholder,
            FoundBy::ButtonText | FoundBy::ButtonTextLabel => Strategy::ButtonText,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FoundBy::Container => "container",
            FoundBy::ContainerLabel => "container+label",
            FoundBy::ContainerUnverified => "container-unverified",
            FoundBy::DataName => "data-name",
            FoundBy::DataNameLabel => "data-name+label",
            FoundBy::DataNameFirst => "data-name-first",
            FoundBy::NameAttribute => "name",
            FoundBy::NameAttributeLabel => "name+label",
            FoundBy::NameAttributeFirst => "name-first",
            FoundBy::Placeholder => "placeholder",
            FoundBy::ButtonText => "button-text",
            FoundBy::ButtonTextLabel => "button-text+label",
        }
    }
}

impl fmt::Display for FoundBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
