//! Contact data carried by contact credentials

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single contact claim (an email address, a display name, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactItem {
    /// Claim type, e.g. "email", "phone", "name"
    pub item_type: String,

    pub value: String,

    /// Preferred entry of its type within the section
    pub primary: bool,

    pub active: bool,

    pub start: Option<DateTime<Utc>>,

    pub end: Option<DateTime<Utc>>,
}

impl ContactItem {
    pub fn new(item_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            value: value.into(),
            primary: false,
            active: true,
            start: None,
            end: None,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }
}

/// Named group of contact items ("identifier", "communication", ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSection {
    pub name: String,
    pub items: Vec<ContactItem>,
}

/// The structured payload of a contact credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactData {
    pub version: u32,
    pub sections: Vec<ContactSection>,
}

impl ContactData {
    pub const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            sections: Vec::new(),
        }
    }

    /// Append `item` to the section called `section`, creating it if needed
    pub fn with_item(mut self, section: &str, item: ContactItem) -> Self {
        match self.sections.iter_mut().find(|s| s.name == section) {
            Some(existing) => existing.items.push(item),
            None => self.sections.push(ContactSection {
                name: section.to_string(),
                items: vec![item],
            }),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.items.is_empty())
    }

    /// First active item of the given type, preferring primary entries
    pub fn preferred(&self, item_type: &str) -> Option<&ContactItem> {
        let mut candidates = self
            .sections
            .iter()
            .flat_map(|s| s.items.iter())
            .filter(|i| i.active && i.item_type == item_type);
        let first = candidates.next()?;
        if first.primary {
            return Some(first);
        }
        Some(candidates.find(|i| i.primary).unwrap_or(first))
    }
}

impl Default for ContactData {
    fn default() -> Self {
        Self::new()
    }
}
