//! Dataset types
//!
//! Items are immutable records supplied by the dataset provider. Ids are
//! dense integers `1..=N` matching the item's position, so item `id` lives
//! at zero-based slot `id - 1`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Item identifier (1-based, dense)
pub type ItemId = u32;

/// An immutable dataset record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Dense 1-based identifier
    pub id: ItemId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Street address
    #[serde(default)]
    pub address: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// City
    #[serde(default)]
    pub city: String,
    /// Gender flag carried through from the dataset; not searchable
    #[serde(rename = "isMale", default)]
    pub is_male: bool,
}

impl Item {
    /// Create an item with a name and empty remaining fields
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Item {
            id,
            name: name.into(),
            address: String::new(),
            description: String::new(),
            city: String::new(),
            is_male: false,
        }
    }

    /// Builder: set address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Builder: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set city
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    /// Builder: set gender flag
    pub fn with_is_male(mut self, is_male: bool) -> Self {
        self.is_male = is_male;
        self
    }

    /// Text indexed for this item: name, address, description and city
    /// joined by single spaces.
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(
            self.name.len() + self.address.len() + self.description.len() + self.city.len() + 3,
        );
        text.push_str(&self.name);
        text.push(' ');
        text.push_str(&self.address);
        text.push(' ');
        text.push_str(&self.description);
        text.push(' ');
        text.push_str(&self.city);
        text
    }

    /// Zero-based storage slot for an id, `None` for id 0.
    #[inline]
    pub fn slot(id: ItemId) -> Option<usize> {
        (id as usize).checked_sub(1)
    }
}

/// Check that `items[i].id == i + 1` for every position.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] naming the first offending position.
pub fn validate_dense_ids(items: &[Item]) -> Result<()> {
    for (pos, item) in items.iter().enumerate() {
        let expected = pos as u64 + 1;
        if item.id as u64 != expected {
            return Err(Error::invalid_input(format!(
                "item at position {} has id {}, expected {}",
                pos, item.id, expected
            )));
        }
    }
    Ok(())
}
