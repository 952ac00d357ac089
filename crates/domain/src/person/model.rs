//! Person aggregate and its creation-event projection.

use serde::{Deserialize, Serialize};

use crate::shared_kernel::{DomainError, PersonId, Result};

/// A persisted person record. Created once by the transactional writer and
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl Person {
    /// The event payload snapshot the bus will receive. Only meaningful
    /// fields are carried; absent attributes are omitted from the JSON.
    pub fn created_event(&self) -> PersonCreated {
        PersonCreated {
            person_id: self.id.as_str().to_string(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone_number: self.phone_number.clone(),
            address: self.address.clone(),
        }
    }
}

/// Input for person creation. The writer assigns an id when the caller did
/// not supply one; whitespace-only values count as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPerson {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewPerson {
    /// Normalizes the input into a persistable person.
    ///
    /// Rejects a person with no meaningful attribute at all before any store
    /// call is made.
    pub fn into_person(self) -> Result<Person> {
        let first_name = non_blank(self.first_name);
        let last_name = non_blank(self.last_name);
        let phone_number = non_blank(self.phone_number);
        let address = non_blank(self.address);

        if first_name.is_none()
            && last_name.is_none()
            && phone_number.is_none()
            && address.is_none()
        {
            return Err(DomainError::Validation {
                field: "person".to_string(),
                reason: "at least one attribute must be set".to_string(),
            });
        }

        let id = match non_blank(self.id) {
            Some(id) => PersonId(id),
            None => PersonId::generate(),
        };

        Ok(Person {
            id,
            first_name,
            last_name,
            phone_number,
            address,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Projection published as the `PersonCreated` event detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonCreated {
    pub person_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
