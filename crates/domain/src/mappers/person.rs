//! Person item codec.

use crate::mappers::MapError;
use crate::person::Person;
use crate::shared_kernel::PersonId;
use crate::store::{AttributeValue, Item};

pub const ID: &str = "Id";
pub const FIRST_NAME: &str = "FirstName";
pub const LAST_NAME: &str = "LastName";
pub const PHONE_NUMBER: &str = "PhoneNumber";
pub const ADDRESS: &str = "Address";

pub fn to_item(person: &Person) -> Item {
    let mut item = Item::with_capacity(5);
    item.insert(ID.to_string(), AttributeValue::s(person.id.as_str()));

    put_non_blank(&mut item, FIRST_NAME, &person.first_name);
    put_non_blank(&mut item, LAST_NAME, &person.last_name);
    put_non_blank(&mut item, PHONE_NUMBER, &person.phone_number);
    put_non_blank(&mut item, ADDRESS, &person.address);

    item
}

pub fn from_item(item: &Item) -> Result<Person, MapError> {
    let id = item
        .get(ID)
        .and_then(AttributeValue::as_s)
        .ok_or(MapError::Missing(ID))?;

    Ok(Person {
        id: PersonId(id.to_string()),
        first_name: get_s(item, FIRST_NAME),
        last_name: get_s(item, LAST_NAME),
        phone_number: get_s(item, PHONE_NUMBER),
        address: get_s(item, ADDRESS),
    })
}

fn put_non_blank(item: &mut Item, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            item.insert(name.to_string(), AttributeValue::s(value.clone()));
        }
    }
}

fn get_s(item: &Item, name: &str) -> Option<String> {
    item.get(name)
        .and_then(AttributeValue::as_s)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::NewPerson;

    #[test]
    fn sparse_round_trip() {
        let person = NewPerson {
            first_name: Some("Alexandre".to_string()),
            last_name: Some("Borges".to_string()),
            ..Default::default()
        }
        .into_person()
        .unwrap();

        let item = to_item(&person);
        assert!(item.contains_key(FIRST_NAME));
        assert!(item.contains_key(LAST_NAME));
        assert!(!item.contains_key(PHONE_NUMBER));
        assert!(!item.contains_key(ADDRESS));

        let decoded = from_item(&item).unwrap();
        assert_eq!(decoded, person);
    }

    #[test]
    fn blank_attributes_are_not_stored() {
        let person = Person {
            id: PersonId("p-1".to_string()),
            first_name: Some("Alexandre".to_string()),
            last_name: Some("   ".to_string()),
            phone_number: Some(String::new()),
            address: None,
        };

        let item = to_item(&person);
        assert!(!item.contains_key(LAST_NAME));
        assert!(!item.contains_key(PHONE_NUMBER));
    }

    #[test]
    fn missing_id_fails_decode() {
        let item = Item::new();
        assert!(matches!(from_item(&item), Err(MapError::Missing(ID))));
    }
}
