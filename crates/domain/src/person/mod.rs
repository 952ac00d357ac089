pub mod model;
pub mod repository;

pub use model::{NewPerson, Person, PersonCreated};
pub use repository::PersonRepository;
