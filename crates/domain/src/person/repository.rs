//! Person repository port.

use async_trait::async_trait;

use crate::person::Person;
use crate::shared_kernel::Result;
use crate::store::TransactWriteItem;

/// Persistence boundary for person records. Creation goes through the
/// transactional writer, which combines [`build_put_new`] with the matching
/// outbox put in one atomic transaction; `get`/`list` are the boundary the
/// read API consumes.
///
/// [`build_put_new`]: PersonRepository::build_put_new
#[async_trait]
pub trait PersonRepository: Send + Sync {
    /// Conditional put creating `person`, guarded by the id not existing yet.
    fn build_put_new(&self, person: &Person) -> TransactWriteItem;

    async fn get(&self, id: &str) -> Result<Option<Person>>;

    async fn list(&self) -> Result<Vec<Person>>;
}
