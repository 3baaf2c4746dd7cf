//! Atomic sequential identity issuance.
//!
//! Identities come from a single counter document and are produced by a
//! server-side increment transform inside one commit. The store applies
//! the increment and returns the post-increment value, so concurrent
//! callers never read-modify-write and never observe the same id. The
//! transform upserts the counter, so the first id issued is 1.

use tracing::debug;

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};
use crate::types::Write;

/// Collection holding sequence counter documents.
const COUNTER_COLLECTION: &str = "counters";

/// Counter field incremented on every issue.
const COUNTER_FIELD: &str = "value";

/// Issues gapless-per-issue, strictly increasing identities.
#[derive(Clone)]
pub struct SequenceGenerator {
    client: StoreClient,
    counter_id: String,
}

impl SequenceGenerator {
    /// Create a generator backed by the named counter document.
    pub fn new(client: StoreClient, counter_id: impl Into<String>) -> Self {
        Self {
            client,
            counter_id: counter_id.into(),
        }
    }

    /// Issue the next identity.
    ///
    /// Returns 1 on the very first call against a fresh counter.
    pub async fn next_id(&self) -> StoreResult<i64> {
        let document = self
            .client
            .full_document_name(COUNTER_COLLECTION, &self.counter_id);
        let write = Write::increment(document, COUNTER_FIELD, 1);

        let response = self.client.commit(vec![write]).await?;

        let id = response.first_transform_integer().ok_or_else(|| {
            StoreError::invalid_response("commit response carried no transform result")
        })?;

        debug!(counter = %self.counter_id, id, "Issued sequence id");
        Ok(id)
    }
}
