//! Prelude module - commonly used test utilities.

pub use crate::fixtures::{
    sample_connector, sample_model_group, test_collection, test_tenant, unique_id,
};
pub use crate::harness::{KvHarness, init_test_logging};
pub use crate::mocks::{FailingTableClient, MockSearchClient, SpyTableClient, TableCall};
