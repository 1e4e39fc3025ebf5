mod publisher;
mod store;

pub use publisher::{object_key, PublishOutcome, ReportPublisher, RetrievalLink, KEY_TIMESTAMP_FORMAT};
pub use store::ObjectStore;
