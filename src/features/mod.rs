// Features layer - one module per bot capability

pub mod knowledge;
pub mod moderation;
pub mod polls;

pub use knowledge::{HttpBlob, KnowledgeStore, RemoteBlob};
pub use moderation::{Moderation, RecordStore, YamlRecordStore};
pub use polls::{run_poll, PollOutcome, PollSpec};
