/// Opaque identity of an actor (a node id such as `"alice.os"`).
pub type NodeId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
