#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("graph contains an edge with a missing endpoint: {edge_id}")]
    MissingEndpoint { edge_id: String },

    #[error("node {member} is a member of unknown group {group}")]
    UnknownGroup { member: String, group: String },

    #[error("group membership of {node} is cyclic")]
    CyclicGrouping { node: String },
}

pub type Result<T> = std::result::Result<T, Error>;
