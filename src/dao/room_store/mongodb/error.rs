use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias for MongoDB room-store operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors raised by the MongoDB room-store backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Connection string could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Client could not be built from the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Server never answered the initial ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Attempts made before giving up.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Periodic health probe failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Insert of a new room failed.
    #[error("failed to insert room `{code}`")]
    InsertRoom {
        /// Room code being written.
        code: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Lookup of a room failed.
    #[error("failed to load room `{code}`")]
    LoadRoom {
        /// Room code being read.
        code: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Conditional or plain update of a room failed.
    #[error("failed to update room `{code}`")]
    UpdateRoom {
        /// Room code being updated.
        code: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
