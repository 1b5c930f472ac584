use thiserror::Error;

/// Errors that can occur while snapshotting a queue to disk or restoring
/// one from a prior snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Opening, reading, or writing the snapshot file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file did not start with the expected snapshot magic bytes.
    #[error("not a queue snapshot file (bad magic)")]
    BadMagic,

    /// The file's format version is not one this build understands.
    #[error("unsupported snapshot format version: {0}")]
    UnsupportedVersion(u32),

    /// A record's checksum did not match its payload.
    #[error("checksum mismatch reading snapshot record")]
    ChecksumMismatch,

    /// Serializing an item for the snapshot failed.
    #[error("failed to encode item: {0}")]
    Encode(#[source] bincode::Error),

    /// Deserializing an item read from the snapshot failed.
    #[error("failed to decode item: {0}")]
    Decode(#[source] bincode::Error),
}
