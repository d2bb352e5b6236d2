use std::fmt::Display;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SGError
{
    /// Generation was requested on a storage that already holds points.
    StorageNotEmpty,
    CliqueSizeTooLarge,
    InvalidCliqueSize,
    LevelVectorMismatch,
    /// The requested level is not supported by the chosen scheme (e.g. level 0 with periodic boundaries).
    UnsupportedLevel,
    LevelOutOfRange,
    InvalidDimension,
    LZ4DecompressionFailed,
    ReadBufferFailed,
    WriteBufferFailed,
    SerializationFailed,
    DeserializationFailed,    
    FileIOError,
    InvalidIndex,
    /// The point is already stored under another sequence number.
    DuplicatePoint,
}
impl std::error::Error for SGError {}

impl Display for SGError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", *self)
    }
}
