#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegmapError {
    /// Malformed configuration rejected at construction time.
    BadConfig,
    /// Register access outside the configured allow-ranges.
    Denied,
    /// Cache lookup for a register that was never seeded or written.
    NotCached,
    /// Zero-length or otherwise unusable argument.
    InvalidLength,
    /// Cache-semantic operation on a core configured without a cache.
    NoCache,
    /// Mutually exclusive modes requested, or an operation that would
    /// touch hardware while writes are confined to the cache.
    Conflict,
    /// A bounded staging buffer is out of space.
    StageFull,
    /// Serializer output would not fit the caller-supplied records.
    LoaderFull,
    /// The register backend reported a failure.
    Io,
}
