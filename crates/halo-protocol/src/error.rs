/// Errors for the Halo relay engine.
///
/// Nothing here is fatal to the duty cycle: decode failures drop the
/// offending payload, radio failures are surfaced and the timer keeps
/// running.
#[derive(Debug, thiserror::Error)]
pub enum HaloError {
    /// Advertisement bytes violate the wire layout (too short, or the
    /// declared name length overruns the payload).
    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },

    /// A radio start/stop call failed (platform error, adapter off).
    #[error("radio unavailable: {0}")]
    RadioUnavailable(String),

    /// A hand-built message does not fit the advertisement budget.
    /// Composed messages are fitted by construction and never hit this.
    #[error("encoded size {size} exceeds {max}-byte advertisement budget",
            max = crate::types::MAX_ADVERT_LEN)]
    EncodingOverflow { size: usize },

    /// Command sent to a runtime whose event loop has exited.
    #[error("runtime shut down")]
    RuntimeShutDown,
}
