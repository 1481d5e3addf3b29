/// Errors from engine construction. Ticking never fails.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{entities} entities need a {side}x{side} state texture, limit is {max}")]
    TextureTooLarge { entities: usize, side: u64, max: u32 },
    #[error("resource allocation failed: {0}")]
    Allocation(String),
    #[error("device error: {0}")]
    Device(String),
}
