use ulid::Ulid;

#[derive(Debug)]
pub enum EngineError {
    /// Calendar policy missing or unreadable — never guess working hours.
    PolicyUnavailable(String),
    /// Malformed `HH:mm` in policy data.
    InvalidTimeFormat(String),
    /// Structural policy invariant violated.
    InvalidPolicy(&'static str),
    /// No such service in the catalog.
    UnknownService(Ulid),
    NotFound(Ulid),
    AlreadyCanceled(Ulid),
    /// The proposed interval overlaps an existing appointment (capacity 1).
    SlotTaken(Ulid),
    /// The proposed interval would push an instant past capacity.
    CapacityExceeded(u32),
    LimitExceeded(&'static str),
    StoreError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::PolicyUnavailable(tenant) => {
                write!(f, "calendar policy unavailable for tenant: {tenant}")
            }
            EngineError::InvalidTimeFormat(text) => {
                write!(f, "invalid HH:mm time: {text:?}")
            }
            EngineError::InvalidPolicy(msg) => write!(f, "invalid calendar policy: {msg}"),
            EngineError::UnknownService(id) => write!(f, "unknown service: {id}"),
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyCanceled(id) => {
                write!(f, "appointment already canceled: {id}")
            }
            EngineError::SlotTaken(id) => {
                write!(f, "this time slot is already taken (conflicts with {id})")
            }
            EngineError::CapacityExceeded(cap) => {
                write!(f, "capacity {cap} exceeded: all slots occupied")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::StoreError(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    /// Whether this is an admission rejection (as opposed to an I/O or
    /// validation failure). Rejections are user-facing and never retried.
    pub fn is_rejection(&self) -> bool {
        matches!(self, EngineError::SlotTaken(_) | EngineError::CapacityExceeded(_))
    }
}
