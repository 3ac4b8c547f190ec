/// Position management: lifecycle state machine + ratchet invariant
///
/// **Module Structure:**
/// - `ratchet`: premium stop that may only rise
/// - `lifecycle`: PENDING_ENTRY → OPEN → CLOSED with Regime A/B exits
pub mod lifecycle;
pub mod ratchet;

pub use lifecycle::PositionMachine;
pub use ratchet::RatchetState;
