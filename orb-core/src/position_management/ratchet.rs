/// Ratchet invariant enforcement for the premium trailing stop
///
/// **Core Rule:** the stop may rise, never fall.
///
/// Positions are always long an option, so tightening the premium stop
/// means raising it. A proposal below the current level is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct RatchetState {
    /// Current stop level (high-water mark)
    current_level: Option<f64>,
}

impl RatchetState {
    /// Create an unarmed ratchet (Regime A positions have no premium stop)
    pub fn new() -> Self {
        Self {
            current_level: None,
        }
    }

    /// Create a ratchet armed at an initial level
    pub fn with_initial_level(initial_level: f64) -> Self {
        Self {
            current_level: Some(initial_level),
        }
    }

    /// Apply the ratchet to a proposed stop level
    ///
    /// Returns the ratcheted level: `max(current, proposed)`, or the
    /// proposal itself when the ratchet is not armed yet.
    ///
    /// # Example
    /// ```
    /// use orb_core::position_management::RatchetState;
    ///
    /// let mut ratchet = RatchetState::with_initial_level(250.0);
    /// assert_eq!(ratchet.apply(280.0), 280.0);
    /// assert_eq!(ratchet.apply(260.0), 280.0);
    /// ```
    pub fn apply(&mut self, proposed: f64) -> f64 {
        let level = match self.current_level {
            None => proposed,
            Some(current) => current.max(proposed),
        };
        self.current_level = Some(level);
        level
    }

    /// Get current ratchet level (if armed)
    pub fn current_level(&self) -> Option<f64> {
        self.current_level
    }
}

impl Default for RatchetState {
    fn default() -> Self {
        Self::new()
    }
}
