//! Per-cycle decision record.

use idler_gateway::ScaleOutcome;

/// Classification of a function within one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FunctionState {
    /// Invocations seen in the lookback window, at this rate.
    Active(f64),
    /// A zero invocation rate was reported.
    Idle,
    /// No usable series; never scaled.
    NoData,
}

impl FunctionState {
    pub fn from_rate(rate: Option<f64>) -> Self {
        match rate {
            Some(r) if r == 0.0 => FunctionState::Idle,
            Some(r) if r > 0.0 => FunctionState::Active(r),
            _ => FunctionState::NoData,
        }
    }
}

/// What one reconciliation cycle observed and did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Every listed function with its classification, in gateway order.
    pub states: Vec<(String, FunctionState)>,
    /// Idle functions whose live replica count was re-checked.
    pub rechecked: Vec<String>,
    /// Scale-to-zero requests issued.
    pub scaled: Vec<(String, ScaleOutcome)>,
    /// Idle functions already at zero replicas.
    pub already_zero: Vec<String>,
    /// Idle functions whose re-check failed.
    pub lookup_failures: Vec<String>,
}

impl CycleReport {
    pub fn state_of(&self, name: &str) -> Option<FunctionState> {
        self.states
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, state)| *state)
    }

    pub fn idle_count(&self) -> usize {
        self.count(|s| matches!(s, FunctionState::Idle))
    }

    pub fn active_count(&self) -> usize {
        self.count(|s| matches!(s, FunctionState::Active(_)))
    }

    pub fn no_data_count(&self) -> usize {
        self.count(|s| matches!(s, FunctionState::NoData))
    }

    pub fn scaled_names(&self) -> Vec<&str> {
        self.scaled.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn count(&self, pred: impl Fn(&FunctionState) -> bool) -> usize {
        self.states.iter().filter(|(_, s)| pred(s)).count()
    }
}
