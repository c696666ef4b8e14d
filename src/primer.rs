use std::fmt;

/// Which primer of the pair a pattern or read direction refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimerRole {
    Forward,
    Reverse,
}

impl PrimerRole {
    pub fn opposite(self) -> Self {
        match self {
            PrimerRole::Forward => PrimerRole::Reverse,
            PrimerRole::Reverse => PrimerRole::Forward,
        }
    }
}

impl fmt::Display for PrimerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimerRole::Forward => write!(f, "forward"),
            PrimerRole::Reverse => write!(f, "reverse"),
        }
    }
}

/// Primer literals and the expected marker length for one run.
///
/// A `marker_length` of 0 means the marker is variable and the end of the
/// target is located by searching for the opposite primer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimerSpec {
    pub forward: String,
    pub reverse: String,
    pub marker_length: usize,
}

impl PrimerSpec {
    pub fn new(forward: impl Into<String>, reverse: impl Into<String>, marker_length: usize) -> Self {
        PrimerSpec {
            forward: forward.into().to_ascii_uppercase(),
            reverse: reverse.into().to_ascii_uppercase(),
            marker_length,
        }
    }

    pub fn literal(&self, role: PrimerRole) -> &str {
        match role {
            PrimerRole::Forward => &self.forward,
            PrimerRole::Reverse => &self.reverse,
        }
    }

    pub fn is_variable_length(&self) -> bool {
        self.marker_length == 0
    }
}

/// Maximum substitutions tolerated in each primer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorBudget {
    pub forward: usize,
    pub reverse: usize,
}

impl ErrorBudget {
    pub fn new(forward: usize, reverse: usize) -> Self {
        ErrorBudget { forward, reverse }
    }

    pub fn get(&self, role: PrimerRole) -> usize {
        match role {
            PrimerRole::Forward => self.forward,
            PrimerRole::Reverse => self.reverse,
        }
    }
}
