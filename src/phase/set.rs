//! Ordered phase sets.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::ConfigError;

/// Name of one visual state in a widget's cycle.
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PhaseId(pub String);

impl PhaseId {
    /// Creates a new `PhaseId` from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed, ordered sequence of distinct phases.
///
/// Order defines the cycle sequence, not a priority. A set always holds at
/// least two phases, so a driver over it has something to cycle through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSet {
    phases: Vec<PhaseId>,
}

impl PhaseSet {
    /// Builds a phase set, rejecting fewer than two phases, empty names and
    /// duplicates.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn new<I, S>(phases: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phases: Vec<PhaseId> = phases.into_iter().map(|p| PhaseId(p.into())).collect();

        if phases.len() < 2 {
            return Err(ConfigError::TooFewPhases {
                count: phases.len(),
            });
        }

        let mut seen = HashSet::with_capacity(phases.len());
        for (index, phase) in phases.iter().enumerate() {
            if phase.0.trim().is_empty() {
                return Err(ConfigError::EmptyPhaseName { index });
            }
            if !seen.insert(phase.as_str()) {
                return Err(ConfigError::DuplicatePhase {
                    name: phase.0.clone(),
                });
            }
        }

        Ok(Self { phases })
    }

    /// Number of phases in the cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Phase at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PhaseId> {
        self.phases.get(index)
    }

    /// Position of the phase named `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.as_str() == name)
    }

    /// The phase shown right after activation.
    #[must_use]
    pub fn first(&self) -> &PhaseId {
        &self.phases[0]
    }

    /// Index that follows `index` in the cycle, wrapping after the last one.
    #[must_use]
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.phases.len()
    }

    /// Iterates phases in cycle order.
    pub fn iter(&self) -> impl Iterator<Item = &PhaseId> {
        self.phases.iter()
    }
}

impl<'a> IntoIterator for &'a PhaseSet {
    type Item = &'a PhaseId;
    type IntoIter = std::slice::Iter<'a, PhaseId>;

    fn into_iter(self) -> Self::IntoIter {
        self.phases.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_set() {
        let set = PhaseSet::new(["search", "results", "profile"]).unwrap();
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
        assert_eq!(set.first().as_str(), "search");
        assert_eq!(set.get(2).unwrap().as_str(), "profile");
        assert_eq!(set.position("results"), Some(1));
        assert_eq!(set.position("missing"), None);
    }

    #[test]
    fn test_single_phase_rejected() {
        let err = PhaseSet::new(["only"]).unwrap_err();
        assert!(matches!(err, ConfigError::TooFewPhases { count: 1 }));
    }

    #[test]
    fn test_empty_rejected() {
        let err = PhaseSet::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ConfigError::TooFewPhases { count: 0 }));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = PhaseSet::new(["a", "b", "a"]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePhase { ref name } if name == "a"));
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = PhaseSet::new(["a", "  "]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPhaseName { index: 1 }));
    }

    #[test]
    fn test_next_index_wraps() {
        let set = PhaseSet::new(["a", "b", "c"]).unwrap();
        assert_eq!(set.next_index(0), 1);
        assert_eq!(set.next_index(1), 2);
        assert_eq!(set.next_index(2), 0);
    }

    #[test]
    fn test_iteration_preserves_order() {
        let set = PhaseSet::new(["broken", "scanning", "fixed"]).unwrap();
        let names: Vec<&str> = set.iter().map(PhaseId::as_str).collect();
        assert_eq!(names, ["broken", "scanning", "fixed"]);
    }
}
