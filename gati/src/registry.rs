//! Named trajectories, grouped per routine.
//!
//! The registry stores factories rather than trajectory instances: a
//! trajectory's completion latch is one-way, so every lookup yields a fresh
//! instance. Names are unique across all groups. The registry belongs to
//! one run; call [`TrajectoryRegistry::reset`] between runs.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{ConfigError, LookupError};
use crate::trajectory::Trajectory;

/// Maximum number of suggestions attached to a failed lookup.
pub const MAX_SUGGESTIONS: usize = 5;

type Factory = Box<dyn Fn() -> Box<dyn Trajectory>>;

struct Entry {
    name: String,
    factory: Factory,
}

/// Registry of named trajectory factories.
#[derive(Default)]
pub struct TrajectoryRegistry {
    // Group name -> entries in insertion order
    groups: BTreeMap<String, Vec<Entry>>,
}

impl TrajectoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `group` / `name`.
    pub fn add_factory(
        &mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn Trajectory> + 'static,
    ) -> Result<(), ConfigError> {
        let (group, name) = (group.into(), name.into());
        if self.contains(&name) {
            return Err(ConfigError::DuplicateName(name));
        }
        debug!("registered trajectory '{}' in group '{}'", name, group);
        self.groups.entry(group).or_default().push(Entry {
            name,
            factory: Box::new(factory),
        });
        Ok(())
    }

    /// Register a trajectory; each lookup yields a clone of it.
    pub fn add_trajectory<T>(
        &mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        trajectory: T,
    ) -> Result<(), ConfigError>
    where
        T: Trajectory + Clone + 'static,
    {
        self.add_factory(group, name, move || Box::new(trajectory.clone()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries().any(|(_, entry)| entry.name == name)
    }

    /// A fresh instance of the named trajectory.
    pub fn get(&self, name: &str) -> Result<Box<dyn Trajectory>, LookupError> {
        self.entries()
            .find(|(_, entry)| entry.name == name)
            .map(|(_, entry)| (entry.factory)())
            .ok_or_else(|| LookupError::new(name, self.suggest(name)))
    }

    /// Fresh instances of every trajectory in `group`, in insertion order.
    pub fn group(&self, group: &str) -> Result<Vec<Box<dyn Trajectory>>, LookupError> {
        match self.groups.get(group) {
            Some(entries) => Ok(entries.iter().map(|e| (e.factory)()).collect()),
            None => {
                let candidates: Vec<&str> = self.groups.keys().map(String::as_str).collect();
                Err(LookupError::new(group, rank(group, candidates)))
            }
        }
    }

    /// Remove a named trajectory.
    pub fn remove(&mut self, name: &str) -> bool {
        let mut removed = false;
        for entries in self.groups.values_mut() {
            let before = entries.len();
            entries.retain(|e| e.name != name);
            removed |= entries.len() != before;
        }
        self.groups.retain(|_, entries| !entries.is_empty());
        removed
    }

    /// Every registered name, grouped, in group then insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries().map(|(_, e)| e.name.as_str()).collect()
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drop every registration.
    pub fn reset(&mut self) {
        if !self.is_empty() {
            info!("Resetting trajectory registry ({} entries)", self.len());
        }
        self.groups.clear();
    }

    /// Registered names closest to `name`.
    pub fn suggest(&self, name: &str) -> Vec<String> {
        rank(name, self.names())
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.groups
            .iter()
            .flat_map(|(group, entries)| entries.iter().map(move |e| (group.as_str(), e)))
    }
}

/// Rank candidates by edit distance to `query`, keeping close ones.
fn rank(query: &str, candidates: Vec<&str>) -> Vec<String> {
    let query_lower = query.to_lowercase();
    let threshold = (query.chars().count() / 2).max(3);

    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let lower = candidate.to_lowercase();
            let distance = levenshtein(&query_lower, &lower);
            let related = lower.contains(&query_lower) || query_lower.contains(&lower);
            (distance <= threshold || related).then_some((distance, candidate))
        })
        .collect();
    scored.sort_unstable();
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Edit distance with unit insert, delete and substitute costs.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PointXYZ;
    use crate::trajectory::PointTrajectory;

    fn point(x: f64) -> PointTrajectory {
        PointTrajectory::new(PointXYZ::new(x, 0.0, 0.0), 0.5, 1.0, 5.0).unwrap()
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_duplicate_names_rejected_across_groups() {
        let mut registry = TrajectoryRegistry::new();
        registry.add_trajectory("left", "score", point(1.0)).unwrap();
        let err = registry
            .add_trajectory("right", "score", point(2.0))
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateName("score".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_yields_fresh_instances() {
        let mut registry = TrajectoryRegistry::new();
        registry.add_trajectory("auto", "park", point(0.0)).unwrap();

        let mut first = registry.get("park").unwrap();
        assert!(first.is_done(PointXYZ::ZERO));
        let mut second = registry.get("park").unwrap();
        assert!(!second.is_done(PointXYZ::new(100.0, 0.0, 0.0)));
    }

    #[test]
    fn test_unknown_name_suggests() {
        let mut registry = TrajectoryRegistry::new();
        for name in ["score_high", "score_low", "park", "intake_ring"] {
            registry.add_trajectory("auto", name, point(0.0)).unwrap();
        }
        let err = registry.get("score_hgih").err().unwrap();
        assert_eq!(err.name, "score_hgih");
        assert_eq!(err.suggestions[0], "score_high");
        assert!(!err.suggestions.contains(&"intake_ring".to_string()));
    }

    #[test]
    fn test_group_order_and_reset() {
        let mut registry = TrajectoryRegistry::new();
        registry.add_trajectory("auto", "b", point(2.0)).unwrap();
        registry.add_trajectory("auto", "a", point(1.0)).unwrap();
        assert_eq!(registry.group("auto").unwrap().len(), 2);
        assert_eq!(registry.names(), vec!["b", "a"]);
        assert!(registry.group("autto").is_err());

        assert!(registry.remove("b"));
        assert_eq!(registry.len(), 1);
        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.get("a").is_err());
    }
}
