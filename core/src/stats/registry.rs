//! Statistics Registry

/// A named, read-only numeric attribute computed from a snapshot of `T`.
pub struct StatsAttribute<T> {
    /// Attribute name used for queries.
    pub name: &'static str,

    /// Human readable description.
    pub description: &'static str,

    /// Computes the value.
    getter: fn(&T) -> f64,
}

/// Registers named statistics attributes for a renderer.
pub struct StatsRegistry<T> {
    /// Registered attributes, in registration order.
    attributes: Vec<StatsAttribute<T>>,
}

impl<T> Default for StatsRegistry<T> {
    fn default() -> Self {
        Self { attributes: vec![] }
    }
}

impl<T> StatsRegistry<T> {
    /// Create a new instance of `StatsRegistry`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute. Names must be unique.
    ///
    /// * `name`        - Attribute name.
    /// * `description` - Human readable description.
    /// * `getter`      - Computes the value from a snapshot.
    pub fn add_double_attribute(
        mut self,
        name: &'static str,
        description: &'static str,
        getter: fn(&T) -> f64,
    ) -> Self {
        assert!(
            self.find(name).is_none(),
            "statistics attribute '{name}' registered twice"
        );
        self.attributes.push(StatsAttribute {
            name,
            description,
            getter,
        });
        self
    }

    /// Returns the attribute with the given name.
    ///
    /// * `name` - Attribute name.
    pub fn find(&self, name: &str) -> Option<&StatsAttribute<T>> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns the value of an attribute or `None` if it is not registered.
    ///
    /// * `snapshot` - The values to compute from.
    /// * `name`     - Attribute name.
    pub fn get(&self, snapshot: &T, name: &str) -> Option<f64> {
        self.find(name).map(|a| (a.getter)(snapshot))
    }

    /// Returns the registered attribute names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes.iter().map(|a| a.name)
    }

    /// Format every attribute, one per line.
    ///
    /// * `snapshot` - The values to compute from.
    pub fn format(&self, snapshot: &T) -> Vec<String> {
        self.attributes
            .iter()
            .map(|a| format!("{:<42} {:>16.2}", a.description, (a.getter)(snapshot)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counters {
        passes: u32,
        photons: u64,
    }

    fn registry() -> StatsRegistry<Counters> {
        StatsRegistry::<Counters>::new()
            .add_double_attribute("passCount", "Passes", |c| c.passes as f64)
            .add_double_attribute("photonCount", "Photons", |c| c.photons as f64)
    }

    #[test]
    fn lookup_by_name() {
        let r = registry();
        let c = Counters {
            passes: 3,
            photons: 1200,
        };
        assert_eq!(r.get(&c, "passCount"), Some(3.0));
        assert_eq!(r.get(&c, "photonCount"), Some(1200.0));
        assert_eq!(r.get(&c, "nope"), None);
        assert_eq!(r.names().collect::<Vec<_>>(), vec!["passCount", "photonCount"]);
        assert_eq!(r.format(&c).len(), 2);
    }

    #[test]
    #[should_panic]
    fn duplicate_names_rejected() {
        let _ = registry().add_double_attribute("passCount", "again", |_| 0.0);
    }
}
