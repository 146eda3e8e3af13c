//! Parameter Sets

use crate::pbrt::*;
use std::collections::HashMap;
use std::fmt;

/// A hashmap of parameter values stored by name.
pub type ParamSetMap<T> = HashMap<String, Vec<T>>;

/// Stores named renderer parameters of different types in hashmaps.
#[derive(Clone, Default)]
pub struct ParamSet {
    pub bools: ParamSetMap<bool>,
    pub ints: ParamSetMap<Int>,
    pub floats: ParamSetMap<Float>,
    pub strings: ParamSetMap<String>,
}

/// Define a macro that can be used to generate a function for adding/replacing
/// a parameter holding a single value.
macro_rules! paramset_add {
    ($func: ident, $t: ty, $paramset: ident) => {
        pub fn $func(&mut self, name: &str, value: $t) -> &mut Self {
            self.$paramset.insert(String::from(name), vec![value]);
            self
        }
    };
}

/// Define a macro that can be used to generate a function for finding
/// a parameter stored as a single value.
macro_rules! paramset_find_one {
    ($func: ident, $t: ty, $paramset: ident) => {
        pub fn $func(&self, name: &str, default: $t) -> $t {
            match self.$paramset.get(name) {
                Some(values) if values.len() == 1 => values[0].clone(),
                Some(_) => {
                    warn!("Parameter '{}' has more than one value; using default.", name);
                    default
                }
                None => default,
            }
        }
    };
}

impl ParamSet {
    /// Returns a new `ParamSet`.
    pub fn new() -> Self {
        Self::default()
    }

    paramset_add!(add_bool, bool, bools);
    paramset_find_one!(find_one_bool, bool, bools);

    paramset_add!(add_int, Int, ints);
    paramset_find_one!(find_one_int, Int, ints);

    paramset_add!(add_float, Float, floats);
    paramset_find_one!(find_one_float, Float, floats);

    paramset_add!(add_string, String, strings);
    paramset_find_one!(find_one_string, String, strings);

    /// Returns a non-negative integer parameter, falling back to the
    /// default for negative values.
    ///
    /// * `name`    - Parameter name.
    /// * `default` - Value used when missing or invalid.
    pub fn find_one_count(&self, name: &str, default: usize) -> usize {
        match self.find_one_int(name, default as Int) {
            v if v < 0 => {
                warn!("Parameter '{name}' must not be negative ({v}); using {default}.");
                default
            }
            v => v as usize,
        }
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_map<T: fmt::Display>(
            f: &mut fmt::Formatter<'_>,
            ty: &str,
            map: &ParamSetMap<T>,
        ) -> fmt::Result {
            let mut names: Vec<&String> = map.keys().collect();
            names.sort();
            for name in names {
                write!(f, "\"{ty} {name}\" [")?;
                for v in map[name].iter() {
                    write!(f, " {v}")?;
                }
                writeln!(f, " ]")?;
            }
            Ok(())
        }

        write_map(f, "bool", &self.bools)?;
        write_map(f, "integer", &self.ints)?;
        write_map(f, "float", &self.floats)?;
        write_map(f, "string", &self.strings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_missing() {
        let ps = ParamSet::new();
        assert_eq!(ps.find_one_int("maxeyedepth", 16), 16);
        assert_eq!(ps.find_one_float("alpha", 0.7), 0.7);
        assert!(ps.find_one_bool("includeenvironment", true));
        assert_eq!(ps.find_one_string("lookupaccel", "hashgrid".into()), "hashgrid");
    }

    #[test]
    fn stored_values_override_defaults() {
        let mut ps = ParamSet::new();
        ps.add_int("haltpasses", 3)
            .add_float("alpha", 0.5)
            .add_string("photonsampler", "amcmc".into())
            .add_bool("includeenvironment", false);
        assert_eq!(ps.find_one_int("haltpasses", 0), 3);
        assert_eq!(ps.find_one_float("alpha", 0.7), 0.5);
        assert_eq!(ps.find_one_string("photonsampler", "halton".into()), "amcmc");
        assert!(!ps.find_one_bool("includeenvironment", true));
    }

    #[test]
    fn negative_counts_use_default() {
        let mut ps = ParamSet::new();
        ps.add_int("nthreads", -2);
        assert_eq!(ps.find_one_count("nthreads", 0), 0);
    }

    #[test]
    fn display_is_sorted() {
        let mut ps = ParamSet::new();
        ps.add_int("b", 2).add_int("a", 1);
        assert_eq!(ps.to_string(), "\"integer a\" [ 1 ]\n\"integer b\" [ 2 ]\n");
    }
}
