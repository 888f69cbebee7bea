//! Variable sources consulted by the first segment of a path.

use std::sync::Arc;

use vp_reflect::Value;
use vp_utils::hash::HashMap;

/// Supplies named variables to an evaluation.
///
/// A path whose first segment names a variable starts from that variable's
/// value instead of the context object.
pub trait VariableResolver: Send + Sync {
    /// Returns the value bound to `name`, or `None` if unbound.
    ///
    /// A variable bound to `null` is returned as `Some(Value::Null)`.
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// A resolver with no variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVariables;

impl VariableResolver for NoVariables {
    #[inline]
    fn resolve(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// A resolver backed by a map.
#[derive(Debug, Default, Clone)]
pub struct MapVariables {
    values: HashMap<Arc<str>, Value>,
}

impl MapVariables {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl VariableResolver for MapVariables {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

impl<K: Into<Arc<str>>, V: Into<Value>> FromIterator<(K, V)> for MapVariables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (name, value) in iter {
            vars.insert(name, value);
        }
        vars
    }
}

/// Consults `first`, then `second`.
#[derive(Debug, Clone, Copy)]
pub struct Chain<A, B> {
    pub first: A,
    pub second: B,
}

impl<A: VariableResolver, B: VariableResolver> VariableResolver for Chain<A, B> {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.first.resolve(name).or_else(|| self.second.resolve(name))
    }
}

impl<T: VariableResolver + ?Sized> VariableResolver for &T {
    #[inline]
    fn resolve(&self, name: &str) -> Option<Value> {
        (**self).resolve(name)
    }
}

impl<T: VariableResolver + ?Sized> VariableResolver for Arc<T> {
    #[inline]
    fn resolve(&self, name: &str) -> Option<Value> {
        (**self).resolve(name)
    }
}

#[cfg(test)]
mod tests {
    use super::{Chain, MapVariables, NoVariables, VariableResolver};
    use vp_reflect::Value;

    #[test]
    fn null_binding_is_distinct_from_unbound() {
        let vars: MapVariables = [("x", Value::Null)].into_iter().collect();
        assert_eq!(vars.resolve("x"), Some(Value::Null));
        assert_eq!(vars.resolve("y"), None);
        assert_eq!(NoVariables.resolve("x"), None);
    }

    #[test]
    fn chain_prefers_first() {
        let a: MapVariables = [("x", 1)].into_iter().collect();
        let b: MapVariables = [("x", 2), ("y", 3)].into_iter().collect();
        let chain = Chain { first: &a, second: &b };
        assert_eq!(chain.resolve("x"), Some(Value::Int(1)));
        assert_eq!(chain.resolve("y"), Some(Value::Int(3)));
        assert_eq!(chain.resolve("z"), None);
    }
}
