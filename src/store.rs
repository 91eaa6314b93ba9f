//! Observable component data.

use core::{cell::RefCell, fmt};

use tidewater_expr::{EvalError, Map, Scope, Value};

type Observer = Box<dyn Fn(&str)>;

/// A data mapping that notifies a single observer after every write.
///
/// Reads are not observed. Writes are not batched: each [`set`](Self::set) runs the
/// observer once, after the mapping has been updated and released, so the observer is
/// free to read the store again.
pub struct ObservableData {
    values: RefCell<Map>,
    observer: Observer,
}

impl ObservableData {
    /// Wraps `values`, calling `observer` with the written key after every write.
    pub fn new(values: Map, observer: impl Fn(&str) + 'static) -> Self {
        Self {
            values: RefCell::new(values),
            observer: Box::new(observer),
        }
    }

    /// Reads a property. Missing properties read as [`Value::Undefined`].
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.values.borrow().get(key).cloned().unwrap_or_default()
    }

    /// Writes a property, then notifies the observer.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.into());
        (self.observer)(key);
    }

    /// Returns `true` if the property exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.borrow().contains_key(key)
    }

    /// Returns the property names in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.values.borrow().keys().cloned().collect()
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    /// Returns `true` if there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    /// Returns a copy of the current mapping.
    #[must_use]
    pub fn snapshot(&self) -> Map {
        self.values.borrow().clone()
    }
}

impl Scope for ObservableData {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).cloned()
    }

    fn assign(&self, name: &str, value: Value) -> Result<(), EvalError> {
        self.set(name, value);
        Ok(())
    }

    fn contains(&self, name: &str) -> bool {
        Self::contains(self, name)
    }
}

impl fmt::Debug for ObservableData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableData")
            .field("values", &self.values.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use tidewater_expr::{Bindings, execute};

    fn recording(values: Map) -> (ObservableData, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let store = ObservableData::new(values, move |key| sink.borrow_mut().push(key.to_string()));
        (store, log)
    }

    #[test]
    fn test_reads_are_not_observed() {
        let (store, log) = recording(Map::from_iter([("a".to_string(), Value::from(1))]));
        assert_eq!(store.get("a"), Value::from(1));
        assert_eq!(store.get("missing"), Value::Undefined);
        assert!(store.contains("a"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_every_write_notifies_once() {
        let (store, log) = recording(Map::new());
        store.set("a", 1);
        store.set("a", 2);
        store.set("b", "x");
        assert_eq!(*log.borrow(), ["a", "a", "b"]);
        assert_eq!(store.keys(), ["a", "b"]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.snapshot()["a"], Value::from(2));
    }

    #[test]
    fn test_observer_sees_written_value() {
        let seen = Rc::new(RefCell::new(None));
        let store = Rc::new_cyclic(|weak: &std::rc::Weak<ObservableData>| {
            let weak = weak.clone();
            let seen = Rc::clone(&seen);
            ObservableData::new(Map::new(), move |key| {
                if let Some(store) = weak.upgrade() {
                    *seen.borrow_mut() = Some(store.get(key));
                }
            })
        });
        store.set("count", 5);
        assert_eq!(*seen.borrow(), Some(Value::from(5)));
    }

    #[test]
    fn test_expression_writes_go_through_observer() {
        let (store, log) = recording(Map::from_iter([("count".to_string(), Value::from(0))]));
        execute("count++; ", &store, &Bindings::new()).unwrap();
        execute("count += 2", &store, &Bindings::new()).unwrap();
        assert_eq!(store.get("count"), Value::from(3));
        assert_eq!(log.borrow().len(), 2);
    }
}
