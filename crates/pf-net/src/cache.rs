//! Opaque solver-owned cache attached to the network.
//!
//! The solver stashes its internal tables here between consecutive solves
//! (`reuse_internal_data`); the network itself never looks inside. The slot
//! is type-erased so that the table layout stays private to the solver
//! crates.

use std::any::Any;

#[derive(Default)]
pub struct SolverCache {
    slot: Option<Box<dyn Any + Send>>,
}

impl std::fmt::Debug for SolverCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverCache")
            .field("occupied", &self.slot.is_some())
            .finish()
    }
}

impl SolverCache {
    /// Store a value, replacing any previous occupant.
    pub fn put<T: Any + Send>(&mut self, value: T) {
        self.slot = Some(Box::new(value));
    }

    /// Remove and return the stored value if it has type `T`.
    pub fn take<T: Any + Send>(&mut self) -> Option<T> {
        match self.slot.take() {
            Some(boxed) => match boxed.downcast::<T>() {
                Ok(v) => Some(*v),
                Err(other) => {
                    self.slot = Some(other);
                    None
                }
            },
            None => None,
        }
    }

    /// Borrow the stored value if it has type `T`.
    pub fn get<T: Any + Send>(&self) -> Option<&T> {
        self.slot.as_ref().and_then(|b| b.downcast_ref::<T>())
    }

    /// Drop whatever is stored.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_take_round_trip() {
        let mut cache = SolverCache::default();
        assert!(cache.is_empty());
        cache.put(42_u64);
        assert_eq!(cache.get::<u64>(), Some(&42));
        assert_eq!(cache.take::<u64>(), Some(42));
        assert!(cache.is_empty());
    }

    #[test]
    fn take_with_wrong_type_keeps_value() {
        let mut cache = SolverCache::default();
        cache.put(String::from("pit"));
        assert_eq!(cache.take::<u64>(), None);
        assert_eq!(cache.take::<String>(), Some(String::from("pit")));
    }
}
