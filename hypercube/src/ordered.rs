use std::hash::Hash;

use rustc_hash::FxHashSet;

/// A set that iterates in first-insertion order.
///
/// Report rows and columns follow the order in which values were first
/// discovered, so the axes of every table are kept in one of these.
#[derive(Debug, Clone)]
pub struct OrderedSet<T> {
    items: Vec<T>,
    seen: FxHashSet<T>,
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    /// Returns `true` if the value was not present before.
    pub fn insert(&mut self, value: T) -> bool {
        if self.seen.contains(&value) {
            return false;
        }
        self.seen.insert(value.clone());
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &T) -> bool {
        self.seen.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Eq + Hash + Clone> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        iter.into_iter().for_each(|value| {
            set.insert(value);
        });
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_insertion_order() {
        let mut set = OrderedSet::new();
        assert!(set.insert("0.5"));
        assert!(set.insert("2.0"));
        assert!(!set.insert("0.5"));
        assert!(set.insert("1.0"));

        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec!["0.5", "2.0", "1.0"]);
        assert_eq!(set.len(), 3);
        assert!(set.contains(&"2.0"));
        assert!(!set.contains(&"3.0"));
    }

    #[test]
    fn collects_without_duplicates() {
        let set: OrderedSet<u32> = [3, 1, 3, 2, 1].into_iter().collect();
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
    }
}
