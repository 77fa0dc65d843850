//! Insertion-ordered collections of named domain objects.
//!
//! A [`NamedContainer`] creates its elements lazily through a factory the
//! first time a name is referenced, and remembers actions registered with
//! [`NamedContainer::all`] so that they reach both the elements which already
//! exist and every element created later.

use std::collections::HashMap;

use crate::error::ContainerError;

type Factory<T> = Box<dyn Fn(&str) -> T + Send + Sync>;
type ElementAction<T> = Box<dyn Fn(&mut T) + Send + Sync>;

pub struct NamedContainer<T> {
    kind: &'static str,
    factory: Factory<T>,
    actions: Vec<ElementAction<T>>,
    names: Vec<String>,
    items: Vec<T>,
    index: HashMap<String, usize>,
    closed: bool,
}

impl<T> NamedContainer<T> {
    /// Creates an empty container. `kind` is used in error messages, e.g.
    /// `"Source set"`.
    pub fn new<F>(kind: &'static str, factory: F) -> Self
    where
        F: Fn(&str) -> T + Send + Sync + 'static,
    {
        Self {
            kind,
            factory: Box::new(factory),
            actions: Vec::new(),
            names: Vec::new(),
            items: Vec::new(),
            index: HashMap::new(),
            closed: false,
        }
    }

    /// Creates a new element, failing if the name is already taken.
    pub fn create(&mut self, name: &str) -> Result<&mut T, ContainerError> {
        if self.index.contains_key(name) {
            return Err(ContainerError::Duplicate {
                kind: self.kind,
                name: name.to_string(),
            });
        }

        self.insert(name)
    }

    /// Returns the element with this name, creating it on first reference.
    pub fn maybe_create(&mut self, name: &str) -> Result<&mut T, ContainerError> {
        match self.index.get(name) {
            Some(&i) => Ok(&mut self.items[i]),
            None => self.insert(name),
        }
    }

    /// Looks the element up (creating it on first reference) and runs the
    /// configuration closure on it. Once the container is closed every
    /// element is frozen, existing ones included.
    pub fn configure<F>(&mut self, name: &str, f: F) -> Result<&mut T, ContainerError>
    where
        F: FnOnce(&mut T),
    {
        if self.closed {
            return Err(self.closed_error(name));
        }

        let item = self.maybe_create(name)?;
        f(item);
        Ok(item)
    }

    /// Runs `action` on every current element and remembers it for elements
    /// created afterwards.
    pub fn all<F>(&mut self, action: F)
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        for item in &mut self.items {
            action(item);
        }

        self.actions.push(Box::new(action));
    }

    pub fn find(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut T> {
        self.index.get(name).map(|&i| &mut self.items[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over `(name, element)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.names.iter().map(String::as_str).zip(self.items.iter())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ends the declaration phase. New names are rejected and
    /// [`NamedContainer::configure`] fails for every name.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn insert(&mut self, name: &str) -> Result<&mut T, ContainerError> {
        if self.closed {
            return Err(self.closed_error(name));
        }

        let mut item = (self.factory)(name);
        for action in &self.actions {
            action(&mut item);
        }

        let i = self.items.len();
        self.items.push(item);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);

        Ok(&mut self.items[i])
    }
}

impl<T> NamedContainer<T> {
    fn closed_error(&self, name: &str) -> ContainerError {
        ContainerError::Closed {
            kind: self.kind,
            name: name.to_string(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for NamedContainer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item {
        name: String,
        tags: Vec<&'static str>,
    }

    fn container() -> NamedContainer<Item> {
        NamedContainer::new("Item", |name| Item {
            name: name.to_string(),
            tags: vec![],
        })
    }

    #[test]
    fn test_create_on_first_reference() {
        let mut items = container();
        items.maybe_create("a").unwrap().tags.push("x");
        items.maybe_create("a").unwrap().tags.push("y");

        assert_eq!(items.len(), 1);
        assert_eq!(items.find("a").unwrap().tags, vec!["x", "y"]);
    }

    #[test]
    fn test_create_rejects_duplicates() {
        let mut items = container();
        items.create("a").unwrap();

        let err = items.create("a").unwrap_err();
        assert_eq!(
            err,
            ContainerError::Duplicate {
                kind: "Item",
                name: "a".into()
            }
        );
    }

    #[test]
    fn test_insertion_order() {
        let mut items = container();
        for name in ["zeta", "alpha", "mid"] {
            items.maybe_create(name).unwrap();
        }
        items.configure("alpha", |item| item.tags.push("again")).unwrap();

        let names: Vec<_> = items.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert!(items.iter().all(|(name, item)| name == item.name));
    }

    #[test]
    fn test_all_reaches_existing_and_future() {
        let mut items = container();
        items.create("before").unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        items.all(move |item| {
            counter.fetch_add(1, Ordering::SeqCst);
            item.tags.push("seen");
        });

        items.create("after").unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(items.find("before").unwrap().tags, vec!["seen"]);
        assert_eq!(items.find("after").unwrap().tags, vec!["seen"]);
    }

    #[test]
    fn test_closed_container() {
        let mut items = container();
        items.create("a").unwrap();
        items.close();

        assert!(items.maybe_create("a").is_ok());
        assert!(matches!(
            items.maybe_create("b"),
            Err(ContainerError::Closed { .. })
        ));
        assert!(matches!(
            items.configure("a", |item| item.tags.push("late")),
            Err(ContainerError::Closed { .. })
        ));
        assert!(items.find("a").unwrap().tags.is_empty());
    }
}
