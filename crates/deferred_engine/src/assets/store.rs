//! Name-keyed storage shared by the asset stores

use std::collections::HashMap;

use super::AssetError;

/// Map from unique name to asset; a name can only be loaded once
#[derive(Debug)]
pub(crate) struct NamedStore<T> {
    kind: &'static str,
    items: HashMap<String, T>,
}

impl<T> NamedStore<T> {
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: HashMap::new(),
        }
    }

    /// Fail early, before any GPU work, if `name` is taken
    pub(crate) fn ensure_free(&self, name: &str) -> Result<(), AssetError> {
        if self.items.contains_key(name) {
            return Err(AssetError::AlreadyLoaded {
                kind: self.kind,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, name: &str, item: T) -> Result<&T, AssetError> {
        self.ensure_free(name)?;
        log::debug!("Loaded {} '{}'", self.kind, name);
        Ok(self.items.entry(name.to_string()).or_insert(item))
    }

    pub(crate) fn get(&self, name: &str) -> Option<&T> {
        self.items.get(name)
    }

    pub(crate) fn require(&self, name: &str) -> Result<&T, AssetError> {
        self.get(name).ok_or_else(|| AssetError::NotFound {
            kind: self.kind,
            name: name.to_string(),
        })
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (String, T)> + '_ {
        self.items.drain()
    }

    /// Panicking lookup backing the stores' `Index` impls
    pub(crate) fn index(&self, name: &str) -> &T {
        match self.items.get(name) {
            Some(item) => item,
            None => panic!("{} '{}' is not loaded", self.kind, name),
        }
    }

    /// Warn if GPU-backed items are dropped without `clear`
    pub(crate) fn warn_if_leaking(&self) {
        if !self.items.is_empty() {
            log::warn!(
                "{} store dropped with {} loaded item(s); call clear() with the backend to release them",
                self.kind,
                self.items.len()
            );
        }
    }
}
