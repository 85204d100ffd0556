//! Alias resolution.

use crate::error::{DiError, DiResult};
use crate::internal::{Map, Set};
use crate::key::Key;

/// `alias -> abstract` map plus the reverse `abstract -> [alias]` lists.
#[derive(Default, Debug)]
pub(crate) struct AliasRegistry {
    aliases: Map<Key, Key>,
    abstract_aliases: Map<Key, Vec<Key>>,
}

impl AliasRegistry {
    pub(crate) fn alias(&mut self, abstract_key: Key, alias: Key) {
        self.aliases.insert(alias.clone(), abstract_key.clone());
        self.abstract_aliases.entry(abstract_key).or_default().push(alias);
    }

    /// Follows the alias chain to its canonical identifier.
    pub(crate) fn resolve(&self, key: &Key) -> DiResult<Key> {
        let mut current = key;
        let mut seen: Option<Set<&Key>> = None;
        while let Some(next) = self.aliases.get(current) {
            if next == current {
                return Err(DiError::alias_cycle(current));
            }
            let seen = seen.get_or_insert_with(Set::default);
            if !seen.insert(current) {
                return Err(DiError::alias_cycle(current));
            }
            current = next;
        }
        Ok(current.clone())
    }

    pub(crate) fn is_alias(&self, key: &Key) -> bool {
        self.aliases.contains_key(key)
    }

    /// Aliases registered for `key`, in registration order.
    pub(crate) fn aliases_of(&self, key: &Key) -> &[Key] {
        self.abstract_aliases
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn remove(&mut self, key: &Key) {
        self.aliases.remove(key);
    }

    /// Drops `alias` from every abstract's alias list.
    pub(crate) fn remove_abstract_alias(&mut self, alias: &Key) {
        if !self.aliases.contains_key(alias) {
            return;
        }
        for list in self.abstract_aliases.values_mut() {
            list.retain(|k| k != alias);
        }
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&Key, &Key)> {
        self.aliases.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.aliases.clear();
        self.abstract_aliases.clear();
    }
}
