use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    config::CookieOptions,
    error::{Error, Result},
};

/// One named session and its values.
///
/// A session lives for a single request: [`MultiCookieStore::load`] builds it from the
/// request's cookies, the application reads and mutates it, and [`MultiCookieStore::save`]
/// turns it back into cookies.
///
/// [`MultiCookieStore::load`]: crate::MultiCookieStore::load
/// [`MultiCookieStore::save`]: crate::MultiCookieStore::save
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    name: String,
    values: BTreeMap<String, Value>,
    options: CookieOptions,
    is_new: bool,
    modified: bool,
    removed: BTreeSet<String>,
}

impl Session {
    pub fn new(name: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
            options,
            is_new: true,
            modified: false,
            removed: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` when none of this session's cookies were decoded from the request.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut CookieOptions {
        self.modified = true;
        &mut self.options
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.values
            .get(key)
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(Error::Deserialize)
    }

    pub fn insert_value(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        self.removed.remove(&key);
        self.modified = true;
        self.values.insert(key, value)
    }

    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(Error::Serialize)?;
        self.insert_value(key, value);
        Ok(())
    }

    pub fn remove_value(&mut self, key: &str) -> Option<Value> {
        let value = self.values.remove(key)?;
        self.modified = true;
        self.removed.insert(key.to_owned());
        Some(value)
    }

    pub fn remove<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        self.remove_value(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(Error::Deserialize)
    }

    /// Remove every value. Their cookies are expired by the layer on save.
    pub fn clear(&mut self) {
        let keys = std::mem::take(&mut self.values).into_keys();
        self.removed.extend(keys);
        self.modified = true;
    }

    /// Keys removed since the session was loaded.
    pub fn removed_keys(&self) -> impl Iterator<Item = &str> {
        self.removed.iter().map(String::as_str)
    }

    /// Override the max-age for this session's cookies only.
    pub fn set_max_age(&mut self, seconds: i64) {
        self.options_mut().max_age = seconds;
    }

    /// Expire all of this session's cookies when it is next saved.
    pub fn delete(&mut self) {
        self.set_max_age(-1);
    }

    pub(crate) fn load_value(&mut self, key: String, value: Value) {
        self.is_new = false;
        self.values.insert(key, value);
    }
}
