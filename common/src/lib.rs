use std::{fmt::Display, hash::Hash};

mod config;
mod error;
mod order;

pub use config::JobConfig;
pub use error::{Error, Result};
pub use order::KeyOrder;

/// One emitted record. Immutable once handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyValue<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KeyValue<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

/// A sink accepting key-value pairs, either the shuffle (map side) or a
/// stage output (reduce side).
pub trait Emit<K, V> {
    fn emit(&mut self, key: K, value: V) -> Result<()>;
}

impl<K, V> Emit<K, V> for Vec<KeyValue<K, V>> {
    fn emit(&mut self, key: K, value: V) -> Result<()> {
        self.push(KeyValue::new(key, value));
        Ok(())
    }
}

pub trait Mapper: Send + Sync + 'static {
    type Key: Hash + Eq + Send + Sync + 'static;
    type Value: Send + Sync + 'static;

    /// Called once per input line.
    fn map(&self, line: &str, out: &mut dyn Emit<Self::Key, Self::Value>) -> Result<()>;
}

pub trait Reducer: Send + Sync + 'static {
    type Key: Send + Sync + 'static;
    type Value: Send + Sync + 'static;
    type OutKey: Display;
    type OutValue: Display;

    /// Called exactly once per key, after every map task of the stage finished.
    fn reduce(
        &self,
        key: &Self::Key,
        values: Values<'_, Self::Value>,
        out: &mut dyn Emit<Self::OutKey, Self::OutValue>,
    ) -> Result<()>;
}

/// Single-pass view over every value emitted for one key.
#[derive(Debug)]
pub struct Values<'a, V> {
    inner: std::slice::Iter<'a, V>,
}

impl<'a, V> Values<'a, V> {
    pub fn new(values: &'a [V]) -> Self {
        Self {
            inner: values.iter(),
        }
    }
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Values<'_, V> {}
