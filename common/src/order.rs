use std::{cmp::Ordering, fmt, sync::Arc};

/// Pluggable total order over keys, used by the shuffle to sort groups.
pub struct KeyOrder<K> {
    cmp: Arc<dyn Fn(&K, &K) -> Ordering + Send + Sync>,
}

impl<K> KeyOrder<K> {
    pub fn new(cmp: impl Fn(&K, &K) -> Ordering + Send + Sync + 'static) -> Self {
        Self { cmp: Arc::new(cmp) }
    }

    pub fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.cmp)(a, b)
    }

    pub fn reversed(self) -> Self
    where
        K: 'static,
    {
        let inner = self.cmp;
        Self::new(move |a, b| inner(a, b).reverse())
    }
}

impl<K: Ord + 'static> KeyOrder<K> {
    pub fn natural() -> Self {
        Self::new(K::cmp)
    }

    pub fn descending() -> Self {
        Self::natural().reversed()
    }
}

impl<K: Ord + 'static> Default for KeyOrder<K> {
    fn default() -> Self {
        Self::natural()
    }
}

impl<K> Clone for KeyOrder<K> {
    fn clone(&self) -> Self {
        Self {
            cmp: Arc::clone(&self.cmp),
        }
    }
}

impl<K> fmt::Debug for KeyOrder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyOrder")
    }
}
