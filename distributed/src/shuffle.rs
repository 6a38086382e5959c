use std::{
    fmt,
    hash::Hash,
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use common::{Emit, Error, KeyOrder, KeyValue, Result, Values};
use dashmap::DashMap;

/// All values emitted for one key, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<K, V> {
    pub key: K,
    pub values: Vec<V>,
}

impl<K, V> Group<K, V> {
    pub fn values(&self) -> Values<'_, V> {
        Values::new(&self.values)
    }
}

#[derive(Debug)]
struct Reservations {
    used: AtomicUsize,
    capacity: Option<usize>,
}

impl Reservations {
    fn reserve(&self) -> Result<()> {
        let used = self.used.fetch_add(1, Ordering::AcqRel) + 1;
        match self.capacity {
            Some(capacity) if used > capacity => {
                self.used.fetch_sub(1, Ordering::AcqRel);
                Err(Error::io(
                    "shuffle emit",
                    io::Error::new(
                        io::ErrorKind::OutOfMemory,
                        format!("shuffle buffer full ({capacity} records)"),
                    ),
                ))
            }
            _ => Ok(()),
        }
    }

    fn release(&self, n: usize) {
        self.used.fetch_sub(n, Ordering::AcqRel);
    }
}

/// Concurrent key -> values buffer shared by every map task of a stage.
///
/// Map tasks never write to it directly: each attempt emits into its own
/// [`TaskEmitter`], which is merged with [`ShuffleBuffer::commit`] once the
/// attempt succeeded.
pub struct ShuffleBuffer<K, V> {
    groups: DashMap<K, Vec<(usize, V)>>,
    reservations: Arc<Reservations>,
}

impl<K: Hash + Eq + fmt::Debug, V: fmt::Debug> fmt::Debug for ShuffleBuffer<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShuffleBuffer")
            .field("groups", &self.groups)
            .field("reservations", &self.reservations)
            .finish()
    }
}

impl<K: Hash + Eq, V> ShuffleBuffer<K, V> {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            groups: DashMap::new(),
            reservations: Arc::new(Reservations {
                used: AtomicUsize::new(0),
                capacity,
            }),
        }
    }

    pub fn emitter(&self, task: usize) -> TaskEmitter<K, V> {
        TaskEmitter {
            task,
            pairs: vec![],
            reservations: Arc::clone(&self.reservations),
        }
    }

    /// Publishes a finished attempt's pairs. Returns how many were added.
    pub fn commit(&self, mut emitter: TaskEmitter<K, V>) -> usize {
        let task = emitter.task;
        let pairs = std::mem::take(&mut emitter.pairs);
        let n = pairs.len();
        for KeyValue { key, value } in pairs {
            self.groups.entry(key).or_default().push((task, value));
        }
        n
    }

    /// Slots held by committed pairs and by attempts still in flight. Once
    /// the map barrier passed this is the number of buffered pairs.
    pub fn len(&self) -> usize {
        self.reservations.used.load(Ordering::Acquire)
    }

    /// Consumes the buffer after the map barrier. Groups come out sorted by
    /// `order`; values keep task order, then emission order.
    pub fn into_groups(self, order: &KeyOrder<K>) -> Vec<Group<K, V>> {
        let mut groups: Vec<Group<K, V>> = self
            .groups
            .into_iter()
            .map(|(key, mut values)| {
                values.sort_by_key(|(task, _)| *task);
                Group {
                    key,
                    values: values.into_iter().map(|(_, v)| v).collect(),
                }
            })
            .collect();
        groups.sort_by(|a, b| order.compare(&a.key, &b.key));
        groups
    }
}

/// Private output of one map attempt.
#[derive(Debug)]
pub struct TaskEmitter<K, V> {
    task: usize,
    pairs: Vec<KeyValue<K, V>>,
    reservations: Arc<Reservations>,
}

impl<K, V> Emit<K, V> for TaskEmitter<K, V> {
    fn emit(&mut self, key: K, value: V) -> Result<()> {
        self.reservations.reserve()?;
        self.pairs.push(KeyValue::new(key, value));
        Ok(())
    }
}

impl<K, V> Drop for TaskEmitter<K, V> {
    fn drop(&mut self) {
        // pairs is empty once committed, so only discarded attempts give back slots
        self.reservations.release(self.pairs.len());
    }
}

/// Cuts ordered groups into `n` contiguous partitions of near-equal size.
/// Concatenating the partitions in index order keeps the global key order.
pub fn range_partition<K, V>(groups: Vec<Group<K, V>>, n: usize) -> Vec<Vec<Group<K, V>>> {
    let n = n.max(1);
    let per = groups.len().div_ceil(n);
    let mut partitions: Vec<Vec<Group<K, V>>> = (0..n).map(|_| vec![]).collect();
    for (i, group) in groups.into_iter().enumerate() {
        partitions[i / per.max(1)].push(group);
    }
    partitions
}
