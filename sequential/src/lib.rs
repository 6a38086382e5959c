use common::{KeyOrder, KeyValue, Mapper, Reducer, Result, Values};
use itertools::Itertools;

/// Runs one map/reduce pass on the current thread: map every line, stably
/// sort the pairs by `order`, reduce each run of equal keys.
pub fn run_stage<M, R, I>(
    mapper: &M,
    reducer: &R,
    order: &KeyOrder<M::Key>,
    lines: I,
) -> Result<Vec<KeyValue<R::OutKey, R::OutValue>>>
where
    M: Mapper,
    M::Key: Clone,
    R: Reducer<Key = M::Key, Value = M::Value>,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut intermediate: Vec<KeyValue<M::Key, M::Value>> = vec![];
    for line in lines {
        mapper.map(line.as_ref(), &mut intermediate)?;
    }
    intermediate.sort_by(|a, b| order.compare(&a.key, &b.key));

    let mut output: Vec<KeyValue<R::OutKey, R::OutValue>> = vec![];
    for (key, kvs) in &intermediate.into_iter().group_by(|kv| kv.key.clone()) {
        let values = kvs.map(|kv| kv.value).collect_vec();
        reducer.reduce(&key, Values::new(&values), &mut output)?;
    }
    Ok(output)
}

/// Renders pairs the way stage outputs store them.
pub fn to_lines<K, V>(pairs: &[KeyValue<K, V>]) -> Vec<String>
where
    K: std::fmt::Display,
    V: std::fmt::Display,
{
    pairs
        .iter()
        .map(|kv| format!("{} {}", kv.key, kv.value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_lettercount::{
        count_order, sort_order, CountMapper, CountReducer, Letter, SortMapper, SortReducer,
    };

    #[test]
    fn letter_report() {
        let counts =
            run_stage(&CountMapper, &CountReducer, &count_order(), ["aAbb c"]).unwrap();
        assert_eq!(to_lines(&counts), ["A 2", "B 2", "C 1"]);

        let sorted = run_stage(
            &SortMapper,
            &SortReducer,
            &sort_order(),
            to_lines(&counts),
        )
        .unwrap();
        assert_eq!(
            sorted,
            vec![
                KeyValue::new(Letter('A'), 2),
                KeyValue::new(Letter('B'), 2),
                KeyValue::new(Letter('C'), 1)
            ]
        );
    }

    #[test]
    fn empty_input() {
        let lines: [&str; 0] = [];
        let counts = run_stage(&CountMapper, &CountReducer, &count_order(), lines).unwrap();
        assert!(counts.is_empty());
    }
}
