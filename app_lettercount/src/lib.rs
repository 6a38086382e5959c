use std::fmt;

use common::{Emit, Error, KeyOrder, Mapper, Reducer, Result, Values};

/// A case-folded input character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Letter(pub char);

impl Letter {
    /// Uppercases `c` when the mapping is a single codepoint, keeps it otherwise.
    pub fn fold(c: char) -> Self {
        let mut upper = c.to_uppercase();
        match (upper.next(), upper.next()) {
            (Some(u), None) => Letter(u),
            _ => Letter(c),
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses one `<letter> <count>` line of COUNT output.
pub fn parse_entry(line: &str) -> Result<(Letter, u64)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[letter, count] = fields.as_slice() else {
        return Err(Error::malformed(
            line,
            format!("expected 2 fields, found {}", fields.len()),
        ));
    };

    let mut chars = letter.chars();
    let letter = match (chars.next(), chars.next()) {
        (Some(c), None) => Letter(c),
        _ => {
            return Err(Error::malformed(
                line,
                format!("letter field {letter:?} is not a single character"),
            ))
        }
    };
    let count = count
        .parse::<u64>()
        .map_err(|e| Error::malformed(line, format!("bad count {count:?}: {e}")))?;
    Ok((letter, count))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CountMapper;

impl Mapper for CountMapper {
    type Key = Letter;
    type Value = u64;

    fn map(&self, line: &str, out: &mut dyn Emit<Letter, u64>) -> Result<()> {
        for c in line.chars().filter(|c| !c.is_whitespace()) {
            out.emit(Letter::fold(c), 1)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CountReducer;

impl Reducer for CountReducer {
    type Key = Letter;
    type Value = u64;
    type OutKey = Letter;
    type OutValue = u64;

    fn reduce(
        &self,
        key: &Letter,
        values: Values<'_, u64>,
        out: &mut dyn Emit<Letter, u64>,
    ) -> Result<()> {
        let mut total: u64 = 0;
        for v in values {
            total = total
                .checked_add(*v)
                .ok_or_else(|| Error::CountOverflow {
                    key: key.to_string(),
                })?;
        }
        out.emit(*key, total)
    }
}

pub fn count_order() -> KeyOrder<Letter> {
    KeyOrder::natural()
}

/// Re-keys `<letter> <count>` as `(count, letter)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SortMapper;

impl Mapper for SortMapper {
    type Key = u64;
    type Value = Letter;

    fn map(&self, line: &str, out: &mut dyn Emit<u64, Letter>) -> Result<()> {
        let (letter, count) = parse_entry(line)?;
        out.emit(count, letter)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SortReducer;

impl Reducer for SortReducer {
    type Key = u64;
    type Value = Letter;
    type OutKey = Letter;
    type OutValue = u64;

    fn reduce(
        &self,
        key: &u64,
        values: Values<'_, Letter>,
        out: &mut dyn Emit<Letter, u64>,
    ) -> Result<()> {
        for letter in values {
            out.emit(*letter, *key)?;
        }
        Ok(())
    }
}

/// Largest count first.
pub fn sort_order() -> KeyOrder<u64> {
    KeyOrder::descending()
}
