use std::{
    fmt::{self, Display},
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use common::{Emit, Error, Result};
use tracing::debug;
use uuid::Uuid;

pub const SUCCESS_MARKER: &str = "_SUCCESS";
const TEMP_DIR: &str = "_temporary";

/// A byte range of one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSplit {
    pub index: usize,
    pub path: PathBuf,
    pub start: u64,
    pub end: u64,
}

impl fmt::Display for InputSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "split {} ({} [{}..{}])",
            self.index,
            self.path.display(),
            self.start,
            self.end
        )
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            name.starts_with('_') || name.starts_with('.')
        })
        .unwrap_or(false)
}

fn input_files(input: &Path) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(input)
        .map_err(|e| Error::io(format!("stat {}", input.display()), e))?;
    if !meta.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = vec![];
    let entries = fs::read_dir(input)
        .map_err(|e| Error::io(format!("list {}", input.display()), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(format!("list {}", input.display()), e))?;
        let path = entry.path();
        if path.is_file() && !is_hidden(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Cuts `input` (a file, or a directory of files) into splits of at most
/// `split_size` bytes.
pub fn plan_splits(input: &Path, split_size: u64) -> Result<Vec<InputSplit>> {
    let split_size = split_size.max(1);
    let mut splits = vec![];
    for path in input_files(input)? {
        let len = fs::metadata(&path)
            .map_err(|e| Error::io(format!("stat {}", path.display()), e))?
            .len();
        let mut start = 0;
        while start < len {
            let end = (start + split_size).min(len);
            splits.push(InputSplit {
                index: splits.len(),
                path: path.clone(),
                start,
                end,
            });
            start = end;
        }
    }
    Ok(splits)
}

/// Calls `f` for every line of `split`.
///
/// A line belongs to the split its first byte falls in, with the first line of
/// a non-initial split left to the previous split, so the splits of a file
/// cover every line exactly once.
pub fn read_split(
    split: &InputSplit,
    mut f: impl FnMut(&str) -> Result<()>,
) -> Result<u64> {
    let ctx = || format!("read {} [{}..{}]", split.path.display(), split.start, split.end);
    let file = File::open(&split.path).map_err(|e| Error::io(ctx(), e))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut pos = split.start;

    if split.start != 0 {
        reader
            .seek(SeekFrom::Start(split.start))
            .map_err(|e| Error::io(ctx(), e))?;
        pos += reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| Error::io(ctx(), e))? as u64;
    }

    let mut records = 0;
    while pos <= split.end {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| Error::io(ctx(), e))?;
        if n == 0 {
            break;
        }
        pos += n as u64;

        let mut line = &buf[..];
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped.strip_suffix(b"\r").unwrap_or(stripped);
        }
        f(String::from_utf8_lossy(line).as_ref())?;
        records += 1;
    }
    Ok(records)
}

/// Stage output directory with per-attempt staging of partition files.
#[derive(Debug)]
pub struct OutputCommitter {
    dir: PathBuf,
}

impl OutputCommitter {
    pub fn create(dir: &Path, overwrite: bool) -> Result<Self> {
        if dir.exists() {
            if !overwrite {
                return Err(Error::OutputExists(dir.to_path_buf()));
            }
            let removed = if dir.is_dir() {
                fs::remove_dir_all(dir)
            } else {
                fs::remove_file(dir)
            };
            removed.map_err(|e| Error::io(format!("remove {}", dir.display()), e))?;
        }
        let temp = dir.join(TEMP_DIR);
        fs::create_dir_all(&temp)
            .map_err(|e| Error::io(format!("create {}", temp.display()), e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn attempt_writer(&self, partition: usize) -> Result<AttemptWriter> {
        let temp = self
            .dir
            .join(TEMP_DIR)
            .join(format!("{partition:05}-{}", Uuid::new_v4()));
        let file = File::create(&temp)
            .map_err(|e| Error::io(format!("create {}", temp.display()), e))?;
        Ok(AttemptWriter {
            out: BufWriter::new(file),
            temp,
            target: self.dir.join(part_name(partition)),
            records: 0,
        })
    }

    /// Drops the staging area and marks the output complete.
    pub fn finish(&self) -> Result<()> {
        let temp = self.dir.join(TEMP_DIR);
        fs::remove_dir_all(&temp)
            .map_err(|e| Error::io(format!("remove {}", temp.display()), e))?;
        let marker = self.dir.join(SUCCESS_MARKER);
        File::create(&marker)
            .map_err(|e| Error::io(format!("create {}", marker.display()), e))?;
        Ok(())
    }
}

pub fn part_name(partition: usize) -> String {
    format!("part-r-{partition:05}")
}

pub fn is_complete(dir: &Path) -> bool {
    dir.join(SUCCESS_MARKER).is_file()
}

/// Writes `<key> <value>` lines for one reduce attempt. Nothing becomes
/// visible in the output directory until [`AttemptWriter::commit`].
#[derive(Debug)]
pub struct AttemptWriter {
    out: BufWriter<File>,
    temp: PathBuf,
    target: PathBuf,
    records: u64,
}

impl AttemptWriter {
    pub fn commit(mut self) -> Result<u64> {
        let ctx = format!("commit {}", self.target.display());
        self.out
            .flush()
            .map_err(|e| Error::io(ctx.clone(), e))?;
        fs::rename(&self.temp, &self.target).map_err(|e| Error::io(ctx, e))?;
        debug!("committed {} ({} records)", self.target.display(), self.records);
        Ok(self.records)
    }
}

impl<K: Display, V: Display> Emit<K, V> for AttemptWriter {
    fn emit(&mut self, key: K, value: V) -> Result<()> {
        writeln!(self.out, "{} {}", key, value)
            .map_err(|e| Error::io(format!("write {}", self.temp.display()), e))?;
        self.records += 1;
        Ok(())
    }
}
