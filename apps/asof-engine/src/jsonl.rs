//! JSON Lines reading and writing for the command line.
//!
//! Blank lines are skipped, so a row's index in the returned vector can
//! differ from its line in the file; the `_numbered` readers keep the
//! 1-based line number of every row. A line that fails to parse reports its
//! file and line number.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Read every non-blank line of `path` as a `T`.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    Ok(read_jsonl_numbered(path)?.into_iter().map(|(_, row)| row).collect())
}

/// Read every non-blank line of `path`, paired with its line number.
pub fn read_jsonl_numbered<T: DeserializeOwned>(path: &Path) -> Result<Vec<(usize, T)>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_numbered_lines(BufReader::new(file), &path.display().to_string())
}

/// Read JSON Lines from any buffered reader; `source` names it in errors.
pub fn read_lines<T: DeserializeOwned>(reader: impl BufRead, source: &str) -> Result<Vec<T>> {
    Ok(read_numbered_lines(reader, source)?.into_iter().map(|(_, row)| row).collect())
}

/// Like [`read_lines`], keeping each row's 1-based line number.
pub fn read_numbered_lines<T: DeserializeOwned>(
    reader: impl BufRead,
    source: &str,
) -> Result<Vec<(usize, T)>> {
    let mut rows = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("reading {source}:{number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let row =
            serde_json::from_str(&line).with_context(|| format!("parsing {source}:{number}"))?;
        rows.push((number, row));
    }
    Ok(rows)
}

/// Write `rows` as JSON Lines to `writer`.
pub fn write_lines<T: Serialize>(
    writer: impl Write,
    rows: impl IntoIterator<Item = T>,
) -> Result<usize> {
    let mut writer = BufWriter::new(writer);
    let mut written = 0;
    for row in rows {
        serde_json::to_writer(&mut writer, &row)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Write `rows` as JSON Lines to a new file at `path`.
pub fn write_jsonl<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_lines(file, rows).with_context(|| format!("writing {}", path.display()))
}
