use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::fs::File;
use std::path::Path;

use crate::engine::FacetError;
use crate::faculty::Faculty;

/// Column positions of the required fields within a header row
#[derive(Debug, Clone, Copy)]
struct Schema {
    sex: usize,
    rank: usize,
    discipline: usize,
    salary: usize,
    yrs_service: usize,
    yrs_since_phd: usize,
    width: usize,
}

struct ChunkError {
    /// 0-based data line within the chunk
    local_line: usize,
    /// `None` for a field-count mismatch rather than a bad value
    column: Option<&'static str>,
    value: String,
}

/// Loads the faculty CSV into typed records using a memory map.
///
/// Columns are located by header name (`sex`, `rank`, `discipline`,
/// `salary`, `yrs.service`, `yrs.since.phd`); extra columns such as the R
/// row-number column are ignored, and fields may be double-quoted. Chunks
/// are parsed in parallel; any malformed numeric field fails the whole load
/// with a [`FacetError::DataFormat`] naming the column and file row — the
/// first error in file order wins, and no partial record set is returned.
pub fn load_csv(path: &Path) -> Result<Vec<Faculty>, FacetError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let buf: &[u8] = &mmap[..];

    let header_end = buf
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| FacetError::Parse("missing header line".into()))?;
    let schema = read_schema(&buf[..header_end])?;

    let data = &buf[header_end + 1..];
    let chunks = find_chunk_boundaries(data, rayon::current_num_threads());

    let outcomes: Vec<Result<(Vec<Faculty>, usize), ChunkError>> = chunks
        .par_iter()
        .map(|&(start, end)| parse_chunk(&data[start..end], &schema))
        .collect();

    let mut records = Vec::new();
    let mut line_offset = 0usize;
    for outcome in outcomes {
        match outcome {
            Ok((mut parsed, lines)) => {
                records.append(&mut parsed);
                line_offset += lines;
            }
            Err(err) => {
                // header is file line 1, data starts at line 2
                let row = line_offset + err.local_line + 2;
                return Err(match err.column {
                    Some(column) => FacetError::DataFormat {
                        column: column.to_string(),
                        row,
                        value: err.value,
                    },
                    None => FacetError::Parse(format!("row {}: {}", row, err.value)),
                });
            }
        }
    }
    Ok(records)
}

fn read_schema(header_line: &[u8]) -> Result<Schema, FacetError> {
    let headers: Vec<String> = header_line
        .split(|&b| b == b',')
        .map(|s| String::from_utf8_lossy(trim_field(s)).to_string())
        .collect();

    let position = |name: &str| -> Result<usize, FacetError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| FacetError::MissingColumn(name.to_string()))
    };

    Ok(Schema {
        sex: position("sex")?,
        rank: position("rank")?,
        discipline: position("discipline")?,
        salary: position("salary")?,
        yrs_service: position("yrs.service")?,
        yrs_since_phd: position("yrs.since.phd")?,
        width: headers.len(),
    })
}

/// Split at newlines near even byte offsets so chunks hold whole lines
fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
    if data.is_empty() {
        return vec![];
    }

    let chunk_size = data.len() / num_chunks.max(1);
    let mut boundaries = Vec::with_capacity(num_chunks);
    let mut start = 0;

    for i in 0..num_chunks.saturating_sub(1) {
        let mut end = (i + 1) * chunk_size;
        while end < data.len() && data[end] != b'\n' {
            end += 1;
        }
        if end < data.len() {
            end += 1;
        }
        if start < end {
            boundaries.push((start, end));
        }
        start = end;
    }

    if start < data.len() {
        boundaries.push((start, data.len()));
    }

    boundaries
}

fn parse_chunk(chunk: &[u8], schema: &Schema) -> Result<(Vec<Faculty>, usize), ChunkError> {
    let mut records = Vec::with_capacity(chunk.len() / 40 + 16);
    let mut lines = 0usize;
    let mut fields: Vec<&[u8]> = Vec::with_capacity(schema.width);

    let mut newlines: Vec<usize> = memchr_iter(b'\n', chunk).collect();
    if newlines.last().copied() != Some(chunk.len() - 1) {
        // final line without a trailing newline
        newlines.push(chunk.len());
    }

    let mut start = 0;
    for newline_pos in newlines {
        let line = &chunk[start..newline_pos.min(chunk.len())];
        start = newline_pos + 1;
        let local_line = lines;
        lines += 1;

        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            continue;
        }

        fields.clear();
        let mut field_start = 0;
        for comma_pos in memchr_iter(b',', line) {
            fields.push(&line[field_start..comma_pos]);
            field_start = comma_pos + 1;
        }
        fields.push(&line[field_start..]);

        if fields.len() != schema.width {
            return Err(ChunkError {
                local_line,
                column: None,
                value: format!("expected {} fields, got {}", schema.width, fields.len()),
            });
        }

        let int_field = |idx: usize, column: &'static str| -> Result<i64, ChunkError> {
            let raw = trim_field(fields[idx]);
            atoi_simd::parse::<i64>(raw).map_err(|_| ChunkError {
                local_line,
                column: Some(column),
                value: String::from_utf8_lossy(raw).to_string(),
            })
        };
        let str_field =
            |idx: usize| -> String { String::from_utf8_lossy(trim_field(fields[idx])).to_string() };

        records.push(Faculty {
            sex: str_field(schema.sex),
            rank: str_field(schema.rank),
            discipline: str_field(schema.discipline),
            salary: int_field(schema.salary, "salary")?,
            yrs_service: int_field(schema.yrs_service, "yrs.service")?,
            yrs_since_phd: int_field(schema.yrs_since_phd, "yrs.since.phd")?,
        });
    }

    Ok((records, lines))
}

/// Strip surrounding double quotes and stray whitespace from a raw field
fn trim_field(mut field: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = field {
        field = rest;
    }
    while let [rest @ .., b' ' | b'\t' | b'\r'] = field {
        field = rest;
    }
    if field.len() >= 2 && field[0] == b'"' && field[field.len() - 1] == b'"' {
        field = &field[1..field.len() - 1];
    }
    field
}
