// crates/areadb-core/src/codec/dbf.rs
//! dBase III attribute table for shapefile layers.
//!
//! Column types are inferred from the values: booleans become `L`,
//! integral numbers `N`, everything else `C`. Text is stored as UTF-8
//! (announced through the layer's `.cpg`).

use crate::geometry::{Properties, Scalar};
use std::collections::{BTreeSet, HashSet};

const VERSION: u8 = 0x03;
// 2000-01-01
const DATE: [u8; 3] = [100, 1, 1];
const HEADER_TERMINATOR: u8 = 0x0D;
const END_OF_FILE: u8 = 0x1A;
const NAME_LEN: usize = 10;
const MAX_CHAR_WIDTH: usize = 254;
const MAX_NUMERIC_WIDTH: usize = 18;
/// Column written for layers without any property.
const FALLBACK_FIELD: &str = "FID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    Character,
    Numeric,
    Logical,
}

impl FieldType {
    fn code(self) -> u8 {
        match self {
            FieldType::Character => b'C',
            FieldType::Numeric => b'N',
            FieldType::Logical => b'L',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    /// Property key the column is filled from.
    key: String,
    /// Column name as stored (at most ten bytes, unique).
    name: String,
    kind: FieldType,
    width: usize,
    /// Filled with the record number instead of a property value.
    synthesized: bool,
}

/// Encodes one attribute row per entry of `rows`.
pub(crate) fn write(rows: &[&Properties]) -> Vec<u8> {
    let fields = fields(rows);
    let record_len = 1 + fields.iter().map(|f| f.width).sum::<usize>();
    let header_len = 32 + 32 * fields.len() + 1;

    let mut out = Vec::with_capacity(header_len + record_len * rows.len() + 1);

    // 1. Header
    out.push(VERSION);
    out.extend_from_slice(&DATE);
    out.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(&(record_len as u16).to_le_bytes());
    out.extend_from_slice(&[0u8; 20]);

    for field in &fields {
        let mut name = [0u8; 11];
        name[..field.name.len()].copy_from_slice(field.name.as_bytes());
        out.extend_from_slice(&name);
        out.push(field.kind.code());
        out.extend_from_slice(&[0u8; 4]);
        out.push(field.width as u8);
        out.push(0);
        out.extend_from_slice(&[0u8; 14]);
    }
    out.push(HEADER_TERMINATOR);

    // 2. Records
    for (index, row) in rows.iter().enumerate() {
        out.push(b' ');
        for field in &fields {
            let cell = if field.synthesized {
                index.to_string()
            } else {
                cell_text(row.get(&field.key), field.kind)
            };
            pad(&mut out, &cell, field.width, field.kind == FieldType::Numeric);
        }
    }
    out.push(END_OF_FILE);
    out
}

fn fields(rows: &[&Properties]) -> Vec<Field> {
    let keys: BTreeSet<&String> = rows.iter().flat_map(|r| r.keys()).collect();
    if keys.is_empty() {
        let width = rows.len().saturating_sub(1).to_string().len();
        return vec![Field {
            key: FALLBACK_FIELD.into(),
            name: FALLBACK_FIELD.into(),
            kind: FieldType::Numeric,
            width,
            synthesized: true,
        }];
    }

    let mut used = HashSet::new();
    keys.into_iter()
        .map(|key| {
            let values: Vec<&Scalar> = rows
                .iter()
                .filter_map(|r| r.get(key))
                .filter(|v| !v.is_null())
                .collect();
            let (kind, width) = infer(&values);
            Field {
                key: key.clone(),
                name: unique_name(key, &mut used),
                kind,
                width,
                synthesized: false,
            }
        })
        .collect()
}

fn infer(values: &[&Scalar]) -> (FieldType, usize) {
    if !values.is_empty() && values.iter().all(|v| matches!(v, Scalar::Bool(_))) {
        return (FieldType::Logical, 1);
    }
    let widest = |kind: FieldType| {
        values
            .iter()
            .map(|v| cell_text(Some(*v), kind).len())
            .max()
            .unwrap_or(0)
            .max(1)
    };
    let integral = !values.is_empty()
        && values
            .iter()
            .all(|v| matches!(v, Scalar::Number(n) if n.is_i64() || n.is_u64()));
    if integral {
        let width = widest(FieldType::Numeric);
        if width <= MAX_NUMERIC_WIDTH {
            return (FieldType::Numeric, width);
        }
    }
    (
        FieldType::Character,
        widest(FieldType::Character).min(MAX_CHAR_WIDTH),
    )
}

fn cell_text(value: Option<&Scalar>, kind: FieldType) -> String {
    match (kind, value) {
        (FieldType::Logical, Some(Scalar::Bool(true))) => "T".into(),
        (FieldType::Logical, Some(Scalar::Bool(false))) => "F".into(),
        (FieldType::Logical, _) => "?".into(),
        (_, Some(v)) => v.to_string(),
        (_, None) => String::new(),
    }
}

/// Writes `text` into a fixed-width cell, truncated on a char boundary.
fn pad(out: &mut Vec<u8>, text: &str, width: usize, right_align: bool) {
    let mut end = text.len().min(width);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let text = &text.as_bytes()[..end];
    let fill = width - text.len();
    if right_align {
        out.extend(std::iter::repeat(b' ').take(fill));
        out.extend_from_slice(text);
    } else {
        out.extend_from_slice(text);
        out.extend(std::iter::repeat(b' ').take(fill));
    }
}

/// Shortens `key` to the ten-byte column limit and appends a counter when
/// the shortened name is already taken.
fn unique_name(key: &str, used: &mut HashSet<String>) -> String {
    let base = truncate(key, NAME_LEN);
    let base = if base.is_empty() { "FIELD".to_string() } else { base };
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 1usize;
    loop {
        let suffix = n.to_string();
        let candidate = format!("{}{}", truncate(&base, NAME_LEN - suffix.len()), suffix);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn truncate(text: &str, max_bytes: usize) -> String {
    let mut end = text.len().min(max_bytes);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
