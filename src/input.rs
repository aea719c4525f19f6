use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::InputError;
use crate::types::{PieceRequirement, leading_u32};

/// Parses a piece list with the header
/// `piece_id,material_id,w_mm,h_mm,qty,rotate,banding,notes`.
///
/// Only `material_id`, `w_mm` and `h_mm` are required columns. Numbers are
/// read from their leading digits (`600.5` is 600); a field with none
/// becomes 1. Anything but `true` in `rotate` means fixed.
pub fn parse_pieces_csv(content: &str) -> Result<Vec<PieceRequirement>, InputError> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header: Vec<String> = split_row(lines.next().ok_or(InputError::Empty)?);
    let column = |name: &str| header.iter().position(|h| h == name);

    let material = column("material_id").ok_or(InputError::MissingColumn("material_id"))?;
    let width = column("w_mm").ok_or(InputError::MissingColumn("w_mm"))?;
    let height = column("h_mm").ok_or(InputError::MissingColumn("h_mm"))?;
    let piece_id = column("piece_id");
    let qty = column("qty");
    let rotate = column("rotate");
    let banding = column("banding");
    let notes = column("notes");

    let rows = lines
        .enumerate()
        .map(|(row, line)| {
            let values = split_row(line);
            let get = |idx: Option<usize>| idx.and_then(|i| values.get(i)).cloned().unwrap_or_default();
            PieceRequirement {
                piece_id: get(piece_id),
                material_id: get(Some(material)),
                width_mm: number_or_one(&get(Some(width)), "w_mm", row),
                height_mm: number_or_one(&get(Some(height)), "h_mm", row),
                quantity: if qty.is_some() {
                    number_or_one(&get(qty), "qty", row)
                } else {
                    1
                },
                rotatable: get(rotate).eq_ignore_ascii_case("true"),
                banding: get(banding),
                note: get(notes),
            }
        })
        .collect();

    Ok(rows)
}

fn number_or_one(raw: &str, field: &str, row: usize) -> u32 {
    match leading_u32(raw) {
        Some(n) => n,
        None => {
            tracing::warn!(row = row + 1, field, value = raw, "unreadable value, using 1");
            1
        }
    }
}

fn split_row(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => values.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(ch),
        }
    }
    values.push(current.trim().to_string());
    values
}

pub fn read_pieces_csv(path: &Path) -> Result<Vec<PieceRequirement>, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_pieces_csv(&content)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| InputError::Json {
        path: path.display().to_string(),
        source,
    })
}
