//! Reads the literal data back out of a generated file.
//!
//! Only understands the exact layout [`Template`](super::Template) emits. Used
//! to check existing artifacts and to verify rendering is lossless.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{JobMapping, TransformerKind};
use crate::error::{GenError, Result};

use super::template::TYPE_MAP_FN;

const GO_STRING: &str = r#""((?:[^"\\]|\\.)*)""#;

static MAPPING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^\s*Schema:\s*{s},\s*\n\s*Table:\s*{s},\s*\n\s*Column:\s*{s},\s*\n\s*Transformer:\s*&\w+\.JobMappingTransformer\{{\s*\n\s*Source:\s*\w+\.TransformerSource_(\w+),",
        s = GO_STRING
    ))
    .expect("valid mapping pattern")
});

static MAP_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*{}:\s*\{{\s*$", GO_STRING))
        .expect("valid map key pattern")
});

static MAP_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*{s}:\s*{s},\s*$", s = GO_STRING))
        .expect("valid map entry pattern")
});

/// Column type lookup as `"schema.table"` → column → type, in file order.
pub type TypeMap = Vec<(String, Vec<(String, String)>)>;

/// Extract the job mapping list from generated Go source.
pub fn parse_job_mappings(source: &str) -> Result<Vec<JobMapping>> {
    MAPPING_RE
        .captures_iter(source)
        .map(|caps| {
            let transformer = TransformerKind::from_go_source_constant(&caps[4])
                .ok_or_else(|| {
                    GenError::Render(format!("unknown transformer source '{}'", &caps[4]))
                })?;
            Ok(JobMapping {
                schema: unescape(&caps[1])?,
                table: unescape(&caps[2])?,
                column: unescape(&caps[3])?,
                transformer,
            })
        })
        .collect()
}

/// Extract the column type lookup, or `None` when the file has none.
pub fn parse_type_map(source: &str) -> Result<Option<TypeMap>> {
    let header = format!("func {}()", TYPE_MAP_FN);
    let Some(start) = source.find(&header) else {
        return Ok(None);
    };

    let mut map: TypeMap = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut current: Option<usize> = None;

    for line in source[start..].lines().skip(2) {
        if let Some(caps) = MAP_KEY_RE.captures(line) {
            let key = unescape(&caps[1])?;
            let idx = *index.entry(key.clone()).or_insert_with(|| {
                map.push((key, Vec::new()));
                map.len() - 1
            });
            current = Some(idx);
        } else if let Some(caps) = MAP_ENTRY_RE.captures(line) {
            let idx = current.ok_or_else(|| {
                GenError::Render(format!("type entry outside a table: {}", line.trim()))
            })?;
            map[idx].1.push((unescape(&caps[1])?, unescape(&caps[2])?));
        } else if line.trim() == "}," {
            current = None;
        } else if line.trim() == "}" {
            break;
        }
    }

    Ok(Some(map))
}

/// Decode the body of a Go interpreted string literal.
fn unescape(body: &str) -> Result<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                let byte = u8::from_str_radix(&hex, 16)
                    .map_err(|_| GenError::Render(format!("bad escape \\x{}", hex)))?;
                out.push(char::from(byte));
            }
            other => {
                return Err(GenError::Render(format!(
                    "unsupported escape \\{}",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}
