//! Text-level recovery for statements the grammar rejects.
//!
//! Real dumps carry vendor clauses the `sqlparser` grammars do not cover:
//! `ON [PRIMARY]`, `WITH (PAD_INDEX = OFF)`, `VARBINARY(MAX)` from SQL Server
//! Management Studio, `INHERITS (..)` or `bit varying` from pg_dump. When a
//! `CREATE TABLE` fails to parse, its name and column list are read from the
//! statement text instead. The column body is cut at its matching
//! parenthesis, split at top-level commas, and each element reduced to a
//! column name and its declared type text. Everything after the body
//! (storage, partitioning, inheritance) is ignored.
//!
//! Quoting follows the union of the dialects: `'..'`, `".."`, `` `..` ``,
//! `[..]` and PostgreSQL dollar quotes. Comments are `--` and `/* */`.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::identifier::strip_type_brackets;
use crate::core::Column;

static CREATE_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|UNLOGGED)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?",
    )
    .expect("valid CREATE TABLE pattern")
});

static CREATE_SCHEMA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^\s*CREATE\s+SCHEMA\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:AUTHORIZATION\s+)?("(?:[^"]|"")+"|\[[^\]]+\]|[\w$]+)"#,
    )
    .expect("valid CREATE SCHEMA pattern")
});

/// Leading words of table elements that are not column definitions.
const NON_COLUMN_WORDS: &[&str] = &[
    "CONSTRAINT",
    "PRIMARY",
    "UNIQUE",
    "CHECK",
    "FOREIGN",
    "INDEX",
    "KEY",
    "EXCLUDE",
    "LIKE",
    "PERIOD",
    "FULLTEXT",
    "SPATIAL",
];

/// Words that end the type text of a column definition.
const TYPE_STOP_WORDS: &[&str] = &[
    "NOT",
    "NULL",
    "IDENTITY",
    "DEFAULT",
    "CONSTRAINT",
    "COLLATE",
    "PRIMARY",
    "UNIQUE",
    "CHECK",
    "REFERENCES",
    "GENERATED",
    "AS",
    "SPARSE",
    "ROWGUIDCOL",
    "FILESTREAM",
    "MASKED",
    "ENCRYPTED",
    "AUTO_INCREMENT",
    "COMMENT",
    "ON",
];

/// A statement cut out of a script with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub line: usize,
    pub text: String,
}

/// A `CREATE TABLE` read from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredTable {
    /// Unquoted parts of the table name, outermost first.
    pub name_parts: Vec<String>,
    /// Columns in declaration order; the type is absent for computed columns.
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Code,
    Quoted,
    Comment,
}

/// Tag every character of `text` with the region it belongs to.
fn classify(text: &str) -> Vec<(usize, char, Region)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let len = chars.len();
    let mut out = Vec::with_capacity(len);
    let mut i = 0;

    while i < len {
        let c = chars[i].1;
        let next = chars.get(i + 1).map(|&(_, n)| n);
        let (region, end) = match c {
            '-' if next == Some('-') => (
                Region::Comment,
                find_char(&chars, i + 2, '\n').unwrap_or(len),
            ),
            '/' if next == Some('*') => (
                Region::Comment,
                find_seq(&chars, i + 2, "*/").map_or(len, |p| p + 2),
            ),
            '\'' | '"' | '`' => (
                Region::Quoted,
                find_char(&chars, i + 1, c).map_or(len, |p| p + 1),
            ),
            '[' => (
                Region::Quoted,
                find_char(&chars, i + 1, ']').map_or(len, |p| p + 1),
            ),
            '$' => match dollar_tag(&chars, i) {
                Some(tag) => {
                    let tag_len = tag.chars().count();
                    (
                        Region::Quoted,
                        find_seq(&chars, i + tag_len, &tag).map_or(len, |p| p + tag_len),
                    )
                }
                None => (Region::Code, i + 1),
            },
            _ => (Region::Code, i + 1),
        };
        out.extend(chars[i..end].iter().map(|&(pos, ch)| (pos, ch, region)));
        i = end;
    }

    out
}

fn find_char(chars: &[(usize, char)], from: usize, target: char) -> Option<usize> {
    chars
        .get(from..)?
        .iter()
        .position(|&(_, c)| c == target)
        .map(|p| from + p)
}

fn find_seq(chars: &[(usize, char)], from: usize, pattern: &str) -> Option<usize> {
    let pattern: Vec<char> = pattern.chars().collect();
    (from..chars.len()).find(|&start| {
        chars.len() - start >= pattern.len()
            && pattern
                .iter()
                .enumerate()
                .all(|(k, &p)| chars[start + k].1 == p)
    })
}

/// `$$` or `$tag$` opening at `i`, unless the `$` continues an identifier.
fn dollar_tag(chars: &[(usize, char)], i: usize) -> Option<String> {
    if i > 0 {
        let prev = chars[i - 1].1;
        if prev.is_alphanumeric() || prev == '_' || prev == '$' {
            return None;
        }
    }
    let mut tag = String::from("$");
    for &(_, c) in chars.get(i + 1..)? {
        if c == '$' {
            tag.push('$');
            return Some(tag);
        }
        let valid = c == '_' || c.is_alphabetic() || (c.is_ascii_digit() && tag.len() > 1);
        if !valid {
            return None;
        }
        tag.push(c);
    }
    None
}

/// Blank out comments, keeping line breaks so line numbers stay valid.
pub fn strip_comments(text: &str) -> String {
    classify(text)
        .into_iter()
        .map(|(_, c, region)| match region {
            Region::Comment if c != '\n' => ' ',
            _ => c,
        })
        .collect()
}

/// Split a script at top-level semicolons, dropping empty statements.
pub fn split_statements(sql: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut line = 1;
    let mut start: Option<(usize, usize)> = None;

    for (pos, c, region) in classify(sql) {
        if region == Region::Code && c == ';' {
            if let Some((from, at)) = start.take() {
                chunks.push(Chunk {
                    line: at,
                    text: sql[from..pos].to_string(),
                });
            }
        } else if start.is_none() && region != Region::Comment && !c.is_whitespace() {
            start = Some((pos, line));
        }
        if c == '\n' {
            line += 1;
        }
    }
    if let Some((from, at)) = start {
        chunks.push(Chunk {
            line: at,
            text: sql[from..].to_string(),
        });
    }

    chunks
}

/// Split at separator characters that sit outside quotes and parentheses.
fn split_top_level(text: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (pos, c, region) in classify(text) {
        if region != Region::Code {
            continue;
        }
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if depth == 0 && is_separator(c) => {
                parts.push(&text[start..pos]);
                start = pos + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Remove one level of identifier quoting.
pub fn unquote(token: &str) -> String {
    for (open, close) in [('"', '"'), ('[', ']'), ('`', '`')] {
        if let Some(inner) = token
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            let doubled: String = [close, close].iter().collect();
            return inner.replace(&doubled, &close.to_string());
        }
    }
    token.to_string()
}

fn is_quoted(token: &str) -> bool {
    token.starts_with(['"', '[', '`'])
}

/// Bare keyword of a token, `IDENTITY(1,1)` → `IDENTITY`.
fn keyword(token: &str) -> &str {
    token.split('(').next().unwrap_or(token)
}

fn is_one_of(token: &str, words: &[&str]) -> bool {
    !is_quoted(token) && words.iter().any(|w| w.eq_ignore_ascii_case(keyword(token)))
}

/// Whether the statement is a `CREATE TABLE` of any form.
pub fn is_create_table(sql: &str) -> bool {
    CREATE_TABLE_RE.is_match(&strip_comments(sql))
}

/// Name of the schema a `CREATE SCHEMA` statement creates.
pub fn recover_create_schema(sql: &str) -> Option<String> {
    let text = strip_comments(sql);
    CREATE_SCHEMA_RE
        .captures(&text)
        .map(|caps| unquote(&caps[1]))
}

/// Read the name and column list of a `CREATE TABLE` from its text.
///
/// Returns `None` when the statement is not a `CREATE TABLE` with a single
/// name followed by a closed column list.
pub fn recover_create_table(sql: &str) -> Option<RecoveredTable> {
    let text = strip_comments(sql);
    let head = CREATE_TABLE_RE.find(&text)?;
    let rest = &text[head.end()..];

    let code: Vec<(usize, char)> = classify(rest)
        .into_iter()
        .filter(|&(_, _, region)| region == Region::Code)
        .map(|(pos, c, _)| (pos, c))
        .collect();

    let open = code.iter().find(|&&(_, c)| c == '(')?.0;
    let name_text = rest[..open].trim();
    if split_top_level(name_text, char::is_whitespace).len() != 1 {
        return None;
    }
    let name_parts: Vec<String> = split_top_level(name_text, |c| c == '.')
        .into_iter()
        .map(unquote)
        .collect();

    let mut depth = 0usize;
    let close = code
        .iter()
        .skip_while(|&&(pos, _)| pos < open)
        .find_map(|&(pos, c)| {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(pos);
                    }
                }
                _ => {}
            }
            None
        })?;

    let columns = split_top_level(&rest[open + 1..close], |c| c == ',')
        .into_iter()
        .filter_map(column_from_element)
        .collect();

    Some(RecoveredTable {
        name_parts,
        columns,
    })
}

fn column_from_element(element: &str) -> Option<Column> {
    let tokens = split_top_level(element, char::is_whitespace);
    let (first, rest) = tokens.split_first()?;
    if is_one_of(first, NON_COLUMN_WORDS) {
        return None;
    }

    let mut type_text = String::new();
    for token in rest.iter().take_while(|t| !is_one_of(t, TYPE_STOP_WORDS)) {
        if !type_text.is_empty() && !token.starts_with('(') {
            type_text.push(' ');
        }
        type_text.push_str(token);
    }

    let name = unquote(first);
    Some(if type_text.is_empty() {
        Column::new(name)
    } else {
        Column::with_type(name, strip_type_brackets(&type_text))
    })
}
