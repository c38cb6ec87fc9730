//! Placeholder substitution for SQL templates.
//!
//! A template contains `?` markers, replaced by the escaped form of the next
//! parameter, and `??` markers, replaced by the parameter's raw form. Raw
//! substitution exists for identifiers that were themselves read from the
//! catalog (table names, column lists) and must never carry user input.
//!
//! ```
//! use mysqldiff::sqlfmt::{format_sql, Param};
//!
//! let sql = format_sql(
//!     "SELECT * FROM ?? WHERE name = ?",
//!     vec![Param::from("users"), Param::from("O'Brien")],
//! );
//! assert_eq!(sql, r"SELECT * FROM users WHERE name = 'O\'Brien'");
//! ```

use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?+").unwrap());

const SEPARATOR: &str = ", ";
const PRETTY_SEPARATOR: &str = ",\n  ";

/// Character substitutions applied to every quoted string literal.
/// Applied one character at a time, so no substitution can see the output
/// of another.
const ESCAPE_TABLE: [(char, &str); 9] = [
    ('\0', "\\0"),
    ('\u{8}', "\\b"),
    ('\t', "\\t"),
    ('\n', "\\n"),
    ('\r', "\\r"),
    ('\u{1a}', "\\Z"),
    ('"', "\\\""),
    ('\'', "\\'"),
    ('\\', "\\\\"),
];

/// A typed value substituted into a SQL template.
///
/// The set of variants is closed: every value that reaches a query goes
/// through one of the escaping rules below.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// A string that is already hex encoded, rendered as `X'..'`.
    Hex(String),
    List(Vec<Param>),
    /// Field assignments, rendered in insertion order.
    Fields(IndexMap<String, Param>),
}

impl Param {
    pub fn hex(encoded: impl Into<String>) -> Self {
        Param::Hex(encoded.into())
    }

    pub fn list<T: Into<Param>>(items: impl IntoIterator<Item = T>) -> Self {
        Param::List(items.into_iter().map(Into::into).collect())
    }

    pub fn fields<K: Into<String>, V: Into<Param>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Param::Fields(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<&String> for Param {
    fn from(value: &String) -> Self {
        Param::Text(value.clone())
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Bool(value)
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Param::Int(value.into())
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Param::Int(value.into())
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Float(value)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Param::Null, Into::into)
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(value: Vec<T>) -> Self {
        Param::list(value)
    }
}

/// Raw form, as substituted by `??`.
impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Null => write!(f, "NULL"),
            Param::Bool(b) => write!(f, "{}", bool_literal(*b)),
            Param::Int(n) => write!(f, "{n}"),
            Param::Float(x) => write!(f, "{}", float_literal(*x)),
            Param::Text(s) | Param::Hex(s) => write!(f, "{s}"),
            Param::List(items) => {
                let raw: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", raw.join(SEPARATOR))
            }
            Param::Fields(fields) => {
                let raw: Vec<String> = fields.iter().map(|(k, v)| format!("{k} = {v}")).collect();
                write!(f, "{}", raw.join(SEPARATOR))
            }
        }
    }
}

/// Anything that can be supplied as the parameter list of a template.
/// A lone `Param` counts as a one-element list.
pub trait IntoParams {
    fn into_params(self) -> Vec<Param>;
}

impl IntoParams for Param {
    fn into_params(self) -> Vec<Param> {
        vec![self]
    }
}

impl IntoParams for Vec<Param> {
    fn into_params(self) -> Vec<Param> {
        self
    }
}

impl IntoParams for &[Param] {
    fn into_params(self) -> Vec<Param> {
        self.to_vec()
    }
}

impl<const N: usize> IntoParams for [Param; N] {
    fn into_params(self) -> Vec<Param> {
        self.into()
    }
}

impl IntoParams for () {
    fn into_params(self) -> Vec<Param> {
        Vec::new()
    }
}

/// Substitutes `params` into `sql`, joining list and field items with `", "`.
pub fn format_sql(sql: &str, params: impl IntoParams) -> String {
    format_with_separator(sql, &params.into_params(), SEPARATOR)
}

/// Like [`format_sql`], but puts every list or field item on its own line.
pub fn format_sql_pretty(sql: &str, params: impl IntoParams) -> String {
    format_with_separator(sql, &params.into_params(), PRETTY_SEPARATOR)
}

fn format_with_separator(sql: &str, params: &[Param], separator: &str) -> String {
    if params.is_empty() {
        return sql.to_string();
    }

    let mut result = String::with_capacity(sql.len());
    let mut chunk_index = 0;
    let mut remaining = params.iter();

    for placeholder in PLACEHOLDER.find_iter(sql) {
        if placeholder.len() > 2 {
            continue;
        }
        let Some(param) = remaining.next() else {
            break;
        };

        let rendered = if placeholder.as_str() == "??" {
            param.to_string()
        } else {
            substitute(param, separator)
        };

        result.push_str(&sql[chunk_index..placeholder.start()]);
        result.push_str(&rendered);
        chunk_index = placeholder.end();
    }

    if chunk_index == 0 {
        return sql.to_string();
    }

    if chunk_index < sql.len() {
        result.push_str(&sql[chunk_index..]);
        return result;
    }

    result.trim().to_string()
}

/// Escaped form of a top-level `?` parameter.
fn substitute(param: &Param, separator: &str) -> String {
    match param {
        Param::Fields(fields) => fields
            .iter()
            .map(|(name, value)| format!("{name} = {}", escape_param(value)))
            .collect::<Vec<_>>()
            .join(separator),
        Param::List(items) => items
            .iter()
            .map(escape_param)
            .collect::<Vec<_>>()
            .join(separator),
        scalar => escape_param(scalar),
    }
}

fn escape_items(items: &[Param]) -> String {
    items
        .iter()
        .map(escape_param)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Renders one parameter as a SQL literal.
///
/// Strings are single quoted with every character of [`ESCAPE_TABLE`]
/// backslash escaped; hex strings additionally get an `X` prefix. Nested
/// lists render as parenthesized tuples.
pub fn escape_param(param: &Param) -> String {
    match param {
        Param::Null => "NULL".to_string(),
        Param::Bool(b) => bool_literal(*b).to_string(),
        Param::Int(n) => n.to_string(),
        Param::Float(x) => float_literal(*x),
        Param::Text(s) => quote(s),
        Param::Hex(s) => format!("X{}", quote(s)),
        Param::List(items) => format!("({})", escape_items(items)),
        Param::Fields(fields) => fields
            .iter()
            .map(|(name, value)| format!("{name} = {}", escape_param(value)))
            .collect::<Vec<_>>()
            .join(SEPARATOR),
    }
}

/// Quotes a string literal, escaping through [`ESCAPE_TABLE`].
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match ESCAPE_TABLE.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Reverses [`quote`]. Returns `None` for anything that is not a single
/// quoted literal using only the escapes of [`ESCAPE_TABLE`].
pub fn unescape_literal(literal: &str) -> Option<String> {
    let body = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next()?;
                let original = ESCAPE_TABLE
                    .iter()
                    .find(|(_, to)| to.ends_with(escaped))
                    .map(|(from, _)| *from)?;
                out.push(original);
            }
            '\'' => return None,
            other => out.push(other),
        }
    }

    Some(out)
}

fn bool_literal(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

fn float_literal(x: f64) -> String {
    if x.is_finite() {
        x.to_string()
    } else {
        "NULL".to_string()
    }
}
