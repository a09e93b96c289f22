use crate::constants::categories::{TOKEN_DELIMITER, VALUE_SUFFIX_CHARS};
use crate::data::{Cell, Table};
use crate::errors::{EtlError, RowError};
use crate::types::{CategoryName, CategoryValue};

/// Where a category schema came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaOrigin {
    /// Inferred from the first row's category field.
    Discovered,
    /// Supplied by configuration; every row's token names are checked against it.
    Supplied,
}

/// Ordered category names bound to token positions in the packed field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategorySchema {
    names: Vec<CategoryName>,
    origin: SchemaOrigin,
}

impl CategorySchema {
    /// Schema from an externally supplied ordered list.
    pub fn supplied<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CategoryName>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            origin: SchemaOrigin::Supplied,
        }
    }

    /// Schema inferred from one packed category field.
    ///
    /// Each token's name is the token minus its trailing `-<digit>`.
    pub fn discover(field: &str) -> Result<Self, EtlError> {
        let names = split_tokens(field)
            .map(|token| {
                let name = category_name(token);
                if name.is_empty() {
                    Err(EtlError::CategoryFormat(format!(
                        "token '{token}' has no category name"
                    )))
                } else {
                    Ok(name.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            names,
            origin: SchemaOrigin::Discovered,
        })
    }

    fn empty() -> Self {
        Self {
            names: Vec::new(),
            origin: SchemaOrigin::Discovered,
        }
    }

    /// Category names in token order.
    pub fn names(&self) -> &[CategoryName] {
        &self.names
    }

    /// Number of categories (`num_categories`).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the schema has no categories.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// How this schema was obtained.
    pub fn origin(&self) -> SchemaOrigin {
        self.origin
    }

    /// Decode one packed field against this schema.
    ///
    /// Token count is always checked. Token names are checked only for a
    /// supplied schema; a discovered schema binds by position alone.
    pub fn decode(&self, field: &str) -> Result<Vec<CategoryValue>, RowError> {
        let values = decode_row(field, self.len())?;
        if self.origin == SchemaOrigin::Supplied {
            for (position, (token, expected)) in
                split_tokens(field).zip(&self.names).enumerate()
            {
                if category_name(token) != expected {
                    return Err(RowError::NameMismatch {
                        position,
                        expected: expected.clone(),
                        found: token.to_string(),
                    });
                }
            }
        }
        Ok(values)
    }

    /// Decode a table cell. Null cells are `RowError::MissingField`.
    pub fn decode_cell(&self, cell: &Cell) -> Result<Vec<CategoryValue>, RowError> {
        match cell.render() {
            Some(field) => self.decode(&field),
            None => Err(RowError::MissingField),
        }
    }
}

/// Infer the category schema from the first row of `column`.
///
/// An empty table yields an empty schema.
pub fn discover_categories(table: &Table, column: &str) -> Result<CategorySchema, EtlError> {
    let col = table.require_column(column, "joined")?;
    let Some(first) = table.rows().first() else {
        return Ok(CategorySchema::empty());
    };
    match first[col].render() {
        Some(field) if !field.is_empty() => CategorySchema::discover(&field),
        _ => Err(EtlError::CategoryFormat(format!(
            "first row has no '{column}' value"
        ))),
    }
}

/// Decode a packed field into exactly `count` values by position.
///
/// Each value is the last character of its token read as a decimal digit.
/// Digits other than `0`/`1` are returned unchanged.
pub fn decode_row(field: &str, count: usize) -> Result<Vec<CategoryValue>, RowError> {
    if field.is_empty() {
        return if count == 0 {
            Ok(Vec::new())
        } else {
            Err(RowError::MissingField)
        };
    }
    let tokens: Vec<&str> = split_tokens(field).collect();
    if tokens.len() != count {
        return Err(RowError::TokenCount {
            expected: count,
            found: tokens.len(),
        });
    }
    tokens
        .into_iter()
        .map(|token| {
            token
                .chars()
                .next_back()
                .and_then(|ch| ch.to_digit(10))
                .map(CategoryValue::from)
                .ok_or_else(|| RowError::InvalidValue {
                    token: token.to_string(),
                })
        })
        .collect()
}

/// Name part of a `name-value` token: the token minus its trailing two characters.
pub fn category_name(token: &str) -> &str {
    token
        .char_indices()
        .rev()
        .nth(VALUE_SUFFIX_CHARS - 1)
        .map(|(idx, _)| &token[..idx])
        .unwrap_or("")
}

fn split_tokens(field: &str) -> impl Iterator<Item = &str> {
    field.split(TOKEN_DELIMITER)
}
