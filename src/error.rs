//! Error types for recipe arithmetic and record conversion

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecipeError>;

/// Which item list an index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRole {
    Ingredient,
    Product,
}

impl fmt::Display for ItemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRole::Ingredient => f.write_str("ingredient"),
            ItemRole::Product => f.write_str("product"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeError {
    #[error("invalid number format: {literal:?}")]
    InvalidNumberFormat { literal: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },

    #[error("{role} index {index} out of range (recipe has {len})")]
    IndexOutOfRange {
        role: ItemRole,
        index: usize,
        len: usize,
    },

    #[error("missing field `{field}`")]
    MissingField { field: String },
}

impl RecipeError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        RecipeError::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn invalid_number(literal: impl Into<String>) -> Self {
        RecipeError::InvalidNumberFormat {
            literal: literal.into(),
        }
    }
}
