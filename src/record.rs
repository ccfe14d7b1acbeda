//! Recipe records as they appear in the JSON data files

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::decimal::{ExactDecimal, NumericLiteral};
use crate::error::{RecipeError, Result};
use crate::models::{Ingredient, ItemQuantity, ProductEntry, Recipe};

const DEFAULT_AMOUNT: u32 = 1;
const DEFAULT_CATALYST: u32 = 0;
const DEFAULT_PROBABILITY: u32 = 1;

/// A numeric field given either as a JSON number or a string
///
/// Numbers keep the digits written in the file (serde_json is built with
/// `arbitrary_precision`), so nothing passes through `f64` on the way to
/// `ExactDecimal`.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberLiteral {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> Deserialize<'de> for NumberLiteral {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => Ok(NumberLiteral::Number(n)),
            serde_json::Value::String(s) => Ok(NumberLiteral::Text(s)),
            other => Err(D::Error::custom(format!(
                "expected a number or a numeric string, found {other}"
            ))),
        }
    }
}

impl NumericLiteral for NumberLiteral {
    fn to_decimal(&self) -> Result<rust_decimal::Decimal> {
        match self {
            NumberLiteral::Number(n) => n.to_string().to_decimal(),
            NumberLiteral::Text(s) => s.to_decimal(),
        }
    }
}

impl NumericLiteral for &NumberLiteral {
    fn to_decimal(&self) -> Result<rust_decimal::Decimal> {
        (*self).to_decimal()
    }
}

// Fields are optional here so a missing one surfaces as `MissingField`
// rather than as a serde error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientRecord {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub amount: Option<NumberLiteral>,
    pub catalyst_amount: Option<NumberLiteral>,
}

// Same fields as `IngredientRecord` plus `probability`. Spelled out instead
// of `#[serde(flatten)]`, which buffers values and mangles exact numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRecord {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub amount: Option<NumberLiteral>,
    pub catalyst_amount: Option<NumberLiteral>,
    pub probability: Option<NumberLiteral>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeRecord {
    pub name: Option<String>,
    pub category: Option<String>,
    pub ingredients: Option<Vec<IngredientRecord>>,
    pub products: Option<Vec<ProductRecord>>,
    pub energy: Option<NumberLiteral>,
}

fn number_or(value: Option<&NumberLiteral>, default: u32) -> Result<ExactDecimal> {
    match value {
        Some(literal) => ExactDecimal::parse(literal),
        None => ExactDecimal::parse(default),
    }
}

fn to_ingredient(
    path: &str,
    name: Option<&String>,
    kind: Option<&String>,
    amount: Option<&NumberLiteral>,
    catalyst_amount: Option<&NumberLiteral>,
) -> Result<Ingredient> {
    let name = name.ok_or_else(|| RecipeError::missing(format!("{path}.name")))?;
    let kind = kind.ok_or_else(|| RecipeError::missing(format!("{path}.type")))?;
    let item = ItemQuantity::new(
        name.as_str(),
        kind.as_str(),
        number_or(amount, DEFAULT_AMOUNT)?,
    );
    Ok(Ingredient::new(item).with_catalyst(number_or(catalyst_amount, DEFAULT_CATALYST)?))
}

impl IngredientRecord {
    fn to_ingredient(&self, path: &str) -> Result<Ingredient> {
        to_ingredient(
            path,
            self.name.as_ref(),
            self.kind.as_ref(),
            self.amount.as_ref(),
            self.catalyst_amount.as_ref(),
        )
    }
}

impl ProductRecord {
    fn to_product(&self, path: &str) -> Result<ProductEntry> {
        let base = to_ingredient(
            path,
            self.name.as_ref(),
            self.kind.as_ref(),
            self.amount.as_ref(),
            self.catalyst_amount.as_ref(),
        )?;
        Ok(ProductEntry {
            base,
            probability: number_or(self.probability.as_ref(), DEFAULT_PROBABILITY)?,
        })
    }
}

impl Recipe {
    /// Build a recipe from an input record, applying the field defaults.
    pub fn from_record(record: &RecipeRecord) -> Result<Recipe> {
        let name = record.name.clone().ok_or_else(|| RecipeError::missing("name"))?;
        let category = record
            .category
            .clone()
            .ok_or_else(|| RecipeError::missing("category"))?;
        let ingredients = record
            .ingredients
            .as_ref()
            .ok_or_else(|| RecipeError::missing("ingredients"))?;
        let products = record
            .products
            .as_ref()
            .ok_or_else(|| RecipeError::missing("products"))?;
        let energy = record
            .energy
            .as_ref()
            .ok_or_else(|| RecipeError::missing("energy"))?;

        Ok(Recipe {
            name,
            category,
            ingredients: ingredients
                .iter()
                .enumerate()
                .map(|(i, r)| r.to_ingredient(&format!("ingredients[{i}]")))
                .collect::<Result<_>>()?,
            products: products
                .iter()
                .enumerate()
                .map(|(i, r)| r.to_product(&format!("products[{i}]")))
                .collect::<Result<_>>()?,
            energy: ExactDecimal::parse(energy)?,
        })
    }
}
