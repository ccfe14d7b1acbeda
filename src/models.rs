//! Data models for recipes and their net form

use std::fmt;

use crate::decimal::ExactDecimal;
use crate::error::{ItemRole, RecipeError, Result};

/// A named amount of an item or fluid
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemQuantity {
    pub name: String,
    pub kind: String, // item, fluid
    pub amount: ExactDecimal,
}

impl ItemQuantity {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, amount: ExactDecimal) -> Self {
        ItemQuantity {
            name: name.into(),
            kind: kind.into(),
            amount,
        }
    }

    fn with_amount(&self, amount: ExactDecimal) -> Self {
        ItemQuantity {
            name: self.name.clone(),
            kind: self.kind.clone(),
            amount,
        }
    }

    pub fn scale(&self, factor: ExactDecimal) -> Result<Self> {
        Ok(self.with_amount(self.amount.checked_mul(factor)?))
    }

    pub fn divide(&self, factor: ExactDecimal) -> Result<Self> {
        Ok(self.with_amount(self.amount.divide(factor)?))
    }
}

impl fmt::Display for ItemQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>12} {} ({})", self.amount, self.name, self.kind)
    }
}

/// A recipe input, part of which may be handed back by the recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub item: ItemQuantity,
    pub catalyst_amount: ExactDecimal,
}

impl Ingredient {
    pub fn new(item: ItemQuantity) -> Self {
        Ingredient {
            item,
            catalyst_amount: ExactDecimal::ZERO,
        }
    }

    pub fn with_catalyst(mut self, catalyst_amount: ExactDecimal) -> Self {
        self.catalyst_amount = catalyst_amount;
        self
    }

    /// Amount actually consumed, i.e. without the catalyst share
    pub fn net(&self) -> Result<ItemQuantity> {
        let amount = self.item.amount.checked_sub(self.catalyst_amount)?;
        Ok(self.item.with_amount(amount))
    }
}

/// A recipe output with a catalyst share and a chance of being produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductEntry {
    pub base: Ingredient,
    pub probability: ExactDecimal,
}

impl ProductEntry {
    pub fn new(item: ItemQuantity) -> Self {
        ProductEntry {
            base: Ingredient::new(item),
            probability: ExactDecimal::ONE,
        }
    }

    pub fn with_catalyst(mut self, catalyst_amount: ExactDecimal) -> Self {
        self.base.catalyst_amount = catalyst_amount;
        self
    }

    pub fn with_probability(mut self, probability: ExactDecimal) -> Self {
        self.probability = probability;
        self
    }

    pub fn item(&self) -> &ItemQuantity {
        &self.base.item
    }

    /// Expected amount gained per execution
    ///
    /// The probability is folded in as a plain factor: over many executions
    /// the yield converges on `(amount - catalyst) * probability`.
    pub fn net(&self) -> Result<ItemQuantity> {
        let net = self.base.net()?;
        let amount = net.amount.checked_mul(self.probability)?;
        Ok(net.with_amount(amount))
    }
}

/// A recipe as described by the game data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    pub category: String,
    pub ingredients: Vec<Ingredient>,
    pub products: Vec<ProductEntry>,
    pub energy: ExactDecimal,
}

impl Recipe {
    /// Derive the catalyst-free, probability-resolved form of this recipe.
    ///
    /// Items whose net amount is zero or negative are dropped. Fails only
    /// when an amount leaves the representable range.
    pub fn net(&self) -> Result<NetRecipe> {
        Ok(NetRecipe {
            name: self.name.clone(),
            category: self.category.clone(),
            ingredients: positive(self.ingredients.iter().map(Ingredient::net))?,
            products: positive(self.products.iter().map(ProductEntry::net))?,
            energy: self.energy,
        })
    }
}

fn positive(items: impl Iterator<Item = Result<ItemQuantity>>) -> Result<Vec<ItemQuantity>> {
    let mut kept = Vec::new();
    for item in items {
        let item = item?;
        if item.amount.is_positive() {
            kept.push(item);
        }
    }
    Ok(kept)
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Recipe {} [{}]", self.name, self.category)?;
        writeln!(f, "  energy: {}", self.energy)?;
        writeln!(f, "  ingredients:")?;
        for ingredient in &self.ingredients {
            write!(f, "    {}", ingredient.item)?;
            if !ingredient.catalyst_amount.is_zero() {
                write!(f, ", catalyst {}", ingredient.catalyst_amount)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  products:")?;
        for product in &self.products {
            write!(f, "    {}", product.item())?;
            if !product.base.catalyst_amount.is_zero() {
                write!(f, ", catalyst {}", product.base.catalyst_amount)?;
            }
            if product.probability != ExactDecimal::ONE {
                write!(f, ", probability {}", product.probability)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Recipe with catalysts removed and product probabilities resolved
///
/// All transforms return a new recipe; a `NetRecipe` is never modified in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetRecipe {
    pub name: String,
    pub category: String,
    pub ingredients: Vec<ItemQuantity>,
    pub products: Vec<ItemQuantity>,
    pub energy: ExactDecimal,
}

impl NetRecipe {
    /// Multiply every amount and the energy by `factor`
    pub fn scale(&self, factor: ExactDecimal) -> Result<NetRecipe> {
        Ok(NetRecipe {
            name: self.name.clone(),
            category: self.category.clone(),
            ingredients: scale_all(&self.ingredients, factor)?,
            products: scale_all(&self.products, factor)?,
            energy: self.energy.checked_mul(factor)?,
        })
    }

    /// Divide every amount and the energy by `factor`
    pub fn divide(&self, factor: ExactDecimal) -> Result<NetRecipe> {
        if factor.is_zero() {
            return Err(RecipeError::DivisionByZero);
        }
        Ok(NetRecipe {
            name: self.name.clone(),
            category: self.category.clone(),
            ingredients: self
                .ingredients
                .iter()
                .map(|i| i.divide(factor))
                .collect::<Result<_>>()?,
            products: self
                .products
                .iter()
                .map(|p| p.divide(factor))
                .collect::<Result<_>>()?,
            energy: self.energy.divide(factor)?,
        })
    }

    /// Rescale so that a quantity currently worth `target` becomes one unit
    pub fn normalize_to(&self, target: ExactDecimal) -> Result<NetRecipe> {
        self.divide(target)
    }

    pub fn normalize_to_item(&self, item: &ItemQuantity) -> Result<NetRecipe> {
        self.normalize_to(item.amount)
    }

    pub fn normalize_to_energy(&self) -> Result<NetRecipe> {
        self.normalize_to(self.energy)
    }

    pub fn ingredient(&self, index: usize) -> Result<&ItemQuantity> {
        self.ingredients
            .get(index)
            .ok_or(RecipeError::IndexOutOfRange {
                role: ItemRole::Ingredient,
                index,
                len: self.ingredients.len(),
            })
    }

    pub fn product(&self, index: usize) -> Result<&ItemQuantity> {
        self.products.get(index).ok_or(RecipeError::IndexOutOfRange {
            role: ItemRole::Product,
            index,
            len: self.products.len(),
        })
    }

    pub fn normalize_to_ingredient(&self, index: usize) -> Result<NetRecipe> {
        self.normalize_to_item(self.ingredient(index)?)
    }

    pub fn normalize_to_product(&self, index: usize) -> Result<NetRecipe> {
        self.normalize_to_item(self.product(index)?)
    }

    /// Model `crafters` copies of this recipe running side by side.
    ///
    /// Item amounts scale with the crafter count while the energy (the time
    /// one batch takes) stays the same. The result is a distinct recipe and is
    /// renamed `<name> x<crafters>`.
    pub fn parallelize(&self, crafters: ExactDecimal) -> Result<NetRecipe> {
        Ok(NetRecipe {
            name: format!("{} x{}", self.name, crafters.to_plain_string()),
            category: self.category.clone(),
            ingredients: scale_all(&self.ingredients, crafters)?,
            products: scale_all(&self.products, crafters)?,
            energy: self.energy,
        })
    }

    /// Scale the recipe to yield `target` units of the given product per unit
    /// of energy.
    pub fn target_product_per_energy(
        &self,
        product_index: usize,
        target: ExactDecimal,
    ) -> Result<NetRecipe> {
        let energy_per_unit = self.normalize_to_product(product_index)?.energy;
        let crafters = energy_per_unit.checked_mul(target)?;
        self.parallelize(crafters)?.normalize_to_energy()
    }
}

fn scale_all(items: &[ItemQuantity], factor: ExactDecimal) -> Result<Vec<ItemQuantity>> {
    items.iter().map(|i| i.scale(factor)).collect()
}

impl fmt::Display for NetRecipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "NetRecipe {} [{}]", self.name, self.category)?;
        writeln!(f, "  energy: {}", self.energy)?;
        writeln!(f, "  ingredients:")?;
        for ingredient in &self.ingredients {
            writeln!(f, "    {}", ingredient)?;
        }
        writeln!(f, "  products:")?;
        for product in &self.products {
            writeln!(f, "    {}", product)?;
        }
        Ok(())
    }
}
