//! In-memory recipe universe

use std::collections::{BTreeSet, HashMap};

use regex::Regex;
use tracing::warn;

use crate::error::Result;
use crate::models::{ItemQuantity, NetRecipe, Recipe};

/// Recipes keyed by name, kept in the order they were added
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    recipes: Vec<Recipe>,
    by_name: HashMap<String, usize>,
}

impl RecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipe. A recipe with the same name is replaced in place.
    pub fn insert(&mut self, recipe: Recipe) {
        match self.by_name.get(&recipe.name) {
            Some(&index) => {
                warn!(recipe = %recipe.name, "duplicate recipe name, replacing earlier definition");
                self.recipes[index] = recipe;
            }
            None => {
                self.by_name.insert(recipe.name.clone(), self.recipes.len());
                self.recipes.push(recipe);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.by_name.get(name).map(|&i| &self.recipes[i])
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    /// Net form of every recipe, in insertion order
    pub fn net_recipes(&self) -> Result<Vec<NetRecipe>> {
        self.recipes.iter().map(Recipe::net).collect()
    }

    pub fn matching<'a>(&'a self, pattern: &'a Regex) -> impl Iterator<Item = &'a Recipe> + 'a {
        self.recipes.iter().filter(|r| pattern.is_match(&r.name))
    }

    /// Every item some recipe yields a positive net amount of
    pub fn producible_items(&self) -> Result<Vec<String>> {
        let nets = self.net_recipes()?;
        Ok(item_names(nets.iter().flat_map(|net| &net.products))
            .into_iter()
            .collect())
    }

    /// Items consumed by some recipe but produced by none
    pub fn raw_items(&self) -> Result<Vec<String>> {
        let nets = self.net_recipes()?;
        let produced = item_names(nets.iter().flat_map(|net| &net.products));
        Ok(item_names(nets.iter().flat_map(|net| &net.ingredients))
            .into_iter()
            .filter(|name| !produced.contains(name))
            .collect())
    }
}

fn item_names<'a>(items: impl Iterator<Item = &'a ItemQuantity>) -> BTreeSet<String> {
    items.map(|item| item.name.clone()).collect()
}

impl FromIterator<Recipe> for RecipeBook {
    fn from_iter<I: IntoIterator<Item = Recipe>>(iter: I) -> Self {
        let mut book = RecipeBook::new();
        for recipe in iter {
            book.insert(recipe);
        }
        book
    }
}
