//! Recipe loading from JSON data files
//!
//! A data file holds a JSON array of recipe records. A directory is searched
//! recursively for `*.json` files, which are loaded in file name order.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::Recipe;
use crate::record::RecipeRecord;

/// Find all recipe data files below `dir`
pub fn find_recipe_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect()
}

/// Parse a JSON array of recipe records.
///
/// Records that fail to convert are logged and counted, not returned as errors.
pub fn parse_recipes(json: &str) -> Result<(Vec<Recipe>, usize)> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(json).context("expected a JSON array of recipe records")?;

    let mut recipes = Vec::with_capacity(values.len());
    let mut skipped = 0;
    for (index, value) in values.into_iter().enumerate() {
        let label = value
            .get("name")
            .and_then(|n| n.as_str())
            .map_or_else(|| format!("#{index}"), str::to_string);

        let converted = serde_json::from_value::<RecipeRecord>(value)
            .map_err(anyhow::Error::from)
            .and_then(|record| Recipe::from_record(&record).map_err(anyhow::Error::from));

        match converted {
            Ok(recipe) => recipes.push(recipe),
            Err(e) => {
                warn!(record = %label, "skipping recipe record: {:#}", e);
                skipped += 1;
            }
        }
    }

    Ok((recipes, skipped))
}

fn load_file(path: &Path, stats: &mut LoadStats) -> Result<Vec<Recipe>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let (recipes, skipped) =
        parse_recipes(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

    debug!(
        file = %path.display(),
        recipes = recipes.len(),
        skipped,
        "loaded recipe file"
    );
    stats.files += 1;
    stats.recipes += recipes.len();
    stats.skipped += skipped;
    Ok(recipes)
}

/// Load recipes from a data file or from every data file below a directory
pub fn load_recipes(path: &Path) -> Result<(Vec<Recipe>, LoadStats)> {
    let mut stats = LoadStats::default();

    if path.is_dir() {
        let files = find_recipe_files(path);
        info!("Found {} recipe files in {}", files.len(), path.display());
        if files.is_empty() {
            bail!("no recipe files (*.json) found in {}", path.display());
        }

        let mut recipes = Vec::new();
        for file in &files {
            recipes.extend(load_file(file, &mut stats)?);
        }
        return Ok((recipes, stats));
    }

    let recipes = load_file(path, &mut stats)?;
    Ok((recipes, stats))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadStats {
    pub files: usize,
    pub recipes: usize,
    pub skipped: usize,
}

impl fmt::Display for LoadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loaded {} recipes from {} file(s). Skipped: {}",
            self.recipes, self.files, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_bad_records_and_keeps_the_rest() {
        let json = r#"[
            {"name": "ok", "category": "c", "energy": 1, "ingredients": [], "products": []},
            {"name": "no-energy", "category": "c", "ingredients": [], "products": []},
            {"name": "bad-number", "category": "c", "energy": "x", "ingredients": [], "products": []},
            {"name": 5}
        ]"#;
        let (recipes, skipped) = parse_recipes(json).unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "ok");
        assert_eq!(skipped, 3);
    }

    #[test]
    fn rejects_non_array_documents() {
        assert!(parse_recipes(r#"{"name": "x"}"#).is_err());
        assert!(parse_recipes("not json").is_err());
    }

    #[test]
    fn stats_display() {
        let stats = LoadStats {
            files: 2,
            recipes: 10,
            skipped: 1,
        };
        assert_eq!(
            stats.to_string(),
            "Loaded 10 recipes from 2 file(s). Skipped: 1"
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_recipes(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
