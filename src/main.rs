//! Net Recipe Calculator
//!
//! Inspect recipes in their net form and explore which recipes can
//! produce an item.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use regex::Regex;
use tracing::info;

use recipe_net::{ExactDecimal, ProcessGraphBuilder, Recipe, RecipeBook, loader, logging};

#[derive(Parser)]
#[command(name = "recipe-net")]
#[command(about = "Net recipe arithmetic and production process graphs")]
struct Cli {
    /// Recipe data: a JSON file or a directory of JSON files
    #[arg(short, long, env = "RECIPE_NET_DATA", default_value = "data/recipes.json")]
    data: PathBuf,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, env = "RECIPE_NET_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recipe names
    ListRecipes {
        /// Only names matching this regular expression
        #[arg(short, long)]
        matching: Option<String>,
    },

    /// List items produced by at least one recipe
    ListItems {
        /// Only names matching this regular expression
        #[arg(short, long)]
        matching: Option<String>,

        /// List raw items (consumed but never produced) instead
        #[arg(long)]
        raw: bool,
    },

    /// Show a recipe and its net form
    Show {
        /// Recipe name
        recipe: String,
    },

    /// Show the net form of a recipe, optionally normalized
    Net {
        /// Recipe name
        recipe: String,

        /// Normalize to one unit of energy
        #[arg(long, group = "normalize")]
        energy: bool,

        /// Normalize to one unit of the ingredient at this index
        #[arg(long, group = "normalize")]
        ingredient: Option<usize>,

        /// Normalize to one unit of the product at this index
        #[arg(long, group = "normalize")]
        product: Option<usize>,
    },

    /// Scale a recipe to yield COUNT units of a product per unit of energy
    Target {
        /// Recipe name
        recipe: String,

        /// Index of the product in the net recipe
        #[arg(short, long, default_value = "0")]
        product: usize,

        /// Units of product wanted per unit of energy
        #[arg(short, long)]
        count: ExactDecimal,
    },

    /// Run several crafters of a recipe side by side
    Parallel {
        /// Recipe name
        recipe: String,

        /// Number of crafters
        #[arg(short, long)]
        crafters: ExactDecimal,
    },

    /// Show every way to produce an item
    Tree {
        /// Item name
        item: String,

        /// Stop expanding below this depth
        #[arg(long)]
        depth: Option<usize>,

        /// Print a summary of recipes and raw inputs after the tree
        #[arg(short, long)]
        summary: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let (recipes, stats) = loader::load_recipes(&cli.data)?;
    info!("{}", stats);
    let book: RecipeBook = recipes.into_iter().collect();

    match cli.command {
        Commands::ListRecipes { matching } => {
            let pattern = compile(matching.as_deref())?;
            println!("{:<40} {:<20} {:>12}", "Recipe", "Category", "Energy");
            println!("{}", "-".repeat(74));
            for recipe in book.matching(&pattern) {
                println!(
                    "{:<40} {:<20} {:>12}",
                    recipe.name, recipe.category, recipe.energy
                );
            }
        }

        Commands::ListItems { matching, raw } => {
            let pattern = compile(matching.as_deref())?;
            let items = if raw {
                book.raw_items()?
            } else {
                book.producible_items()?
            };
            let items: Vec<_> = items.into_iter().filter(|i| pattern.is_match(i)).collect();
            if items.is_empty() {
                println!("No matching items.");
            } else {
                println!("{}:", if raw { "Raw items" } else { "Producible items" });
                for item in items {
                    println!("  {}", item);
                }
            }
        }

        Commands::Show { recipe } => {
            let recipe = find(&book, &recipe)?;
            println!("{}", recipe);
            println!("{}", recipe.net()?);
        }

        Commands::Net {
            recipe,
            energy,
            ingredient,
            product,
        } => {
            let net = find(&book, &recipe)?.net()?;
            let net = if energy {
                net.normalize_to_energy()?
            } else if let Some(index) = ingredient {
                net.normalize_to_ingredient(index)?
            } else if let Some(index) = product {
                net.normalize_to_product(index)?
            } else {
                net
            };
            println!("{}", net);
        }

        Commands::Target {
            recipe,
            product,
            count,
        } => {
            let net = find(&book, &recipe)?.net()?;
            println!("{}", net.target_product_per_energy(product, count)?);
        }

        Commands::Parallel { recipe, crafters } => {
            let net = find(&book, &recipe)?.net()?;
            println!("{}", net.parallelize(crafters)?);
        }

        Commands::Tree {
            item,
            depth,
            summary,
        } => {
            let mut builder = ProcessGraphBuilder::from_book(&book)?;
            let root = builder.get_process(&item);
            if builder.node(root).is_raw() {
                println!("No recipe produces '{}'.", item);
            } else {
                print!("{}", builder.render(root, depth));
                if summary {
                    println!();
                    println!("{}", builder.summarize(root));
                }
            }
        }
    }

    Ok(())
}

fn find<'a>(book: &'a RecipeBook, name: &str) -> Result<&'a Recipe> {
    book.get(name)
        .ok_or_else(|| anyhow!("Recipe '{}' not found", name))
}

fn compile(pattern: Option<&str>) -> Result<Regex> {
    Ok(Regex::new(pattern.unwrap_or(""))?)
}
