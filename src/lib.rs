//! Net recipe calculator
//!
//! Removes catalysts and resolves probabilities in production recipes,
//! rescales them to a unit of energy or of a chosen item, and builds the
//! graph of recipes able to produce a given item.

pub mod book;
pub mod decimal;
pub mod error;
pub mod loader;
pub mod logging;
pub mod models;
pub mod process;
pub mod record;

pub use book::RecipeBook;
pub use decimal::{DEFAULT_PRECISION, ExactDecimal};
pub use error::{ItemRole, RecipeError, Result};
pub use models::{Ingredient, ItemQuantity, NetRecipe, ProductEntry, Recipe};
pub use process::{ProcessEdge, ProcessGraphBuilder, ProcessId, ProcessNode, ProcessSummary};
pub use record::RecipeRecord;
