//! Process graph construction
//!
//! Expands "which recipes make item X" into a tree of alternatives, one
//! node per item name. Nodes are stored in an arena owned by the builder
//! and referenced by [`ProcessId`], so a node reached from several recipes
//! (or from itself, through a cycle) is the same node every time.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::book::RecipeBook;
use crate::error::Result;
use crate::models::NetRecipe;

/// Handle to a node inside one [`ProcessGraphBuilder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(usize);

/// All known ways to produce one item
#[derive(Debug, Clone)]
pub struct ProcessNode {
    pub product: String,
    pub alternatives: Vec<ProcessEdge>,
}

impl ProcessNode {
    /// No recipe produces this item
    pub fn is_raw(&self) -> bool {
        self.alternatives.is_empty()
    }
}

/// One recipe yielding the node's product, with a node per distinct ingredient
#[derive(Debug, Clone)]
pub struct ProcessEdge {
    pub recipe: Arc<NetRecipe>,
    pub inputs: Vec<ProcessId>,
}

#[derive(Debug, Default)]
pub struct ProcessGraphBuilder {
    producers: HashMap<String, Vec<Arc<NetRecipe>>>,
    nodes: Vec<ProcessNode>,
    cache: HashMap<String, ProcessId>,
    in_progress: HashSet<ProcessId>,
}

impl ProcessGraphBuilder {
    /// Index `recipes` by the items they produce, keeping their order.
    pub fn new(recipes: impl IntoIterator<Item = NetRecipe>) -> Self {
        let mut producers: HashMap<String, Vec<Arc<NetRecipe>>> = HashMap::new();
        for recipe in recipes {
            let recipe = Arc::new(recipe);
            let mut seen = HashSet::new();
            for product in &recipe.products {
                if seen.insert(product.name.as_str()) {
                    producers
                        .entry(product.name.clone())
                        .or_default()
                        .push(Arc::clone(&recipe));
                }
            }
        }
        debug!(items = producers.len(), "indexed recipe producers");
        ProcessGraphBuilder {
            producers,
            ..Default::default()
        }
    }

    pub fn from_book(book: &RecipeBook) -> Result<Self> {
        Ok(Self::new(book.net_recipes()?))
    }

    /// Recipes that produce `product`, in index order
    pub fn producers(&self, product: &str) -> &[Arc<NetRecipe>] {
        self.producers.get(product).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Node for `product`, building it (and everything below it) on first use.
    ///
    /// Unknown items yield a node without alternatives. The node is cached
    /// before its ingredients are expanded, so an ingredient that leads back
    /// to `product` resolves to this same node instead of being expanded
    /// again. Expansion runs on an explicit work stack, so chain depth is
    /// bounded by memory rather than by the thread's stack.
    pub fn get_process(&mut self, product: &str) -> ProcessId {
        if let Some(&id) = self.cache.get(product) {
            trace!(product, "process cache hit");
            return id;
        }

        let root = self.open(product);
        let root_id = root.id;
        let mut stack = vec![root];

        while let Some(frame) = stack.last_mut() {
            if let Some(ingredient) = frame.next_ingredient() {
                match self.cache.get(&ingredient).copied() {
                    Some(input) => {
                        if self.in_progress.contains(&input) {
                            debug!(
                                product = %self.nodes[frame.id.0].product,
                                recipe = %frame.current_recipe(),
                                ingredient = %ingredient,
                                "cyclic dependency, linking to node under construction"
                            );
                        }
                        frame.inputs.push(input);
                    }
                    None => {
                        let child = self.open(&ingredient);
                        stack.push(child);
                    }
                }
                continue;
            }

            let Some(done) = stack.pop() else { break };
            let id = self.close(done);
            if let Some(parent) = stack.last_mut() {
                parent.inputs.push(id);
            }
        }

        root_id
    }

    /// Register the placeholder node for `product` and start expanding it
    fn open(&mut self, product: &str) -> Frame {
        let id = ProcessId(self.nodes.len());
        self.nodes.push(ProcessNode {
            product: product.to_string(),
            alternatives: Vec::new(),
        });
        self.cache.insert(product.to_string(), id);
        self.in_progress.insert(id);
        debug!(product, "expanding process");
        Frame::new(id, self.producers(product).to_vec())
    }

    fn close(&mut self, frame: Frame) -> ProcessId {
        self.in_progress.remove(&frame.id);
        self.nodes[frame.id.0].alternatives = frame.alternatives;
        frame.id
    }

    /// Node for an id handed out by this builder
    ///
    /// # Panics
    ///
    /// Panics if `id` was handed out by a different builder holding fewer
    /// nodes. Use [`ProcessGraphBuilder::get`] when the origin is unknown.
    pub fn node(&self, id: ProcessId) -> &ProcessNode {
        &self.nodes[id.0]
    }

    /// Node for `id`, or `None` if `id` is past the last node built here
    pub fn get(&self, id: ProcessId) -> Option<&ProcessNode> {
        self.nodes.get(id.0)
    }

    /// Cached node id for `product`, without building anything
    pub fn lookup(&self, product: &str) -> Option<ProcessId> {
        self.cache.get(product).copied()
    }

    /// Number of nodes built so far
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn render(&self, root: ProcessId, max_depth: Option<usize>) -> ProcessTree<'_> {
        ProcessTree {
            builder: self,
            root,
            max_depth,
        }
    }

    /// Every recipe and raw item reachable from `root`
    pub fn summarize(&self, root: ProcessId) -> ProcessSummary {
        let mut recipes = BTreeSet::new();
        let mut raw_items = BTreeSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = self.node(id);
            if node.is_raw() {
                raw_items.insert(node.product.clone());
            }
            for edge in &node.alternatives {
                recipes.insert(edge.recipe.name.clone());
                stack.extend(edge.inputs.iter().copied());
            }
        }

        ProcessSummary {
            product: self.node(root).product.clone(),
            recipes: recipes.into_iter().collect(),
            raw_items: raw_items.into_iter().collect(),
        }
    }
}

/// Expansion state of one node on the `get_process` work stack
struct Frame {
    id: ProcessId,
    recipes: Vec<Arc<NetRecipe>>,
    recipe: usize,
    ingredient: usize,
    seen: HashSet<String>,
    inputs: Vec<ProcessId>,
    alternatives: Vec<ProcessEdge>,
}

impl Frame {
    fn new(id: ProcessId, recipes: Vec<Arc<NetRecipe>>) -> Self {
        Frame {
            id,
            alternatives: Vec::with_capacity(recipes.len()),
            recipes,
            recipe: 0,
            ingredient: 0,
            seen: HashSet::new(),
            inputs: Vec::new(),
        }
    }

    fn current_recipe(&self) -> &str {
        self.recipes
            .get(self.recipe)
            .map_or("", |recipe| recipe.name.as_str())
    }

    /// Next distinct ingredient to resolve, closing finished edges on the way
    fn next_ingredient(&mut self) -> Option<String> {
        while let Some(recipe) = self.recipes.get(self.recipe) {
            if let Some(ingredient) = recipe.ingredients.get(self.ingredient) {
                self.ingredient += 1;
                if self.seen.insert(ingredient.name.clone()) {
                    return Some(ingredient.name.clone());
                }
                continue;
            }
            self.alternatives.push(ProcessEdge {
                recipe: Arc::clone(recipe),
                inputs: std::mem::take(&mut self.inputs),
            });
            self.seen.clear();
            self.recipe += 1;
            self.ingredient = 0;
        }
        None
    }
}

/// Indented, depth-first rendering of a process node
pub struct ProcessTree<'a> {
    builder: &'a ProcessGraphBuilder,
    root: ProcessId,
    max_depth: Option<usize>,
}

enum Step {
    Node { id: ProcessId, depth: usize },
    Edge { edge: usize, of: ProcessId, depth: usize },
    Leave(ProcessId),
}

impl fmt::Display for ProcessTree<'_> {
    /// Nodes already expanded elsewhere in the tree print as `(see above)`;
    /// a node that is its own ancestor prints as `(cycle)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = HashSet::new();
        let mut expanded = HashSet::new();
        let mut steps = vec![Step::Node {
            id: self.root,
            depth: 0,
        }];

        while let Some(step) = steps.pop() {
            match step {
                Step::Leave(id) => {
                    path.remove(&id);
                }
                Step::Edge { edge, of, depth } => {
                    let recipe = &self.builder.node(of).alternatives[edge].recipe;
                    writeln!(
                        f,
                        "{}  <- {} [{}]",
                        indent(depth),
                        recipe.name,
                        recipe.category
                    )?;
                }
                Step::Node { id, depth } => {
                    let node = self.builder.node(id);
                    let prefix = indent(depth);
                    if node.is_raw() {
                        writeln!(f, "{}{} (raw)", prefix, node.product)?;
                    } else if path.contains(&id) {
                        writeln!(f, "{}{} (cycle)", prefix, node.product)?;
                    } else if expanded.contains(&id) {
                        writeln!(f, "{}{} (see above)", prefix, node.product)?;
                    } else if self.max_depth.is_some_and(|max| depth >= max) {
                        writeln!(f, "{}{} ...", prefix, node.product)?;
                    } else {
                        writeln!(f, "{}{}", prefix, node.product)?;
                        path.insert(id);
                        expanded.insert(id);
                        steps.push(Step::Leave(id));
                        for (index, edge) in node.alternatives.iter().enumerate().rev() {
                            steps.extend(edge.inputs.iter().rev().map(|&input| Step::Node {
                                id: input,
                                depth: depth + 1,
                            }));
                            steps.push(Step::Edge {
                                edge: index,
                                of: id,
                                depth,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth * 2)
}

/// Recipes and raw inputs involved in producing one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSummary {
    pub product: String,
    pub recipes: Vec<String>,
    pub raw_items: Vec<String>,
}

impl fmt::Display for ProcessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Process Summary ===")?;
        writeln!(f, "Target: {}", self.product)?;
        writeln!(f)?;

        writeln!(f, "Recipes involved ({}):", self.recipes.len())?;
        for name in &self.recipes {
            writeln!(f, "  {}", name)?;
        }
        writeln!(f)?;

        writeln!(f, "Raw inputs ({}):", self.raw_items.len())?;
        for name in &self.raw_items {
            writeln!(f, "  {}", name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::ExactDecimal;
    use crate::models::ItemQuantity;

    fn recipe(name: &str, inputs: &[&str], outputs: &[&str]) -> NetRecipe {
        let item = |n: &&str| ItemQuantity::new(*n, "item", ExactDecimal::ONE);
        NetRecipe {
            name: name.to_string(),
            category: "crafting".to_string(),
            ingredients: inputs.iter().map(item).collect(),
            products: outputs.iter().map(item).collect(),
            energy: ExactDecimal::ONE,
        }
    }

    fn circuits() -> ProcessGraphBuilder {
        ProcessGraphBuilder::new([
            recipe("iron-plate", &["iron-ore"], &["iron-plate"]),
            recipe("copper-plate", &["copper-ore"], &["copper-plate"]),
            recipe("copper-cable", &["copper-plate"], &["copper-cable"]),
            recipe(
                "electronic-circuit",
                &["iron-plate", "copper-cable"],
                &["electronic-circuit"],
            ),
            recipe("scrap-recycling", &["scrap"], &["iron-plate", "copper-plate"]),
        ])
    }

    #[test]
    fn repeated_queries_return_the_cached_node() {
        let mut builder = circuits();
        let first = builder.get_process("electronic-circuit");
        let nodes = builder.len();
        let second = builder.get_process("electronic-circuit");
        assert_eq!(first, second);
        assert!(std::ptr::eq(builder.node(first), builder.node(second)));
        assert_eq!(builder.len(), nodes);
    }

    #[test]
    fn shared_ingredients_resolve_to_one_node() {
        let mut builder = circuits();
        let circuit = builder.get_process("electronic-circuit");
        let edge = &builder.node(circuit).alternatives[0];
        let iron_via_circuit = edge.inputs[0];
        assert_eq!(builder.lookup("iron-plate"), Some(iron_via_circuit));
        assert_eq!(builder.get_process("iron-plate"), iron_via_circuit);
    }

    #[test]
    fn alternatives_follow_index_order_and_share_recipes() {
        let mut builder = circuits();
        let iron = builder.get_process("iron-plate");
        let copper = builder.get_process("copper-plate");
        let names: Vec<_> = builder
            .node(iron)
            .alternatives
            .iter()
            .map(|e| e.recipe.name.as_str())
            .collect();
        assert_eq!(names, ["iron-plate", "scrap-recycling"]);
        assert!(Arc::ptr_eq(
            &builder.node(iron).alternatives[1].recipe,
            &builder.node(copper).alternatives[1].recipe
        ));
    }

    #[test]
    fn unknown_item_is_a_raw_node() {
        let mut builder = circuits();
        let id = builder.get_process("nonexistent-item");
        let node = builder.node(id);
        assert_eq!(node.product, "nonexistent-item");
        assert!(node.alternatives.is_empty());
        assert!(node.is_raw());
    }

    #[test]
    fn cyclic_universe_terminates() {
        let mut builder = ProcessGraphBuilder::new([
            recipe("r1", &["a"], &["b"]),
            recipe("r2", &["b"], &["a"]),
        ]);
        let a = builder.get_process("a");
        let b = builder.get_process("b");
        assert_eq!(builder.len(), 2);
        assert_eq!(builder.node(a).alternatives[0].inputs, [b]);
        assert_eq!(builder.node(b).alternatives[0].inputs, [a]);

        let tree = builder.render(a, None).to_string();
        assert_eq!(tree, "a\n  <- r2 [crafting]\n    b\n      <- r1 [crafting]\n        a (cycle)\n");
    }

    #[test]
    fn self_consuming_recipe_links_to_itself() {
        let mut builder = ProcessGraphBuilder::new([recipe("breeder", &["seed", "water"], &["seed"])]);
        let seed = builder.get_process("seed");
        let water = builder.lookup("water").unwrap();
        assert_eq!(builder.node(seed).alternatives[0].inputs, [seed, water]);
    }

    #[test]
    fn duplicate_ingredient_names_are_expanded_once() {
        let mut builder = ProcessGraphBuilder::new([recipe("mix", &["a", "a", "b"], &["c"])]);
        let c = builder.get_process("c");
        assert_eq!(builder.node(c).alternatives[0].inputs.len(), 2);
    }

    #[test]
    fn render_is_indented_depth_first() {
        let mut builder = circuits();
        let cable = builder.get_process("copper-cable");
        let expected = "\
copper-cable
  <- copper-cable [crafting]
    copper-plate
      <- copper-plate [crafting]
        copper-ore (raw)
      <- scrap-recycling [crafting]
        scrap (raw)
";
        assert_eq!(builder.render(cable, None).to_string(), expected);
        assert_eq!(
            builder.render(cable, Some(1)).to_string(),
            "copper-cable\n  <- copper-cable [crafting]\n    copper-plate ...\n"
        );
    }

    #[test]
    fn summary_collects_recipes_and_raw_items() {
        let mut builder = circuits();
        let circuit = builder.get_process("electronic-circuit");
        let summary = builder.summarize(circuit);
        assert_eq!(summary.product, "electronic-circuit");
        assert_eq!(
            summary.recipes,
            [
                "copper-cable",
                "copper-plate",
                "electronic-circuit",
                "iron-plate",
                "scrap-recycling"
            ]
        );
        assert_eq!(summary.raw_items, ["copper-ore", "iron-ore", "scrap"]);
        assert!(summary.to_string().contains("Raw inputs (3):"));
    }

    #[test]
    fn shared_subtrees_are_rendered_once() {
        let mut builder = ProcessGraphBuilder::new([
            recipe("top", &["left", "right"], &["top"]),
            recipe("left", &["base"], &["left"]),
            recipe("right", &["base"], &["right"]),
            recipe("base", &["ore"], &["base"]),
        ]);
        let top = builder.get_process("top");
        let expected = "\
top
  <- top [crafting]
    left
      <- left [crafting]
        base
          <- base [crafting]
            ore (raw)
    right
      <- right [crafting]
        base (see above)
";
        assert_eq!(builder.render(top, None).to_string(), expected);
    }

    #[test]
    fn long_chains_do_not_exhaust_the_stack() {
        const DEPTH: usize = 100_000;
        let chain = (0..DEPTH).map(|i| {
            let input = format!("i{}", i + 1);
            let output = format!("i{}", i);
            recipe(&format!("r{}", i), &[input.as_str()], &[output.as_str()])
        });
        let mut builder = ProcessGraphBuilder::new(chain);

        let top = builder.get_process("i0");
        assert_eq!(builder.len(), DEPTH + 1);
        let next = builder.lookup("i1").unwrap();
        assert_eq!(builder.node(top).alternatives[0].inputs, [next]);
        let bottom = builder.lookup(&format!("i{}", DEPTH)).unwrap();
        assert!(builder.node(bottom).is_raw());

        let summary = builder.summarize(top);
        assert_eq!(summary.recipes.len(), DEPTH);
        assert_eq!(summary.raw_items, [format!("i{}", DEPTH)]);
        assert!(builder.render(top, Some(3)).to_string().ends_with("i3 ...\n"));
    }

    #[test]
    fn foreign_ids_are_not_resolved() {
        let mut big = circuits();
        let circuit = big.get_process("electronic-circuit");
        let mut small = ProcessGraphBuilder::new(Vec::new());
        small.get_process("a");
        assert!(small.get(circuit).is_none());
        assert!(big.get(circuit).is_some());
    }

    #[test]
    #[should_panic]
    fn node_panics_on_a_foreign_id() {
        let mut big = circuits();
        let circuit = big.get_process("electronic-circuit");
        ProcessGraphBuilder::new(Vec::new()).node(circuit);
    }

    #[test]
    fn builders_do_not_share_state() {
        let mut first = circuits();
        let second = circuits();
        first.get_process("electronic-circuit");
        assert!(second.is_empty());
        assert_eq!(second.lookup("electronic-circuit"), None);
    }
}
