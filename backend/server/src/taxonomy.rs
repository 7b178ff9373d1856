//! # Taxonomy Tree
//!
//! Small illustrative tree around one species: its lineage from kingdom to genus, a few relatives,
//! laid out top to bottom for any 2D drawing surface.
//!
//! ## Shape
//! - Lineage chain, `?` placeholders for blank ranks
//! - The species itself under its genus, tagged `focus`
//! - Up to 3 other species of the genus
//! - Up to 2 other genera of the family, one species each
//! - Up to 1 other family of the order, no species
//!
//! Relatives are sampled with a stream seeded by the focal name, the same species always draws the
//! same tree.
//!
//! ## Layout
//! Tidy tree. Leaves take consecutive columns in visit order, parents sit at the mean of their
//! children, rows are fixed per rank. Species on the bottom row alternate up and down a little so
//! neighbouring labels don't collide.
use std::collections::{BTreeSet, HashMap};

use bank::{Species, SpeciesBank};
use rand::{SeedableRng, rngs::StdRng, seq::index::sample};
use serde::Serialize;

use crate::depth::species_hash;

pub const ROW_HEIGHT: f64 = 100.0;
pub const COL_WIDTH: f64 = 120.0;
pub const LABEL_NUDGE: f64 = 12.5;

const MISSING: &str = "?";
const MAX_SIBLINGS: usize = 3;
const MAX_COUSIN_GENERA: usize = 2;
const MAX_OTHER_FAMILIES: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    pub const LINEAGE: [Rank; 6] = [
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            Rank::Kingdom => "Kingdom",
            Rank::Phylum => "Phylum",
            Rank::Class => "Class",
            Rank::Order => "Order",
            Rank::Family => "Family",
            Rank::Genus => "Genus",
            Rank::Species => "Species",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Taxon,
    Focus,
    Example,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub rank: Rank,
    pub kind: NodeKind,
    pub label: String,
    pub hover: String,
    pub x: f64,
    pub y: f64,
    /// Canonical `Genus species` to navigate to when the node is clicked.
    pub species: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaxonomyTree {
    pub nodes: Vec<TreeNode>,
    pub edges: Vec<TreeEdge>,
    /// Highest rank that is not a placeholder.
    pub root: Option<String>,
}

impl TaxonomyTree {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn resolve_selection(&self, id: &str) -> Option<&str> {
        self.node(id)?.species.as_deref()
    }
}

struct ArenaNode {
    id: String,
    rank: Rank,
    kind: NodeKind,
    label: String,
    hover: String,
    species: Option<String>,
    children: Vec<usize>,
}

#[derive(Default)]
struct Arena {
    nodes: Vec<ArenaNode>,
    ids: HashMap<String, usize>,
    edges: Vec<TreeEdge>,
}

impl Arena {
    /// Existing ids are returned as is, without a second parent.
    fn add(&mut self, parent: Option<usize>, node: ArenaNode) -> usize {
        if let Some(&index) = self.ids.get(&node.id) {
            return index;
        }

        let index = self.nodes.len();
        if let Some(parent) = parent {
            self.edges.push(TreeEdge {
                source: self.nodes[parent].id.clone(),
                target: node.id.clone(),
            });
            self.nodes[parent].children.push(index);
        }

        self.ids.insert(node.id.clone(), index);
        self.nodes.push(node);

        index
    }

    fn add_taxon(&mut self, parent: Option<usize>, rank: Rank, name: Option<&str>) -> usize {
        let node = match name {
            Some(name) => ArenaNode {
                id: name.to_string(),
                rank,
                kind: NodeKind::Taxon,
                label: name.to_string(),
                hover: format!("{}: {name}", rank.title()),
                species: None,
                children: Vec::new(),
            },
            None => ArenaNode {
                id: format!("{MISSING}{}", rank.title()),
                rank,
                kind: NodeKind::Taxon,
                label: MISSING.to_string(),
                hover: format!("{}: unknown", rank.title()),
                species: None,
                children: Vec::new(),
            },
        };

        self.add(parent, node)
    }

    fn add_species(&mut self, parent: usize, species: &Species, kind: NodeKind) -> usize {
        let (label, hover) = match &species.common_name {
            Some(common) => (
                format!("{}\n({common})", species.name),
                format!("{} / {common}", species.name),
            ),
            None => (species.name.clone(), species.name.clone()),
        };

        self.add(
            Some(parent),
            ArenaNode {
                id: species.name.clone(),
                rank: Rank::Species,
                kind,
                label,
                hover,
                species: Some(species.name.clone()),
                children: Vec::new(),
            },
        )
    }

    /// Post-order x placement from `root`, explicit stack.
    fn layout(&self, root: usize) -> Vec<f64> {
        let mut xs = vec![0.0; self.nodes.len()];
        let mut column = 0usize;
        let mut stack = vec![(root, false)];

        while let Some((index, expanded)) = stack.pop() {
            let children = &self.nodes[index].children;

            if children.is_empty() {
                xs[index] = column as f64 * COL_WIDTH;
                column += 1;
            } else if expanded {
                xs[index] =
                    children.iter().map(|&child| xs[child]).sum::<f64>() / children.len() as f64;
            } else {
                stack.push((index, true));
                stack.extend(children.iter().rev().map(|&child| (child, false)));
            }
        }

        xs
    }

    fn into_tree(self, root: Option<String>) -> TaxonomyTree {
        if self.nodes.is_empty() {
            return TaxonomyTree::default();
        }

        let xs = self.layout(0);
        let mut ys: Vec<f64> = self
            .nodes
            .iter()
            .map(|node| -(node.rank.index() as f64) * ROW_HEIGHT)
            .collect();

        let mut bottom_row: Vec<usize> = (0..self.nodes.len())
            .filter(|&index| self.nodes[index].rank == Rank::Species)
            .collect();
        bottom_row.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]).then(a.cmp(&b)));

        for (position, &index) in bottom_row.iter().enumerate() {
            ys[index] += if position % 2 == 0 {
                LABEL_NUDGE
            } else {
                -LABEL_NUDGE
            };
        }

        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| TreeNode {
                id: node.id,
                rank: node.rank,
                kind: node.kind,
                label: node.label,
                hover: node.hover,
                x: xs[index],
                y: ys[index],
                species: node.species,
            })
            .collect();

        TaxonomyTree {
            nodes,
            edges: self.edges,
            root,
        }
    }
}

/// Up to `amount` items, drawn without replacement, returned in their original order.
fn pick<T>(rng: &mut StdRng, items: Vec<T>, amount: usize) -> Vec<T> {
    if items.len() <= amount {
        return items;
    }

    let mut chosen = sample(rng, items.len(), amount).into_vec();
    chosen.sort_unstable();

    let mut items: Vec<Option<T>> = items.into_iter().map(Some).collect();
    chosen
        .into_iter()
        .filter_map(|index| items[index].take())
        .collect()
}

pub fn build_tree(bank: &SpeciesBank, focal: &str) -> TaxonomyTree {
    let Some(species) = bank.get(focal) else {
        return TaxonomyTree::default();
    };

    let mut arena = Arena::default();
    let mut rng = StdRng::seed_from_u64(species_hash(focal));
    let lineage = species.taxonomy.lineage();

    let mut root = None;
    let mut parent = None;
    let mut nodes = [0usize; 6];

    for (rank, name) in Rank::LINEAGE.into_iter().zip(lineage) {
        let index = arena.add_taxon(parent, rank, name);

        if root.is_none() && name.is_some() {
            root = Some(arena.nodes[index].id.clone());
        }

        nodes[rank.index()] = index;
        parent = Some(index);
    }

    let [_, _, _, order, family, genus] = lineage;
    let genus_node = nodes[Rank::Genus.index()];
    arena.add_species(genus_node, species, NodeKind::Focus);

    if let Some(genus) = genus {
        let siblings: Vec<&Species> = bank
            .iter()
            .filter(|record| record.taxonomy.genus.as_deref() == Some(genus))
            .filter(|record| record.name != species.name)
            .collect();

        for sibling in pick(&mut rng, siblings, MAX_SIBLINGS) {
            arena.add_species(genus_node, sibling, NodeKind::Example);
        }
    }

    if let Some(family) = family {
        let family_node = nodes[Rank::Family.index()];
        let genera: BTreeSet<&str> = bank
            .iter()
            .filter(|record| record.taxonomy.family.as_deref() == Some(family))
            .filter_map(|record| record.taxonomy.genus.as_deref())
            .filter(|&other| Some(other) != genus)
            .collect();

        for other in pick(&mut rng, genera.into_iter().collect(), MAX_COUSIN_GENERA) {
            let other_node = arena.add_taxon(Some(family_node), Rank::Genus, Some(other));

            let example = bank.iter().find(|record| {
                record.taxonomy.family.as_deref() == Some(family)
                    && record.taxonomy.genus.as_deref() == Some(other)
            });
            if let Some(example) = example {
                arena.add_species(other_node, example, NodeKind::Example);
            }
        }
    }

    if let Some(order) = order {
        let order_node = nodes[Rank::Order.index()];
        let families: BTreeSet<&str> = bank
            .iter()
            .filter(|record| record.taxonomy.order.as_deref() == Some(order))
            .filter_map(|record| record.taxonomy.family.as_deref())
            .filter(|&other| Some(other) != family)
            .collect();

        for other in pick(&mut rng, families.into_iter().collect(), MAX_OTHER_FAMILIES) {
            arena.add_taxon(Some(order_node), Rank::Family, Some(other));
        }
    }

    arena.into_tree(root)
}

#[cfg(test)]
mod tests {
    use bank::species::{Bank, SpeciesEntry};

    use super::*;

    fn entry(lineage: [&str; 5], name: &str, common: Option<&str>) -> SpeciesEntry {
        let (genus, species) = name.split_once(' ').unwrap();
        let rank = |value: &str| (!value.is_empty()).then(|| value.to_string());

        SpeciesEntry {
            genus: genus.into(),
            species: species.into(),
            common_name: common.map(Into::into),
            has_wiki_page: true,
            depth_shallow: Some(0.0),
            depth_deep: Some(10.0),
            kingdom: rank(lineage[0]),
            phylum: rank(lineage[1]),
            class: rank(lineage[2]),
            order: rank(lineage[3]),
            family: rank(lineage[4]),
            database: 1,
            ..Default::default()
        }
    }

    const SALMONIDAE: [&str; 5] = [
        "Animalia",
        "Chordata",
        "Actinopteri",
        "Salmoniformes",
        "Salmonidae",
    ];
    const COREGONIDAE: [&str; 5] = [
        "Animalia",
        "Chordata",
        "Actinopteri",
        "Salmoniformes",
        "Coregonidae",
    ];

    fn bank() -> SpeciesBank {
        SpeciesBank::from_bank(Bank {
            species: vec![
                entry(SALMONIDAE, "Salmo trutta", Some("Brown trout")),
                entry(SALMONIDAE, "Salmo salar", Some("Atlantic salmon")),
                entry(SALMONIDAE, "Salmo marmoratus", None),
                entry(SALMONIDAE, "Salmo obtusirostris", None),
                entry(SALMONIDAE, "Salmo carpio", None),
                entry(SALMONIDAE, "Oncorhynchus mykiss", Some("Rainbow trout")),
                entry(SALMONIDAE, "Oncorhynchus nerka", None),
                entry(SALMONIDAE, "Salvelinus alpinus", Some("Arctic char")),
                entry(SALMONIDAE, "Thymallus thymallus", Some("Grayling")),
                entry(COREGONIDAE, "Coregonus albula", Some("Vendace")),
                entry(["", "", "Actinopteri", "", ""], "Mystery fish", None),
            ],
        })
    }

    #[test]
    fn test_unknown_species_is_empty() {
        let tree = build_tree(&bank(), "Nemo nobody");

        assert!(tree.is_empty());
        assert!(tree.edges.is_empty());
        assert_eq!(tree.root, None);
    }

    #[test]
    fn test_deterministic() {
        let bank = bank();

        assert_eq!(build_tree(&bank, "Salmo trutta"), build_tree(&bank, "Salmo trutta"));
    }

    #[test]
    fn test_shape() {
        let tree = build_tree(&bank(), "Salmo trutta");

        let focus = tree.node("Salmo trutta").unwrap();
        assert_eq!(focus.kind, NodeKind::Focus);
        assert_eq!(focus.rank, Rank::Species);
        assert_eq!(tree.root.as_deref(), Some("Animalia"));

        let children_of = |id: &str| -> Vec<&str> {
            tree.edges
                .iter()
                .filter(|edge| edge.source == id)
                .map(|edge| edge.target.as_str())
                .collect()
        };

        let genus_children = children_of("Salmo");
        assert_eq!(genus_children.len(), 1 + MAX_SIBLINGS);
        assert!(genus_children.contains(&"Salmo trutta"));

        // Salmo is the focal genus, three others remain in the family.
        let cousins: Vec<&str> = children_of("Salmonidae")
            .into_iter()
            .filter(|&id| id != "Salmo")
            .collect();
        assert_eq!(cousins.len(), MAX_COUSIN_GENERA);
        for cousin in cousins {
            assert_eq!(children_of(cousin).len(), 1);
        }

        assert_eq!(children_of("Salmoniformes"), vec!["Salmonidae", "Coregonidae"]);
        assert!(children_of("Coregonidae").is_empty());

        // Every node but the kingdom has exactly one parent.
        assert_eq!(tree.edges.len(), tree.nodes.len() - 1);
    }

    #[test]
    fn test_placeholders() {
        let tree = build_tree(&bank(), "Mystery fish");

        assert_eq!(tree.root.as_deref(), Some("Actinopteri"));
        assert_eq!(tree.node("?Kingdom").unwrap().label, "?");
        assert_eq!(tree.node("?Phylum").unwrap().hover, "Phylum: unknown");
        assert!(tree.node("?Order").is_some());
        assert!(tree.node("?Family").is_some());

        assert_eq!(tree.nodes.len(), 7);
        assert_eq!(tree.edges.len(), 6);
    }

    #[test]
    fn test_layout() {
        let tree = build_tree(&bank(), "Salmo trutta");

        for node in &tree.nodes {
            let children: Vec<&TreeNode> = tree
                .edges
                .iter()
                .filter(|edge| edge.source == node.id)
                .filter_map(|edge| tree.node(&edge.target))
                .collect();

            if node.rank != Rank::Species {
                assert_eq!(node.y, -(node.rank.index() as f64) * ROW_HEIGHT);
            }

            if !children.is_empty() {
                let mean = children.iter().map(|child| child.x).sum::<f64>() / children.len() as f64;
                assert!((node.x - mean).abs() < 1e-9, "{} not centred", node.id);
            }
        }

        let mut species: Vec<&TreeNode> = tree
            .nodes
            .iter()
            .filter(|node| node.rank == Rank::Species)
            .collect();
        species.sort_by(|a, b| a.x.total_cmp(&b.x));

        let base = -(Rank::Species.index() as f64) * ROW_HEIGHT;
        for (position, node) in species.iter().enumerate() {
            let expected = if position % 2 == 0 { LABEL_NUDGE } else { -LABEL_NUDGE };
            assert_eq!(node.y, base + expected);
        }

        let mut columns: Vec<f64> = species.iter().map(|node| node.x / COL_WIDTH).collect();
        columns.dedup();
        assert_eq!(columns.len(), species.len());
    }

    #[test]
    fn test_labels_and_selection() {
        let tree = build_tree(&bank(), "Salmo trutta");

        let focus = tree.node("Salmo trutta").unwrap();
        assert_eq!(focus.label, "Salmo trutta\n(Brown trout)");
        assert_eq!(focus.hover, "Salmo trutta / Brown trout");
        assert_eq!(tree.node("Salmonidae").unwrap().hover, "Family: Salmonidae");

        assert_eq!(tree.resolve_selection("Salmo trutta"), Some("Salmo trutta"));
        assert_eq!(tree.resolve_selection("Salmonidae"), None);
    }
}
