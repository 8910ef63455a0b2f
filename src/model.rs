use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Deserialize;
use tracing::warn;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpretability {
    Yes,
    #[default]
    No,
}

impl Interpretability {
    /// Anything other than a case-insensitive `YES` is treated as `No`,
    /// which is also what the backend assumes for missing values.
    pub fn from_wire(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("yes") {
            Self::Yes
        } else {
            Self::No
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }

    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InterpretabilityFilter {
    #[default]
    All,
    Yes,
    No,
}

impl InterpretabilityFilter {
    pub const ALL: [Self; 3] = [Self::All, Self::Yes, Self::No];

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Yes => "Interpretable only (YES)",
            Self::No => "Non-interpretable only (NO)",
        }
    }

    /// Value for the `interpretability` query parameter; `None` omits it.
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Yes => Some("YES"),
            Self::No => Some("NO"),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }
}

/// Parameters that determine which subgraph is fetched.
///
/// `min_weight` is on the raw weight scale used by the backend, not a
/// normalized 0..1 value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterSpec {
    pub min_weight: f64,
    pub interpretability: InterpretabilityFilter,
    pub limit: usize,
}

impl FilterSpec {
    pub fn new(min_weight: f64, interpretability: InterpretabilityFilter, limit: usize) -> Self {
        Self {
            min_weight,
            interpretability,
            limit,
        }
    }

    /// The widest possible view of the dataset.
    pub fn permissive(cap: usize) -> Self {
        Self::new(0.0, InterpretabilityFilter::All, cap).clamped(cap)
    }

    pub fn clamped(self, cap: usize) -> Self {
        let min_weight = if self.min_weight.is_finite() {
            self.min_weight.max(0.0)
        } else {
            0.0
        };

        Self {
            min_weight,
            interpretability: self.interpretability,
            limit: self.limit.clamp(1, cap.max(1)),
        }
    }

    pub fn merge(self, patch: &FilterPatch, cap: usize) -> Self {
        Self {
            min_weight: patch.min_weight.unwrap_or(self.min_weight),
            interpretability: patch.interpretability.unwrap_or(self.interpretability),
            limit: patch.limit.unwrap_or(self.limit),
        }
        .clamped(cap)
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("min_weight", self.min_weight.to_string())];
        if let Some(value) = self.interpretability.query_value() {
            params.push(("interpretability", value.to_owned()));
        }
        params.push(("limit", self.limit.to_string()));
        params
    }
}

/// Partial update merged into the active [`FilterSpec`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FilterPatch {
    pub min_weight: Option<f64>,
    pub interpretability: Option<InterpretabilityFilter>,
    pub limit: Option<usize>,
}

impl FilterPatch {
    pub fn min_weight(value: f64) -> Self {
        Self {
            min_weight: Some(value),
            ..Self::default()
        }
    }

    pub fn interpretability(value: InterpretabilityFilter) -> Self {
        Self {
            interpretability: Some(value),
            ..Self::default()
        }
    }

    pub fn limit(value: usize) -> Self {
        Self {
            limit: Some(value),
            ..Self::default()
        }
    }

    pub fn replace(spec: FilterSpec) -> Self {
        Self {
            min_weight: Some(spec.min_weight),
            interpretability: Some(spec.interpretability),
            limit: Some(spec.limit),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: String,
    pub label: String,
    pub interpretable: Interpretability,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Enrichment {
    pub shared_genes: BTreeSet<String>,
    pub shared_pathways: Vec<String>,
    pub reason: Option<String>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.shared_genes.is_empty()
            && self.shared_pathways.is_empty()
            && self.reason.as_deref().is_none_or(|reason| reason.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    pub id: String,
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub interpretable: Interpretability,
    pub enrichment: Enrichment,
}

impl Relation {
    pub fn touches(&self, entity_id: &str) -> bool {
        self.source == entity_id || self.target == entity_id
    }

    pub fn other_end(&self, entity_id: &str) -> &str {
        if self.source == entity_id {
            &self.target
        } else {
            &self.source
        }
    }
}

/// Aggregates over the relations adjacent to one node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeStats {
    pub total_edges: usize,
    pub interpretable_edges: usize,
    /// Mean adjacent weight; 0 when the node has no adjacent relations.
    pub avg_weight: f64,
}

impl NodeStats {
    pub fn from_relations<'a>(relations: impl IntoIterator<Item = &'a Relation>) -> Self {
        let mut total_edges = 0usize;
        let mut interpretable_edges = 0usize;
        let mut weight_sum = 0.0f64;

        for relation in relations {
            total_edges += 1;
            if relation.interpretable.is_yes() {
                interpretable_edges += 1;
            }
            weight_sum += relation.weight;
        }

        let avg_weight = if total_edges == 0 {
            0.0
        } else {
            weight_sum / total_edges as f64
        };

        Self {
            total_edges,
            interpretable_edges,
            avg_weight,
        }
    }
}

/// The 1-hop neighborhood of a node, including the node itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Neighborhood {
    pub nodes: HashSet<String>,
    pub relations: HashSet<String>,
}

/// A fetched subgraph together with the filter that produced it.
#[derive(Clone, Debug)]
pub struct View {
    entities: Vec<Entity>,
    relations: Vec<Relation>,
    produced_by: FilterSpec,
    entity_index: HashMap<String, usize>,
    relation_index: HashMap<String, usize>,
    adjacency: HashMap<String, Vec<usize>>,
}

impl View {
    /// Builds a view, dropping duplicate entities and any relation whose
    /// endpoints are not part of `entities`.
    pub fn new(entities: Vec<Entity>, relations: Vec<Relation>, produced_by: FilterSpec) -> Self {
        let mut entity_index = HashMap::with_capacity(entities.len());
        let mut unique_entities = Vec::with_capacity(entities.len());
        for entity in entities {
            if entity_index.contains_key(&entity.id) {
                continue;
            }
            entity_index.insert(entity.id.clone(), unique_entities.len());
            unique_entities.push(entity);
        }

        let mut relation_index = HashMap::with_capacity(relations.len());
        let mut kept_relations = Vec::with_capacity(relations.len());
        let mut adjacency: HashMap<String, Vec<usize>> = HashMap::new();
        let mut dropped = 0usize;

        for relation in relations {
            if !entity_index.contains_key(&relation.source)
                || !entity_index.contains_key(&relation.target)
                || relation_index.contains_key(&relation.id)
            {
                dropped += 1;
                continue;
            }

            let index = kept_relations.len();
            relation_index.insert(relation.id.clone(), index);
            adjacency
                .entry(relation.source.clone())
                .or_default()
                .push(index);
            if relation.target != relation.source {
                adjacency
                    .entry(relation.target.clone())
                    .or_default()
                    .push(index);
            }
            kept_relations.push(relation);
        }

        if dropped > 0 {
            warn!(dropped, "dropped relations with unknown endpoints or duplicate ids");
        }

        Self {
            entities: unique_entities,
            relations: kept_relations,
            produced_by,
            entity_index,
            relation_index,
            adjacency,
        }
    }

    pub fn empty(produced_by: FilterSpec) -> Self {
        Self::new(Vec::new(), Vec::new(), produced_by)
    }

    pub fn produced_by(&self) -> FilterSpec {
        self.produced_by
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entity_index.contains_key(entity_id)
    }

    pub fn entity(&self, entity_id: &str) -> Option<&Entity> {
        self.entity_index
            .get(entity_id)
            .and_then(|&index| self.entities.get(index))
    }

    pub fn relation(&self, relation_id: &str) -> Option<&Relation> {
        self.relation_index
            .get(relation_id)
            .and_then(|&index| self.relations.get(index))
    }

    pub fn label_of<'a>(&'a self, entity_id: &'a str) -> &'a str {
        self.entity(entity_id)
            .map(|entity| entity.label.as_str())
            .unwrap_or(entity_id)
    }

    pub fn adjacent(&self, entity_id: &str) -> impl Iterator<Item = &Relation> + '_ {
        self.adjacency
            .get(entity_id)
            .into_iter()
            .flatten()
            .filter_map(|&index| self.relations.get(index))
    }

    /// Number of relations adjacent to the node in this view.
    pub fn degree(&self, entity_id: &str) -> usize {
        self.adjacency.get(entity_id).map_or(0, Vec::len)
    }

    pub fn node_stats(&self, entity_id: &str) -> NodeStats {
        NodeStats::from_relations(self.adjacent(entity_id))
    }

    pub fn neighborhood(&self, entity_id: &str) -> Option<Neighborhood> {
        if !self.contains(entity_id) {
            return None;
        }

        let mut neighborhood = Neighborhood::default();
        neighborhood.nodes.insert(entity_id.to_owned());
        for relation in self.adjacent(entity_id) {
            neighborhood.relations.insert(relation.id.clone());
            neighborhood
                .nodes
                .insert(relation.other_end(entity_id).to_owned());
        }

        Some(neighborhood)
    }

    pub(crate) fn relation_mut(&mut self, relation_id: &str) -> Option<&mut Relation> {
        let index = *self.relation_index.get(relation_id)?;
        self.relations.get_mut(index)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeSelection {
    pub entity: Entity,
    pub degree: usize,
    pub stats: NodeStats,
    pub relations: Vec<Relation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSelection {
    pub relation: Relation,
    pub source_label: String,
    pub target_label: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Selection {
    #[default]
    None,
    Node(NodeSelection),
    Edge(EdgeSelection),
}

impl Selection {
    pub fn node(view: &View, entity_id: &str) -> Option<Self> {
        let entity = view.entity(entity_id)?.clone();
        let relations = view.adjacent(entity_id).cloned().collect::<Vec<_>>();

        Some(Self::Node(NodeSelection {
            degree: relations.len(),
            stats: NodeStats::from_relations(&relations),
            entity,
            relations,
        }))
    }

    pub fn edge(view: &View, relation_id: &str) -> Option<Self> {
        let relation = view.relation(relation_id)?.clone();

        Some(Self::Edge(EdgeSelection {
            source_label: view.label_of(&relation.source).to_owned(),
            target_label: view.label_of(&relation.target).to_owned(),
            relation,
        }))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::Node(node) => Some(node.entity.id.as_str()),
            _ => None,
        }
    }

    pub fn edge_id(&self) -> Option<&str> {
        match self {
            Self::Edge(edge) => Some(edge.relation.id.as_str()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchCandidate {
    pub id: String,
    pub label: String,
    pub relation_count: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct WeightRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct WeightPercentiles {
    #[serde(rename = "50th")]
    pub p50: Option<f64>,
    #[serde(rename = "75th")]
    pub p75: Option<f64>,
    #[serde(rename = "90th")]
    pub p90: Option<f64>,
}

/// Dataset-wide statistics as reported by `GET /stats`. Every field is
/// optional so partial payloads still decode.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatasetStats {
    pub total_nodes: Option<u64>,
    pub total_edges: Option<u64>,
    pub interpretable_count: Option<u64>,
    pub interpretable_percentage: Option<String>,
    pub uninterpretable_count: Option<u64>,
    pub uninterpretable_percentage: Option<String>,
    pub weight_range: Option<WeightRange>,
    pub weight_percentiles: Option<WeightPercentiles>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::{entity, relation, spec};
    use super::*;

    fn sample_view() -> View {
        View::new(
            vec![entity("A"), entity("B"), entity("C"), entity("D")],
            vec![
                relation("A", "B", 100.0, true),
                relation("C", "A", 200.0, true),
                relation("A", "D", 300.0, false),
                relation("B", "C", 50.0, false),
            ],
            spec(),
        )
    }

    #[test]
    fn node_stats_match_the_adjacent_relations() {
        let view = sample_view();
        let stats = view.node_stats("A");

        assert_eq!(stats.total_edges, 3);
        assert_eq!(stats.interpretable_edges, 2);
        assert!((stats.avg_weight - 200.0).abs() < 1e-9);
        assert_eq!(view.degree("A"), 3);
    }

    #[test]
    fn isolated_node_has_zero_average_weight() {
        let view = View::new(vec![entity("lonely")], Vec::new(), spec());
        let stats = view.node_stats("lonely");

        assert_eq!(stats.total_edges, 0);
        assert_eq!(stats.avg_weight, 0.0);
    }

    #[test]
    fn relations_with_missing_endpoints_are_dropped() {
        let view = View::new(
            vec![entity("A"), entity("B")],
            vec![relation("A", "B", 1.0, true), relation("A", "ghost", 1.0, true)],
            spec(),
        );

        assert_eq!(view.relations().len(), 1);
        assert!(view
            .relations()
            .iter()
            .all(|rel| view.contains(&rel.source) && view.contains(&rel.target)));
    }

    #[test]
    fn neighborhood_includes_the_node_and_its_direct_peers() {
        let view = sample_view();
        let hood = view.neighborhood("B").expect("B is in the view");

        let mut nodes = hood.nodes.iter().cloned().collect::<Vec<_>>();
        nodes.sort();
        assert_eq!(nodes, vec!["A", "B", "C"]);
        assert_eq!(hood.relations.len(), 2);
        assert!(view.neighborhood("missing").is_none());
    }

    #[test]
    fn merge_clamps_to_the_dataset_cap() {
        let merged = spec().merge(&FilterPatch::limit(50_000), 12_000);
        assert_eq!(merged.limit, 12_000);

        let merged = spec().merge(&FilterPatch::min_weight(-4.0), 12_000);
        assert_eq!(merged.min_weight, 0.0);

        let merged = spec().merge(&FilterPatch::limit(0), 12_000);
        assert_eq!(merged.limit, 1);
    }

    #[test]
    fn query_params_omit_interpretability_for_all() {
        let params = spec().query_params();
        assert!(params.iter().all(|(key, _)| *key != "interpretability"));

        let only_yes = spec().merge(
            &FilterPatch::interpretability(InterpretabilityFilter::Yes),
            1000,
        );
        assert!(only_yes
            .query_params()
            .contains(&("interpretability", "YES".to_owned())));
    }

    #[test]
    fn interpretability_parsing_is_lenient() {
        assert_eq!(Interpretability::from_wire("YES"), Interpretability::Yes);
        assert_eq!(Interpretability::from_wire(" yes "), Interpretability::Yes);
        assert_eq!(Interpretability::from_wire("nan"), Interpretability::No);
    }

    #[test]
    fn partial_stats_payload_decodes() {
        let stats: DatasetStats =
            serde_json::from_str(r#"{"total_nodes": 12, "weight_percentiles": {"50th": 4.5}}"#)
                .expect("valid stats json");

        assert_eq!(stats.total_nodes, Some(12));
        assert_eq!(stats.total_edges, None);
        assert_eq!(
            stats.weight_percentiles.and_then(|p| p.p50),
            Some(4.5)
        );
    }
}
