use std::collections::BTreeSet;

use serde::Deserialize;

use crate::model::{
    Enrichment, Entity, FilterSpec, Interpretability, Relation, SearchCandidate, View,
};

#[derive(Clone, Debug, Deserialize)]
pub(super) struct Element<T> {
    pub(super) data: T,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawNode {
    pub(super) id: String,
    #[serde(default)]
    pub(super) label: Option<String>,
    #[serde(default)]
    pub(super) interpretable: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawEdge {
    pub(super) id: String,
    pub(super) source: String,
    pub(super) target: String,
    #[serde(default)]
    pub(super) weight: Option<f64>,
    #[serde(default)]
    pub(super) interpretable: Option<String>,
    #[serde(default)]
    pub(super) shared_genes: Option<Vec<String>>,
    #[serde(default)]
    pub(super) filtered_pathways: Option<Vec<String>>,
    #[serde(default)]
    pub(super) reason_gpt4o: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct NetworkResponse {
    #[serde(default, alias = "entities")]
    pub(super) nodes: Vec<Element<RawNode>>,
    #[serde(default, alias = "relations")]
    pub(super) edges: Vec<Element<RawEdge>>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawCandidate {
    pub(super) id: String,
    #[serde(default)]
    pub(super) label: Option<String>,
    #[serde(default)]
    pub(super) edge_count: Option<usize>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct SearchResponse {
    #[serde(default)]
    pub(super) results: Vec<RawCandidate>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct EdgeDetailResponse {
    pub(super) edge: Element<RawEnrichment>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(super) struct RawEnrichment {
    #[serde(default)]
    pub(super) shared_genes: Option<Vec<String>>,
    #[serde(default)]
    pub(super) filtered_pathways: Option<Vec<String>>,
    #[serde(default)]
    pub(super) reason_gpt4o: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub nodes_count: usize,
    #[serde(default)]
    pub edges_count: usize,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub(super) detail: Option<String>,
}

fn enrichment(
    genes: Option<Vec<String>>,
    pathways: Option<Vec<String>>,
    reason: Option<String>,
) -> Enrichment {
    Enrichment {
        shared_genes: genes.unwrap_or_default().into_iter().collect::<BTreeSet<_>>(),
        shared_pathways: pathways.unwrap_or_default(),
        reason: reason.filter(|reason| !reason.trim().is_empty()),
    }
}

fn clamp_weight(weight: Option<f64>) -> f64 {
    match weight {
        Some(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

impl NetworkResponse {
    pub(super) fn into_view(self, produced_by: FilterSpec) -> View {
        let entities = self
            .nodes
            .into_iter()
            .map(|Element { data }| Entity {
                label: data.label.unwrap_or_else(|| data.id.clone()),
                interpretable: data
                    .interpretable
                    .as_deref()
                    .map(Interpretability::from_wire)
                    .unwrap_or_default(),
                id: data.id,
            })
            .collect();

        let relations = self
            .edges
            .into_iter()
            .map(|Element { data }| Relation {
                weight: clamp_weight(data.weight),
                interpretable: data
                    .interpretable
                    .as_deref()
                    .map(Interpretability::from_wire)
                    .unwrap_or_default(),
                enrichment: enrichment(
                    data.shared_genes,
                    data.filtered_pathways,
                    data.reason_gpt4o,
                ),
                id: data.id,
                source: data.source,
                target: data.target,
            })
            .collect();

        View::new(entities, relations, produced_by)
    }
}

impl SearchResponse {
    pub(super) fn into_candidates(self, limit: usize) -> Vec<SearchCandidate> {
        self.results
            .into_iter()
            .take(limit)
            .map(|raw| SearchCandidate {
                label: raw.label.unwrap_or_else(|| raw.id.clone()),
                relation_count: raw.edge_count.unwrap_or(0),
                id: raw.id,
            })
            .collect()
    }
}

impl EdgeDetailResponse {
    pub(super) fn into_enrichment(self) -> Enrichment {
        let data = self.edge.data;
        enrichment(data.shared_genes, data.filtered_pathways, data.reason_gpt4o)
    }
}
