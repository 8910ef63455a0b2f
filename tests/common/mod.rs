#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use disease_explorer::api::{ApiError, Health, NetworkApi};
use disease_explorer::config::RawConfig;
use disease_explorer::engine::{Explorer, RenderSurface, Request, Response, SurfaceEvent};
use disease_explorer::layout::LayoutEntry;
use disease_explorer::model::{
    DatasetStats, Enrichment, Entity, FilterSpec, Interpretability, InterpretabilityFilter,
    Relation, SearchCandidate, View,
};

/// Records every command sent to the surface.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<String>,
}

impl RecordingSurface {
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.commands)
    }
}

impl RenderSurface for RecordingSurface {
    fn stop_layout(&mut self) {
        self.commands.push("stop".into());
    }

    fn install(&mut self, view: &View) {
        self.commands
            .push(format!("install {}", view.entities().len()));
    }

    fn run_layout(&mut self, _view: &View, layout: &LayoutEntry) {
        self.commands.push(format!("layout {}", layout.name));
    }

    fn fit(&mut self, padding: f32) {
        self.commands.push(format!("fit {padding}"));
    }

    fn center_on(&mut self, entity_id: &str) {
        self.commands.push(format!("center {entity_id}"));
    }

    fn reset_zoom(&mut self) {
        self.commands.push("reset-zoom".into());
    }
}

pub fn entity(id: &str) -> Entity {
    Entity {
        id: id.to_owned(),
        label: format!("Disease {id}"),
        interpretable: Interpretability::No,
    }
}

pub fn relation(source: &str, target: &str, weight: f64, yes: bool) -> Relation {
    Relation {
        id: format!("{source}__{target}"),
        source: source.to_owned(),
        target: target.to_owned(),
        weight,
        interpretable: if yes {
            Interpretability::Yes
        } else {
            Interpretability::No
        },
        enrichment: Enrichment::default(),
    }
}

/// In-memory backend that filters a fixed relation list the way the real
/// service does: weight threshold, interpretability, heaviest first, limit.
pub struct FakeBackend {
    pub relations: Vec<Relation>,
    pub network_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(relations: Vec<Relation>) -> Self {
        Self {
            relations,
            network_calls: AtomicUsize::new(0),
        }
    }

    pub fn network_calls(&self) -> usize {
        self.network_calls.load(Ordering::SeqCst)
    }

    fn entity_ids(&self) -> Vec<String> {
        let mut ids = self
            .relations
            .iter()
            .flat_map(|relation| [relation.source.clone(), relation.target.clone()])
            .collect::<Vec<_>>();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl NetworkApi for FakeBackend {
    fn network(&self, spec: &FilterSpec) -> Result<View, ApiError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);

        let mut relations = self
            .relations
            .iter()
            .filter(|relation| relation.weight >= spec.min_weight)
            .filter(|relation| match spec.interpretability {
                InterpretabilityFilter::All => true,
                InterpretabilityFilter::Yes => relation.interpretable.is_yes(),
                InterpretabilityFilter::No => !relation.interpretable.is_yes(),
            })
            .cloned()
            .collect::<Vec<_>>();
        relations.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        relations.truncate(spec.limit);

        let mut ids = relations
            .iter()
            .flat_map(|relation| [relation.source.clone(), relation.target.clone()])
            .collect::<Vec<_>>();
        ids.sort();
        ids.dedup();

        Ok(View::new(
            ids.iter().map(|id| entity(id)).collect(),
            relations,
            *spec,
        ))
    }

    fn stats(&self) -> Result<DatasetStats, ApiError> {
        Ok(DatasetStats {
            total_nodes: Some(self.entity_ids().len() as u64),
            total_edges: Some(self.relations.len() as u64),
            ..DatasetStats::default()
        })
    }

    fn search(&self, keyword: &str, limit: usize) -> Result<Vec<SearchCandidate>, ApiError> {
        let needle = keyword.to_lowercase();
        Ok(self
            .entity_ids()
            .into_iter()
            .map(|id| entity(&id))
            .filter(|entity| entity.label.to_lowercase().contains(&needle))
            .map(|entity| SearchCandidate {
                relation_count: self
                    .relations
                    .iter()
                    .filter(|relation| relation.touches(&entity.id))
                    .count(),
                id: entity.id,
                label: entity.label,
            })
            .take(limit)
            .collect())
    }

    fn edge_detail(&self, edge_id: &str) -> Result<Enrichment, ApiError> {
        self.relations
            .iter()
            .find(|relation| relation.id == edge_id)
            .map(|relation| relation.enrichment.clone())
            .ok_or_else(|| ApiError::Status {
                status: 404,
                detail: "Edge not found".into(),
            })
    }

    fn health(&self) -> Result<Health, ApiError> {
        Ok(Health {
            status: "healthy".into(),
            nodes_count: self.entity_ids().len(),
            edges_count: self.relations.len(),
        })
    }
}

pub fn explorer() -> Explorer {
    let config = RawConfig::default()
        .validate()
        .expect("default config is valid");
    Explorer::new(&config)
}

/// Executes every queued request against `api` and feeds the responses back
/// in issue order. Returns how many requests ran.
pub fn pump(
    explorer: &mut Explorer,
    api: &dyn NetworkApi,
    surface: &mut dyn RenderSurface,
    now: Instant,
) -> usize {
    let mut executed = 0;
    loop {
        let requests = explorer.take_requests();
        if requests.is_empty() {
            return executed;
        }
        for request in requests {
            executed += 1;
            let response: Response = request.execute(api);
            explorer.handle(response, now, surface);
        }
    }
}

pub fn network_requests(requests: &[Request]) -> usize {
    requests
        .iter()
        .filter(|request| request.is_network_fetch())
        .count()
}

pub fn tap(explorer: &mut Explorer, surface: &mut dyn RenderSurface, event: SurfaceEvent, now: Instant) {
    explorer
        .event_sender()
        .send(event)
        .expect("engine owns the receiver");
    explorer.tick(now, surface);
}
