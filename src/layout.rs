use std::cmp::Reverse;
use std::f32::consts::TAU;
use std::time::Duration;

use eframe::egui::{Vec2, vec2};

use crate::model::View;
use crate::util::stable_pair;

pub const LAYOUT_ANIMATION: Duration = Duration::from_millis(500);
pub const FIT_PADDING: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutAlgorithm {
    Circle,
    Grid,
    Random,
    Concentric,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleParams {
    /// Arc length reserved per node; the radius grows with the node count.
    pub spacing: f32,
    pub start_angle: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridParams {
    /// Fixed column count; `None` picks a near-square grid.
    pub columns: Option<usize>,
    pub spacing: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomParams {
    pub extent: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConcentricParams {
    pub ring_gap: f32,
    pub spacing: f32,
}

/// Algorithm-specific parameters, tagged by algorithm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayoutParams {
    Circle(CircleParams),
    Grid(GridParams),
    Random(RandomParams),
    Concentric(ConcentricParams),
}

impl LayoutParams {
    pub fn algorithm(&self) -> LayoutAlgorithm {
        match self {
            Self::Circle(_) => LayoutAlgorithm::Circle,
            Self::Grid(_) => LayoutAlgorithm::Grid,
            Self::Random(_) => LayoutAlgorithm::Random,
            Self::Concentric(_) => LayoutAlgorithm::Concentric,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutEntry {
    pub name: &'static str,
    pub label: &'static str,
    pub params: LayoutParams,
    pub animation: Duration,
    pub padding: f32,
}

impl LayoutEntry {
    fn new(name: &'static str, label: &'static str, params: LayoutParams) -> Self {
        Self {
            name,
            label,
            params,
            animation: LAYOUT_ANIMATION,
            padding: FIT_PADDING,
        }
    }

    pub fn algorithm(&self) -> LayoutAlgorithm {
        self.params.algorithm()
    }

    /// Target positions in world units, aligned with `view.entities()`.
    pub fn positions(&self, view: &View) -> Vec<Vec2> {
        let count = view.entities().len();
        if count == 0 {
            return Vec::new();
        }

        match self.params {
            LayoutParams::Circle(params) => circle(count, params),
            LayoutParams::Grid(params) => grid(count, params),
            LayoutParams::Random(params) => view
                .entities()
                .iter()
                .map(|entity| {
                    let (x, y) = stable_pair(&entity.id);
                    vec2(x, y) * params.extent
                })
                .collect(),
            LayoutParams::Concentric(params) => concentric(view, params),
        }
    }
}

fn circle(count: usize, params: CircleParams) -> Vec<Vec2> {
    if count == 1 {
        return vec![Vec2::ZERO];
    }
    let radius = (count as f32 * params.spacing / TAU).max(params.spacing);
    (0..count)
        .map(|index| {
            let angle = params.start_angle + (index as f32 / count as f32) * TAU;
            vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

fn grid(count: usize, params: GridParams) -> Vec<Vec2> {
    let columns = params
        .columns
        .filter(|&columns| columns > 0)
        .unwrap_or_else(|| (count as f32).sqrt().ceil() as usize)
        .max(1);
    let rows = count.div_ceil(columns);
    let origin = vec2(
        (columns.saturating_sub(1)) as f32 * params.spacing * 0.5,
        (rows.saturating_sub(1)) as f32 * params.spacing * 0.5,
    );

    (0..count)
        .map(|index| {
            let column = index % columns;
            let row = index / columns;
            vec2(column as f32, row as f32) * params.spacing - origin
        })
        .collect()
}

/// Rings of decreasing degree: the best-connected nodes sit in the middle.
fn concentric(view: &View, params: ConcentricParams) -> Vec<Vec2> {
    let entities = view.entities();
    let mut order = (0..entities.len()).collect::<Vec<_>>();
    order.sort_by_key(|&index| Reverse(view.degree(&entities[index].id)));

    let mut positions = vec![Vec2::ZERO; entities.len()];
    let mut placed = 0usize;
    let mut ring = 0usize;

    while placed < order.len() {
        let radius = ring as f32 * params.ring_gap;
        let capacity = if ring == 0 {
            1
        } else {
            ((TAU * radius) / params.spacing).floor().max(1.0) as usize
        };
        let members = &order[placed..(placed + capacity).min(order.len())];

        for (slot, &index) in members.iter().enumerate() {
            let angle = (slot as f32 / members.len() as f32) * TAU;
            positions[index] = vec2(angle.cos(), angle.sin()) * radius;
        }

        placed += members.len();
        ring += 1;
    }

    positions
}

/// Name-keyed set of layouts with one active entry.
#[derive(Clone, Debug)]
pub struct LayoutRegistry {
    entries: Vec<LayoutEntry>,
    active: usize,
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self {
            entries: vec![
                LayoutEntry::new(
                    "circle",
                    "Circle",
                    LayoutParams::Circle(CircleParams {
                        spacing: 60.0,
                        start_angle: 0.0,
                    }),
                ),
                LayoutEntry::new(
                    "grid",
                    "Grid",
                    LayoutParams::Grid(GridParams {
                        columns: None,
                        spacing: 90.0,
                    }),
                ),
                LayoutEntry::new(
                    "random",
                    "Random",
                    LayoutParams::Random(RandomParams { extent: 900.0 }),
                ),
                LayoutEntry::new(
                    "concentric",
                    "Concentric",
                    LayoutParams::Concentric(ConcentricParams {
                        ring_gap: 120.0,
                        spacing: 70.0,
                    }),
                ),
            ],
            active: 0,
        }
    }
}

impl LayoutRegistry {
    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&LayoutEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn active(&self) -> &LayoutEntry {
        &self.entries[self.active]
    }

    /// Returns `false` and keeps the current layout for unknown names.
    pub fn activate(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|entry| entry.name == name) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }
}
