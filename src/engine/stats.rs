use crate::model::DatasetStats;
use crate::util::{NOT_AVAILABLE, format_fixed, or_not_available, parse_percentage};

/// One labelled value, already formatted for display.
#[derive(Clone, Debug, PartialEq)]
pub struct StatRow {
    pub label: &'static str,
    pub value: String,
}

impl StatRow {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }
}

/// Interpretable or uninterpretable share of all edges.
#[derive(Clone, Debug, PartialEq)]
pub struct ShareRow {
    pub label: &'static str,
    pub count: String,
    pub percentage: String,
    /// Bar fill in `0..=1`; 0 when the percentage is missing or unparsable.
    pub fraction: f32,
}

impl ShareRow {
    fn new(label: &'static str, count: Option<u64>, percentage: Option<&str>) -> Self {
        Self {
            label,
            count: or_not_available(count),
            percentage: percentage.unwrap_or("0%").to_owned(),
            fraction: percentage.and_then(parse_percentage).unwrap_or(0.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatsSummary {
    pub header: Vec<StatRow>,
    pub weight_range: String,
    pub percentiles: Vec<StatRow>,
    pub shares: [ShareRow; 2],
}

/// Read-only formatting of the dataset-wide statistics.
#[derive(Clone, Debug, Default)]
pub struct StatisticsPresenter {
    stats: Option<DatasetStats>,
}

impl StatisticsPresenter {
    pub fn update(&mut self, stats: DatasetStats) {
        self.stats = Some(stats);
    }

    pub fn is_loaded(&self) -> bool {
        self.stats.is_some()
    }

    pub fn raw(&self) -> Option<&DatasetStats> {
        self.stats.as_ref()
    }

    /// Bounds for the minimum-weight slider, when the backend reported a
    /// usable range.
    pub fn weight_bounds(&self) -> Option<(f64, f64)> {
        let range = self.stats.as_ref()?.weight_range?;
        let min = range.min.unwrap_or(0.0).max(0.0);
        let max = range.max?;
        (max.is_finite() && max > min).then_some((min, max))
    }

    pub fn percentile_marks(&self) -> Vec<(&'static str, f64)> {
        let Some(percentiles) = self.stats.as_ref().and_then(|stats| stats.weight_percentiles)
        else {
            return Vec::new();
        };
        [
            ("P50", percentiles.p50),
            ("P75", percentiles.p75),
            ("P90", percentiles.p90),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|value| (label, value)))
        .collect()
    }

    pub fn summary(&self) -> StatsSummary {
        let empty = DatasetStats::default();
        let stats = self.stats.as_ref().unwrap_or(&empty);
        let range = stats.weight_range.unwrap_or_default();
        let percentiles = stats.weight_percentiles.unwrap_or_default();

        let interpretable = match (
            stats.interpretable_count,
            stats.interpretable_percentage.as_deref(),
        ) {
            (Some(count), Some(percentage)) => format!("{count} ({percentage})"),
            (Some(count), None) => count.to_string(),
            (None, _) => NOT_AVAILABLE.to_owned(),
        };

        StatsSummary {
            header: vec![
                StatRow::new("Nodes", or_not_available(stats.total_nodes)),
                StatRow::new("Edges", or_not_available(stats.total_edges)),
                StatRow::new("Interpretable", interpretable),
            ],
            weight_range: format!(
                "{} - {}",
                format_fixed(range.min, 2),
                format_fixed(range.max, 2)
            ),
            percentiles: vec![
                StatRow::new("P50", format_fixed(percentiles.p50, 2)),
                StatRow::new("P75", format_fixed(percentiles.p75, 2)),
                StatRow::new("P90", format_fixed(percentiles.p90, 2)),
            ],
            shares: [
                ShareRow::new(
                    "Interpretable",
                    stats.interpretable_count,
                    stats.interpretable_percentage.as_deref(),
                ),
                ShareRow::new(
                    "Non-interpretable",
                    stats.uninterpretable_count,
                    stats.uninterpretable_percentage.as_deref(),
                ),
            ],
        }
    }
}
