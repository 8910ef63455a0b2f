use eframe::egui::{self, RichText, Ui};

use disease_explorer::engine::SurfaceEvent;
use disease_explorer::model::{EdgeSelection, NodeSelection, Selection};

use super::super::ExplorerApp;

fn draw_node(ui: &mut Ui, node: &NodeSelection, labels: impl Fn(&str) -> String) -> Option<String> {
    ui.label(RichText::new(node.entity.label.as_str()).strong());
    ui.small(node.entity.id.as_str());
    ui.add_space(6.0);

    ui.label(format!("Interpretable: {}", node.entity.interpretable.label()));
    ui.label(format!("Degree: {}", node.degree));
    ui.label(format!("Relations in view: {}", node.stats.total_edges));
    ui.label(format!(
        "Interpretable relations: {}",
        node.stats.interpretable_edges
    ));
    ui.label(format!("Average weight: {:.4}", node.stats.avg_weight));

    ui.separator();
    ui.label(RichText::new("Related diseases").strong());
    if node.relations.is_empty() {
        ui.label("No relations in the current view.");
        return None;
    }

    let mut clicked = None;
    egui::ScrollArea::vertical()
        .id_salt("related_relations_scroll")
        .max_height(360.0)
        .auto_shrink([false, false])
        .show_rows(ui, 22.0, node.relations.len(), |ui, row_range| {
            for relation in &node.relations[row_range] {
                let other = relation.other_end(&node.entity.id);
                let label = format!(
                    "{}  ({:.2})  [{}]",
                    labels(other),
                    relation.weight,
                    relation.interpretable.label()
                );
                if ui.link(label).on_hover_text(other).clicked() {
                    clicked = Some(relation.id.clone());
                }
            }
        });
    clicked
}

fn draw_edge(ui: &mut Ui, edge: &EdgeSelection) {
    ui.label(
        RichText::new(format!(
            "{}  <->  {}",
            edge.source_label, edge.target_label
        ))
        .strong(),
    );
    ui.small(edge.relation.id.as_str());
    ui.add_space(6.0);

    ui.label(format!("Weight: {:.4}", edge.relation.weight));
    ui.label(format!(
        "Interpretable: {}",
        edge.relation.interpretable.label()
    ));

    let enrichment = &edge.relation.enrichment;
    if enrichment.is_empty() {
        ui.separator();
        ui.weak("No shared genes, pathways or explanation recorded for this relation.");
        return;
    }

    ui.separator();
    ui.label(RichText::new("Shared genes").strong());
    if enrichment.shared_genes.is_empty() {
        ui.weak("None");
    } else {
        ui.label(
            enrichment
                .shared_genes
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        );
    }

    ui.add_space(4.0);
    ui.label(RichText::new("Shared pathways").strong());
    if enrichment.shared_pathways.is_empty() {
        ui.weak("None");
    } else {
        for pathway in &enrichment.shared_pathways {
            ui.label(format!("- {pathway}"));
        }
    }

    if let Some(reason) = enrichment.reason.as_deref().filter(|reason| !reason.trim().is_empty()) {
        ui.add_space(4.0);
        ui.label(RichText::new("Why they are related").strong());
        ui.label(reason);
    }
}

impl ExplorerApp {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let clicked = match self.explorer.selection() {
            Selection::None => {
                ui.label("Click a disease or a relation in the graph.");
                None
            }
            Selection::Node(node) => {
                let view = self.explorer.view();
                draw_node(ui, node, |id| {
                    view.map_or_else(|| id.to_owned(), |view| view.label_of(id).to_owned())
                })
            }
            Selection::Edge(edge) => {
                draw_edge(ui, edge);
                None
            }
        };

        if let Some(relation_id) = clicked {
            self.canvas.emit(SurfaceEvent::TapEdge(relation_id));
        }
    }
}
