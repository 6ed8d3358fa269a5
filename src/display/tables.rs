//! Table formatting for pipeline reports.

use comfy_table::{
    Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

use crate::graph::{ClusterProfile, ClusterSimilarity, GraphMetrics};
use crate::pipeline::StageTiming;

/// Builder for formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { table: base_table() }
    }

    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        self.table.set_header(bold_cells(headers));
        self
    }

    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    pub fn build(self) -> String {
        self.table.to_string()
    }
}

fn base_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table
}

fn bold_cells(headers: Vec<&str>) -> Vec<Cell> {
    headers
        .into_iter()
        .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
        .collect()
}

/// Graph metrics, one per row.
pub fn create_metrics_table(metrics: &GraphMetrics) -> String {
    let mut table = base_table();
    table.set_header(bold_cells(vec!["Metric", "Value"]));

    // Plain cells; comfy-table miscounts widths of ANSI-styled text
    table.add_row(vec!["Nodes".to_string(), metrics.total_nodes.to_string()]);
    table.add_row(vec!["Edges".to_string(), metrics.total_edges.to_string()]);
    table.add_row(vec!["Density".to_string(), format!("{:.4}", metrics.density)]);
    table.add_row(vec!["Average degree".to_string(), format!("{:.2}", metrics.avg_degree)]);
    table.add_row(vec!["Modularity".to_string(), format!("{:.4}", metrics.modularity)]);
    table.add_row(vec![
        "Connected components".to_string(),
        metrics.connected_components.to_string(),
    ]);

    // Silhouette above 0.5 is a well separated layout, below 0.25 a weak one
    let score = metrics.silhouette_score;
    let color = if score >= 0.5 {
        Color::Green
    } else if score >= 0.25 {
        Color::Yellow
    } else {
        Color::Red
    };
    table.add_row(vec![
        Cell::new("Silhouette"),
        Cell::new(format!("{score:.4}"))
            .fg(color)
            .add_attribute(Attribute::Bold),
    ]);

    table.to_string()
}

/// One row per cluster with its dominant keywords.
pub fn create_cluster_table(profiles: &[ClusterProfile]) -> String {
    let mut table = base_table();
    table.set_header(bold_cells(vec!["Cluster", "Nodes", "Top keywords", "Topics"]));

    for profile in profiles {
        let keywords = profile
            .top_keywords
            .iter()
            .map(|k| format!("{} ({})", k.word, k.count))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            profile.cluster_id.to_string(),
            profile.node_count.to_string(),
            keywords,
            profile.main_topics.join(", "),
        ]);
    }

    table.to_string()
}

/// Cluster pairs that share vocabulary.
pub fn create_similarity_table(similarities: &[ClusterSimilarity]) -> String {
    let mut table = base_table();
    table.set_header(bold_cells(vec!["Clusters", "Score", "Shared keywords"]));

    for similarity in similarities {
        table.add_row(vec![
            format!(
                "{} ↔ {}",
                similarity.target_cluster_id, similarity.similar_cluster_id
            ),
            format!("{:.3}", similarity.score),
            similarity.shared_keywords.join(", "),
        ]);
    }

    table.to_string()
}

/// Stage timings with a total row.
pub fn create_timing_table(timings: &[StageTiming]) -> String {
    let mut table = base_table();
    table.set_header(bold_cells(vec!["Stage", "Time"]));

    let mut total = 0.0;
    for timing in timings {
        total += timing.elapsed_ms;
        table.add_row(vec![
            timing.stage.to_string(),
            format!("{:.1} ms", timing.elapsed_ms),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL").add_attribute(Attribute::Bold),
        Cell::new(format!("{total:.1} ms")).add_attribute(Attribute::Bold),
    ]);

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::KeywordCount;
    use crate::pipeline::PipelineStage;

    #[test]
    fn test_table_builder() {
        let table = TableBuilder::new()
            .set_headers(vec!["Column 1", "Column 2"])
            .add_row(vec!["Value 1".to_string(), "Value 2".to_string()])
            .build();

        assert!(table.contains("Column 1"));
        assert!(table.contains("Value 1"));
    }

    #[test]
    fn test_metrics_table_lists_every_metric() {
        let metrics = GraphMetrics {
            density: 0.5,
            avg_degree: 1.5,
            modularity: 0.3125,
            silhouette_score: 0.42,
            total_nodes: 4,
            total_edges: 3,
            connected_components: 1,
        };
        let table = create_metrics_table(&metrics);
        for needle in ["Nodes", "Edges", "0.5000", "1.50", "0.3125", "0.4200", "Connected components"] {
            assert!(table.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn test_cluster_table() {
        let profiles = vec![ClusterProfile {
            cluster_id: 1,
            node_count: 3,
            top_keywords: vec![KeywordCount {
                word: "imposto".to_string(),
                count: 3,
            }],
            main_topics: vec!["imposto".to_string()],
        }];
        let table = create_cluster_table(&profiles);
        assert!(table.contains("imposto (3)"));
    }

    #[test]
    fn test_timing_table_has_total() {
        let timings = vec![
            StageTiming {
                stage: PipelineStage::Upload,
                elapsed_ms: 1.25,
            },
            StageTiming {
                stage: PipelineStage::Graph,
                elapsed_ms: 2.0,
            },
        ];
        let table = create_timing_table(&timings);
        assert!(table.contains("upload"));
        assert!(table.contains("3.2 ms") || table.contains("3.3 ms"));
    }
}
