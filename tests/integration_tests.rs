// Integration tests for the single_replicability crate
// End-to-end scenarios that combine label handling, ordering and aggregation.

#[cfg(test)]
mod integration_tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use single_replicability::aggregation::{AggregationConfig, ClusterAggregation};
    use single_replicability::labels::{cell_type_of, make_cluster_ids};
    use single_replicability::ordering::{
        RankOrderConfig, ScoreMatrix, SimilarityOrderConfig, order_rows_by_hierarchy,
        order_symmetric,
    };

    #[test]
    fn test_two_genes_four_samples() {
        let expr = array![[1.0, 3.0, 10.0, 20.0], [4.0, 0.0, 6.0, 8.0]];
        let genes = ["g1", "g2"];
        let studies = ["A", "A", "B", "B"];
        let cell_types = ["X", "X", "Y", "Y"];
        let config = AggregationConfig {
            normalize_library_size: false,
            average_expressing_only: false,
            ..Default::default()
        };

        let summary = expr
            .summarize_clusters(&genes, &studies, &cell_types, &genes, config)
            .unwrap();

        let records = summary.records();
        assert_eq!(records.len(), 4);

        let expected = [
            ("g1", "X", 2.0, 1.0),
            ("g1", "Y", 15.0, 1.0),
            ("g2", "X", 2.0, 0.5),
            ("g2", "Y", 7.0, 1.0),
        ];
        for (record, (gene, cell_type, mean, fraction)) in records.iter().zip(expected) {
            assert_eq!(record.gene, gene);
            assert_eq!(record.cell_type, cell_type);
            assert_abs_diff_eq!(record.average_expression, mean, epsilon = 1e-12);
            assert_abs_diff_eq!(record.percent_expressing, fraction, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cell_type_shared_across_studies() {
        // Same cell types in both studies: the summary averages study centroids,
        // not samples, so the 3-sample cluster does not outweigh the 1-sample one
        let expr = array![[2.0, 4.0, 6.0, 10.0, 1.0, 1.0]];
        let studies = ["A", "A", "A", "B", "A", "B"];
        let cell_types = ["X", "X", "X", "X", "Y", "Y"];
        let config = AggregationConfig {
            normalize_library_size: false,
            ..Default::default()
        };

        let summary = expr
            .summarize_clusters(&["g"], &studies, &cell_types, &["g"], config)
            .unwrap();

        let x = summary.get("g", "X").unwrap();
        assert_abs_diff_eq!(x.average_expression, (4.0 + 10.0) / 2.0, epsilon = 1e-12);
        assert_eq!(summary.clusters, vec!["A|X", "A|Y", "B|X", "B|Y"]);
        assert!(summary.get("g", "Z").is_none());
    }

    #[test]
    fn test_ordering_then_reindexing() {
        let studies = ["s1", "s1", "s2", "s2"];
        let cell_types = ["Pvalb", "Sst", "Pvalb", "Sst"];
        let ids = make_cluster_ids(&studies, &cell_types).unwrap();

        // Matching cell types replicate across studies
        let scores = ScoreMatrix::square(
            ids.clone(),
            array![
                [1.0, 0.30, 0.92, 0.25],
                [0.28, 1.0, 0.20, 0.88],
                [0.90, 0.22, 1.0, 0.35],
                [0.27, 0.86, 0.31, 1.0],
            ],
        )
        .unwrap();

        let ordering = order_symmetric(&scores, SimilarityOrderConfig::default()).unwrap();
        let ordered = ordering.ordered_labels();
        let ordered_types: Vec<&str> = ordered.iter().map(|id| cell_type_of(id).unwrap()).collect();
        assert_eq!(ordered_types, vec!["Pvalb", "Pvalb", "Sst", "Sst"]);

        let reordered = scores.reordered(&ordering).unwrap();
        assert_eq!(reordered.row_labels(), &ordered[..]);
        assert_eq!(reordered.get("s1|Sst", "s2|Sst"), Some(0.88));

        // Two meta-clusters, one per cell type
        let groups = ordering.cut(2).unwrap();
        assert_eq!(groups[0], groups[2]);
        assert_eq!(groups[1], groups[3]);
        assert_ne!(groups[0], groups[1]);
    }

    #[test]
    fn test_test_clusters_against_reference() {
        let reference_ids = vec!["ref|A".to_string(), "ref|B".to_string(), "ref|C".to_string()];
        let reference = ScoreMatrix::square(
            reference_ids.clone(),
            array![[1.0, 0.8, 0.1], [0.8, 1.0, 0.3], [0.1, 0.3, 1.0]],
        )
        .unwrap();
        let test = ScoreMatrix::new(
            vec!["test|c".to_string(), "test|none".to_string(), "test|a".to_string()],
            reference_ids,
            array![[0.0, 0.1, 0.9], [0.0, 0.0, 0.0], [0.95, 0.2, 0.0]],
        )
        .unwrap();

        let (columns, rows) = order_rows_by_hierarchy(
            &test,
            &reference,
            SimilarityOrderConfig::default(),
            RankOrderConfig::default(),
        )
        .unwrap();

        assert_eq!(columns.ordered_labels(), vec!["ref|C", "ref|A", "ref|B"]);
        // test|c matches the first reference column, test|none has no mass
        assert_eq!(
            rows.ordered_labels(),
            vec!["test|c", "test|a", "test|none"]
        );
    }
}
