//! # Probe Loop Scenarios
//!
//! Complete generate → upload → confirm → download cycles:
//!
//! 1. Replication after two empty listings takes exactly two poll intervals
//! 2. Deal discovery is measured into its own series
//! 3. Averages after several iterations

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use probe_core::{
        MockStorageNetwork, ProbeApi, RecordLedger, SeriesKind, StopReason, LEDGER_FILE_NAME,
    };

    use crate::integration::probe;

    // =========================================================================
    // REPLICATION
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_single_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(
            MockStorageNetwork::new()
                .with_identifiers(["abc123"])
                .with_replication_after(2)
                .with_upload_latency(Duration::from_millis(1500))
                .with_download_latency(Duration::from_millis(700)),
        );
        let mut service = probe(dir.path(), &net, |_| {});

        let summary = service.run().await.unwrap();

        assert_eq!(summary.iterations, 1);
        assert_eq!(summary.stopped_by, StopReason::IterationLimit);
        assert_eq!(summary.averages[&SeriesKind::GatewayUpload].average_ms, 1500);
        assert_eq!(summary.averages[&SeriesKind::Replication].average_ms, 20_000);
        assert_eq!(summary.averages[&SeriesKind::Download].average_ms, 700);
        assert!(!summary.averages.contains_key(&SeriesKind::Deal));

        let calls = net.calls();
        assert_eq!(calls.upload, 1);
        assert_eq!(calls.namespace_contents, 3);
        assert_eq!(calls.download, 1);
        assert_eq!(net.listed("random").len(), 1);

        let workspace = dir.path().join("CESS_STORAGE");
        let payload = std::fs::metadata(workspace.join("rand.txt")).unwrap();
        assert_eq!(payload.len(), 1024);
        assert!(workspace.join(LEDGER_FILE_NAME).exists());
        assert!(!workspace.join("abc123_rand.txt").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replication_measured_from_upload_end() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(
            MockStorageNetwork::new()
                .with_replication_after(4)
                .with_upload_latency(Duration::from_secs(5)),
        );
        let mut service = probe(dir.path(), &net, |_| {});

        let report = service.run_iteration().await.unwrap();

        assert_eq!(report.timings.gateway_upload, Some(Duration::from_secs(5)));
        assert_eq!(report.timings.replication, Some(Duration::from_secs(40)));
        assert_eq!(report.replication_polls, 5);
    }

    // =========================================================================
    // DEAL
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_deal_found_after_three_queries() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(
            MockStorageNetwork::new()
                .with_identifiers(["abc123"])
                .with_replication_after(1)
                .with_deal_after(3),
        );
        let mut service = probe(dir.path(), &net, |_| {});

        let report = service.run_iteration().await.unwrap();

        assert_eq!(report.timings.deal, Some(Duration::from_secs(3)));
        assert_eq!(report.timings.replication, Some(Duration::from_secs(13)));
        assert_eq!(report.averages[&SeriesKind::Deal].average_ms, 3000);
        assert_eq!(report.averages[&SeriesKind::Deal].count, 1);
        assert_eq!(report.averages[&SeriesKind::Replication].average_ms, 13_000);
        assert_eq!(net.calls().query_deal, 4);
    }

    // =========================================================================
    // AVERAGES
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_averages_over_three_iterations() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(
            MockStorageNetwork::new()
                .with_identifiers(["aaa111", "bbb222", "ccc333"])
                .with_upload_latency(Duration::from_millis(900)),
        );
        let mut service = probe(dir.path(), &net, |c| c.max_iterations = Some(3));

        let summary = service.run().await.unwrap();

        assert_eq!(summary.iterations, 3);
        let upload = summary.averages[&SeriesKind::GatewayUpload];
        assert_eq!(upload.count, 3);
        assert_eq!(upload.average_ms, 900);
        assert_eq!(summary.averages[&SeriesKind::Replication].average_ms, 0);

        let ledger = RecordLedger::in_workspace(&dir.path().join("CESS_STORAGE"));
        let cids: Vec<String> = ledger
            .read_records()
            .unwrap()
            .into_iter()
            .map(|r| r.cid.to_string())
            .collect();
        assert_eq!(cids, vec!["aaa111", "bbb222", "ccc333"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_payload_sizes_within_range() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(MockStorageNetwork::new());
        let mut service = probe(dir.path(), &net, |c| {
            c.min_size_units = 2;
            c.max_size_units = 4;
        });

        for _ in 0..5 {
            let report = service.run_iteration().await.unwrap();
            assert_eq!(report.payload_bytes % 1024, 0);
            assert!((2048..=4096).contains(&report.payload_bytes));
        }
    }
}
