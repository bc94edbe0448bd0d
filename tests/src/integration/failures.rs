//! # Failure Scenarios
//!
//! Fail-fast is the default. With `RetryTransient` only transient upload and
//! download failures are retried; everything else still stops the run.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use probe_core::{
        FailurePolicy, MockStorageNetwork, NetworkError, ProbeApi, ProbeError, SeriesKind,
        ShutdownSignal, StopReason,
    };

    use crate::integration::probe;

    // =========================================================================
    // UPLOAD / DOWNLOAD
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_transient_upload_failure_is_fatal_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(
            MockStorageNetwork::new().fail_next_upload(NetworkError::Transient("gateway busy".into())),
        );
        let mut service = probe(dir.path(), &net, |_| {});

        let err = service.run().await.unwrap_err();

        assert!(matches!(err, ProbeError::Upload(NetworkError::Transient(_))));
        assert_eq!(net.calls().upload, 1);
        assert!(service.ledger().read_records().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_retried_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(
            MockStorageNetwork::new()
                .with_identifiers(["abc123"])
                .fail_next_upload(NetworkError::Transient("gateway busy".into()))
                .fail_next_download(NetworkError::Transient("reset".into())),
        );
        let mut service = probe(dir.path(), &net, |c| {
            c.failure_policy = FailurePolicy::RetryTransient { max_attempts: 3 };
        });

        let summary = service.run().await.unwrap();

        assert_eq!(summary.iterations, 1);
        assert_eq!(net.calls().upload, 2);
        assert_eq!(net.calls().download, 2);
        assert_eq!(service.ledger().read_records().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(
            MockStorageNetwork::new().fail_next_upload(NetworkError::Permanent("rejected".into())),
        );
        let mut service = probe(dir.path(), &net, |c| {
            c.failure_policy = FailurePolicy::RetryTransient { max_attempts: 5 };
        });

        let err = service.run().await.unwrap_err();

        assert!(matches!(err, ProbeError::Upload(NetworkError::Permanent(_))));
        assert_eq!(net.calls().upload, 1);
    }

    #[tokio::test]
    async fn test_corrupt_download_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(
            MockStorageNetwork::new()
                .with_identifiers(["abc123"])
                .with_corrupt_downloads(),
        );
        let mut service = probe(dir.path(), &net, |_| {});

        let err = service.run().await.unwrap_err();

        assert!(matches!(err, ProbeError::Download(_)));
        assert_eq!(service.completed_iterations(), 0);

        // The upload was recorded before the download failed.
        let records = service.ledger().read_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cid.as_str(), "abc123");

        let workspace = dir.path().join("CESS_STORAGE");
        assert!(!workspace.join("abc123_rand.txt").exists());
        assert!(workspace.join("rand.txt").exists());
    }

    // =========================================================================
    // DEAL QUERIES
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_deal_query_errors_keep_polling() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(
            MockStorageNetwork::new()
                .with_replication_after(1)
                .fail_next_deal_query(NetworkError::Permanent("invalid params".into()))
                .fail_next_deal_query(NetworkError::Transient("node busy".into())),
        );
        let mut service = probe(dir.path(), &net, |_| {});

        let summary = service.run().await.unwrap();

        assert_eq!(summary.iterations, 1);
        assert_eq!(summary.averages[&SeriesKind::Deal].average_ms, 2000);
        assert_eq!(summary.averages[&SeriesKind::Replication].average_ms, 12_000);
        assert_eq!(net.calls().query_deal, 3);
        assert_eq!(service.ledger().read_records().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_authorisation_failure_stops_before_upload() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(
            MockStorageNetwork::new().fail_authorization(NetworkError::Permanent("denied".into())),
        );
        let mut service = probe(dir.path(), &net, |_| {});

        let err = service.run().await.unwrap_err();

        assert!(matches!(
            err,
            ProbeError::Network {
                operation: "authorize_gateway",
                ..
            }
        ));
        assert_eq!(net.calls().upload, 0);
    }

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_between_polls() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(MockStorageNetwork::new().with_replication_after(1));
        let (tx, signal) = ShutdownSignal::new();
        let mut service = probe(dir.path(), &net, |c| c.max_iterations = None).with_shutdown(signal);

        let stop = async {
            tokio::time::sleep(Duration::from_secs(25)).await;
            tx.send(true).unwrap();
        };
        let (summary, ()) = tokio::join!(service.run(), stop);
        let summary = summary.unwrap();

        assert_eq!(summary.stopped_by, StopReason::Shutdown);
        assert_eq!(summary.iterations, 2);
        assert_eq!(net.calls().upload, 3);
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(MockStorageNetwork::new());
        let (tx, signal) = ShutdownSignal::new();
        tx.send(true).unwrap();
        let mut service = probe(dir.path(), &net, |c| c.max_iterations = None).with_shutdown(signal);

        let summary = service.run().await.unwrap();

        assert_eq!(summary.stopped_by, StopReason::Shutdown);
        assert_eq!(summary.iterations, 0);
        assert_eq!(net.calls().upload, 0);
    }
}
