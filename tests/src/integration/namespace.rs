//! # Namespace Scenarios
//!
//! The namespace is created once per owner, however often the probe starts.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use probe_core::{MockStorageNetwork, NamespaceManager, ProbeApi, ProbeError};

    use crate::integration::{probe, OWNER};

    #[tokio::test]
    async fn test_ensure_twice_creates_once() {
        let net = Arc::new(MockStorageNetwork::new());
        let manager = NamespaceManager::new(Arc::clone(&net));

        let first = manager.ensure("random", &OWNER).await.unwrap();
        let second = manager.ensure("random", &OWNER).await.unwrap();

        assert!(first.created.is_some());
        assert!(second.created.is_none());
        assert_eq!(net.calls().create_namespace, 1);
    }

    #[tokio::test]
    async fn test_restarted_probe_reuses_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(MockStorageNetwork::new());

        probe(dir.path(), &net, |_| {}).run().await.unwrap();
        probe(dir.path(), &net, |_| {}).run().await.unwrap();

        let calls = net.calls();
        assert_eq!(calls.create_namespace, 1);
        assert_eq!(calls.list_namespaces, 2);
        assert_eq!(calls.upload, 2);
    }

    #[tokio::test]
    async fn test_existing_namespace_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(MockStorageNetwork::new().with_namespace(OWNER, "probe-bucket"));

        let mut service = probe(dir.path(), &net, |c| c.namespace = "probe-bucket".into());
        let name = service.prepare().await.unwrap();

        assert_eq!(name.as_str(), "probe-bucket");
        assert_eq!(net.calls().create_namespace, 0);
    }

    #[tokio::test]
    async fn test_invalid_name_aborts_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(MockStorageNetwork::new());

        let err = probe(dir.path(), &net, |c| c.namespace = "Bad Name!".into())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeError::InvalidName { .. }));
        assert_eq!(net.calls().list_namespaces, 0);
        assert_eq!(net.calls().upload, 0);
    }
}
