//! # Ledger Scenarios
//!
//! One line per successful upload, appended in order, in the layout
//! `<identifier> <sourceTag> <label> <timestamp>`.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{FixedOffset, TimeZone};
    use probe_core::{
        ContentIdentifier, GatewayKind, MockStorageNetwork, ProbeApi, RecordLedger, UploadRecord,
        LEDGER_FILE_NAME,
    };

    use crate::integration::probe;

    fn record(cid: &str, second: u32) -> UploadRecord {
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        UploadRecord {
            cid: ContentIdentifier::new(cid),
            display_name: "rand.txt".to_string(),
            origin: GatewayKind::Public,
            timestamp: ist.with_ymd_and_hms(2024, 5, 1, 9, 30, second).unwrap(),
        }
    }

    #[test]
    fn test_two_appends_in_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = RecordLedger::in_workspace(dir.path());

        ledger.append(&record("abc123", 1)).unwrap();
        ledger.append(&record("def456", 2)).unwrap();

        let text = std::fs::read_to_string(dir.path().join(LEDGER_FILE_NAME)).unwrap();
        assert_eq!(
            text,
            "abc123 pub rand.txt 2024-05-01 09:30:01 +05:30\n\
             def456 pub rand.txt 2024-05-01 09:30:02 +05:30\n"
        );

        let records = ledger.read_records().unwrap();
        assert_eq!(records, vec![record("abc123", 1), record("def456", 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_appends_one_line_per_upload() {
        let dir = tempfile::tempdir().unwrap();
        let net = Arc::new(MockStorageNetwork::new().with_identifiers(["abc123", "def456"]));
        let mut service = probe(dir.path(), &net, |c| c.max_iterations = Some(2));

        service.run().await.unwrap();

        let text =
            std::fs::read_to_string(dir.path().join("CESS_STORAGE").join(LEDGER_FILE_NAME)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("abc123 pub rand.txt "));
        assert!(lines[1].starts_with("def456 pub rand.txt "));
        assert!(lines.iter().all(|l| l.ends_with("+05:30")));
    }

    #[tokio::test]
    async fn test_existing_ledger_is_extended() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = dir.path().join("CESS_STORAGE");
        std::fs::create_dir_all(&workspace).unwrap();
        RecordLedger::in_workspace(&workspace)
            .append(&record("old001", 0))
            .unwrap();

        let net = Arc::new(MockStorageNetwork::new().with_identifiers(["new002"]));
        let mut service = probe(dir.path(), &net, |c| c.gateway.account = "cXselfhosted".into());
        service.run().await.unwrap();

        let records = service.ledger().read_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cid.as_str(), "old001");
        assert_eq!(records[1].cid.as_str(), "new002");
        assert_eq!(records[1].origin, GatewayKind::SelfHosted);
    }
}
