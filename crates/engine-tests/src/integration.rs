#[cfg(test)]
mod tests {
    use crate::utils::{
        config, list_keys, read_object, read_text, record, run_singer, schema, singer_input,
        state,
    };
    use arrow_array::{Array, Float64Array, Int64Array, StringArray};
    use connectors::storage::{StorageSink, object::ObjectStorageSink};
    use engine_config::settings::{TargetConfig, format::Compression};
    use engine_runtime::execution::factory;
    use flate2::read::GzDecoder;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use serde_json::json;
    use std::{io::Read, sync::Arc};
    use tracing_test::traced_test;

    // Scenario: three records for one stream, no limit reached before end of input.
    // Expected Outcome: one jsonl artifact with three lines in arrival order.
    #[traced_test]
    #[tokio::test]
    async fn test_jsonl_single_batch() {
        let sink = Arc::new(ObjectStorageSink::in_memory());
        let store = sink.store();
        let input = singer_input(&[
            schema("public-users"),
            record("public-users", json!({"id": 1, "name": "a"})),
            record("public-users", json!({"id": 2, "name": "b"})),
            record("public-users", json!({"id": 3, "name": "c"})),
        ]);

        let output = run_singer(config("jsonl"), sink, &input).await;
        let summary = output.result.unwrap();

        assert_eq!(list_keys(&store).await, vec!["users/000001.jsonl"]);
        assert_eq!(
            read_text(&store, "users/000001.jsonl").await,
            "{\"id\":1,\"name\":\"a\"}\n{\"id\":2,\"name\":\"b\"}\n{\"id\":3,\"name\":\"c\"}\n"
        );
        assert_eq!(summary.metrics.records_appended, 3);
        assert!(logs_contain("Batch stored"));
    }

    // Test Settings: max_records = 3.
    // Scenario: the third record reaches the limit.
    // Expected Outcome: the drain happens on that record, three lines in insertion order.
    #[traced_test]
    #[tokio::test]
    async fn test_record_limit_drains_batch() {
        let sink = Arc::new(ObjectStorageSink::in_memory());
        let store = sink.store();
        let mut config = config("jsonl");
        config.format.batch.max_records = 3;

        let input = singer_input(&[
            record("letters", json!({"a": 1})),
            record("letters", json!({"a": 2})),
            record("letters", json!({"a": 3})),
        ]);
        run_singer(config, sink, &input).await.result.unwrap();

        let keys = list_keys(&store).await;
        assert_eq!(keys.len(), 1);
        assert!(keys[0].ends_with(".jsonl"));
        let text = read_text(&store, &keys[0]).await;
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines, vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3})]);
        assert!(logs_contain("reason=max_records"));
    }

    // Scenario: a record carries an escaped lone surrogate inside its text.
    // Expected Outcome: the stored text has the surrogate removed, nothing else changes.
    #[traced_test]
    #[tokio::test]
    async fn test_surrogates_are_stripped() {
        let sink = Arc::new(ObjectStorageSink::in_memory());
        let store = sink.store();
        let input = concat!(
            "{\"type\":\"RECORD\",\"stream\":\"notes\",\"record\":{\"text\":\"Hello\\ud800World\",\"tags\":[\"a\\udfffb\"]}}\n",
        );

        run_singer(config("jsonl"), sink, input).await.result.unwrap();

        assert_eq!(
            read_text(&store, "notes/000001.jsonl").await,
            "{\"text\":\"HelloWorld\",\"tags\":[\"ab\"]}\n"
        );
    }

    // Test Settings: max_records = 100.
    // Scenario: the input ends after a single record.
    // Expected Outcome: finalize still stores exactly that record.
    #[traced_test]
    #[tokio::test]
    async fn test_finalize_partial_batch() {
        let sink = Arc::new(ObjectStorageSink::in_memory());
        let store = sink.store();
        let mut config = config("jsonl");
        config.format.batch.max_records = 100;

        let input = singer_input(&[record("events", json!({"n": 1}))]);
        run_singer(config, sink, &input).await.result.unwrap();

        assert_eq!(read_text(&store, "events/000001.jsonl").await, "{\"n\":1}\n");
    }

    // Test Settings: max_records = 2.
    // Scenario: five records for one stream.
    // Expected Outcome: three artifacts with strictly increasing sequence numbers.
    #[traced_test]
    #[tokio::test]
    async fn test_keys_are_unique_per_drain() {
        let sink = Arc::new(ObjectStorageSink::in_memory());
        let store = sink.store();
        let mut config = config("jsonl");
        config.format.batch.max_records = 2;

        let messages: Vec<_> = (0..5).map(|n| record("events", json!({"n": n}))).collect();
        let summary = run_singer(config, sink, &singer_input(&messages))
            .await
            .result
            .unwrap();

        assert_eq!(
            list_keys(&store).await,
            vec!["events/000001.jsonl", "events/000002.jsonl", "events/000003.jsonl"]
        );
        assert_eq!(read_text(&store, "events/000003.jsonl").await, "{\"n\":4}\n");
        assert_eq!(summary.stream("events").unwrap().summary.batches, 3);
    }

    // Scenario: the third record introduces a column the first two lack.
    // Expected Outcome: csv header lists all columns, missing cells are empty.
    #[traced_test]
    #[tokio::test]
    async fn test_csv_null_fill() {
        let sink = Arc::new(ObjectStorageSink::in_memory());
        let store = sink.store();
        let input = singer_input(&[
            record("people", json!({"id": 1, "name": "a"})),
            record("people", json!({"id": 2, "name": null})),
            record("people", json!({"id": 3, "name": "c", "email": "c@x.io"})),
        ]);

        run_singer(config("csv"), sink, &input).await.result.unwrap();

        assert_eq!(
            read_text(&store, "people/000001.csv").await,
            "id,name,email\n1,a,\n2,,\n3,c,c@x.io\n"
        );
    }

    // Scenario: integer, float and text columns written as parquet.
    // Expected Outcome: the file reads back with inferred Arrow types.
    #[traced_test]
    #[tokio::test]
    async fn test_parquet_readback() {
        let sink = Arc::new(ObjectStorageSink::in_memory());
        let store = sink.store();
        let input = singer_input(&[
            record("metrics", json!({"id": 1, "score": 1.5, "label": "x"})),
            record("metrics", json!({"id": 2, "score": 2, "label": null})),
        ]);

        run_singer(config("parquet"), sink, &input).await.result.unwrap();

        let body = read_object(&store, "metrics/000001.parquet").await;
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(body)
            .unwrap()
            .build()
            .unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.num_rows(), 2);

        let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ids.value(1), 2);
        let scores = batch.column(1).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(scores.value(1), 2.0);
        let labels = batch.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(labels.value(0), "x");
        assert!(labels.is_null(1));
    }

    // Test Settings: compression = gzip.
    // Expected Outcome: the artifact key ends in .jsonl.gz and inflates to the jsonl body.
    #[traced_test]
    #[tokio::test]
    async fn test_gzip_jsonl() {
        let sink = Arc::new(ObjectStorageSink::in_memory());
        let store = sink.store();
        let mut config = config("jsonl");
        config.format.compression = Compression::Gzip;

        let input = singer_input(&[record("logs", json!({"m": "up"}))]);
        run_singer(config, sink, &input).await.result.unwrap();

        let body = read_object(&store, "logs/000001.jsonl.gz").await;
        let mut text = String::new();
        GzDecoder::new(body.as_ref()).read_to_string(&mut text).unwrap();
        assert_eq!(text, "{\"m\":\"up\"}\n");
    }

    // Scenario: two streams interleaved, with a state message in between.
    // Expected Outcome: independent key sequences; the state is echoed once.
    #[traced_test]
    #[tokio::test]
    async fn test_interleaved_streams_with_state() {
        let sink = Arc::new(ObjectStorageSink::in_memory());
        let store = sink.store();
        let mut config = config("jsonl");
        config.format.batch.max_records = 1;

        let input = singer_input(&[
            record("shop-orders", json!({"id": 1})),
            record("shop-items", json!({"id": 7})),
            record("shop-orders", json!({"id": 2})),
            state(json!({"bookmarks": {"orders": 2}})),
        ]);
        let output = run_singer(config, sink, &input).await;
        let summary = output.result.unwrap();

        assert_eq!(
            list_keys(&store).await,
            vec!["items/000001.jsonl", "orders/000001.jsonl", "orders/000002.jsonl"]
        );
        assert_eq!(output.state_lines, vec![r#"{"bookmarks":{"orders":2}}"#]);
        assert_eq!(summary.metrics.states_emitted, 1);
    }

    // Test Settings: prefix, date folders with partition names, process date.
    // Expected Outcome: keys follow the configured layout and every record is stamped.
    #[traced_test]
    #[tokio::test]
    async fn test_key_layout_and_process_date() {
        let sink = Arc::new(ObjectStorageSink::in_memory());
        let store = sink.store();
        let mut config = config("jsonl");
        config.prefix = "/raw/".to_string();
        config.append_date_to_prefix = true;
        config.partition_name_enabled = true;
        config.include_process_date = true;

        let input = singer_input(&[record("public-users", json!({"id": 1}))]);
        run_singer(config, sink, &input).await.result.unwrap();

        let keys = list_keys(&store).await;
        assert_eq!(keys.len(), 1);
        let key = &keys[0];
        assert!(key.starts_with("raw/year="), "{key}");
        assert!(key.contains("/month=") && key.contains("/day="), "{key}");
        assert!(key.ends_with("/users/000001.jsonl"), "{key}");

        let line = read_text(&store, key).await;
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert!(value["_process_date"].as_str().unwrap().ends_with('Z'));
    }

    // Test Settings: local provider rooted in a temporary directory.
    // Expected Outcome: the artifact is written as a file below the root.
    #[traced_test]
    #[tokio::test]
    async fn test_local_filesystem_provider() {
        let dir = tempfile::tempdir().unwrap();
        let raw = json!({
            "format": {"format_type": "jsonl", "batch": {"max_age_secs": 0}},
            "cloud_provider": {
                "cloud_provider_type": "local",
                "local": {"root": dir.path().to_str().unwrap()}
            },
            "append_date_to_prefix": false,
            "append_date_to_filename": false
        });
        let config = TargetConfig::from_json(&raw.to_string()).unwrap();
        let sink: Arc<dyn StorageSink> = factory::create_sink(&config).unwrap();

        let input = singer_input(&[record("public-users", json!({"id": 1}))]);
        run_singer(config, sink, &input).await.result.unwrap();

        let written = std::fs::read_to_string(dir.path().join("users/000001.jsonl")).unwrap();
        assert_eq!(written, "{\"id\":1}\n");
    }
}
