#[cfg(test)]
mod tests {
    use crate::utils::{
        ADDRESS, QUOTES_DB, init_logging, insert_calls, pool, quotes_cluster, quotes_table,
        quotes_writer_options, stored_doubles, stored_rows, wait_for_exit,
    };
    use chrono::NaiveDate;
    use connectors::memory::{MemoryCluster, TableDefinition};
    use engine_config::{AppenderOptions, PoolOptions, WriterOptions, settings::from_json};
    use engine_processing::{AppendError, MultiGoroutineTable, PartitionedTableAppender, TableState};
    use model::{ColumnType, DataForm, DataType, RawValue, Value, Vector, row};
    use partition::PartitionType;
    use std::time::Duration;
    use tracing_test::traced_test;

    // Settings: BatchSize = 10, Throttle = 50ms, GoroutineCount = 3, PartitionCol = sym.
    // Scenario: one row for each of the three VALUE partitions A, B and C.
    // Expected Outcome:
    // - every row is written once, by the worker its partition hashes to;
    // - the table reports three sent rows and nothing left behind.
    #[traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn tc01() {
        let cluster = quotes_cluster();
        let writer = MultiGoroutineTable::new(quotes_writer_options(3), &cluster.dialer())
            .await
            .unwrap();

        writer.insert(row!["A", 1.0]).unwrap();
        writer.insert(row!["B", 2.0]).unwrap();
        writer.insert(row!["C", 3.0]).unwrap();
        writer.wait_for_completion().await.unwrap();

        let status = writer.status();
        assert_eq!(status.sent_rows, 3);
        assert_eq!(status.unsent_rows, 0);
        assert_eq!(status.failed_rows, 0);
        assert!(writer.get_unwritten_data().is_empty());

        // A -> worker 0, C -> worker 1, B -> worker 2.
        let sent: Vec<u64> = status.workers.iter().map(|w| w.sent_rows).collect();
        assert_eq!(sent, vec![1, 1, 1]);

        let mut values = stored_doubles(&cluster, Some(QUOTES_DB), "quotes", "val");
        values.sort_by(f64::total_cmp);
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert!(logs_contain("Multi-worker table writer closed"));
    }

    // Settings: BatchSize = 1, GoroutineCount = 3; the server fails every
    // insert after the first two.
    // Scenario: 30 rows spread over all partitions.
    // Expected Outcome:
    // - the table is poisoned with the server's message;
    // - sent rows plus unwritten rows account for every accepted row;
    // - replaying the unwritten rows on a fresh writer lands them all.
    #[traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn tc02() {
        let cluster = quotes_cluster();
        cluster.fail_inserts_after(2, "node unavailable");
        let options = quotes_writer_options(3).with_batch_size(1);
        let writer = MultiGoroutineTable::new(options.clone(), &cluster.dialer())
            .await
            .unwrap();

        let symbols = ["A", "B", "C"];
        let mut accepted = 0usize;
        for i in 0..30 {
            if writer.insert(row![symbols[i % 3], i as f64]).is_ok() {
                accepted += 1;
            }
        }
        wait_for_exit(&writer).await;
        writer.wait_for_completion().await.unwrap();

        assert_eq!(
            writer.state(),
            TableState::Poisoned("server response: node unavailable".to_string())
        );
        let sent = writer.status().sent_rows as usize;
        let unwritten = writer.get_unwritten_data();
        assert_eq!(sent + unwritten.len(), accepted);
        assert_eq!(stored_rows(&cluster, Some(QUOTES_DB), "quotes"), sent);
        assert!(logs_contain("Failed to write batch, table stops accepting rows"));

        cluster.clear_faults();
        let replay = MultiGoroutineTable::new(options, &cluster.dialer())
            .await
            .unwrap();
        replay.insert_unwritten_data(unwritten).unwrap();
        replay.wait_for_completion().await.unwrap();

        assert_eq!(stored_rows(&cluster, Some(QUOTES_DB), "quotes"), accepted);
        assert_eq!(cluster.open_connections(), 0);
    }

    // Settings: pool of 3 connections, 20ms server latency.
    // Scenario: a bulk append touching every partition, then one where the
    // server rejects rows of partition B.
    // Expected Outcome:
    // - the first append reports every row, with at most 3 calls in flight;
    // - the second fails with the server's error while A and C stay written.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn tc03() {
        let _logging = init_logging();
        let cluster = quotes_cluster();
        cluster.set_latency(Duration::from_millis(20));
        let pool = pool(&cluster, PoolOptions::new(ADDRESS).with_pool_size(3)).await;
        let appender = PartitionedTableAppender::new(
            AppenderOptions::new("quotes", "sym").with_db_path(QUOTES_DB),
            pool.clone(),
        )
        .await
        .unwrap();

        let rows = appender
            .append(&quotes_table(
                &["A", "B", "C", "A", "B", "C"],
                &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            ))
            .await
            .unwrap();
        assert_eq!(rows, 6);
        assert!(cluster.max_in_flight() <= 3);
        assert_eq!(insert_calls(&cluster), 3);

        cluster.reject_value(Value::Symbol("B".into()));
        let err = appender
            .append(&quotes_table(&["A", "B", "C"], &[7.0, 8.0, 9.0]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppendError::Connection(_)));
        assert_eq!(stored_rows(&cluster, Some(QUOTES_DB), "quotes"), 8);

        appender.close().await.unwrap();
        assert!(pool.is_closed());
        assert_eq!(cluster.open_connections(), 0);
    }

    // Settings: LoadBalance = true without explicit addresses, PoolSize = 4.
    // Scenario: the controller reports two live data nodes.
    // Expected Outcome:
    // - the pool asks the controller once, then alternates between the nodes;
    // - appends through the pool use the node connections.
    #[tokio::test]
    async fn tc04() {
        let _logging = init_logging();
        let cluster = quotes_cluster();
        cluster.set_live_nodes(["10.0.0.1:8848:node1", "10.0.0.2:8848:node2"]);
        let pool = pool(
            &cluster,
            PoolOptions::new("controller:8848")
                .with_pool_size(4)
                .with_load_balance(true),
        )
        .await;

        assert_eq!(
            cluster.dialed_addresses(),
            vec![
                "controller:8848",
                "10.0.0.1:8848",
                "10.0.0.2:8848",
                "10.0.0.1:8848",
                "10.0.0.2:8848",
            ]
        );
        assert_eq!(pool.addresses(), ["10.0.0.1:8848", "10.0.0.2:8848"]);

        let appender = PartitionedTableAppender::new(
            AppenderOptions::new("quotes", "sym").with_db_path(QUOTES_DB),
            pool,
        )
        .await
        .unwrap();
        let rows = appender
            .append(&quotes_table(&["A", "B", "C"], &[1.0, 2.0, 3.0]))
            .await
            .unwrap();
        assert_eq!(rows, 3);
        assert!(
            cluster
                .calls()
                .iter()
                .filter(|c| c.request.starts_with("tableInsert"))
                .all(|c| c.address != "controller:8848")
        );
    }

    // Settings: in-memory table with an array column, one worker.
    // Scenario: rows carrying a list, a single value and a null for the
    // array column.
    // Expected Outcome: each row lands as one nested vector cell.
    #[tokio::test]
    async fn tc05() {
        let _logging = init_logging();
        let cluster = MemoryCluster::new();
        cluster
            .create_table(
                None,
                "ticks",
                TableDefinition::new([
                    ("id", ColumnType::Scalar(DataType::Int)),
                    ("prices", ColumnType::Array(DataType::Double)),
                ]),
            )
            .unwrap();
        let options = WriterOptions::new(ADDRESS, "ticks");
        let writer = MultiGoroutineTable::new(options, &cluster.dialer())
            .await
            .unwrap();

        writer.insert(row![1, vec![1.5, 2.5]]).unwrap();
        writer.insert(row![2, 4.0]).unwrap();
        writer.insert(row![3, RawValue::Null]).unwrap();
        writer.wait_for_completion().await.unwrap();
        assert_eq!(writer.status().sent_rows, 3);

        let stored = cluster.table(None, "ticks").unwrap();
        let prices = stored.column_by_name("prices").unwrap();
        assert_eq!(prices.column_type(), ColumnType::Array(DataType::Double));

        let cells: Vec<Vec<Value>> = prices
            .iter()
            .map(|cell| cell.as_vector().unwrap().values().to_vec())
            .collect();
        assert_eq!(
            cells,
            vec![
                vec![Value::Double(1.5), Value::Double(2.5)],
                vec![Value::Double(4.0)],
                vec![Value::Null],
            ]
        );
    }

    // Settings: writer options parsed from JSON.
    // Scenario: a composite DATE VALUE + SYMBOL HASH(4) table routed on sym
    // over two workers.
    // Expected Outcome:
    // - A (bucket 1) goes to worker 1 and B (bucket 2) to worker 0;
    // - dates are packed into DATE cells.
    #[tokio::test]
    async fn tc06() {
        let _logging = init_logging();
        let cluster = MemoryCluster::new();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let dates = Vector::from_values(
            ColumnType::Scalar(DataType::Date),
            vec![Value::Date(19_724)],
        )
        .unwrap();
        cluster
            .create_table(
                Some("dfs://ticks"),
                "trades",
                TableDefinition::new([
                    ("date", ColumnType::Scalar(DataType::Date)),
                    ("sym", ColumnType::Scalar(DataType::Symbol)),
                    ("price", ColumnType::Scalar(DataType::Double)),
                ])
                .partitioned_by("date", PartitionType::Value, DataForm::Vector(dates))
                .partitioned_by("sym", PartitionType::Hash, DataForm::Scalar(Value::Int(4))),
            )
            .unwrap();

        let options: WriterOptions = from_json(
            r#"{
                "Database": "dfs://ticks",
                "TableName": "trades",
                "Address": "localhost:8848",
                "BatchSize": 100,
                "Throttle": 10,
                "GoroutineCount": 2,
                "PartitionCol": "sym"
            }"#,
        )
        .unwrap();
        let writer = MultiGoroutineTable::new(options, &cluster.dialer())
            .await
            .unwrap();

        writer.insert(row![day, "A", 10.0]).unwrap();
        writer.insert(row![day, "B", 20.0]).unwrap();
        writer.wait_for_completion().await.unwrap();

        let workers = writer.status().workers;
        assert_eq!(workers[0].sent_rows, 1);
        assert_eq!(workers[1].sent_rows, 1);

        let stored = cluster.table(Some("dfs://ticks"), "trades").unwrap();
        assert_eq!(
            stored.column_by_name("date").unwrap().values(),
            &[Value::Date(19_724), Value::Date(19_724)]
        );
    }
}
