//! More partitions finish a latency-bound workload sooner

use crate::common::{within, TEST_TIMEOUT};
use partichan::channel::{HandlerError, PartitionedChannel, PartitionedChannelConfig};
use partichan::telemetry::Telemetry;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const MESSAGES: u64 = 10_000;

async fn time_workload(partitions: usize) -> Duration {
    let telemetry = Telemetry::new();
    let channel = PartitionedChannel::new(
        &PartitionedChannelConfig::new("throughput", 256, partitions),
        |n: &u64| *n,
        &telemetry,
    )
    .unwrap();
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let handle = channel.start_processing(
        |_n: u64, _cancel: CancellationToken| async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok::<(), HandlerError>(())
        },
        &cancel,
    ).unwrap();
    for n in 0..MESSAGES {
        channel.publish(n, &cancel).await.unwrap();
    }
    channel.complete();
    let reports = tokio::time::timeout(TEST_TIMEOUT * 12, handle.join())
        .await
        .expect("workload timed out")
        .unwrap();
    let elapsed = started.elapsed();

    let processed: u64 = reports.iter().map(|r| r.processed).sum();
    assert_eq!(processed, MESSAGES);
    elapsed
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore = "slow"]
async fn test_partition_count_reduces_wall_clock_time() {
    let one = time_workload(1).await;
    let four = time_workload(4).await;
    let eight = time_workload(8).await;
    println!("1 partition: {:?}, 4: {:?}, 8: {:?}", one, four, eight);

    assert!(four * 2 < one, "4 partitions ({:?}) vs 1 ({:?})", four, one);
    assert!(eight < four, "8 partitions ({:?}) vs 4 ({:?})", eight, four);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_small_workload_completes_on_every_partition_count() {
    for partitions in [1, 4, 8] {
        let telemetry = Telemetry::new();
        let channel = PartitionedChannel::new(
            &PartitionedChannelConfig::new("smoke", 16, partitions),
            |n: &u64| *n,
            &telemetry,
        )
        .unwrap();
        let cancel = CancellationToken::new();
        let handle = channel.start_processing(
            |_n: u64, _cancel: CancellationToken| async { Ok::<(), HandlerError>(()) },
            &cancel,
        ).unwrap();
        for n in 0..200u64 {
            channel.publish(n, &cancel).await.unwrap();
        }
        channel.complete();
        let reports = within(handle.join()).await.unwrap();
        assert_eq!(reports.len(), partitions);
        assert_eq!(channel.queue_depth(), 0);
    }
}
