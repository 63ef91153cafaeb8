//! A capacity-2 channel suspends the third publish until a read frees a slot

use crate::common::within;
use partichan::channel::{Channel, ChannelConfig};
use partichan::telemetry::Telemetry;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_third_publish_waits_for_read() {
    let telemetry = Telemetry::new();
    let channel: Channel<&'static str> =
        Channel::new(&ChannelConfig::new("letters", 2), &telemetry).unwrap();
    let cancel = CancellationToken::new();

    within(channel.publish("a", &cancel)).await.unwrap();
    within(channel.publish("b", &cancel)).await.unwrap();

    let third = {
        let channel = channel.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { channel.publish("c", &cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!third.is_finished(), "publish of 'c' should be waiting");

    let reader = channel.reader();
    let mut received = vec![within(reader.read(&cancel)).await.unwrap().unwrap()];
    within(third).await.unwrap().unwrap();

    channel.complete();
    while let Some(envelope) = within(reader.read(&cancel)).await.unwrap() {
        received.push(envelope);
    }

    for envelope in &received {
        channel.record_processed(envelope, Duration::ZERO);
    }
    let order: Vec<_> = received.into_iter().map(|e| e.into_message()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);

    let stats = channel.stats();
    assert_eq!(stats.published, 3);
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.queue_depth, 0);
}
