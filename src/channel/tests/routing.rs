//! Tests for key-to-partition routing

#[cfg(test)]
mod tests {
    use super::super::helpers::{keyed_channel, Item};
    use crate::channel::{ChannelError, PartitionedChannel, PartitionedChannelConfig};
    use crate::telemetry::Telemetry;
    use std::hash::{BuildHasher, Hasher};
    use tokio_util::sync::CancellationToken;

    /// Sends every key to partition 0
    #[derive(Clone, Copy, Default)]
    struct ConstantBuildHasher;

    struct ConstantHasher;

    impl Hasher for ConstantHasher {
        fn finish(&self) -> u64 {
            0
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    impl BuildHasher for ConstantBuildHasher {
        type Hasher = ConstantHasher;

        fn build_hasher(&self) -> Self::Hasher {
            ConstantHasher
        }
    }

    #[test]
    fn test_routing_is_deterministic() {
        let telemetry = Telemetry::new();
        let channel = keyed_channel("routing", 4, 8, &telemetry);

        for n in 0..200 {
            let key = format!("customer-{}", n);
            let index = channel.partition_for_key(&key);
            assert!(index < 8);
            assert_eq!(index, channel.partition_for_key(&key));
            assert_eq!(index, channel.partition_for(&Item::new(key, 1)));
        }
    }

    #[test]
    fn test_routing_is_stable_across_instances() {
        let first = keyed_channel("stable", 4, 16, &Telemetry::new());
        let second = keyed_channel("stable", 4, 16, &Telemetry::new());

        for n in 0..100 {
            let key = format!("device-{}", n);
            assert_eq!(first.partition_for_key(&key), second.partition_for_key(&key));
        }
    }

    #[test]
    fn test_keys_spread_over_partitions() {
        let telemetry = Telemetry::new();
        let channel = keyed_channel("spread", 4, 4, &telemetry);
        let mut hits = [0usize; 4];
        for n in 0..1000 {
            hits[channel.partition_for_key(&format!("k{}", n))] += 1;
        }
        assert!(hits.iter().all(|&count| count > 0), "hits: {:?}", hits);
    }

    #[tokio::test]
    async fn test_publish_lands_on_routed_partition() {
        let telemetry = Telemetry::new();
        let channel = keyed_channel("landing", 16, 4, &telemetry);
        let cancel = CancellationToken::new();

        let item = Item::new("alice", 0);
        let expected = channel.partition_for(&item);
        let index = channel.publish(item, &cancel).await.unwrap();
        assert_eq!(index, expected);

        let stats = channel.stats();
        for (partition, snapshot) in stats.iter().enumerate() {
            assert_eq!(snapshot.partition, Some(partition));
            let expected_published = u64::from(partition == index);
            assert_eq!(snapshot.published, expected_published);
        }
        assert_eq!(channel.queue_depth(), 1);
    }

    #[tokio::test]
    async fn test_custom_hasher() {
        let telemetry = Telemetry::new();
        let channel = PartitionedChannel::with_hasher(
            &PartitionedChannelConfig::new("custom", 8, 4),
            |n: &u64| *n,
            ConstantBuildHasher,
            &telemetry,
        )
        .unwrap();
        let cancel = CancellationToken::new();

        for n in 0..5u64 {
            assert_eq!(channel.publish(n, &cancel).await.unwrap(), 0);
        }
        assert_eq!(channel.stats()[0].published, 5);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let telemetry = Telemetry::new();
        for config in [
            PartitionedChannelConfig::new("zero-partitions", 4, 0),
            PartitionedChannelConfig::new("zero-capacity", 0, 4),
            PartitionedChannelConfig::new("  ", 4, 4),
        ] {
            let result = PartitionedChannel::new(&config, |n: &u32| *n, &telemetry);
            assert!(matches!(
                result,
                Err(ChannelError::InvalidConfiguration { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_complete_closes_every_partition() {
        let telemetry = Telemetry::new();
        let channel = keyed_channel("complete-all", 4, 3, &telemetry);
        let cancel = CancellationToken::new();
        channel.complete();
        assert!(channel.is_completed());

        for n in 0..10 {
            let err = channel
                .publish(Item::new(format!("k{}", n), 0), &cancel)
                .await
                .unwrap_err();
            assert!(err.is_closed());
        }
    }
}
