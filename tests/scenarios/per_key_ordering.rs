//! Interleaved customers each keep their order on a single partition

use crate::common::{order_channel, within, Order};
use partichan::channel::HandlerError;
use partichan::telemetry::Telemetry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

type Seen = Arc<Mutex<HashMap<String, Vec<(usize, u32)>>>>;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_customers_processed_in_order_on_one_partition() {
    let telemetry = Telemetry::new();
    let channel = Arc::new(order_channel("orders", 16, 4, &telemetry));
    let cancel = CancellationToken::new();
    let seen: Seen = Arc::default();

    // Record which partition handled each order by routing it again
    let handle = {
        let seen = seen.clone();
        let router = channel.clone();
        channel.start_processing(
            move |order: Order, _cancel: CancellationToken| {
                let seen = seen.clone();
                let partition = router.partition_for(&order);
                async move {
                    seen.lock()
                        .map_err(|e| HandlerError::msg(e))?
                        .entry(order.customer)
                        .or_default()
                        .push((partition, order.number));
                    Ok::<(), HandlerError>(())
                }
            },
            &cancel,
        ).unwrap()
    };

    let mut published_to = HashMap::new();
    for number in 1..=100 {
        for customer in ["X", "Y"] {
            let partition = within(channel.publish(Order::new(customer, number), &cancel))
                .await
                .unwrap();
            published_to
                .entry(customer.to_string())
                .or_insert_with(Vec::new)
                .push(partition);
        }
    }
    channel.complete();
    within(handle.join()).await.unwrap();

    let seen = seen.lock().unwrap();
    for customer in ["X", "Y"] {
        let orders = &seen[customer];
        let numbers: Vec<u32> = orders.iter().map(|(_, n)| *n).collect();
        assert_eq!(numbers, (1..=100).collect::<Vec<_>>(), "customer {}", customer);

        let partitions = &published_to[customer];
        assert!(partitions.iter().all(|p| *p == partitions[0]));
        assert!(orders.iter().all(|(p, _)| *p == partitions[0]));
    }
}
