//! A failing message is recorded and the partition carries on

use crate::common::{order_channel, within, InvalidOperation, Order};
use partichan::channel::HandlerError;
use partichan::telemetry::Telemetry;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_third_of_five_fails_others_processed() {
    let (telemetry, spans) = Telemetry::with_span_collector();
    let channel = order_channel("isolated", 8, 1, &telemetry);
    let cancel = CancellationToken::new();
    let observed = Arc::new(Mutex::new(Vec::new()));

    let handle = {
        let observed = observed.clone();
        channel.start_processing(
            move |order: Order, _cancel: CancellationToken| {
                let observed = observed.clone();
                async move {
                    if order.number == 3 {
                        return Err(InvalidOperation(order.number).into());
                    }
                    observed
                        .lock()
                        .map_err(|e| HandlerError::msg(e))?
                        .push(order.number);
                    Ok::<(), HandlerError>(())
                }
            },
            &cancel,
        ).unwrap()
    };

    for number in 1..=5 {
        channel.publish(Order::new("c", number), &cancel).await.unwrap();
    }
    channel.complete();
    let reports = within(handle.join()).await.unwrap();
    telemetry.flush();

    assert_eq!(reports[0].processed, 4);
    assert_eq!(reports[0].failed, 1);
    assert_eq!(*observed.lock().unwrap(), vec![1, 2, 4, 5]);

    let stats = &channel.stats()[0];
    assert_eq!((stats.processed, stats.failed, stats.queue_depth), (4, 1, 0));
    assert!(telemetry
        .metrics_text()
        .unwrap()
        .contains("error_type=\"InvalidOperation\""));
    assert_eq!(spans.error_count(), 1);
}
