//! Tests for the lazy stream view over a channel

#[cfg(test)]
mod tests {
    use super::super::helpers::{channel, within};
    use futures::StreamExt;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_stream_yields_in_order_and_ends_when_drained() {
        let (channel, _telemetry) = channel::<u32>("stream", 8);
        let cancel = CancellationToken::new();
        for value in 0..5 {
            channel.publish(value, &cancel).await.unwrap();
        }
        channel.complete();

        let reader = channel.reader();
        let received: Vec<u32> = within(
            reader
                .stream(cancel.clone())
                .map(|envelope| envelope.into_message())
                .collect(),
        )
        .await;
        assert_eq!(received, vec![0, 1, 2, 3, 4]);

        // A fresh stream starts at the current head, which is now empty
        let again: Vec<_> = within(reader.stream(cancel).collect::<Vec<_>>()).await;
        assert!(again.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stream_waits_for_slow_producer() {
        let (channel, _telemetry) = channel::<u32>("stream-slow", 2);
        let cancel = CancellationToken::new();

        let producer = {
            let channel = channel.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                for value in 0..20 {
                    channel.publish(value, &cancel).await.unwrap();
                    if value % 5 == 0 {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                }
                channel.complete();
            })
        };

        let received: Vec<u32> = within(
            channel
                .reader()
                .stream(cancel)
                .map(|envelope| envelope.into_message())
                .collect(),
        )
        .await;
        within(producer).await.unwrap();
        assert_eq!(received, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_stream_ends_on_cancellation() {
        let (channel, _telemetry) = channel::<u32>("stream-cancel", 4);
        let cancel = CancellationToken::new();
        channel.publish(1, &cancel).await.unwrap();

        let mut stream = Box::pin(channel.reader().stream(cancel.clone()));
        assert_eq!(stream.next().await.map(|e| e.into_message()), Some(1));

        cancel.cancel();
        assert!(within(stream.next()).await.is_none());
    }
}
