//! # End-to-End Gateway Runs
//!
//! Boots the real gateway on an ephemeral port and drives it with the
//! real client controllers, covering the full path: controller →
//! WebSocket → gateway → relay → dispatch loop → WebSocket → controller.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::time::timeout;

    use trade_client::{
        run_wonder_trade, ClientConfig, ClientError, FriendEvent, FriendTrade, ItemSink,
        WonderOutcome,
    };
    use trade_gateway::{router, GatewayConfig};
    use trade_relay::Relay;
    use trade_types::TradeItem;

    const DEADLINE: Duration = Duration::from_secs(5);

    fn item(name: &str) -> TradeItem {
        TradeItem::with_checksum(serde_json::json!({ "species": name, "level": 30 }))
    }

    /// Collects delivered items; re-delivery of a known item is a no-op.
    #[derive(Default)]
    struct RecordingSink {
        items: Mutex<Vec<TradeItem>>,
    }

    #[async_trait]
    impl ItemSink for RecordingSink {
        async fn deliver(&self, item: TradeItem) -> anyhow::Result<()> {
            let mut items = self.items.lock();
            if !items.contains(&item) {
                items.push(item);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sink_ignores_redelivered_item() {
        // The relay redelivers a result rather than lose it, so applying
        // an already-known item a second time must change nothing.
        let sink = RecordingSink::default();
        let received = item("Porygon");

        sink.deliver(received.clone()).await.expect("first delivery");
        sink.deliver(received.clone()).await.expect("redelivery");

        assert_eq!(sink.items.lock().as_slice(), &[received]);
    }

    /// Start a gateway with fast ticks on an ephemeral port; returns the
    /// WebSocket URL of the trade endpoint.
    async fn start_gateway() -> String {
        let mut config = GatewayConfig::default();
        config.relay.tick_interval = Duration::from_millis(10);

        let relay = Relay::new(config.relay.clone());
        let app = router(relay, Arc::new(config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("gateway serve");
        });

        format!("ws://{addr}/trade")
    }

    #[tokio::test]
    async fn test_wonder_trade_between_two_clients() {
        let url = start_gateway().await;
        let config = ClientConfig::default();

        let sink_a = Arc::new(RecordingSink::default());
        let sink_b = Arc::new(RecordingSink::default());

        let a = {
            let url = url.clone();
            let config = config.clone();
            let sink = Arc::clone(&sink_a);
            tokio::spawn(async move { run_wonder_trade(&url, &config, item("Lapras"), &*sink).await })
        };
        let b = {
            let url = url.clone();
            let config = config.clone();
            let sink = Arc::clone(&sink_b);
            tokio::spawn(async move { run_wonder_trade(&url, &config, item("Dratini"), &*sink).await })
        };

        let outcome_a = timeout(DEADLINE, a).await.expect("deadline").unwrap().unwrap();
        let outcome_b = timeout(DEADLINE, b).await.expect("deadline").unwrap().unwrap();

        assert_eq!(outcome_a, WonderOutcome::Completed(item("Dratini")));
        assert_eq!(outcome_b, WonderOutcome::Completed(item("Lapras")));
        assert_eq!(sink_a.items.lock().as_slice(), &[item("Dratini")]);
        assert_eq!(sink_b.items.lock().as_slice(), &[item("Lapras")]);
    }

    #[tokio::test]
    async fn test_invalid_item_rejected_end_to_end() {
        let url = start_gateway().await;
        let sink = RecordingSink::default();

        let bad = TradeItem::new(serde_json::json!({"species": "MissingNo"}), 0);
        let outcome = timeout(
            DEADLINE,
            run_wonder_trade(&url, &ClientConfig::default(), bad, &sink),
        )
        .await
        .expect("deadline")
        .expect("run");

        assert_eq!(outcome, WonderOutcome::Rejected);
        assert!(sink.items.lock().is_empty());
    }

    #[tokio::test]
    async fn test_friend_trade_full_session() {
        let url = start_gateway().await;
        let config = ClientConfig::default();

        let (mut host, code) = FriendTrade::host(&url, &config).await.expect("host");
        let mut guest = FriendTrade::join(&url, &config, code.as_str())
            .await
            .expect("join");

        assert_eq!(
            timeout(DEADLINE, host.next_event()).await.expect("deadline").expect("event"),
            FriendEvent::FriendFound
        );

        host.offer(Some(item("Scyther"))).await.expect("offer");
        assert_eq!(
            timeout(DEADLINE, guest.next_event()).await.expect("deadline").expect("event"),
            FriendEvent::Offer(Some(item("Scyther")))
        );

        guest.offer(Some(item("Pinsir"))).await.expect("offer");
        assert_eq!(
            timeout(DEADLINE, host.next_event()).await.expect("deadline").expect("event"),
            FriendEvent::Offer(Some(item("Pinsir")))
        );

        host.accept().await.expect("accept");
        guest.accept().await.expect("accept");

        assert_eq!(
            timeout(DEADLINE, host.next_event()).await.expect("deadline").expect("event"),
            FriendEvent::Finalized(Some(item("Pinsir")))
        );
        assert_eq!(
            timeout(DEADLINE, guest.next_event()).await.expect("deadline").expect("event"),
            FriendEvent::Finalized(Some(item("Scyther")))
        );

        // The host leaving ends the session for the guest.
        host.leave().await;
        assert_eq!(
            timeout(DEADLINE, guest.next_event()).await.expect("deadline").expect("event"),
            FriendEvent::PartnerDisconnected
        );
        guest.leave().await;
    }

    #[tokio::test]
    async fn test_join_with_unknown_code_fails() {
        let url = start_gateway().await;
        let result = FriendTrade::join(&url, &ClientConfig::default(), "zzzz9999").await;
        assert!(matches!(result, Err(ClientError::FriendNotFound)));
    }

    #[tokio::test]
    async fn test_connect_timeout_surfaces() {
        // Nothing listens on this port range reservation trick: bind a
        // listener and never accept the WebSocket handshake.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let url = format!("ws://{addr}/trade");

        let config = ClientConfig {
            connect_timeout: Duration::from_millis(200),
        };
        let sink = RecordingSink::default();
        let result = run_wonder_trade(&url, &config, item("Magikarp"), &sink).await;
        assert!(matches!(result, Err(ClientError::ConnectTimeout)));
    }
}
