//! # Friend Trade Integration Flows
//!
//! Full negotiation rounds through the relay facade: rendezvous by code,
//! offer forwarding, simultaneous acceptance, disconnect propagation,
//! and repeat rounds on the same code.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use trade_relay::{Relay, RelayConfig, RelayError};
    use trade_types::{ClientEvent, ConnectionId, FriendCode, ServerEvent, TradeItem, TradeMode};

    const DEADLINE: Duration = Duration::from_secs(2);

    fn relay() -> Relay {
        Relay::new(RelayConfig {
            tick_interval: Duration::from_millis(10),
            ..Default::default()
        })
    }

    fn item(name: &str) -> TradeItem {
        TradeItem::with_checksum(serde_json::json!({ "species": name, "level": 12 }))
    }

    /// Connect and declare Friend mode.
    fn friend_client(relay: &Relay) -> (ConnectionId, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let id = relay.connect(tx);
        relay
            .handle_event(id, ClientEvent::DeclareMode { mode: TradeMode::Friend })
            .expect("declare mode");
        (id, rx)
    }

    async fn expect_event(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
        timeout(DEADLINE, rx.recv())
            .await
            .expect("event within deadline")
            .expect("channel open")
    }

    /// Host a session and join it, consuming both `friendFound`s.
    async fn matched_pair(
        relay: &Relay,
    ) -> (
        (ConnectionId, mpsc::Receiver<ServerEvent>),
        (ConnectionId, mpsc::Receiver<ServerEvent>),
        FriendCode,
    ) {
        let (host, mut host_rx) = friend_client(relay);
        let (guest, mut guest_rx) = friend_client(relay);

        relay.handle_event(host, ClientEvent::CreateCode).unwrap();
        let code = match expect_event(&mut host_rx).await {
            ServerEvent::CreateCode { code } => code,
            other => panic!("expected createCode, got {other:?}"),
        };

        relay
            .handle_event(
                guest,
                ClientEvent::CheckCode {
                    code: code.as_str().to_owned(),
                },
            )
            .unwrap();

        assert_eq!(expect_event(&mut host_rx).await, ServerEvent::FriendFound);
        assert_eq!(expect_event(&mut guest_rx).await, ServerEvent::FriendFound);

        ((host, host_rx), (guest, guest_rx), code)
    }

    #[tokio::test]
    async fn test_rendezvous_by_code() {
        let relay = relay();
        let ((host, _), (guest, _), _code) = matched_pair(&relay).await;
        assert_eq!(relay.friends().friend_of(host), Some(guest));
        assert_eq!(relay.friends().friend_of(guest), Some(host));
    }

    #[tokio::test]
    async fn test_unknown_code_answered_not_found() {
        let relay = relay();
        let (guest, mut guest_rx) = friend_client(&relay);

        relay
            .handle_event(
                guest,
                ClientEvent::CheckCode {
                    code: "zzzz9999".to_owned(),
                },
            )
            .unwrap();
        assert_eq!(expect_event(&mut guest_rx).await, ServerEvent::FriendNotFound);
    }

    #[tokio::test]
    async fn test_blank_code_answered_not_found() {
        let relay = relay();
        let (guest, mut guest_rx) = friend_client(&relay);

        let result = relay.handle_event(guest, ClientEvent::CheckCode { code: String::new() });
        assert!(matches!(result, Err(RelayError::Code(_))));
        assert_eq!(expect_event(&mut guest_rx).await, ServerEvent::FriendNotFound);
    }

    #[tokio::test]
    async fn test_full_negotiation_round() {
        let relay = relay();
        let ((host, mut host_rx), (guest, mut guest_rx), _code) = matched_pair(&relay).await;

        relay
            .handle_event(host, ClientEvent::SetOffer { item: Some(item("Gengar")) })
            .unwrap();
        assert_eq!(
            expect_event(&mut guest_rx).await,
            ServerEvent::TradeOffer {
                item: Some(item("Gengar"))
            }
        );

        relay
            .handle_event(guest, ClientEvent::SetOffer { item: Some(item("Machamp")) })
            .unwrap();
        assert_eq!(
            expect_event(&mut host_rx).await,
            ServerEvent::TradeOffer {
                item: Some(item("Machamp"))
            }
        );

        relay.handle_event(host, ClientEvent::SetAccepted).unwrap();
        relay.handle_event(guest, ClientEvent::SetAccepted).unwrap();

        assert_eq!(
            expect_event(&mut host_rx).await,
            ServerEvent::AcceptedTrade {
                item: Some(item("Machamp"))
            }
        );
        assert_eq!(
            expect_event(&mut guest_rx).await,
            ServerEvent::AcceptedTrade {
                item: Some(item("Gengar"))
            }
        );
    }

    #[tokio::test]
    async fn test_reoffer_invalidates_pending_acceptance() {
        let relay = relay();
        let ((host, mut host_rx), (guest, mut guest_rx), _code) = matched_pair(&relay).await;

        relay
            .handle_event(host, ClientEvent::SetOffer { item: Some(item("Abra")) })
            .unwrap();
        let _ = expect_event(&mut guest_rx).await;
        relay
            .handle_event(guest, ClientEvent::SetOffer { item: Some(item("Ditto")) })
            .unwrap();
        let _ = expect_event(&mut host_rx).await;

        relay.handle_event(guest, ClientEvent::SetAccepted).unwrap();

        // Guest swaps the offer; their acceptance must not survive it.
        relay
            .handle_event(guest, ClientEvent::SetOffer { item: Some(item("Haunter")) })
            .unwrap();
        relay.handle_event(host, ClientEvent::SetAccepted).unwrap();

        // Host sees the replacement offer, and no finalize happens.
        assert_eq!(
            expect_event(&mut host_rx).await,
            ServerEvent::TradeOffer {
                item: Some(item("Haunter"))
            }
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(host_rx.try_recv().is_err());
        assert!(guest_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_offer_withdrawal_reaches_friend() {
        let relay = relay();
        let ((host, _host_rx), (_guest, mut guest_rx), _code) = matched_pair(&relay).await;

        relay
            .handle_event(host, ClientEvent::SetOffer { item: Some(item("Onix")) })
            .unwrap();
        let _ = expect_event(&mut guest_rx).await;

        relay
            .handle_event(host, ClientEvent::SetOffer { item: None })
            .unwrap();
        assert_eq!(
            expect_event(&mut guest_rx).await,
            ServerEvent::TradeOffer { item: None }
        );
    }

    #[tokio::test]
    async fn test_disconnect_reaches_partner_and_frees_code() {
        let relay = relay();
        let ((host, _host_rx), (guest, mut guest_rx), code) = matched_pair(&relay).await;

        relay.disconnect(host);
        assert_eq!(
            expect_event(&mut guest_rx).await,
            ServerEvent::PartnerDisconnected
        );

        relay.disconnect(guest);
        assert!(!relay.friends().codes().is_reserved(&code));
        assert_eq!(relay.friends().codes().reserved_count(), 0);
    }

    #[tokio::test]
    async fn test_trade_again_supports_second_round() {
        let relay = relay();
        let ((host, mut host_rx), (guest, mut guest_rx), _code) = matched_pair(&relay).await;

        // Round one.
        relay
            .handle_event(host, ClientEvent::SetOffer { item: Some(item("Eevee")) })
            .unwrap();
        let _ = expect_event(&mut guest_rx).await;
        relay
            .handle_event(guest, ClientEvent::SetOffer { item: Some(item("Pikachu")) })
            .unwrap();
        let _ = expect_event(&mut host_rx).await;
        relay.handle_event(host, ClientEvent::SetAccepted).unwrap();
        relay.handle_event(guest, ClientEvent::SetAccepted).unwrap();
        let _ = expect_event(&mut host_rx).await;
        let _ = expect_event(&mut guest_rx).await;

        // Round two on the same pairing.
        relay.handle_event(host, ClientEvent::TradeAgain).unwrap();
        relay.handle_event(guest, ClientEvent::TradeAgain).unwrap();

        relay
            .handle_event(host, ClientEvent::SetOffer { item: Some(item("Vaporeon")) })
            .unwrap();
        assert_eq!(
            expect_event(&mut guest_rx).await,
            ServerEvent::TradeOffer {
                item: Some(item("Vaporeon"))
            }
        );
        relay
            .handle_event(guest, ClientEvent::SetOffer { item: Some(item("Jolteon")) })
            .unwrap();
        let _ = expect_event(&mut host_rx).await;
        relay.handle_event(host, ClientEvent::SetAccepted).unwrap();
        relay.handle_event(guest, ClientEvent::SetAccepted).unwrap();

        assert_eq!(
            expect_event(&mut host_rx).await,
            ServerEvent::AcceptedTrade {
                item: Some(item("Jolteon"))
            }
        );
        assert_eq!(
            expect_event(&mut guest_rx).await,
            ServerEvent::AcceptedTrade {
                item: Some(item("Vaporeon"))
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_offer_rejected_and_not_forwarded() {
        let relay = relay();
        let ((host, mut host_rx), (_guest, mut guest_rx), _code) = matched_pair(&relay).await;

        let bad = TradeItem::new(serde_json::json!({"species": "MissingNo"}), 0xBAD);
        let result = relay.handle_event(host, ClientEvent::SetOffer { item: Some(bad) });
        assert!(matches!(result, Err(RelayError::InvalidItem)));
        assert_eq!(expect_event(&mut host_rx).await, ServerEvent::InvalidPokemon);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(guest_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wonder_event_rejected_in_friend_mode() {
        let relay = relay();
        let (host, _rx) = friend_client(&relay);
        let result = relay.handle_event(host, ClientEvent::SubmitItem { item: item("Mew") });
        assert!(matches!(
            result,
            Err(RelayError::WrongMode(_, TradeMode::Wonder))
        ));
    }
}
