//! Fan-out of one event connection to many sessions.
//!
//! Frames are parsed once and delivered to the inbox of the session whose swap they name.
//! Connection-level events (close, error) reach every session.

use crate::event::{ChannelFrame, ServerMessage, parse_server_message};
use crate::session::SessionInput;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SessionRouter {
    routes: HashMap<String, UnboundedSender<SessionInput>>,
}

impl SessionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an inbox for `swap_id`, replacing any previous one.
    pub fn register(&mut self, swap_id: &str) -> UnboundedReceiver<SessionInput> {
        self.prune();
        let (tx, rx) = mpsc::unbounded();
        if self.routes.insert(swap_id.to_string(), tx).is_some() {
            log::warn!("Replaced existing route for swap {swap_id}");
        }
        rx
    }

    /// Whether a live session is registered for `swap_id`.
    pub fn contains(&self, swap_id: &str) -> bool {
        self.routes
            .get(swap_id)
            .is_some_and(|route| !route.is_closed())
    }

    /// Number of live sessions. A session is gone once its inbox is dropped.
    pub fn len(&self) -> usize {
        self.routes
            .values()
            .filter(|route| !route.is_closed())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&mut self) {
        self.routes.retain(|swap_id, route| {
            let live = !route.is_closed();
            if !live {
                log::debug!("Session of swap {swap_id} ended, removing route");
            }
            live
        });
    }

    /// Deliver a frame. Returns the number of inputs delivered.
    ///
    /// Routes whose session has ended are dropped on the way.
    pub fn dispatch(&mut self, frame: ChannelFrame) -> usize {
        self.prune();
        match frame {
            ChannelFrame::Text(text) => match parse_server_message(&text) {
                Ok(ServerMessage::Update(updates)) => {
                    let mut delivered = 0;
                    for update in updates {
                        let id = update.id.clone();
                        let Some(route) = self.routes.get(&id) else {
                            log::debug!("No session for swap {id}, dropping {}", update.status);
                            continue;
                        };
                        if route.unbounded_send(SessionInput::Update(update)).is_ok() {
                            delivered += 1;
                        } else {
                            log::debug!("Session of swap {id} ended, removing route");
                            self.routes.remove(&id);
                        }
                    }
                    delivered
                }
                Ok(ServerMessage::Other(event)) => {
                    log::debug!("Ignoring {event} message");
                    0
                }
                Err(e) => {
                    log::warn!("{e}");
                    0
                }
            },
            ChannelFrame::Closed(reason) => self.broadcast(SessionInput::Closed(reason)),
            ChannelFrame::Error(error) => self.broadcast(SessionInput::Error(error)),
        }
    }

    /// Send `input` to every session and forget all routes.
    fn broadcast(&mut self, input: SessionInput) -> usize {
        self.routes
            .drain()
            .filter(|(_, route)| route.unbounded_send(input.clone()).is_ok())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ServiceStatus;
    use futures::StreamExt;

    fn update_frame(id: &str, status: &str) -> ChannelFrame {
        ChannelFrame::Text(format!(
            r#"{{"event":"update","args":[{{"id":"{id}","status":"{status}"}}]}}"#
        ))
    }

    #[tokio::test]
    async fn test_updates_reach_only_their_session() {
        let mut router = SessionRouter::new();
        let mut a = router.register("a");
        let mut b = router.register("b");

        assert_eq!(router.dispatch(update_frame("a", "invoice.set")), 1);
        assert_eq!(router.dispatch(update_frame("c", "invoice.set")), 0);

        let Some(SessionInput::Update(update)) = a.next().await else {
            panic!("expected update");
        };
        assert_eq!(update.status, ServiceStatus::InvoiceSet);
        assert!(b.try_next().is_err());
    }

    #[test]
    fn test_garbage_and_acks_are_dropped() {
        let mut router = SessionRouter::new();
        let _a = router.register("a");
        assert_eq!(router.dispatch(ChannelFrame::Text("{".to_string())), 0);
        assert_eq!(
            router.dispatch(ChannelFrame::Text(
                r#"{"event":"subscribe","args":["a"]}"#.to_string()
            )),
            0
        );
        assert!(router.contains("a"));
    }

    #[test]
    fn test_ended_sessions_are_pruned() {
        let mut router = SessionRouter::new();
        drop(router.register("a"));
        assert_eq!(router.dispatch(update_frame("a", "invoice.set")), 0);
        assert!(router.is_empty());
        assert!(router.routes.is_empty());
    }

    #[test]
    fn test_ended_sessions_stop_counting_without_traffic() {
        let mut router = SessionRouter::new();
        let a = router.register("a");
        let _b = router.register("b");
        assert_eq!(router.len(), 2);

        drop(a);
        assert_eq!(router.len(), 1);
        assert!(!router.contains("a"));
        assert!(router.contains("b"));

        // the next registration drops the stale entry
        let _c = router.register("c");
        assert_eq!(router.routes.len(), 2);
    }

    #[tokio::test]
    async fn test_close_reaches_every_session() {
        let mut router = SessionRouter::new();
        let mut a = router.register("a");
        let mut b = router.register("b");

        assert_eq!(router.dispatch(ChannelFrame::Closed(None)), 2);
        assert!(router.is_empty());
        assert_eq!(a.next().await, Some(SessionInput::Closed(None)));
        assert_eq!(b.next().await, Some(SessionInput::Closed(None)));
    }
}
