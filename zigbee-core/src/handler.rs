use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};

/// A one-shot correlation token. `Handler` registration and removal key off
/// the token rather than a pointer or channel identity, so a timer firing
/// and a reader fulfilling the same handler race safely: whichever side
/// removes the token from the map first wins, and the loser observes that
/// its token is already gone instead of double-delivering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(u64);

struct Handler<V> {
    token: Token,
    sender: mpsc::Sender<V>,
    /// `None` for a permanent handler (e.g. an incoming-message subscriber)
    /// that is never removed by a timeout.
    oneshot: bool,
}

/// A registry correlating wire-level response keys (`K`, typically a frame
/// header) to the in-flight request awaiting that response.
///
/// Grounded on the ZNP port's `handlers map[FrameHeader]*Handler`: one-shot
/// handlers are registered before a request is written and removed either by
/// the reader loop delivering a match or by a timeout, whichever happens
/// first. Permanent handlers (registered with `register_permanent`) are
/// never removed by a timeout and are used for unsolicited indications such
/// as incoming application messages.
pub struct HandlerMap<K, V> {
    next_token: AtomicU64,
    handlers: Mutex<HashMap<K, Handler<V>>>,
}

impl<K, V> Default for HandlerMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> HandlerMap<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            next_token: AtomicU64::new(1),
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a one-shot handler for `key` and return a receiver that
    /// yields at most one value. Fails with [`Error::HandlerConflict`] if a
    /// handler is already registered for this key, mirroring the teacher's
    /// panic-on-duplicate registration (recast here as a recoverable error
    /// since wire keys are attacker/peer-influenced, not a programmer bug).
    pub fn register_oneshot(&self, key: K) -> Result<(Token, mpsc::Receiver<V>)> {
        self.register(key, true)
    }

    /// Register a handler that is never removed by a timeout. Used for
    /// subscriptions to unsolicited traffic (e.g. incoming messages).
    pub fn register_permanent(&self, key: K) -> Result<(Token, mpsc::Receiver<V>)> {
        self.register(key, false)
    }

    fn register(&self, key: K, oneshot: bool) -> Result<(Token, mpsc::Receiver<V>)> {
        let token = Token(self.next_token.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel();

        let mut handlers = self.handlers.lock().unwrap();
        if handlers.contains_key(&key) {
            return Err(Error::HandlerConflict);
        }
        handlers.insert(
            key,
            Handler {
                token,
                sender: tx,
                oneshot,
            },
        );
        Ok((token, rx))
    }

    /// Deliver `value` to the handler registered for `key`, if any. One-shot
    /// handlers are removed after delivery; permanent handlers remain
    /// registered. Returns `true` if a handler accepted the value.
    pub fn fulfill(&self, key: &K, value: V) -> bool {
        let mut handlers = self.handlers.lock().unwrap();
        let Some(handler) = handlers.get(key) else {
            return false;
        };
        let delivered = handler.sender.send(value).is_ok();
        if handler.oneshot {
            handlers.remove(key);
        }
        delivered
    }

    /// Remove the handler registered for `key` if its token still matches
    /// `token`. Used by a timeout to reclaim a one-shot handler without
    /// racing a concurrent `fulfill`: if the reader already fulfilled and
    /// removed the entry (or replaced it), this is a no-op.
    pub fn cancel(&self, key: &K, token: Token) {
        let mut handlers = self.handlers.lock().unwrap();
        if handlers.get(key).is_some_and(|h| h.token == token) {
            handlers.remove(key);
        }
    }

    /// Remove a permanent handler explicitly (e.g. on controller shutdown).
    pub fn remove(&self, key: &K) {
        self.handlers.lock().unwrap().remove(key);
    }
}

/// Block on `rx` for up to `timeout`, cancelling the handler registration on
/// timeout so it does not linger in the map forever.
pub fn recv_timeout<K, V>(
    map: &Arc<HandlerMap<K, V>>,
    key: &K,
    token: Token,
    rx: &mpsc::Receiver<V>,
    timeout: Duration,
) -> Result<V>
where
    K: Eq + Hash + Clone,
{
    match rx.recv_timeout(timeout) {
        Ok(value) => Ok(value),
        Err(_) => {
            map.cancel(key, token);
            Err(Error::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfill_delivers_to_registered_oneshot_handler() {
        let map: HandlerMap<u32, u8> = HandlerMap::new();
        let (token, rx) = map.register_oneshot(7).unwrap();
        assert!(map.fulfill(&7, 42));
        assert_eq!(rx.recv().unwrap(), 42);
        // One-shot handler is gone now; cancel with the old token is a no-op.
        map.cancel(&7, token);
        assert!(!map.fulfill(&7, 43));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let map: HandlerMap<&str, u8> = HandlerMap::new();
        let (_token, _rx) = map.register_oneshot("key").unwrap();
        assert!(matches!(
            map.register_oneshot("key"),
            Err(Error::HandlerConflict)
        ));
    }

    #[test]
    fn permanent_handler_survives_multiple_deliveries() {
        let map: HandlerMap<&str, u8> = HandlerMap::new();
        let (_token, rx) = map.register_permanent("indications").unwrap();
        assert!(map.fulfill(&"indications", 1));
        assert!(map.fulfill(&"indications", 2));
        assert_eq!(rx.recv().unwrap(), 1);
        assert_eq!(rx.recv().unwrap(), 2);
    }

    #[test]
    fn cancel_after_fulfill_does_not_remove_new_registration() {
        let map: HandlerMap<&str, u8> = HandlerMap::new();
        let (token, rx) = map.register_oneshot("key").unwrap();
        assert!(map.fulfill(&"key", 1));
        assert_eq!(rx.recv().unwrap(), 1);

        // A new handler is registered for the same key before the stale
        // timeout fires.
        let (_new_token, _new_rx) = map.register_oneshot("key").unwrap();
        map.cancel(&"key", token);
        // The new registration must still be present.
        assert!(map.fulfill(&"key", 2));
    }

    #[test]
    fn recv_timeout_cancels_on_expiry() {
        let map = Arc::new(HandlerMap::<&str, u8>::new());
        let (token, rx) = map.register_oneshot("key").unwrap();
        let result = recv_timeout(&map, &"key", token, &rx, Duration::from_millis(10));
        assert!(matches!(result, Err(Error::Timeout)));
        // Handler was reclaimed, so a fresh registration succeeds.
        assert!(map.register_oneshot("key").is_ok());
    }
}
