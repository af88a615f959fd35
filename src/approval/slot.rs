use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::decision::Decision;

/// Single-assignment decision slot. The first caller of [`resolve`] wins;
/// everyone else gets `false` and the stored decision is untouched.
///
/// This is the only coordination primitive in the approval core: the timeout
/// task and the HTTP approve/deny handlers all funnel through it, so a late
/// timer firing after an explicit decision (or vice versa) is a no-op rather
/// than a double-resolution.
///
/// [`resolve`]: DecisionSlot::resolve
#[derive(Debug)]
pub struct DecisionSlot {
    tx: Mutex<Option<oneshot::Sender<Decision>>>,
}

impl DecisionSlot {
    /// Create a slot and the receiver the waiting caller parks on.
    pub fn new() -> (Self, oneshot::Receiver<Decision>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Attempt to assign `decision`. Returns `true` iff this call performed
    /// the assignment. Callers use the return value to decide whether their
    /// side effects fire.
    pub fn resolve(&self, decision: Decision) -> bool {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match sender {
            Some(tx) => {
                // A dropped receiver means the waiter is gone; the slot is
                // still consumed so later resolvers observe `false`.
                let _ = tx.send(decision);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn first_resolve_wins() {
        let (slot, rx) = DecisionSlot::new();

        assert!(slot.resolve(Decision::Allow {
            updated_input: json!({"x": 1}),
        }));
        assert!(!slot.resolve(Decision::Deny {
            message: "too late".into(),
        }));

        let decision = rx.await.unwrap();
        assert!(decision.is_allow());
    }

    #[tokio::test]
    async fn resolve_after_receiver_dropped_still_consumes_slot() {
        let (slot, rx) = DecisionSlot::new();
        drop(rx);

        assert!(slot.resolve(Decision::Deny {
            message: "waiter gone".into(),
        }));
        assert!(slot.is_resolved());
        assert!(!slot.resolve(Decision::Deny {
            message: "second".into(),
        }));
    }

    #[test]
    fn concurrent_resolvers_exactly_one_wins() {
        let (slot, _rx) = DecisionSlot::new();
        let slot = std::sync::Arc::new(slot);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let slot = slot.clone();
                std::thread::spawn(move || {
                    slot.resolve(Decision::Deny {
                        message: format!("resolver {i}"),
                    })
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
    }
}
