//! Shared Token
//!
//! Single serialization point for concurrent callers. Writers hold the
//! write lock for the whole call, so mutations are applied one at a time;
//! readers share a consistent view. Observers receive each committed
//! event exactly once, in commit order, after the write has landed.
//!
//! Observers run after the write lock is released but while the next
//! writer is still held back. They may read the token from any thread;
//! they must not call mutating methods on the same `SharedToken`.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use ftoken_common::{storage::Snapshot, Address, Amount, TokenEvent, TokenResult};

use crate::FungibleToken;

/// Receiver of committed token events
pub trait EventObserver: Send + Sync {
    fn on_event(&self, event: &TokenEvent);
}

/// Thread-safe handle around a [`FungibleToken`]
pub struct SharedToken {
    inner: RwLock<FungibleToken>,
    observers: RwLock<Vec<Arc<dyn EventObserver>>>,
    // Outer lock of every write, held until every observer has been notified
    dispatch: Mutex<()>,
}

impl SharedToken {
    /// Wrap a token; events already in its log are discarded
    pub fn new(mut token: FungibleToken) -> Self {
        token.drain_events();
        Self {
            inner: RwLock::new(token),
            observers: RwLock::new(Vec::new()),
            dispatch: Mutex::new(()),
        }
    }

    /// Register an observer for all future events
    pub fn subscribe(&self, observer: Arc<dyn EventObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Run a read-only closure against a consistent view
    pub fn read<R>(&self, f: impl FnOnce(&FungibleToken) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    /// Run one mutating call under the write lock, then notify observers
    pub fn execute<R>(&self, f: impl FnOnce(&mut FungibleToken) -> TokenResult<R>) -> TokenResult<R> {
        // `dispatch` is always taken before `inner`
        let _order = self.dispatch.lock().unwrap_or_else(PoisonError::into_inner);

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mark = guard.event_count();
        let result = f(&mut *guard);
        let committed = guard.drain_events_from(mark);
        drop(guard);

        if !committed.is_empty() {
            let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
            for event in &committed {
                for observer in observers.iter() {
                    observer.on_event(event);
                }
            }
        }

        result
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.read(|token| token.balance_of(account))
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.read(|token| token.allowance(owner, spender))
    }

    pub fn total_supply(&self) -> Amount {
        self.read(|token| token.total_supply())
    }

    pub fn paused(&self) -> bool {
        self.read(|token| token.paused())
    }

    /// Capture the persisted state
    pub fn snapshot(&self) -> Snapshot {
        self.read(|token| token.snapshot())
    }

    /// Unwrap the token
    pub fn into_inner(self) -> FungibleToken {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftoken_common::TokenError;
    use std::thread;

    const DEPLOYER: Address = [1u8; 32];

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<TokenEvent>>,
    }

    impl EventObserver for Recorder {
        fn on_event(&self, event: &TokenEvent) {
            self.seen.lock().unwrap().push(event.clone());
        }
    }

    fn shared() -> SharedToken {
        SharedToken::new(FungibleToken::new("Fungible Token", "FTK", DEPLOYER).unwrap())
    }

    #[test]
    fn test_observer_sees_committed_events_in_order() {
        let token = shared();
        let recorder = Arc::new(Recorder::default());
        token.subscribe(recorder.clone());

        let alice = [2u8; 32];
        token.execute(|t| t.transfer(DEPLOYER, alice, 10)).unwrap();
        token.execute(|t| t.approve(alice, DEPLOYER, 5)).unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                TokenEvent::Transfer { from: DEPLOYER, to: alice, amount: 10 },
                TokenEvent::Approval { owner: alice, spender: DEPLOYER, amount: 5 },
            ]
        );
    }

    #[test]
    fn test_failed_call_notifies_nothing() {
        let token = shared();
        let recorder = Arc::new(Recorder::default());
        token.subscribe(recorder.clone());

        let result = token.execute(|t| t.pause([9u8; 32]));
        assert!(matches!(result, Err(TokenError::Unauthorized { .. })));
        assert!(recorder.seen.lock().unwrap().is_empty());
        assert!(!token.paused());
    }

    #[test]
    fn test_observer_may_read() {
        struct Reader {
            token: Arc<SharedToken>,
            supplies: Mutex<Vec<Amount>>,
        }
        impl EventObserver for Reader {
            fn on_event(&self, _event: &TokenEvent) {
                self.supplies.lock().unwrap().push(self.token.total_supply());
            }
        }

        let token = Arc::new(shared());
        let reader = Arc::new(Reader {
            token: token.clone(),
            supplies: Mutex::new(Vec::new()),
        });
        token.subscribe(reader.clone());

        let supply = token.total_supply();
        token.execute(|t| t.burn(DEPLOYER, 100)).unwrap();
        assert_eq!(*reader.supplies.lock().unwrap(), vec![supply - 100]);
    }

    #[test]
    fn test_reading_observer_with_concurrent_writers() {
        use std::sync::mpsc;
        use std::time::Duration;

        struct SlowReader {
            token: Arc<SharedToken>,
            reads: Mutex<usize>,
        }
        impl EventObserver for SlowReader {
            fn on_event(&self, _event: &TokenEvent) {
                thread::sleep(Duration::from_millis(2));
                let _ = self.token.total_supply();
                *self.reads.lock().unwrap() += 1;
            }
        }

        let token = Arc::new(shared());
        let reader = Arc::new(SlowReader {
            token: token.clone(),
            reads: Mutex::new(0),
        });
        token.subscribe(reader.clone());

        let (done, finished) = mpsc::channel();
        for i in 2u8..6 {
            let token = token.clone();
            let done = done.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    token.execute(|t| t.transfer(DEPLOYER, [i; 32], 1)).unwrap();
                }
                done.send(()).unwrap();
            });
        }

        for _ in 0..4 {
            finished
                .recv_timeout(Duration::from_secs(10))
                .expect("writer threads stalled");
        }
        assert_eq!(*reader.reads.lock().unwrap(), 4 * 20);
        assert!(token.read(|t| t.check_invariants()));
    }

    #[test]
    fn test_concurrent_transfers_conserve_supply() {
        let token = Arc::new(shared());
        let supply = token.total_supply();

        let handles: Vec<_> = (2u8..10)
            .map(|i| {
                let token = token.clone();
                thread::spawn(move || {
                    let account = [i; 32];
                    for _ in 0..50 {
                        token.execute(|t| t.transfer(DEPLOYER, account, 3)).unwrap();
                        // May fail when the account has not been funded yet
                        let _ = token.execute(|t| t.transfer(account, [i + 100; 32], 1));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(token.total_supply(), supply);
        assert!(token.read(|t| t.check_invariants()));
        assert_eq!(token.balance_of(&DEPLOYER), supply - 8 * 50 * 3);
    }

    #[test]
    fn test_into_inner_keeps_state() {
        let token = shared();
        token.execute(|t| t.approve(DEPLOYER, [4u8; 32], 12)).unwrap();
        let inner = token.into_inner();
        assert_eq!(inner.allowance(&DEPLOYER, &[4u8; 32]), 12);
        assert!(inner.events().is_empty());
    }
}
