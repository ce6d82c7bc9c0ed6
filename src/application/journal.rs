/// Hook Journal - Engine State Bound to Pool Manager Sessions
///
/// The hook's engine state lives here, behind a lock shared with the pool
/// manager. The pool manager checkpoints the journal whenever it opens an
/// unlock session and closes the checkpoint with the session's outcome:
///
/// ```text
/// session opens   -> checkpoint (state, event mark)
/// session commits -> checkpoint dropped
/// session fails   -> state and events restored to the checkpoint
/// ```
///
/// Crossings run by `after_swap` therefore stand or fall with the swapper's
/// outermost session, even when the swapper fails to settle after the hook
/// has returned. Events are buffered until no session and no hook operation
/// is open, so nothing is published for work that is later reverted.
///
/// Lock guards are never held across a call into the pool manager.

use crate::application::hook::HookState;
use crate::application::ports::SessionJournal;
use crate::shared::protocol::HookEvent;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use smallvec::SmallVec;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

#[derive(Debug)]
struct Checkpoint {
    state: HookState,
    events: usize,
}

/// State saved when a hook operation starts
#[derive(Debug)]
pub(crate) struct Savepoint {
    state: HookState,
    events: usize,
}

#[derive(Debug, Default)]
struct Store {
    state: HookState,
    events: SmallVec<[HookEvent; 8]>,
    /// One per open pool manager session, outermost first
    checkpoints: Vec<Checkpoint>,
    /// Hook operations currently running
    operations: usize,
    sink: Option<UnboundedSender<HookEvent>>,
}

impl Store {
    fn flush(&mut self) {
        if self.operations > 0 || !self.checkpoints.is_empty() {
            return;
        }
        for event in self.events.drain(..) {
            debug!(kind = event.kind(), "event committed");
            if let Some(sink) = &self.sink {
                if sink.send(event).is_err() {
                    warn!("event receiver dropped, disabling event sink");
                    self.sink = None;
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct HookJournal {
    store: Mutex<Store>,
}

impl HookJournal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_sink(&self, sink: UnboundedSender<HookEvent>) {
        self.store.lock().sink = Some(sink);
    }

    pub(crate) fn state(&self) -> MappedMutexGuard<'_, HookState> {
        MutexGuard::map(self.store.lock(), |store| &mut store.state)
    }

    pub(crate) fn emit(&self, event: HookEvent) {
        self.store.lock().events.push(event);
    }

    /// Number of pool manager sessions currently open
    pub(crate) fn open_sessions(&self) -> usize {
        self.store.lock().checkpoints.len()
    }

    pub(crate) fn begin(&self) -> Savepoint {
        let mut store = self.store.lock();
        store.operations += 1;
        Savepoint {
            state: store.state.clone(),
            events: store.events.len(),
        }
    }

    /// Ends an operation successfully. Its events are published unless a
    /// session or an outer operation is still open.
    pub(crate) fn commit(&self) {
        let mut store = self.store.lock();
        store.operations = store.operations.saturating_sub(1);
        store.flush();
    }

    pub(crate) fn rollback(&self, savepoint: Savepoint) {
        let mut store = self.store.lock();
        store.operations = store.operations.saturating_sub(1);
        store.state = savepoint.state;
        store.events.truncate(savepoint.events);
    }
}

impl SessionJournal for HookJournal {
    fn checkpoint(&self) {
        let mut store = self.store.lock();
        let checkpoint = Checkpoint {
            state: store.state.clone(),
            events: store.events.len(),
        };
        store.checkpoints.push(checkpoint);
    }

    fn close(&self, committed: bool) {
        let mut store = self.store.lock();
        let Some(checkpoint) = store.checkpoints.pop() else {
            warn!("session closed without a matching checkpoint");
            return;
        };

        if committed {
            store.flush();
        } else {
            let dropped = store.events.len().saturating_sub(checkpoint.events);
            store.state = checkpoint.state;
            store.events.truncate(checkpoint.events);
            debug!(
                depth = store.checkpoints.len(),
                dropped_events = dropped,
                "session reverted, hook state restored"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orderbook::PendingOrderBook;
    use crate::shared::protocol::{AccountId, ClassId, Currency, Direction, PoolId, PoolKey};

    fn pool() -> PoolId {
        PoolKey::new(Currency::new("WETH"), Currency::new("USDC"), 3000, 60).id()
    }

    fn placed(amount: u128) -> HookEvent {
        HookEvent::OrderPlaced {
            class_id: ClassId::derive(&pool(), 120, Direction::ZeroForOne),
            holder: AccountId(10),
            amount,
            boundary: 120,
            direction: Direction::ZeroForOne,
        }
    }

    fn with_sink() -> (HookJournal, tokio::sync::mpsc::UnboundedReceiver<HookEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let journal = HookJournal::new();
        journal.set_sink(tx);
        (journal, rx)
    }

    fn add_pending(journal: &HookJournal, amount: u128) {
        journal
            .state()
            .book
            .add_pending(&pool(), 120, Direction::ZeroForOne, amount)
            .unwrap();
    }

    fn total(journal: &HookJournal) -> u128 {
        journal.state().book.total_pending(&pool(), Direction::ZeroForOne)
    }

    #[test]
    fn test_events_publish_on_commit_outside_sessions() {
        let (journal, mut rx) = with_sink();
        let _ = journal.begin();
        journal.emit(placed(1));
        journal.commit();
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_events_wait_for_outermost_session() {
        let (journal, mut rx) = with_sink();
        journal.checkpoint();
        journal.checkpoint();

        let _ = journal.begin();
        journal.emit(placed(1));
        journal.commit();
        assert!(rx.try_recv().is_err());

        journal.close(true);
        assert!(rx.try_recv().is_err());
        journal.close(true);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_failed_session_restores_state_and_drops_events() {
        let (journal, mut rx) = with_sink();
        add_pending(&journal, 100);

        journal.checkpoint();
        let _ = journal.begin();
        add_pending(&journal, 50);
        journal.emit(placed(50));
        journal.commit();
        assert_eq!(total(&journal), 150);

        journal.close(false);
        assert_eq!(total(&journal), 100);
        assert_eq!(journal.open_sessions(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_inner_commit_reverted_by_outer_failure() {
        let (journal, _rx) = with_sink();
        journal.checkpoint();
        journal.checkpoint();
        add_pending(&journal, 70);
        journal.close(true);
        assert_eq!(total(&journal), 70);

        journal.close(false);
        assert_eq!(total(&journal), 0);
    }

    #[test]
    fn test_rollback_restores_savepoint() {
        let (journal, mut rx) = with_sink();
        let savepoint = journal.begin();
        add_pending(&journal, 10);
        journal.emit(placed(10));
        journal.rollback(savepoint);

        assert_eq!(total(&journal), 0);
        let _ = journal.begin();
        journal.commit();
        assert!(rx.try_recv().is_err());
    }
}
