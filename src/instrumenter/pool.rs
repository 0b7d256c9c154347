//! One instrumenter per thread per registry.

use super::Instrumenter;
use crate::registry::Fanout;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use tracing::trace;

thread_local! {
    static INSTRUMENTERS: RefCell<HashMap<u64, Rc<Instrumenter>>> = RefCell::new(HashMap::new());
}

/// Hands out thread-local instrumenters.
///
/// Each thread lazily gets its own [`Instrumenter`] for each registry it
/// instruments against, so the instrument hot path shares no mutable state
/// across threads. Entries live as long as the thread; entries whose registry
/// has been dropped are pruned the next time the thread allocates one.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstrumenterPool;

impl InstrumenterPool {
    /// This thread's instrumenter for `fanout`, created on first use
    pub fn for_current_thread(fanout: &Arc<Fanout>) -> Rc<Instrumenter> {
        INSTRUMENTERS
            .try_with(|pool| {
                let mut pool = pool.borrow_mut();
                if let Some(instrumenter) = pool.get(&fanout.id()) {
                    return instrumenter.clone();
                }

                pool.retain(|_, instrumenter| instrumenter.is_attached());
                let instrumenter = Rc::new(Instrumenter::new(fanout));
                trace!(
                    registry = fanout.id(),
                    instrumenter_id = %instrumenter.id(),
                    "Instrumenter allocated for thread"
                );
                pool.insert(fanout.id(), instrumenter.clone());
                instrumenter
            })
            // Thread-local storage is being torn down; hand out a one-off.
            .unwrap_or_else(|_| Rc::new(Instrumenter::new(fanout)))
    }

    /// Number of instrumenters held for the current thread
    pub fn thread_len() -> usize {
        INSTRUMENTERS
            .try_with(|pool| pool.borrow().len())
            .unwrap_or(0)
    }
}
