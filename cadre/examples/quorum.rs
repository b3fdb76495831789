//! Quorum round driven by the worker pool: three simulated participants
//! respond to a registered message, and the main thread blocks until the
//! outcome is known.

use std::sync::Arc;
use std::time::Duration;

use cadre::{
    MessageLedger, PoolConfig, ReportedResult, ThreadNameRegistry, WorkerPool, logging,
};

fn main() {
    logging::init_development();

    let registry = ThreadNameRegistry::shared();
    let pool = WorkerPool::with_registry(PoolConfig::new(3, 16), Some(Arc::clone(&registry)))
        .expect("pool construction");

    let ledger: Arc<MessageLedger<u32, String>> = Arc::new(MessageLedger::new());
    ledger
        .register(1, 3, 2, "replicate block 42".to_string())
        .expect("fresh key");

    for node in 0..3u32 {
        let ledger = Arc::clone(&ledger);
        pool.execute(move || {
            // Simulated remote participant: node 2 reports a failure.
            std::thread::sleep(Duration::from_millis(20 * (node as u64 + 1)));
            let result = if node == 2 {
                ReportedResult::Failure
            } else {
                ReportedResult::Success
            };
            ledger.update_status(node, &1, result);
        })
        .expect("enqueue");
    }

    let outcome = ledger.wait_on(&1, Duration::from_secs(2));
    println!(
        "message {:?} resolved as {:?} (counters: {:?})",
        ledger.try_retrieve(&1),
        outcome,
        ledger.counters(&1)
    );
    ledger.remove(&1);
}
