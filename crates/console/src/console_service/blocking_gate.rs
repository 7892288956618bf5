use parking_lot::{Condvar, Mutex};
use std::time::Duration;

/// Release signal that suspends the input loop after a blocking command.
///
/// Permits are counted: a release that arrives before anyone waits is kept
/// and consumed by the next [`BlockingGate::wait`].
#[derive(Debug, Default)]
pub struct BlockingGate {
    permits: Mutex<usize>,
    released: Condvar,
}

impl BlockingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one permit and wakes one waiter.
    pub fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.released.notify_one();
    }

    /// Blocks until a permit is available, then takes it.
    pub fn wait(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.released.wait(&mut permits);
        }
        *permits -= 1;
    }

    /// Like [`BlockingGate::wait`] but gives up after `timeout`. Returns
    /// whether a permit was taken.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            if self.released.wait_for(&mut permits, timeout).timed_out() {
                if *permits == 0 {
                    return false;
                }
                break;
            }
        }
        *permits -= 1;
        true
    }

    pub fn pending(&self) -> usize {
        *self.permits.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn release_before_wait_is_not_lost() {
        let gate = BlockingGate::new();
        gate.release();
        assert_eq!(gate.pending(), 1);
        assert!(gate.wait_timeout(Duration::from_millis(10)));
        assert_eq!(gate.pending(), 0);
    }

    #[test]
    fn wait_without_release_times_out() {
        let gate = BlockingGate::new();
        assert!(!gate.wait_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn one_release_unblocks_one_waiter() {
        let gate = Arc::new(BlockingGate::new());
        let done = Arc::new(AtomicBool::new(false));
        let waiter = {
            let gate = Arc::clone(&gate);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                gate.wait();
                done.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(30));
        assert!(!done.load(Ordering::SeqCst));
        gate.release();
        waiter.join().unwrap();
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(gate.pending(), 0);
    }

    #[test]
    fn permits_accumulate() {
        let gate = BlockingGate::new();
        gate.release();
        gate.release();
        assert!(gate.wait_timeout(Duration::from_millis(5)));
        assert!(gate.wait_timeout(Duration::from_millis(5)));
        assert!(!gate.wait_timeout(Duration::from_millis(5)));
    }
}
