//! Teardown callbacks registered by plugins during one render pass.

use std::fmt;

use tracing::trace;

/// Callbacks collected during one render pass.
///
/// Nothing runs automatically: the caller invokes [`Teardown::run`] once it
/// is done with the rendered text. Dropping an unrun `Teardown` discards the
/// callbacks without calling them.
#[derive(Default)]
pub struct Teardown {
    callbacks: Vec<Box<dyn FnOnce() + Send>>,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a callback.
    pub fn register(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Number of callbacks still pending.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Run every pending callback in registration order. Calling this again
    /// does nothing.
    pub fn run(&mut self) {
        let callbacks = std::mem::take(&mut self.callbacks);
        trace!(count = callbacks.len(), "running teardown callbacks");
        for callback in callbacks {
            callback();
        }
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Teardown")
            .field("pending", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_runs_in_order_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut teardown = Teardown::new();
        for i in 0..3 {
            let calls = Arc::clone(&calls);
            teardown.register(move || calls.lock().unwrap().push(i));
        }
        assert_eq!(teardown.len(), 3);

        teardown.run();
        teardown.run();

        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2]);
        assert!(teardown.is_empty());
    }

    #[test]
    fn test_drop_does_not_run() {
        let ran = Arc::new(Mutex::new(false));
        {
            let mut teardown = Teardown::new();
            let ran = Arc::clone(&ran);
            teardown.register(move || *ran.lock().unwrap() = true);
        }
        assert!(!*ran.lock().unwrap());
    }

    #[test]
    fn test_runs_on_another_thread() {
        let ran = Arc::new(Mutex::new(false));
        let mut teardown = Teardown::new();
        let flag = Arc::clone(&ran);
        teardown.register(move || *flag.lock().unwrap() = true);

        std::thread::spawn(move || teardown.run()).join().unwrap();
        assert!(*ran.lock().unwrap());
    }
}
