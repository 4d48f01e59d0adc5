use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};

/// Coalesces a stream of values, releasing only the latest one after
/// `window` has passed without a newer value.
///
/// Releasing a value equal to the previously released one is suppressed.
pub struct Debouncer<T> {
    input: watch::Sender<Option<T>>,
    output: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(window: Duration) -> Self {
        let (input, mut pending) = watch::channel::<Option<T>>(None);
        let (released, output) = watch::channel::<Option<T>>(None);

        let task = tokio::spawn(async move {
            while pending.changed().await.is_ok() {
                // Restart the window on every new value.
                loop {
                    tokio::select! {
                        changed = pending.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        _ = tokio::time::sleep(window) => break,
                    }
                }

                let latest = pending.borrow_and_update().clone();
                released.send_if_modified(|current| {
                    if *current == latest {
                        false
                    } else {
                        *current = latest;
                        true
                    }
                });
            }
        });

        Self {
            input,
            output,
            task,
        }
    }

    pub fn push(&self, value: T) {
        self.input.send_replace(Some(value));
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.output.clone()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
