// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The graphics execution context.

# Context

Device resources for an array are created, copied into and released on exactly one
thread.  [`GraphicsContext`] owns that thread and a FIFO channel feeding it.  Any
thread may [`GraphicsContext::submit`] work; the work runs later, on the context, in
the order it was submitted.  Submitting never blocks.

Because there is a single consumer, ordering is transitive: if an allocation job is
submitted before a copy job, the copy observes the allocation.  Nothing is
reordered, coalesced or cancelled.

# Observing completion

[`GraphicsContext::fence`] submits an empty job and resolves once it runs, which
means every job submitted before the fence has finished.
*/

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle, ThreadId};

use r#continue::continuation;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Message {
    label: &'static str,
    job: Job,
}

#[derive(Debug)]
struct ContextResources {
    sender: Mutex<Option<Sender<Message>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
    name: String,
}

/**
Handle to a dedicated graphics thread.

Cloning is cheap; clones submit to the same thread.  The thread exits after the last
handle is dropped, once it has drained the jobs already queued.
*/
#[derive(Clone)]
pub struct GraphicsContext {
    resources: Arc<ContextResources>,
}

impl GraphicsContext {
    /// Spawns a graphics context thread with the given name.
    pub fn new(name: &str) -> Self {
        let (sender, receiver): (Sender<Message>, Receiver<Message>) = mpsc::channel();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                // Exits when every sender is gone and the queue is empty
                while let Ok(message) = receiver.recv() {
                    logwise::trace_sync!("graphics context: {label}", label = message.label);
                    (message.job)();
                }
            })
            .expect("Failed to spawn graphics context thread");
        let thread_id = thread.thread().id();
        GraphicsContext {
            resources: Arc::new(ContextResources {
                sender: Mutex::new(Some(sender)),
                thread: Mutex::new(Some(thread)),
                thread_id,
                name: name.to_string(),
            }),
        }
    }

    /**
    Queues `job` to run on the context.

    Returns immediately.  Jobs from all submitters run one at a time in the order
    the submissions happened.
    */
    pub fn submit<F>(&self, label: &'static str, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self
            .resources
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match sender.as_ref() {
            Some(sender) => {
                if sender
                    .send(Message {
                        label,
                        job: Box::new(job),
                    })
                    .is_err()
                {
                    logwise::error_sync!(
                        "graphics context exited; dropping {label}",
                        label = label
                    );
                }
            }
            None => {
                logwise::error_sync!("graphics context shut down; dropping {label}", label = label);
            }
        }
    }

    /**
    Resolves after every job submitted before this call has run.
    */
    pub fn fence(&self) -> impl Future<Output = ()> + use<> {
        let (sender, fence) = continuation();
        self.submit("fence", move || {
            sender.send(());
        });
        fence
    }

    /**
    Runs `f` on the context and resolves with its result.
    */
    pub fn run<F, R>(&self, label: &'static str, f: F) -> impl Future<Output = R> + use<F, R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (sender, result) = continuation();
        self.submit(label, move || {
            sender.send(f());
        });
        result
    }

    /// Whether the calling thread is this context's thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.resources.thread_id
    }
}

impl Debug for GraphicsContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("name", &self.resources.name)
            .finish()
    }
}

impl PartialEq for GraphicsContext {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resources, &other.resources)
    }
}

impl Drop for ContextResources {
    fn drop(&mut self) {
        // Closing the channel lets the thread finish the queue and exit
        let sender = self
            .sender
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        drop(sender);

        let handle = self
            .thread
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            // The last handle may be dropped by a job running on the context itself
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}
