use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{error, info};

use crate::email::sender::{EmailSender, SendError};
use crate::email::EmailMessage;

const QUEUE_CAPACITY: usize = 64;
const WORKERS: usize = 4;
const RETRY_BACKOFF: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(3),
];

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: usize,
        #[source]
        source: SendError,
    },
    #[error("mail queue is full")]
    QueueFull,
    #[error("mail queue is closed")]
    QueueClosed,
}

struct Job {
    message: EmailMessage,
    outcome: oneshot::Sender<Result<(), DeliveryError>>,
}

/// Bounded background mail delivery: a fixed worker pool drains the queue,
/// retrying each message with linear backoff. HTTP callers never wait on a
/// send and never see its failure; workers log every attempt.
#[derive(Clone)]
pub struct EmailQueue {
    tx: mpsc::Sender<Job>,
}

impl EmailQueue {
    pub fn start(sender: Arc<dyn EmailSender>) -> Self {
        Self::start_with(sender, WORKERS, RETRY_BACKOFF)
    }

    fn start_with(sender: Arc<dyn EmailSender>, workers: usize, backoff: [Duration; 3]) -> Self {
        let (tx, rx) = mpsc::channel::<Job>(QUEUE_CAPACITY);
        let rx = Arc::new(Mutex::new(rx));
        for _ in 0..workers {
            let rx = Arc::clone(&rx);
            let sender = Arc::clone(&sender);
            tokio::spawn(async move {
                loop {
                    let job = rx.lock().await.recv().await;
                    let Some(job) = job else { break };
                    let result = deliver(sender.as_ref(), &job.message, &backoff).await;
                    let _ = job.outcome.send(result);
                }
            });
        }
        Self { tx }
    }

    /// Queues a message for delivery. The returned receiver resolves once
    /// the send succeeds or retries are exhausted; dropping it is fine.
    pub fn enqueue(&self, message: EmailMessage) -> oneshot::Receiver<Result<(), DeliveryError>> {
        let (out_tx, out_rx) = oneshot::channel();
        match self.tx.try_send(Job {
            message,
            outcome: out_tx,
        }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(job)) => {
                error!(to = %job.message.to, "mail queue full, dropping email");
                let _ = job.outcome.send(Err(DeliveryError::QueueFull));
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                error!(to = %job.message.to, "mail queue closed, dropping email");
                let _ = job.outcome.send(Err(DeliveryError::QueueClosed));
            }
        }
        out_rx
    }
}

async fn deliver(
    sender: &dyn EmailSender,
    message: &EmailMessage,
    backoff: &[Duration],
) -> Result<(), DeliveryError> {
    let mut attempts = 1;
    let mut last = match sender.send(message).await {
        Ok(()) => {
            info!(to = %message.to, "email sent");
            return Ok(());
        }
        Err(e) => {
            error!(error = %e, to = %message.to, "failed to send email");
            e
        }
    };

    for delay in backoff {
        tokio::time::sleep(*delay).await;
        attempts += 1;
        match sender.send(message).await {
            Ok(()) => {
                info!(to = %message.to, attempts, "email sent");
                return Ok(());
            }
            Err(e) => {
                error!(error = %e, to = %message.to, retry = attempts - 1, "failed to send email, retrying");
                last = e;
            }
        }
    }

    error!(to = %message.to, attempts, "giving up on email delivery");
    Err(DeliveryError::Exhausted {
        attempts,
        source: last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::EmailTemplate;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakySender {
        calls: AtomicUsize,
        fail_first: usize,
    }

    #[async_trait]
    impl EmailSender for FlakySender {
        async fn send(&self, message: &EmailMessage) -> Result<(), SendError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(SendError::Address(message.to.clone()))
            } else {
                Ok(())
            }
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: "user@example.com".into(),
            template: EmailTemplate::Welcome {
                name: "Test".into(),
            },
        }
    }

    #[tokio::test]
    async fn delivery_succeeds_after_retries() {
        let sender = Arc::new(FlakySender {
            calls: AtomicUsize::new(0),
            fail_first: 2,
        });
        let shared: Arc<dyn EmailSender> = sender.clone();
        let queue = EmailQueue::start_with(shared, 1, [Duration::ZERO; 3]);

        let outcome = queue.enqueue(message()).await.expect("worker reports");
        assert!(outcome.is_ok());
        assert_eq!(sender.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn delivery_gives_up_after_all_attempts() {
        let sender = Arc::new(FlakySender {
            calls: AtomicUsize::new(0),
            fail_first: usize::MAX,
        });
        let shared: Arc<dyn EmailSender> = sender.clone();
        let queue = EmailQueue::start_with(shared, 1, [Duration::ZERO; 3]);

        let outcome = queue.enqueue(message()).await.expect("worker reports");
        match outcome {
            Err(DeliveryError::Exhausted { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("expected exhausted delivery, got {other:?}"),
        }
        assert_eq!(sender.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn workers_drain_multiple_jobs() {
        let sender = Arc::new(FlakySender {
            calls: AtomicUsize::new(0),
            fail_first: 0,
        });
        let shared: Arc<dyn EmailSender> = sender.clone();
        let queue = EmailQueue::start_with(shared, 2, [Duration::ZERO; 3]);

        let first = queue.enqueue(message());
        let second = queue.enqueue(message());
        assert!(first.await.expect("worker reports").is_ok());
        assert!(second.await.expect("worker reports").is_ok());
        assert_eq!(sender.calls.load(Ordering::SeqCst), 2);
    }
}
