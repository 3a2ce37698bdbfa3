use tokio::sync::broadcast;

/// Mutation published after a session write succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Stored { email: String },
    ProfileUpdated,
    Cleared,
}

/// Fan-out for session changes. Stores that share one notifier (for example
/// two contexts over the same storage) see each other's writes.
#[derive(Debug, Clone)]
pub struct SessionNotifier {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) {
        // No subscribers is the common case
        match self.sender.send(event) {
            Ok(receivers) => tracing::trace!("Session event delivered to {} receivers", receivers),
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!("No listeners for {:?}", event)
            }
        }
    }
}

impl Default for SessionNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}
