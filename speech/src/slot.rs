//! Per-chunk audio slots shared by the producer and the consumer.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Audio payload held by a slot: base64 PCM.
pub type SlotAudio = Arc<str>;

/// Result of waiting for a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotWait {
    /// The slot was filled.
    Ready(SlotAudio),
    /// The wait ceiling elapsed first.
    TimedOut,
    /// The owning session was cancelled first.
    Cancelled,
}

/// Write-once audio cells, one per chunk of an utterance.
///
/// Each slot is a watch channel so the consumer can await a fill instead of
/// polling for it.
#[derive(Debug)]
pub struct ChunkSlots {
    slots: Vec<watch::Sender<Option<SlotAudio>>>,
}

impl ChunkSlots {
    /// Creates `count` empty slots.
    pub fn new(count: usize) -> Self {
        let slots = (0..count).map(|_| watch::Sender::new(None)).collect();
        Self { slots }
    }

    /// Returns the number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stores `audio` in slot `index` unless it already holds audio.
    ///
    /// Returns false if the slot was already filled or does not exist.
    pub fn fill(&self, index: usize, audio: impl Into<SlotAudio>) -> bool {
        let Some(slot) = self.slots.get(index) else {
            return false;
        };
        let mut audio = Some(audio.into());
        slot.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = audio.take();
            true
        })
    }

    /// Returns the audio in slot `index`, if filled.
    pub fn get(&self, index: usize) -> Option<SlotAudio> {
        self.slots.get(index).and_then(|s| s.borrow().clone())
    }

    /// Returns true if every slot holds audio.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| s.borrow().is_some())
    }

    /// Returns the number of filled slots.
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.borrow().is_some()).count()
    }

    /// Returns a copy of every slot in order.
    pub fn snapshot(&self) -> Vec<Option<SlotAudio>> {
        self.slots.iter().map(|s| s.borrow().clone()).collect()
    }

    /// Waits until slot `index` is filled, `ceiling` elapses, or `cancel` fires.
    ///
    /// A missing slot index waits out the ceiling like a slot that is never filled.
    pub async fn wait(&self, index: usize, ceiling: Duration, cancel: &CancellationToken) -> SlotWait {
        if cancel.is_cancelled() {
            return SlotWait::Cancelled;
        }
        let Some(slot) = self.slots.get(index) else {
            return tokio::select! {
                _ = cancel.cancelled() => SlotWait::Cancelled,
                _ = tokio::time::sleep(ceiling) => SlotWait::TimedOut,
            };
        };

        let mut rx = slot.subscribe();
        tokio::select! {
            _ = cancel.cancelled() => SlotWait::Cancelled,
            filled = tokio::time::timeout(ceiling, wait_filled(&mut rx)) => match filled {
                Ok(Some(audio)) => SlotWait::Ready(audio),
                _ => SlotWait::TimedOut,
            },
        }
    }
}

async fn wait_filled(rx: &mut watch::Receiver<Option<SlotAudio>>) -> Option<SlotAudio> {
    match rx.wait_for(Option::is_some).await {
        Ok(value) => (*value).clone(),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_is_write_once() {
        let slots = ChunkSlots::new(2);
        assert!(!slots.is_complete());
        assert!(slots.fill(0, "first"));
        assert!(!slots.fill(0, "second"));
        assert_eq!(slots.get(0).as_deref(), Some("first"));
        assert_eq!(slots.get(1), None);
        assert!(!slots.fill(5, "out of range"));
        assert_eq!(slots.filled(), 1);

        assert!(slots.fill(1, "b"));
        assert!(slots.is_complete());
        let snapshot: Vec<_> = slots.snapshot().into_iter().map(|s| s.unwrap().to_string()).collect();
        assert_eq!(snapshot, vec!["first", "b"]);
    }

    #[tokio::test]
    async fn test_wait_ready_immediately() {
        let slots = ChunkSlots::new(1);
        slots.fill(0, "x");
        let cancel = CancellationToken::new();
        let got = slots.wait(0, Duration::from_secs(1), &cancel).await;
        assert_eq!(got, SlotWait::Ready("x".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sees_later_fill() {
        let slots = Arc::new(ChunkSlots::new(1));
        let writer = slots.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            writer.fill(0, "late");
        });

        let cancel = CancellationToken::new();
        let got = slots.wait(0, Duration::from_secs(10), &cancel).await;
        assert_eq!(got, SlotWait::Ready("late".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let slots = ChunkSlots::new(1);
        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();
        let got = slots.wait(0, Duration::from_secs(10), &cancel).await;
        assert_eq!(got, SlotWait::TimedOut);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_cancelled() {
        let slots = ChunkSlots::new(1);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });
        let got = slots.wait(0, Duration::from_secs(10), &cancel).await;
        assert_eq!(got, SlotWait::Cancelled);
    }
}
