//! Single-slot handoff between the audio producer and the render consumer.
//!
//! Publishing never blocks: a frame the consumer has not picked up yet is
//! evicted and replaced. The consumer never blocks either: when nothing new is
//! pending it keeps showing the last frame it received (all zeros before the
//! first publish). Frames the consumer is done with travel back to the producer
//! so the steady-state capture path does not allocate.

use crossbeam_channel::{Receiver, Sender, TrySendError};

use super::SpectrumFrame;

/// Frames drawn through `spare_frame` never number more than three: the
/// consumer's last frame, one waiting in the slot and one being filled by the
/// producer. The recycle queue can therefore always accept a returned frame, and
/// no frame is dropped (freed) on the producer side.
const RECYCLE_CAPACITY: usize = 3;

/// Create a connected publisher/receiver pair for frames of `band_count` bands.
pub fn frame_channel(band_count: usize) -> (FramePublisher, FrameReceiver) {
    let (slot_tx, slot_rx) = crossbeam_channel::bounded(1);
    let (recycle_tx, recycle_rx) = crossbeam_channel::bounded(RECYCLE_CAPACITY);

    let publisher = FramePublisher {
        slot: slot_tx,
        evict: slot_rx.clone(),
        recycled: recycle_rx,
        spill: recycle_tx.clone(),
        band_count,
        next_sequence: 1,
    };
    let receiver = FrameReceiver {
        slot: slot_rx,
        recycle: recycle_tx,
        last: SpectrumFrame::zeroed(band_count),
    };

    (publisher, receiver)
}

/// Producer half. Owned by exactly one capture thread.
pub struct FramePublisher {
    slot: Sender<SpectrumFrame>,
    evict: Receiver<SpectrumFrame>,
    recycled: Receiver<SpectrumFrame>,
    spill: Sender<SpectrumFrame>,
    band_count: usize,
    next_sequence: u64,
}

impl FramePublisher {
    pub fn band_count(&self) -> usize {
        self.band_count
    }

    /// A frame buffer to analyze into: a recycled one when available.
    ///
    /// Only allocates while the pool is still warming up. Frames that did not
    /// come from here add to the pool and may be dropped once it is full.
    pub fn spare_frame(&self) -> SpectrumFrame {
        self.recycled
            .try_recv()
            .unwrap_or_else(|_| SpectrumFrame::zeroed(self.band_count))
    }

    /// Hand `frame` to the consumer, replacing any frame still pending.
    pub fn publish(&mut self, mut frame: SpectrumFrame) {
        frame.sequence = self.next_sequence;
        self.next_sequence += 1;

        loop {
            match self.slot.try_send(frame) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    // The consumer may win the race for the stale frame; either way
                    // the slot is free on the next attempt.
                    if let Ok(stale) = self.evict.try_recv() {
                        let _ = self.spill.try_send(stale);
                    }
                    frame = rejected;
                }
                // Unreachable while `evict` keeps the channel alive.
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

/// Consumer half. Owned by the render loop.
pub struct FrameReceiver {
    slot: Receiver<SpectrumFrame>,
    recycle: Sender<SpectrumFrame>,
    last: SpectrumFrame,
}

impl FrameReceiver {
    /// The pending frame if one arrived since the last call, otherwise the last
    /// frame delivered (or the startup zero frame).
    pub fn take_latest_or_fallback(&mut self) -> &SpectrumFrame {
        self.take_pending();
        &self.last
    }

    /// Only a frame that has not been returned before.
    pub fn take_latest(&mut self) -> Option<&SpectrumFrame> {
        if self.take_pending() {
            Some(&self.last)
        } else {
            None
        }
    }

    /// The frame most recently handed out, without checking for a new one.
    pub fn last(&self) -> &SpectrumFrame {
        &self.last
    }

    fn take_pending(&mut self) -> bool {
        match self.slot.try_recv() {
            Ok(frame) => {
                let previous = std::mem::replace(&mut self.last, frame);
                let _ = self.recycle.try_send(previous);
                true
            }
            Err(_) => false,
        }
    }
}
