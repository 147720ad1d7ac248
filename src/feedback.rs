//! Haptic and sound feedback plumbing
//!
//! The core never plays anything itself. It emits abstract requests to a
//! host-provided [`FeedbackSink`], which resolves them to real resources.

use serde::{Deserialize, Serialize};

/// Haptic pattern identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HapticPattern {
    /// Dial crossed a notch
    NotchTick,
    /// Dial tapped
    Tap,
    /// Firework burst
    FireworkBurst,
    /// Glass impact
    GlassImpact,
    /// Coin landing
    CoinDrop,
    /// Milestone reached
    Milestone,
}

/// Sound event identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEvent {
    Notch,
    Tap,
    FireworkLaunch,
    FireworkExplosion,
    GlassCrack,
    CoinRain,
    CoinDrop,
    Milestone,
}

/// A single feedback request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeedbackRequest {
    Haptic { pattern: HapticPattern, intensity: f32 },
    Sound(SoundEvent),
}

impl FeedbackRequest {
    pub fn haptic(pattern: HapticPattern, intensity: f32) -> Self {
        Self::Haptic {
            pattern,
            intensity: intensity.clamp(0.0, 1.0),
        }
    }

    /// Deliver this request to a sink; sounds play at `volume`
    pub fn deliver(self, sink: &mut dyn FeedbackSink, volume: f32) {
        match self {
            FeedbackRequest::Haptic { pattern, intensity } => sink.play_haptic(pattern, intensity),
            FeedbackRequest::Sound(event) => sink.play_sound_at(event, volume),
        }
    }
}

/// Host-side receiver for feedback; fire-and-forget
pub trait FeedbackSink {
    fn play_haptic(&mut self, pattern: HapticPattern, intensity: f32);
    fn play_sound(&mut self, event: SoundEvent);

    /// Sound at master volume (0.0 - 1.0); sinks without a mixer ignore the level
    fn play_sound_at(&mut self, event: SoundEvent, volume: f32) {
        let _ = volume;
        self.play_sound(event);
    }
}

/// User-facing gates applied when requests are flushed
///
/// A volume of zero mutes sounds; any other level is passed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackGate {
    pub haptics_enabled: bool,
    pub sound_enabled: bool,
    pub volume: f32,
}

impl Default for FeedbackGate {
    fn default() -> Self {
        Self {
            haptics_enabled: true,
            sound_enabled: true,
            volume: 1.0,
        }
    }
}

impl FeedbackGate {
    fn allows(&self, request: &FeedbackRequest) -> bool {
        match request {
            FeedbackRequest::Haptic { .. } => self.haptics_enabled,
            FeedbackRequest::Sound(_) => self.sound_enabled && self.volume > 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    at: f64,
    seq: u64,
    request: FeedbackRequest,
}

/// Timeline of pending feedback requests on the single UI thread
///
/// Requests fire in timestamp order; ties keep insertion order.
#[derive(Debug, Default)]
pub struct FeedbackQueue {
    pending: Vec<Pending>,
    next_seq: u64,
    gate: FeedbackGate,
}

impl FeedbackQueue {
    pub fn new(gate: FeedbackGate) -> Self {
        Self {
            pending: Vec::new(),
            next_seq: 0,
            gate,
        }
    }

    pub fn set_gate(&mut self, gate: FeedbackGate) {
        self.gate = gate;
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Queue a request to fire at `at` (seconds, host clock)
    pub fn schedule(&mut self, at: f64, request: FeedbackRequest) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending { at, seq, request });
    }

    /// Queue a request for the next flush
    pub fn push(&mut self, request: FeedbackRequest) {
        self.schedule(f64::NEG_INFINITY, request);
    }

    /// Deliver every request due at `now`; returns how many were delivered
    pub fn flush(&mut self, now: f64, sink: &mut dyn FeedbackSink) -> usize {
        let mut due: Vec<Pending> = Vec::new();
        self.pending.retain(|p| {
            if p.at <= now {
                due.push(*p);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.at.total_cmp(&b.at).then(a.seq.cmp(&b.seq)));

        let mut delivered = 0;
        for p in due {
            if self.gate.allows(&p.request) {
                p.request.deliver(sink, self.gate.volume);
                delivered += 1;
            }
        }
        delivered
    }

    /// Drop everything still pending (app backgrounded)
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Sink that logs every request
#[derive(Debug, Default)]
pub struct LogSink;

impl FeedbackSink for LogSink {
    fn play_haptic(&mut self, pattern: HapticPattern, intensity: f32) {
        log::debug!("haptic {:?} @ {:.2}", pattern, intensity);
    }

    fn play_sound(&mut self, event: SoundEvent) {
        log::debug!("sound {:?}", event);
    }

    fn play_sound_at(&mut self, event: SoundEvent, volume: f32) {
        log::debug!("sound {:?} @ {:.2}", event, volume);
    }
}

/// Sink that records every request for later inspection
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub requests: Vec<FeedbackRequest>,
    /// Volume of each sound, in delivery order
    pub sound_volumes: Vec<f32>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn haptics(&self) -> impl Iterator<Item = (HapticPattern, f32)> + '_ {
        self.requests.iter().filter_map(|r| match *r {
            FeedbackRequest::Haptic { pattern, intensity } => Some((pattern, intensity)),
            FeedbackRequest::Sound(_) => None,
        })
    }

    pub fn sounds(&self) -> impl Iterator<Item = SoundEvent> + '_ {
        self.requests.iter().filter_map(|r| match *r {
            FeedbackRequest::Sound(event) => Some(event),
            FeedbackRequest::Haptic { .. } => None,
        })
    }

    pub fn count_sound(&self, event: SoundEvent) -> usize {
        self.sounds().filter(|e| *e == event).count()
    }

    pub fn count_haptic(&self, pattern: HapticPattern) -> usize {
        self.haptics().filter(|(p, _)| *p == pattern).count()
    }
}

impl FeedbackSink for RecordingSink {
    fn play_haptic(&mut self, pattern: HapticPattern, intensity: f32) {
        self.requests.push(FeedbackRequest::Haptic { pattern, intensity });
    }

    fn play_sound(&mut self, event: SoundEvent) {
        self.play_sound_at(event, 1.0);
    }

    fn play_sound_at(&mut self, event: SoundEvent, volume: f32) {
        self.requests.push(FeedbackRequest::Sound(event));
        self.sound_volumes.push(volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_delivers_due_in_order() {
        let mut queue = FeedbackQueue::default();
        queue.schedule(1.02, FeedbackRequest::Sound(SoundEvent::Notch));
        queue.schedule(1.00, FeedbackRequest::haptic(HapticPattern::NotchTick, 0.5));
        queue.schedule(1.50, FeedbackRequest::Sound(SoundEvent::Tap));

        let mut sink = RecordingSink::new();
        assert_eq!(queue.flush(1.1, &mut sink), 2);
        assert_eq!(queue.len(), 1);
        assert!(matches!(sink.requests[0], FeedbackRequest::Haptic { .. }));
        assert_eq!(sink.requests[1], FeedbackRequest::Sound(SoundEvent::Notch));

        queue.flush(2.0, &mut sink);
        assert!(queue.is_empty());
        assert_eq!(sink.count_sound(SoundEvent::Tap), 1);
    }

    #[test]
    fn test_gate_filters_disabled_channels() {
        let mut queue = FeedbackQueue::new(FeedbackGate {
            haptics_enabled: false,
            sound_enabled: true,
            volume: 0.0,
        });
        queue.push(FeedbackRequest::haptic(HapticPattern::Tap, 1.0));
        queue.push(FeedbackRequest::Sound(SoundEvent::Tap));

        let mut sink = RecordingSink::new();
        assert_eq!(queue.flush(0.0, &mut sink), 0);
        assert!(sink.requests.is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_master_volume_reaches_sink() {
        let mut queue = FeedbackQueue::new(FeedbackGate {
            volume: 0.35,
            ..Default::default()
        });
        queue.push(FeedbackRequest::Sound(SoundEvent::Notch));
        queue.push(FeedbackRequest::haptic(HapticPattern::NotchTick, 0.5));

        let mut sink = RecordingSink::new();
        assert_eq!(queue.flush(0.0, &mut sink), 2);
        assert_eq!(sink.sound_volumes, vec![0.35]);
        // Haptics are not scaled by volume
        assert_eq!(sink.haptics().next(), Some((HapticPattern::NotchTick, 0.5)));
    }

    #[test]
    fn test_haptic_intensity_clamped() {
        let request = FeedbackRequest::haptic(HapticPattern::Milestone, 3.0);
        assert_eq!(
            request,
            FeedbackRequest::Haptic {
                pattern: HapticPattern::Milestone,
                intensity: 1.0
            }
        );
    }
}
