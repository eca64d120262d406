//! Animation sequencing for presentation drivers
//!
//! Animations run either from a sequential queue or immediately alongside
//! whatever is active. Drivers call [`AnimationSequencer::update`] once per
//! frame with the elapsed time.

use std::collections::VecDeque;

/// A presentation animation
pub trait Animation: Send {
    /// Called once when the animation becomes active
    fn start(&mut self);

    /// Advance by `delta_ms`
    fn update(&mut self, delta_ms: f64);

    fn is_complete(&self) -> bool;

    /// Completion hook, called once after the animation is removed
    fn on_complete(&mut self) {}

    /// Label for logs
    fn label(&self) -> &str {
        "animation"
    }
}

type EmptyCallback = Box<dyn FnOnce() + Send>;

/// Queue plus parallel playback
#[derive(Default)]
pub struct AnimationSequencer {
    queue: VecDeque<Box<dyn Animation>>,
    active: Vec<Box<dyn Animation>>,
    on_empty: Vec<EmptyCallback>,
}

impl AnimationSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to the sequential queue
    pub fn enqueue(&mut self, animation: impl Animation + 'static) {
        self.queue.push_back(Box::new(animation));
    }

    /// Start the next queued animation, or fire empty callbacks if none
    pub fn play_next(&mut self) {
        match self.queue.pop_front() {
            Some(animation) => self.activate(animation),
            None => self.fire_empty(),
        }
    }

    /// Start every animation at once
    pub fn play_parallel(&mut self, animations: Vec<Box<dyn Animation>>) {
        for animation in animations {
            self.activate(animation);
        }
    }

    /// Start one animation now, bypassing the queue
    pub fn play_immediate(&mut self, animation: impl Animation + 'static) {
        self.activate(Box::new(animation));
    }

    fn activate(&mut self, mut animation: Box<dyn Animation>) {
        log::trace!("animation start: {}", animation.label());
        animation.start();
        self.active.push(animation);
    }

    /// Advance active animations, retire completed ones, then advance the queue
    pub fn update(&mut self, delta_ms: f64) {
        let mut finished = Vec::new();
        let mut i = 0;
        while i < self.active.len() {
            self.active[i].update(delta_ms);
            if self.active[i].is_complete() {
                finished.push(self.active.remove(i));
            } else {
                i += 1;
            }
        }
        for mut animation in finished {
            animation.on_complete();
        }

        if self.active.is_empty() {
            if self.queue.is_empty() {
                self.fire_empty();
            } else {
                self.play_next();
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        !self.active.is_empty() || !self.queue.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// One-shot callback for when everything has finished
    pub fn on_empty(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.on_empty.push(Box::new(callback));
    }

    pub fn clear_on_empty(&mut self) {
        self.on_empty.clear();
    }

    fn fire_empty(&mut self) {
        for callback in std::mem::take(&mut self.on_empty) {
            callback();
        }
    }

    /// Drop all animations and callbacks
    pub fn clear(&mut self) {
        self.queue.clear();
        self.active.clear();
        self.on_empty.clear();
    }
}

impl std::fmt::Debug for AnimationSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationSequencer")
            .field("queued", &self.queue.len())
            .field("active", &self.active.len())
            .field("on_empty", &self.on_empty.len())
            .finish()
    }
}

/// Fixed-duration animation with an optional completion callback
pub struct TimedAnimation {
    label: String,
    duration_ms: f64,
    elapsed_ms: f64,
    started: bool,
    callback: Option<Box<dyn FnOnce() + Send>>,
}

impl TimedAnimation {
    pub fn new(label: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            label: label.into(),
            duration_ms: duration_ms.max(0.0),
            elapsed_ms: 0.0,
            started: false,
            callback: None,
        }
    }

    pub fn then(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// Progress in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).min(1.0)
        }
    }
}

impl Animation for TimedAnimation {
    fn start(&mut self) {
        self.started = true;
        self.elapsed_ms = 0.0;
    }

    fn update(&mut self, delta_ms: f64) {
        if self.started {
            self.elapsed_ms += delta_ms;
        }
    }

    fn is_complete(&self) -> bool {
        self.started && self.elapsed_ms >= self.duration_ms
    }

    fn on_complete(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback();
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for TimedAnimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedAnimation")
            .field("label", &self.label)
            .field("duration_ms", &self.duration_ms)
            .field("elapsed_ms", &self.elapsed_ms)
            .finish()
    }
}
