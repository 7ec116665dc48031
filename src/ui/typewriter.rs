use std::time::Duration;

/// Reveals text one character per `delay`, driven by the egui clock.
#[derive(Debug, Clone)]
pub struct TypeWriter {
    text: String,
    char_count: usize,
    started_at: f64,
    delay: Duration,
    finished: bool,
}

impl TypeWriter {
    pub fn new(delay: Duration) -> Self {
        Self {
            text: String::new(),
            char_count: 0,
            started_at: 0.0,
            delay,
            finished: true,
        }
    }

    /// Replaces whatever is being typed and starts over from the first char.
    pub fn start(&mut self, text: impl Into<String>, now: f64) {
        self.text = text.into();
        self.char_count = self.text.chars().count();
        self.started_at = now;
        self.finished = self.char_count == 0 || self.delay.is_zero();
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn full_text(&self) -> &str {
        &self.text
    }

    pub fn revealed_chars(&self, now: f64) -> usize {
        if self.finished {
            return self.char_count;
        }
        let elapsed = (now - self.started_at).max(0.0);
        let steps = (elapsed / self.delay.as_secs_f64()).floor() as usize;
        steps.saturating_add(1).min(self.char_count)
    }

    pub fn is_typing(&self, now: f64) -> bool {
        self.revealed_chars(now) < self.char_count
    }

    pub fn visible(&self, now: f64) -> &str {
        let shown = self.revealed_chars(now);
        match self.text.char_indices().nth(shown) {
            Some((byte_index, _)) => &self.text[..byte_index],
            None => &self.text,
        }
    }
}
