//! Intra-phase effects
//!
//! Timer-driven effects that live inside one mounted phase: a bounded
//! counter, a delayed reveal, a typewriter and a rolling feed. [`Effect`]
//! is the declarative definition, [`EffectState`] the per-mount state those
//! timers mutate. The state transitions are plain methods so they can be
//! exercised without a runtime; [`PhaseInstance`](super::PhaseInstance)
//! wires them to timers.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;

/// How a counter is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterStyle {
    /// One filled star per unit, `max` stars in total
    Stars,
    /// A numeric score out of 100
    Score,
}

/// What an effect does and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EffectKind {
    /// Adds `step` every `period` after `start`, until `max`.
    Counter {
        /// Delay before the periodic timer begins
        start: Duration,
        /// Time between increments
        period: Duration,
        /// Amount added per increment
        step: u32,
        /// Terminal value
        max: u32,
        /// Presentation hint
        style: CounterStyle,
    },
    /// Flips from hidden to shown once, after `after`.
    Reveal {
        /// Delay before the flip
        after: Duration,
        /// Text shown once revealed
        label: String,
    },
    /// Reveals `text` one character per `per_char` after `start`.
    Typewriter {
        /// Delay before typing begins
        start: Duration,
        /// Time between characters
        per_char: Duration,
        /// Full target text
        text: String,
    },
    /// Prepends `count` new items, the first after `first` and then every
    /// `spacing`, keeping at most `capacity` items.
    Feed {
        /// Items present at mount, most recent first
        seed: Vec<u64>,
        /// Delay before the first new item
        first: Duration,
        /// Time between new items
        spacing: Duration,
        /// Number of items added after mount
        count: usize,
        /// Maximum number of items kept
        capacity: usize,
        /// Display template; `{id}` is replaced by the item id
        item_label: String,
    },
}

/// A named effect belonging to a phase definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Effect {
    /// Name, unique within its phase
    pub name: String,
    /// Behavior and timing
    #[serde(flatten)]
    pub kind: EffectKind,
}

impl Effect {
    /// Bounded counter.
    #[must_use]
    pub fn counter(
        name: impl Into<String>,
        start: Duration,
        period: Duration,
        step: u32,
        max: u32,
        style: CounterStyle,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EffectKind::Counter {
                start,
                period,
                step,
                max,
                style,
            },
        }
    }

    /// One-shot reveal.
    #[must_use]
    pub fn reveal(name: impl Into<String>, after: Duration, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EffectKind::Reveal {
                after,
                label: label.into(),
            },
        }
    }

    /// Typewriter.
    #[must_use]
    pub fn typewriter(
        name: impl Into<String>,
        start: Duration,
        per_char: Duration,
        text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EffectKind::Typewriter {
                start,
                per_char,
                text: text.into(),
            },
        }
    }

    /// Rolling feed with evenly spaced additions.
    #[must_use]
    pub fn feed(
        name: impl Into<String>,
        seed: Vec<u64>,
        first: Duration,
        spacing: Duration,
        count: usize,
        capacity: usize,
        item_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EffectKind::Feed {
                seed,
                first,
                spacing,
                count,
                capacity,
                item_label: item_label.into(),
            },
        }
    }

    /// Checks that the effect can run without busy-looping or overflowing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveInterval`] for a zero period and
    /// [`ConfigError::InvalidValue`] for other out-of-range settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.kind {
            EffectKind::Counter {
                period, step, max, ..
            } => {
                self.positive("period", *period)?;
                if *step == 0 {
                    return Err(self.invalid("step", step, "a positive increment"));
                }
                if *max == 0 {
                    return Err(self.invalid("max", max, "a positive maximum"));
                }
            }
            EffectKind::Reveal { .. } => {}
            EffectKind::Typewriter { per_char, .. } => {
                self.positive("per_char", *per_char)?;
            }
            EffectKind::Feed {
                seed,
                count,
                capacity,
                ..
            } => {
                if *capacity == 0 {
                    return Err(self.invalid("capacity", capacity, "a positive capacity"));
                }
                if seed.len() > *capacity {
                    return Err(self.invalid(
                        "seed",
                        &seed.len(),
                        "no more seed items than the capacity",
                    ));
                }
                if seed.windows(2).any(|w| w[0] <= w[1]) {
                    return Err(self.invalid(
                        "seed",
                        &format!("{seed:?}"),
                        "strictly decreasing ids (most recent first)",
                    ));
                }
                let pushes = u64::try_from(*count).unwrap_or(u64::MAX);
                if let Some(top) = seed.first()
                    && top.checked_add(pushes).is_none()
                {
                    return Err(self.invalid("seed", top, "ids that leave room for every push"));
                }
            }
        }
        Ok(())
    }

    fn positive(&self, field: &str, value: Duration) -> Result<(), ConfigError> {
        if value.is_zero() {
            return Err(ConfigError::NonPositiveInterval {
                field: format!("{}.{field}", self.name),
                value,
            });
        }
        Ok(())
    }

    fn invalid(&self, field: &str, value: &dyn std::fmt::Display, expected: &str) -> ConfigError {
        ConfigError::InvalidValue {
            field: format!("{}.{field}", self.name),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }
}

/// Per-mount state of one effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EffectState {
    /// Current counter value
    Counter {
        /// Value so far
        value: u32,
        /// Terminal value
        max: u32,
    },
    /// Whether the reveal has happened
    Reveal {
        /// `true` once flipped
        shown: bool,
    },
    /// Typewriter progress
    Typewriter {
        /// Full target text
        text: String,
        /// Characters revealed so far
        revealed: usize,
    },
    /// Rolling feed contents
    Feed {
        /// Item ids, most recent first
        items: VecDeque<u64>,
        /// Id the next item will get
        next_id: u64,
        /// Maximum number of items kept
        capacity: usize,
    },
}

impl EffectState {
    /// Fresh state for `effect`, as it is on every mount.
    #[must_use]
    pub fn initial(effect: &Effect) -> Self {
        match &effect.kind {
            EffectKind::Counter { max, .. } => Self::Counter {
                value: 0,
                max: *max,
            },
            EffectKind::Reveal { .. } => Self::Reveal { shown: false },
            EffectKind::Typewriter { text, .. } => Self::Typewriter {
                text: text.clone(),
                revealed: 0,
            },
            EffectKind::Feed { seed, capacity, .. } => Self::Feed {
                items: seed.iter().copied().take(*capacity).collect(),
                next_id: seed.iter().copied().max().map_or(1, |m| m.saturating_add(1)),
                capacity: *capacity,
            },
        }
    }

    /// Adds `step` to a counter, clamped to its maximum.
    ///
    /// Returns `true` when the counter is at its terminal value afterwards.
    /// Calling it again at the maximum is a no-op.
    pub fn counter_step(&mut self, step: u32) -> bool {
        match self {
            Self::Counter { value, max } => {
                *value = value.saturating_add(step).min(*max);
                *value == *max
            }
            _ => true,
        }
    }

    /// Flips a reveal. Returns `true` if this call changed it.
    pub fn reveal(&mut self) -> bool {
        match self {
            Self::Reveal { shown } if !*shown => {
                *shown = true;
                true
            }
            _ => false,
        }
    }

    /// Reveals one more character.
    ///
    /// Returns `true` when the whole text is visible afterwards. Never goes
    /// past the end of the text.
    pub fn type_next(&mut self) -> bool {
        match self {
            Self::Typewriter { text, revealed } => {
                let total = text.chars().count();
                if *revealed < total {
                    *revealed += 1;
                }
                *revealed >= total
            }
            _ => true,
        }
    }

    /// Prepends a new item with the next id, dropping the oldest beyond
    /// capacity. Returns the id added.
    pub fn feed_push(&mut self) -> Option<u64> {
        match self {
            Self::Feed {
                items,
                next_id,
                capacity,
            } => {
                let id = *next_id;
                *next_id = next_id.saturating_add(1);
                items.push_front(id);
                items.truncate(*capacity);
                Some(id)
            }
            _ => None,
        }
    }

    /// Revealed prefix of a typewriter's text, or `""` for other effects.
    #[must_use]
    pub fn revealed_text(&self) -> &str {
        match self {
            Self::Typewriter { text, revealed } => {
                let end = text
                    .char_indices()
                    .nth(*revealed)
                    .map_or(text.len(), |(i, _)| i);
                &text[..end]
            }
            _ => "",
        }
    }

    /// Returns `true` once no timer can change this state any further.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        match self {
            Self::Counter { value, max } => value >= max,
            Self::Reveal { shown } => *shown,
            Self::Typewriter { text, revealed } => *revealed >= text.chars().count(),
            Self::Feed { .. } => false,
        }
    }
}
