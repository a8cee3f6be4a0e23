use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{StickerError, StickerResult};

/// Frame rate used when neither fps nor a total duration is given.
pub const DEFAULT_FPS: f64 = 16.0;
/// Shortest per-frame display time a preset may allocate.
pub const MIN_FRAME_MS: u32 = 10;

/// Named easing presets mapping frame position to a display-time weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimingPreset {
    /// Every frame gets the same share.
    #[default]
    Uniform,
    /// Linger early, rush late.
    EaseIn,
    /// Rush early, linger late.
    EaseOut,
    /// Longest at both ends, shortest at the midpoint.
    EaseInOut,
    /// Shortest at both ends, longest at the midpoint.
    Bounce,
}

impl TimingPreset {
    /// Every preset, in CLI listing order.
    pub const ALL: [Self; 5] = [
        Self::Uniform,
        Self::EaseIn,
        Self::EaseOut,
        Self::EaseInOut,
        Self::Bounce,
    ];

    /// Duration weight at normalized position `t ∈ [0, 1]`. Always positive.
    pub fn weight(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Uniform => 1.0,
            Self::EaseIn => 1.1 - t,
            Self::EaseOut => 0.1 + t,
            Self::EaseInOut => 1.1 - (PI * t).sin(),
            Self::Bounce => 0.1 + (PI * t).sin(),
        }
    }

    /// Kebab-case name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
            Self::Bounce => "bounce",
        }
    }

    fn symmetric(self) -> bool {
        matches!(self, Self::Uniform | Self::EaseInOut | Self::Bounce)
    }
}

impl FromStr for TimingPreset {
    type Err = StickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                StickerError::validation(format!(
                    "unknown timing preset '{s}' (expected one of: uniform, ease-in, ease-out, ease-in-out, bounce)"
                ))
            })
    }
}

impl fmt::Display for TimingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-frame timing request: a preset or a verbatim list of milliseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimingSpec {
    /// Distribute the total by a preset curve.
    Preset(TimingPreset),
    /// Exact milliseconds per frame.
    Explicit(Vec<u32>),
}

impl Default for TimingSpec {
    fn default() -> Self {
        Self::Preset(TimingPreset::Uniform)
    }
}

impl FromStr for TimingSpec {
    type Err = StickerError;

    /// Accepts a preset name or a comma-separated list such as `80,60,60,80`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(preset) = s.parse::<TimingPreset>() {
            return Ok(Self::Preset(preset));
        }
        if !s.contains(|c: char| c.is_ascii_digit()) {
            return s.parse::<TimingPreset>().map(Self::Preset);
        }
        s.split(',')
            .map(|part| {
                part.trim().parse::<u32>().map_err(|_| {
                    StickerError::validation(format!(
                        "timing '{s}' is neither a preset nor a comma-separated ms list"
                    ))
                })
            })
            .collect::<StickerResult<Vec<_>>>()
            .map(Self::Explicit)
    }
}

/// How the total animation length is given when a preset distributes it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TotalDuration {
    /// Frames per second; total = frames / fps.
    Fps(f64),
    /// Total loop length in milliseconds.
    Millis(u32),
}

impl Default for TotalDuration {
    fn default() -> Self {
        Self::Fps(DEFAULT_FPS)
    }
}

impl TotalDuration {
    /// Total milliseconds for `frame_count` frames: `round(1000 × n / fps)` or the fixed value.
    pub fn total_ms(self, frame_count: usize) -> StickerResult<u32> {
        match self {
            Self::Millis(ms) => Ok(ms),
            Self::Fps(fps) => {
                if !fps.is_finite() || fps <= 0.0 {
                    return Err(StickerError::validation(format!(
                        "fps must be positive, got {fps}"
                    )));
                }
                let ms = (1000.0 * frame_count as f64 / fps).round();
                if ms > f64::from(u32::MAX) {
                    return Err(StickerError::validation("total duration out of range"));
                }
                Ok(ms as u32)
            }
        }
    }
}

/// Ordered per-frame display durations in milliseconds; every entry is positive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingCurve {
    durations: Vec<u32>,
}

impl TimingCurve {
    /// Use a duration list verbatim; it must match the frame count and hold no zeros.
    pub fn explicit(frame_count: usize, durations: Vec<u32>) -> StickerResult<Self> {
        if durations.len() != frame_count {
            return Err(StickerError::TimingMismatch {
                expected: frame_count,
                got: durations.len(),
            });
        }
        if let Some(i) = durations.iter().position(|&d| d == 0) {
            return Err(StickerError::validation(format!(
                "frame {i} has a zero duration"
            )));
        }
        Ok(Self { durations })
    }

    /// Distribute `total_ms` over `frame_count` frames by the preset's weights.
    ///
    /// Weights are sampled at `t = i / (n - 1)`; symmetric presets sample the mirrored index so
    /// mirrored frames weigh exactly the same. Integer milliseconds are assigned by largest
    /// remainder, so the sum is exact, and each frame gets at least [`MIN_FRAME_MS`].
    pub fn from_preset(
        frame_count: usize,
        total_ms: u32,
        preset: TimingPreset,
    ) -> StickerResult<Self> {
        if frame_count == 0 {
            return Err(StickerError::validation("cannot time zero frames"));
        }
        let floor_total = u64::from(MIN_FRAME_MS) * frame_count as u64;
        if u64::from(total_ms) < floor_total {
            return Err(StickerError::validation(format!(
                "total duration {total_ms} ms is below {floor_total} ms ({MIN_FRAME_MS} ms x {frame_count} frames)"
            )));
        }

        let last = frame_count.saturating_sub(1);
        let weights = (0..frame_count)
            .map(|i| {
                if last == 0 {
                    return preset.weight(0.5);
                }
                let i = if preset.symmetric() { i.min(last - i) } else { i };
                preset.weight(i as f64 / last as f64)
            })
            .collect::<Vec<_>>();
        let weight_sum = weights.iter().sum::<f64>();

        let exact = weights
            .iter()
            .map(|w| f64::from(total_ms) * w / weight_sum)
            .collect::<Vec<_>>();
        let mut durations = exact.iter().map(|e| e.floor() as u32).collect::<Vec<_>>();
        let assigned = durations.iter().map(|&d| u64::from(d)).sum::<u64>();
        let leftover = u64::from(total_ms).saturating_sub(assigned) as usize;

        let mut order = (0..frame_count).collect::<Vec<_>>();
        order.sort_by(|&a, &b| {
            let fa = exact[a] - exact[a].floor();
            let fb = exact[b] - exact[b].floor();
            fb.total_cmp(&fa).then(a.cmp(&b))
        });
        for &i in order.iter().take(leftover) {
            durations[i] += 1;
        }

        enforce_minimum(&mut durations);
        Ok(Self { durations })
    }

    /// Build the curve for a run from its timing inputs.
    ///
    /// An explicit list is checked against the frame count before anything else.
    pub fn build(
        frame_count: usize,
        total: TotalDuration,
        spec: &TimingSpec,
    ) -> StickerResult<Self> {
        match spec {
            TimingSpec::Explicit(list) => Self::explicit(frame_count, list.clone()),
            TimingSpec::Preset(preset) => {
                Self::from_preset(frame_count, total.total_ms(frame_count)?, *preset)
            }
        }
    }

    /// Per-frame milliseconds, in playback order.
    pub fn durations(&self) -> &[u32] {
        &self.durations
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    /// True for an empty curve.
    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Sum of all durations.
    pub fn total_ms(&self) -> u64 {
        self.durations.iter().map(|&d| u64::from(d)).sum()
    }
}

/// Lift short frames to [`MIN_FRAME_MS`], taking the deficit one ms at a time from the
/// longest frames. The caller guarantees the total allows it.
fn enforce_minimum(durations: &mut [u32]) {
    let mut deficit = durations
        .iter()
        .map(|&d| u64::from(MIN_FRAME_MS.saturating_sub(d)))
        .sum::<u64>();
    for d in durations.iter_mut() {
        *d = (*d).max(MIN_FRAME_MS);
    }
    while deficit > 0 {
        let Some((i, _)) = durations
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d > MIN_FRAME_MS)
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        else {
            break;
        };
        durations[i] -= 1;
        deficit -= 1;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/curve.rs"]
mod tests;
