use std::fmt;

use crate::assemble::apng::DecodedAnimation;
use crate::report::loop_score::{LoopScore, score_sequence};

/// Exclusive upper bound on the encoded file size for published stickers.
pub const MAX_STICKER_BYTES: u64 = 1_048_576;

/// Fixed publishing limits for one sticker kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublishLimits {
    /// Sticker kind these limits apply to.
    pub kind: StickerKind,
    /// Largest allowed width in pixels.
    pub max_width: u32,
    /// Largest allowed height in pixels.
    pub max_height: u32,
    /// Inclusive frame-count range; `None` when the kind is not animated.
    pub frame_range: Option<(u32, u32)>,
    /// Longest allowed loop; `None` for static stickers.
    pub max_duration_ms: Option<u64>,
    /// Encoded size must be strictly below this.
    pub max_bytes: u64,
}

/// Which publishing rule set applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StickerKind {
    /// Animated PNG sticker.
    Animated,
    /// Single-image sticker.
    Static,
}

impl PublishLimits {
    /// Animated limits: 320x270, 5 to 20 frames, at most 4 s, under 1 MB.
    pub const fn animated() -> Self {
        Self {
            kind: StickerKind::Animated,
            max_width: 320,
            max_height: 270,
            frame_range: Some((5, 20)),
            max_duration_ms: Some(4000),
            max_bytes: MAX_STICKER_BYTES,
        }
    }

    /// Static limits: 370x320, under 1 MB.
    pub const fn static_sticker() -> Self {
        Self {
            kind: StickerKind::Static,
            max_width: 370,
            max_height: 320,
            frame_range: None,
            max_duration_ms: None,
            max_bytes: MAX_STICKER_BYTES,
        }
    }
}

/// One publishing constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintRule {
    /// Width and height within the maximum.
    Dimensions,
    /// Frame count within the allowed range.
    FrameCount,
    /// Total loop duration within the maximum.
    Duration,
    /// Encoded size below the byte limit.
    FileSize,
}

/// One rule's verdict with the measured value and the limit it was held to.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ConstraintCheck {
    /// Rule that was checked.
    pub rule: ConstraintRule,
    /// Whether the measurement met the limit.
    pub passed: bool,
    /// Human-readable measurement.
    pub measured: String,
    /// Human-readable limit.
    pub limit: String,
}

impl fmt::Display for ConstraintCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.passed { "OK" } else { "NG" };
        write!(f, "  [{mark}] {} ({})", self.measured, self.limit)
    }
}

/// Every rule checked independently, plus the advisory loop score.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ValidationReport {
    /// Rule set the file was held to.
    pub kind: StickerKind,
    /// One check per rule, in a fixed order.
    pub checks: Vec<ConstraintCheck>,
    /// Seam score; advisory only.
    pub loop_score: Option<LoopScore>,
}

impl ValidationReport {
    /// PASS only when every rule passes; the loop score never affects it.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Verdict for one rule.
    pub fn check(&self, rule: ConstraintRule) -> Option<&ConstraintCheck> {
        self.checks.iter().find(|c| c.rule == rule)
    }

    /// Checks that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &ConstraintCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            StickerKind::Animated => "animated",
            StickerKind::Static => "static",
        };
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        writeln!(f, "{kind} sticker validation [{verdict}]:")?;
        for check in &self.checks {
            writeln!(f, "{check}")?;
        }
        if let Some(score) = self.loop_score {
            writeln!(f, "{score}")?;
        }
        Ok(())
    }
}

/// Raw measurements a report is computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Measurements {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Number of frames.
    pub frame_count: u32,
    /// Total loop duration.
    pub duration_ms: u64,
    /// Encoded size in bytes.
    pub byte_size: u64,
}

/// Check measurements against limits. All rules are evaluated; none short-circuits.
pub fn validate_measurements(m: &Measurements, limits: &PublishLimits) -> Vec<ConstraintCheck> {
    let mut checks = vec![ConstraintCheck {
        rule: ConstraintRule::Dimensions,
        passed: m.width <= limits.max_width && m.height <= limits.max_height,
        measured: format!("{}x{} px", m.width, m.height),
        limit: format!("max {}x{}", limits.max_width, limits.max_height),
    }];
    if let Some((lo, hi)) = limits.frame_range {
        checks.push(ConstraintCheck {
            rule: ConstraintRule::FrameCount,
            passed: (lo..=hi).contains(&m.frame_count),
            measured: format!("{} frames", m.frame_count),
            limit: format!("must be {lo}-{hi}"),
        });
    }
    if let Some(max) = limits.max_duration_ms {
        checks.push(ConstraintCheck {
            rule: ConstraintRule::Duration,
            passed: m.duration_ms <= max,
            measured: format!("{} ms total", m.duration_ms),
            limit: format!("max {max} ms"),
        });
    }
    checks.push(ConstraintCheck {
        rule: ConstraintRule::FileSize,
        passed: m.byte_size < limits.max_bytes,
        measured: format!("{:.1} KB ({} bytes)", m.byte_size as f64 / 1024.0, m.byte_size),
        limit: format!("under {} KB", limits.max_bytes / 1024),
    });
    checks
}

/// Validate a decoded artifact, scoring its loop seam when it has several frames.
pub fn validate_decoded(decoded: &DecodedAnimation, limits: &PublishLimits) -> ValidationReport {
    let m = Measurements {
        width: decoded.width,
        height: decoded.height,
        frame_count: decoded.frames.len() as u32,
        duration_ms: decoded.total_duration_ms(),
        byte_size: decoded.byte_size,
    };
    let checks = validate_measurements(&m, limits);
    let loop_score = match limits.kind {
        StickerKind::Animated => score_sequence(&decoded.frames),
        StickerKind::Static => None,
    };
    let report = ValidationReport {
        kind: limits.kind,
        checks,
        loop_score,
    };
    for failed in report.failures() {
        tracing::warn!(rule = ?failed.rule, measured = %failed.measured, limit = %failed.limit, "constraint failed");
    }
    report
}

#[cfg(test)]
#[path = "../../tests/unit/report/validate.rs"]
mod tests;
