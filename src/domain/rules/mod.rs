// Domain rules - Selection and planning policies

use std::ops::RangeInclusive;

use rand::Rng;

use crate::domain::errors::DomainError;

/// Length of every extracted window in seconds
pub const CLIP_LENGTH_SECS: u32 = 60;

/// Slack kept before the window start and after the window end
pub const EDGE_MARGIN_SECS: u32 = 10;

/// Shortest source that can host a window plus both margins
pub const MIN_SOURCE_DURATION_SECS: f64 = 80.0;

/// Default cap on the number of sampled inputs
pub const DEFAULT_MAX_VIDEOS: usize = 60;

/// Fades must leave room for both transitions inside one window
pub const MAX_FADE_SECS: f64 = CLIP_LENGTH_SECS as f64 / 2.0;

/// Whether a measured duration is long enough to be planned
pub fn meets_duration_threshold(duration: f64) -> bool {
    duration.is_finite() && duration >= MIN_SOURCE_DURATION_SECS
}

/// Range of admissible window starts for a source of `duration` seconds.
///
/// `[10, floor(duration) - 70]`, so that a 60 second window followed by a
/// 10 second margin stays inside the source. An empty range means the
/// duration filter was bypassed and is reported as an internal error.
pub fn offset_range(duration: f64) -> Result<RangeInclusive<u32>, DomainError> {
    let tail = CLIP_LENGTH_SECS + EDGE_MARGIN_SECS;
    let whole = if duration.is_finite() && duration > 0.0 {
        duration.floor() as u64
    } else {
        0
    };
    let upper = whole.saturating_sub(u64::from(tail));
    if upper < u64::from(EDGE_MARGIN_SECS) {
        return Err(DomainError::InternalError(format!(
            "source duration {:.3}s leaves no room for a {}s window",
            duration, CLIP_LENGTH_SECS
        )));
    }
    let upper = u32::try_from(upper).unwrap_or(u32::MAX);
    Ok(EDGE_MARGIN_SECS..=upper)
}

/// Draw a window start uniformly from `offset_range(duration)`
pub fn draw_start_offset<R: Rng>(rng: &mut R, duration: f64) -> Result<u32, DomainError> {
    let range = offset_range(duration)?;
    Ok(rng.gen_range(range))
}

/// Reject fade durations that cannot fit twice inside one window
pub fn validate_fade_duration(seconds: f64) -> Result<(), DomainError> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(DomainError::BadArgs(format!(
            "Fade duration must be a positive number of seconds, got {}",
            seconds
        )));
    }
    if seconds >= MAX_FADE_SECS {
        return Err(DomainError::BadArgs(format!(
            "Fade duration must be less than {}s for a {}s clip, got {}s",
            MAX_FADE_SECS, CLIP_LENGTH_SECS, seconds
        )));
    }
    Ok(())
}

/// Number of inputs the selector draws from `available` files
pub fn selection_size(available: usize, max_videos: usize) -> usize {
    available.min(max_videos)
}
