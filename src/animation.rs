//! Frame-clock pulse shared by the darkness mask and the glow sprites.
//!
//! Both consumers call `phase` with the same frame counter, so they stay in
//! sync without sharing any mutable state.

/// Symmetric triangle wave: rises 0→1 over the first half of `period`, falls
/// back to 0 over the second half. A zero period yields 0.
pub fn saw_wave(time: u64, period: u64) -> f32 {
    if period == 0 {
        return 0.0;
    }
    let cycle_position = (time % period) as f64 / period as f64;
    let value = if cycle_position < 0.5 {
        cycle_position * 2.0
    } else {
        (1.0 - cycle_position) * 2.0
    };
    value as f32
}

/// Pulse value in [0, 1] for a frame, with a period of two seconds of frames
pub fn phase(frame_count: u64, frame_rate: u64) -> f32 {
    saw_wave(frame_count, 2 * frame_rate)
}
