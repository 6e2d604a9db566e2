//! Bounded fixed-point iteration.

/// How an [`iterate_until_stable`] loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoint {
    /// Steps actually run.
    pub iterations: u32,
    /// `false` when the cap was hit while the last step still changed something.
    pub converged: bool,
}

/// Run `step` until it reports no change, at most `max_iters` times.
///
/// `step` receives the 1-based iteration number and returns whether it
/// changed anything. With `max_iters == 0` nothing runs and the result is
/// not converged.
pub fn iterate_until_stable<F>(max_iters: u32, mut step: F) -> FixedPoint
where
    F: FnMut(u32) -> bool,
{
    for iteration in 1..=max_iters {
        if !step(iteration) {
            return FixedPoint {
                iterations: iteration,
                converged: true,
            };
        }
    }
    FixedPoint {
        iterations: max_iters,
        converged: false,
    }
}
