//! Async driver for a single stepped tween.

use tracing::debug;

use crate::job::{StepOutcome, TweenJob};

/// Render frames until the job finishes, sleeping for the returned delay
/// between frames. Returns the number of frames rendered.
///
/// Dropping the future stops the tween where it is; the element keeps its
/// `animating` class in that case.
pub async fn run_timed(mut job: TweenJob) -> u32 {
    let mut frames = 0;
    loop {
        frames += 1;
        match job.advance() {
            StepOutcome::Continue { delay } => tokio::time::sleep(delay).await,
            StepOutcome::Finished => break,
        }
    }
    debug!(job = ?job.id(), frames, "timed tween done");
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Animator, TweenOptions, ANIMATING_CLASS};
    use glide_dom::{Document, EventRegistry, HostCapabilities};
    use std::time::Duration;
    use tokio::time::Instant;

    fn job(property: &str, from: f64, to: f64) -> (TweenJob, std::rc::Rc<glide_dom::Element>) {
        let doc = Document::new(HostCapabilities::stepped());
        let elm = doc.create_element("div");
        let animator = Animator::new(EventRegistry::new(doc));
        let job = animator
            .animate(&elm, TweenOptions::new(property, to).from(from))
            .unwrap()
            .into_job()
            .unwrap();
        (job, elm)
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_timed_sleeps_between_frames() {
        let (job, elm) = job("height", 0.0, 100.0);
        let started = Instant::now();

        let frames = run_timed(job).await;

        assert_eq!(frames, 20);
        assert_eq!(started.elapsed(), Duration::from_millis(19 * 50));
        assert_eq!(elm.style("height").as_deref(), Some("100px"));
        assert!(!elm.has_class(ANIMATING_CLASS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_future_cancels() {
        let (job, elm) = job("width", 0.0, 100.0);

        let result = tokio::time::timeout(Duration::from_millis(120), run_timed(job)).await;

        assert!(result.is_err());
        // Frames at 0, 50 and 100ms
        assert_eq!(elm.style("width").as_deref(), Some("15px"));
        assert!(elm.has_class(ANIMATING_CLASS));
    }
}
