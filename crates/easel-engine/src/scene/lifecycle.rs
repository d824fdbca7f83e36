use crate::error::EngineError;

/// Setup progress of a scene object.
///
/// Stages advance strictly in declaration order; `Destroyed` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    Uninitialized,
    GeometryReady,
    ShadersReady,
    PipelineReady,
    Destroyed,
}

impl Stage {
    /// The stage that must be current before this one can be entered, or
    /// `None` for stages that are not setup targets.
    fn prerequisite(self) -> Option<Stage> {
        match self {
            Stage::GeometryReady => Some(Stage::Uninitialized),
            Stage::ShadersReady => Some(Stage::GeometryReady),
            Stage::PipelineReady => Some(Stage::ShadersReady),
            Stage::Uninitialized | Stage::Destroyed => None,
        }
    }
}

/// Lifecycle state machine shared by every scene object.
///
/// Setup methods call [`begin`](Self::begin) before doing work and
/// [`advance`](Self::advance) after it succeeds, so a failed stage leaves
/// the machine where it was and the stage can be retried.
#[derive(Debug)]
pub struct Lifecycle {
    stage: Stage,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            stage: Stage::Uninitialized,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Checks that `op` may run now and would enter `target`.
    pub fn begin(&self, target: Stage, op: &str) -> Result<(), EngineError> {
        self.ensure_alive(op)?;

        let Some(expected) = target.prerequisite() else {
            return Err(EngineError::usage(format!(
                "`{op}` does not lead to a setup stage"
            )));
        };

        if self.stage != expected {
            return Err(EngineError::usage(format!(
                "`{op}` called at stage {:?} (expected {expected:?})",
                self.stage
            )));
        }

        Ok(())
    }

    /// Records that the stage guarded by [`begin`](Self::begin) succeeded.
    pub fn advance(&mut self, target: Stage) {
        debug_assert_eq!(target.prerequisite(), Some(self.stage));
        self.stage = target;
    }

    /// Fails unless the object has reached `stage`.
    pub fn require(&self, stage: Stage, op: &str) -> Result<(), EngineError> {
        self.ensure_alive(op)?;

        if self.stage != stage {
            return Err(EngineError::usage(format!(
                "`{op}` requires stage {stage:?}, object is at {:?}",
                self.stage
            )));
        }

        Ok(())
    }

    /// Fails only if the object has been destroyed. Used by no-op lifecycle
    /// methods, which are legal at any live stage.
    pub fn ensure_alive(&self, op: &str) -> Result<(), EngineError> {
        if self.stage == Stage::Destroyed {
            return Err(EngineError::usage(format!("`{op}` called after destroy")));
        }
        Ok(())
    }

    /// Enters the terminal stage. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        self.stage = Stage::Destroyed;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_machine() -> Lifecycle {
        let mut lc = Lifecycle::new();
        lc.advance(Stage::GeometryReady);
        lc.advance(Stage::ShadersReady);
        lc.advance(Stage::PipelineReady);
        lc
    }

    // ── ordered setup ─────────────────────────────────────────────────────

    #[test]
    fn stages_advance_in_order() {
        let mut lc = Lifecycle::new();

        lc.begin(Stage::GeometryReady, "createGeometry").unwrap();
        lc.advance(Stage::GeometryReady);
        lc.begin(Stage::ShadersReady, "createShaders").unwrap();
        lc.advance(Stage::ShadersReady);
        lc.begin(Stage::PipelineReady, "createRenderPipeline").unwrap();
        lc.advance(Stage::PipelineReady);

        assert_eq!(lc.stage(), Stage::PipelineReady);
    }

    #[test]
    fn skipping_a_stage_is_a_usage_error() {
        let lc = Lifecycle::new();
        let err = lc.begin(Stage::ShadersReady, "createShaders").unwrap_err();
        assert!(matches!(err, EngineError::Usage(_)));
    }

    #[test]
    fn repeating_a_stage_is_a_usage_error() {
        let mut lc = Lifecycle::new();
        lc.advance(Stage::GeometryReady);

        let err = lc.begin(Stage::GeometryReady, "createGeometry").unwrap_err();
        assert!(matches!(err, EngineError::Usage(_)));
    }

    #[test]
    fn failed_stage_leaves_the_machine_retryable() {
        let mut lc = Lifecycle::new();
        lc.advance(Stage::GeometryReady);

        // begin() without advance() models a stage whose work failed.
        lc.begin(Stage::ShadersReady, "createShaders").unwrap();
        assert_eq!(lc.stage(), Stage::GeometryReady);
        lc.begin(Stage::ShadersReady, "createShaders").unwrap();
    }

    // ── readiness guard ───────────────────────────────────────────────────

    #[test]
    fn render_before_pipeline_readiness_fails_fast() {
        let lc = Lifecycle::new();
        let err = lc.require(Stage::PipelineReady, "render").unwrap_err();
        assert!(matches!(err, EngineError::Usage(_)));
    }

    #[test]
    fn render_after_full_setup_is_allowed() {
        let lc = ready_machine();
        lc.require(Stage::PipelineReady, "render").unwrap();
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn destroy_is_terminal_and_idempotent() {
        let mut lc = ready_machine();

        lc.destroy();
        assert_eq!(lc.stage(), Stage::Destroyed);
        lc.destroy();
        assert_eq!(lc.stage(), Stage::Destroyed);
    }

    #[test]
    fn lifecycle_calls_after_destroy_are_usage_errors() {
        let mut lc = Lifecycle::new();
        lc.destroy();

        assert!(lc.begin(Stage::GeometryReady, "createGeometry").is_err());
        assert!(lc.require(Stage::PipelineReady, "render").is_err());
        assert!(lc.ensure_alive("updateGeometry").is_err());
    }

    #[test]
    fn destroy_succeeds_from_a_partial_setup() {
        let mut lc = Lifecycle::new();
        lc.advance(Stage::GeometryReady);

        lc.destroy();
        assert_eq!(lc.stage(), Stage::Destroyed);
    }
}
