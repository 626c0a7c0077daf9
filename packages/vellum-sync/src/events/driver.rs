use vellum_traits::{DocumentModel, Notification};

use crate::context::SyncState;
use crate::surface::Surface;

/// Everything a stage may touch while handling one notification: the document
/// model, the surface, and the engine's synchronization state. One context is
/// built per dispatch and threaded down the stage chain.
pub struct StageContext<'a> {
    pub doc: &'a mut dyn DocumentModel,
    pub surface: &'a mut Surface,
    pub state: &'a mut SyncState,
}

/// What a dispatch did, reported back to the host so it can decide whether to
/// re-render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub model_changed: bool,
}

impl Outcome {
    pub fn changed(model_changed: bool) -> Self {
        Outcome { model_changed }
    }

    pub fn merge(self, other: Outcome) -> Outcome {
        Outcome {
            model_changed: self.model_changed || other.model_changed,
        }
    }
}

/// One element of the ordered stage chain a notification travels through.
///
/// A stage handles what it wants and hands the rest of the chain the
/// continuation: calling `next.run(..)` passes the notification on, not
/// calling it swallows the notification. Host stages slot in between the
/// built-in gate and reconcile stages.
pub trait SyncStage {
    fn on_notification(
        &mut self,
        cx: &mut StageContext<'_>,
        event: &Notification,
        next: Next<'_>,
    ) -> Outcome;
}

/// Continuation token for the remainder of the stage chain.
pub struct Next<'chain> {
    rest: &'chain mut [Box<dyn SyncStage>],
}

impl<'chain> Next<'chain> {
    pub(crate) fn new(rest: &'chain mut [Box<dyn SyncStage>]) -> Self {
        Next { rest }
    }

    /// Run the remaining stages. Past the end of the chain this is a no-op.
    pub fn run(self, cx: &mut StageContext<'_>, event: &Notification) -> Outcome {
        match self.rest.split_first_mut() {
            None => Outcome::default(),
            Some((stage, rest)) => stage.on_notification(cx, event, Next { rest }),
        }
    }
}

pub struct NoopStage;

impl SyncStage for NoopStage {
    fn on_notification(
        &mut self,
        cx: &mut StageContext<'_>,
        event: &Notification,
        next: Next<'_>,
    ) -> Outcome {
        next.run(cx, event)
    }
}
