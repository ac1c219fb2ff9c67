use std::future::Future;
use std::time::{Duration, Instant};

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::dispatch::{DispatchOutcome, ScanDispatcher};
use super::pipeline::Pipeline;
use super::presentation::PresentationStateMachine;
use super::queue::EventReceiver;
use super::render::Renderer;

/// Single-threaded UI loop. Owns the presentation state and the renderer;
/// dispatch outcomes come back through its own channel and are applied here,
/// never from the dispatch task.
pub struct UiDriver<R> {
    presentation: PresentationStateMachine,
    dispatcher: ScanDispatcher,
    outcome_tx: mpsc::UnboundedSender<DispatchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<DispatchOutcome>,
    renderer: R,
}

impl<R: Renderer> UiDriver<R> {
    pub fn new(hold: Duration, dispatcher: ScanDispatcher, renderer: R) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            presentation: PresentationStateMachine::new(hold),
            dispatcher,
            outcome_tx,
            outcome_rx,
            renderer,
        }
    }

    pub fn presentation(&self) -> &PresentationStateMachine {
        &self.presentation
    }

    /// One UI tick: apply finished dispatches, take every queued scan in
    /// arrival order, expire the result screen, redraw.
    pub fn tick(&mut self, events: &mut EventReceiver, now: Instant) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.presentation.on_outcome(outcome, now);
        }

        for event in events.drain() {
            self.presentation.on_scan(&event);
            self.dispatcher.submit(event, self.outcome_tx.clone());
        }

        self.presentation.tick(now);

        let screen = self.presentation.screen();
        if let Err(e) = self.renderer.render(&screen, Local::now().naive_local()) {
            warn!(error = %e, "Failed to render kiosk screen");
        }
    }

    /// Ticks every `period` until `shutdown` resolves.
    pub async fn run(
        mut self,
        pipeline: &mut Pipeline,
        period: Duration,
        shutdown: impl Future<Output = ()>,
    ) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(tick_ms = period.as_millis() as u64, "UI driver running");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => self.tick(pipeline.events(), Instant::now()),
            }
        }
        info!("UI driver stopped");
    }
}
