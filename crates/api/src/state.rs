use buy_alert_domain::services::{telemetry::TelemetryGuard, DestinationQueues};
use buy_alert_monitor::EventProcessor;

#[derive(Clone)]
pub struct AppState {
    processor: EventProcessor,
    telemetry: TelemetryGuard,
}

impl AppState {
    pub fn new(processor: EventProcessor, telemetry: TelemetryGuard) -> Self {
        Self {
            processor,
            telemetry,
        }
    }

    pub fn processor(&self) -> &EventProcessor {
        &self.processor
    }

    pub fn queues(&self) -> &DestinationQueues {
        self.processor.queues()
    }

    pub fn telemetry(&self) -> &TelemetryGuard {
        &self.telemetry
    }
}
