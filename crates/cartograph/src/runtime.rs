// ABOUTME: Owns the scheduler, bus, license gate and application for one session
// ABOUTME: Wires subscriptions at start and tears them down in order at shutdown

use cartograph_core::{LicenseGate, ListenerHandle, Message, MessageBus, MessageDispatch, TaskScheduler};
use cartograph_logging::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::application::{APPLICATION_MESSAGE_KINDS, Application, Collaborators};
use crate::config::AppConfig;
use crate::error::RuntimeError;

/// Explicit context object for a running session.
///
/// Dropping a runtime shuts it down if [`Runtime::shutdown`] was not called.
pub struct Runtime {
    scheduler: Arc<TaskScheduler>,
    bus: MessageBus,
    license_gate: LicenseGate,
    application: Arc<Mutex<Application>>,
    listeners: Vec<ListenerHandle>,
    shut_down: bool,
}

impl Runtime {
    pub fn start(config: &AppConfig, collaborators: Collaborators) -> Result<Self, RuntimeError> {
        config
            .validate()
            .map_err(|reason| RuntimeError::Config { reason })?;

        let scheduler = Arc::new(TaskScheduler::with_slow_task_threshold(
            config.slow_task_threshold(),
        ));
        let bus = MessageBus::new(Arc::clone(&scheduler));
        let license_gate = LicenseGate::new(bus.clone());

        let events: Arc<dyn MessageDispatch> = Arc::new(bus.clone());
        let application = Arc::new(Mutex::new(Application::new(
            config.app_name.clone(),
            config.settings_path.clone(),
            collaborators,
            events,
        )));

        let app_listener = ListenerHandle::from_shared(Arc::clone(&application));
        bus.subscribe_all(&APPLICATION_MESSAGE_KINDS, &app_listener);
        let gate_listener = license_gate.subscribe(&bus);

        // Constructed before anything can fail so Drop cleans up the subscriptions
        let runtime = Self {
            scheduler,
            bus,
            license_gate,
            application,
            listeners: vec![app_listener, gate_listener],
            shut_down: false,
        };

        let has_ui = runtime.application.lock().prepare_ui();
        if has_ui {
            runtime
                .license_gate
                .dispatch_when_license_valid(Message::ShowStartScreen);
            runtime.application.lock().load_layout();
        }

        runtime.scheduler.start()?;
        runtime.bus.set_delivery_mode(true);

        if !config.license_check {
            debug!("License check disabled, releasing held messages");
            runtime.license_gate.resolve(true);
        }

        info!(app = %config.app_name, has_ui, "Runtime started");
        Ok(runtime)
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn scheduler(&self) -> &Arc<TaskScheduler> {
        &self.scheduler
    }

    pub fn license_gate(&self) -> &LicenseGate {
        &self.license_gate
    }

    pub fn dispatcher(&self) -> Arc<dyn MessageDispatch> {
        Arc::new(self.bus.clone())
    }

    /// Queue `message` on the default delivery route
    pub fn dispatch(&self, message: Message) {
        self.bus.publish_as_task(message);
    }

    /// Run `f` with the application locked; waits for any in-flight delivery
    pub fn with_application<R>(&self, f: impl FnOnce(&Application) -> R) -> R {
        f(&self.application.lock())
    }

    pub fn wait_until_idle(&self) {
        self.scheduler.wait_until_idle();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Stop accepting messages, drain queued work, then release listeners
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.bus.shutdown();
        self.scheduler.stop();

        for listener in self.listeners.drain(..) {
            self.bus.unsubscribe_all(&listener);
        }

        self.application.lock().save_layout();
        info!("Runtime shut down");
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
