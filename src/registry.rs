//! Host-side application slot.
//!
//! The host owns one [`AppRegistry`] per app type. The first request builds the
//! instance; later requests hand back the same one. Asking again with a
//! different [`AppConfig`] is an error rather than being quietly ignored, and
//! swapping the instance for a differently configured one is only allowed while
//! it is not running.

use log::info;

/// Name the clock registers under with the host.
pub const APP_NAME: &str = "Squareline";

/// Per-instance configuration: which host chrome stays visible over the app.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub use_status_bar: bool,
    pub use_navigation_bar: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HostError {
    Rejected,
}

/// What the app needs from the host framework.
pub trait HostFramework {
    /// One-way "this app has closed" notification.
    fn notify_closed(&mut self, app_name: &'static str) -> Result<(), HostError>;
}

/// What the registry needs from an app.
pub trait HostedApp {
    fn name(&self) -> &'static str;
    fn config(&self) -> AppConfig;
    fn is_running(&self) -> bool;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    ConfigMismatch { existing: AppConfig, requested: AppConfig },
    InstanceRunning,
}

#[derive(Debug)]
pub struct AppRegistry<A> {
    slot: Option<A>,
}

impl<A: HostedApp> Default for AppRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: HostedApp> AppRegistry<A> {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Existing instance if its configuration matches, otherwise a new one from
    /// `build` when the slot is empty.
    pub fn request_instance(
        &mut self,
        config: AppConfig,
        build: impl FnOnce(AppConfig) -> A,
    ) -> Result<&mut A, RegistryError> {
        if let Some(app) = &self.slot {
            let existing = app.config();
            if existing != config {
                return Err(RegistryError::ConfigMismatch { existing, requested: config });
            }
        }
        Ok(self.slot.get_or_insert_with(|| {
            let app = build(config);
            info!("Created app instance {} ({:?})", app.name(), config);
            app
        }))
    }

    pub fn instance(&mut self) -> Option<&mut A> {
        self.slot.as_mut()
    }

    /// Replace the instance with one built for `config`. The old instance is
    /// dropped, which releases whatever it still holds.
    pub fn recreate(
        &mut self,
        config: AppConfig,
        build: impl FnOnce(AppConfig) -> A,
    ) -> Result<&mut A, RegistryError> {
        if self.slot.as_ref().is_some_and(HostedApp::is_running) {
            return Err(RegistryError::InstanceRunning);
        }
        self.slot = None;
        let app = build(config);
        info!("Recreated app instance {} ({:?})", app.name(), config);
        Ok(self.slot.insert(app))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        config: AppConfig,
        running: bool,
        serial: u32,
    }

    impl HostedApp for Dummy {
        fn name(&self) -> &'static str {
            "dummy"
        }
        fn config(&self) -> AppConfig {
            self.config
        }
        fn is_running(&self) -> bool {
            self.running
        }
    }

    fn dummy(serial: u32) -> impl FnOnce(AppConfig) -> Dummy {
        move |config| Dummy { config, running: false, serial }
    }

    #[test]
    fn builds_once_and_returns_the_same_instance() {
        let mut reg = AppRegistry::new();
        let cfg = AppConfig::default();
        assert_eq!(reg.request_instance(cfg, dummy(1)).unwrap().serial, 1);
        assert_eq!(reg.request_instance(cfg, dummy(2)).unwrap().serial, 1);
    }

    #[test]
    fn default_registry_starts_empty() {
        let mut reg: AppRegistry<Dummy> = AppRegistry::default();
        assert!(reg.instance().is_none());
        assert_eq!(reg.request_instance(AppConfig::default(), dummy(7)).unwrap().serial, 7);
    }

    #[test]
    fn different_config_is_rejected() {
        let mut reg = AppRegistry::new();
        reg.request_instance(AppConfig::default(), dummy(1)).unwrap();
        let wanted = AppConfig { use_status_bar: true, use_navigation_bar: false };
        assert_eq!(
            reg.request_instance(wanted, dummy(2)).err(),
            Some(RegistryError::ConfigMismatch { existing: AppConfig::default(), requested: wanted })
        );
        assert_eq!(reg.instance().unwrap().serial, 1);
    }

    #[test]
    fn recreate_only_when_not_running() {
        let mut reg = AppRegistry::new();
        reg.request_instance(AppConfig::default(), dummy(1)).unwrap().running = true;
        let wanted = AppConfig { use_status_bar: true, use_navigation_bar: true };
        assert_eq!(reg.recreate(wanted, dummy(2)).err(), Some(RegistryError::InstanceRunning));

        reg.instance().unwrap().running = false;
        assert_eq!(reg.recreate(wanted, dummy(3)).unwrap().serial, 3);
        assert_eq!(reg.request_instance(wanted, dummy(4)).unwrap().serial, 3);
    }
}
