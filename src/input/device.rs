use std::{error::Error, sync::Arc, time::Duration};

use tokio::sync::mpsc;

use crate::{
    config::{DeviceConfig, DriverConfig},
    drivers::tablet::{
        descriptor::DeviceDescriptor,
        driver::{Driver, DriverError},
    },
    input::{
        manager::ManagerCommand,
        mapping::MappingSet,
        session::TranslationSession,
        sink::{uinput::UinputSink, VirtualDeviceSink},
    },
};

/// Number of times opening a device is attempted
pub const ATTACH_ATTEMPTS: u32 = 5;
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(250);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(4);
/// Reports buffered between the reader thread and the device task
const REPORT_BUFFER_SIZE: usize = 256;
pub const COMMAND_BUFFER_SIZE: usize = 32;

/// Possible errors attaching to a device
#[derive(thiserror::Error, Debug)]
pub enum AttachError {
    #[error("Unable to open {path} after {attempts} attempts: {source}")]
    RetriesExhausted {
        path: String,
        attempts: u32,
        source: DriverError,
    },
    #[error("Unable to open {path}: {source}")]
    Unsupported { path: String, source: DriverError },
}

/// Commands a running device task accepts
#[derive(Debug, Clone)]
pub enum DeviceCommand {
    /// Rebuild the mapping set from the given configuration
    Reload(Arc<DriverConfig>),
    Stop,
}

/// Delay before the given retry. Starts at 250ms and doubles up to 4s.
pub fn retry_delay(attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    INITIAL_RETRY_DELAY
        .saturating_mul(factor)
        .min(MAX_RETRY_DELAY)
}

/// Open the device at the given path, retrying with backoff while the node
/// is not ready. Only the calling task waits between attempts.
pub async fn open_with_retry(path: &str) -> Result<Driver, AttachError> {
    let mut attempt = 0;
    loop {
        let open_path = path.to_string();
        let result = tokio::task::spawn_blocking(move || Driver::new(&open_path)).await;
        let error = match result {
            Ok(Ok(driver)) => return Ok(driver),
            Ok(Err(e)) => e,
            Err(e) => {
                log::warn!("Device open task for {path} failed: {e}");
                DriverError::Hid(hidapi::HidError::HidApiError {
                    message: e.to_string(),
                })
            }
        };

        if !error.is_transient() {
            return Err(AttachError::Unsupported {
                path: path.to_string(),
                source: error,
            });
        }

        attempt += 1;
        if attempt >= ATTACH_ATTEMPTS {
            return Err(AttachError::RetriesExhausted {
                path: path.to_string(),
                attempts: attempt,
                source: error,
            });
        }

        let delay = retry_delay(attempt - 1);
        log::warn!(
            "Failed to open {path} (attempt {attempt}/{ATTACH_ATTEMPTS}): {error}. Retrying in {delay:?}"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Build the mapping set for a device from the given configuration. Returns
/// the device config if its mapping had to be synthesized.
pub fn resolve_mappings(
    config: &DriverConfig,
    descriptor: &DeviceDescriptor,
) -> (MappingSet, Option<DeviceConfig>) {
    let (device_config, synthesized) = config.resolve_device(descriptor);
    let mappings = MappingSet::from_config(&device_config);
    (mappings, synthesized.then_some(device_config))
}

/// Runs one attached tablet: reads its reports on a blocking thread and
/// translates them on this task until the device goes away or is stopped.
pub struct DeviceTask {
    path: String,
    id: u64,
    config: Arc<DriverConfig>,
    rx: mpsc::Receiver<DeviceCommand>,
    manager_tx: mpsc::Sender<ManagerCommand>,
    sink: Box<dyn VirtualDeviceSink>,
}

impl DeviceTask {
    pub fn new(
        path: String,
        id: u64,
        config: Arc<DriverConfig>,
        rx: mpsc::Receiver<DeviceCommand>,
        manager_tx: mpsc::Sender<ManagerCommand>,
    ) -> Self {
        Self {
            path,
            id,
            config,
            rx,
            manager_tx,
            sink: Box::new(UinputSink::new()),
        }
    }

    pub async fn run(mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let result = self.attach_and_run().await;
        if let Err(e) = self
            .manager_tx
            .send(ManagerCommand::DeviceStopped {
                path: self.path.clone(),
                id: self.id,
            })
            .await
        {
            log::debug!("Unable to notify manager that {} stopped: {e}", self.path);
        }
        result
    }

    async fn attach_and_run(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let driver = match open_with_retry(&self.path).await {
            Ok(driver) => driver,
            Err(AttachError::Unsupported { path, source }) => {
                log::debug!("Not attaching to {path}: {source}");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = driver.write_init_key() {
            log::warn!("Failed to send init key to {}: {e}", self.path);
        }
        let descriptor = driver.probe();

        let (mappings, synthesized) = resolve_mappings(&self.config, &descriptor);
        // The touch pad shares its product id with the pen interface, which
        // owns the stored mapping
        if let Some(device_config) = synthesized.filter(|_| !descriptor.is_pointer()) {
            self.manager_tx
                .send(ManagerCommand::DefaultsCreated {
                    vendor_id: descriptor.vendor_id,
                    product_id: descriptor.product_id,
                    config: device_config,
                })
                .await?;
        }

        let mut session = TranslationSession::new(Arc::new(mappings));
        session.on_attach(descriptor, self.sink.as_mut())?;

        // Spawn a blocking task to read the reports
        let (report_tx, mut report_rx) = mpsc::channel::<Vec<u8>>(REPORT_BUFFER_SIZE);
        let path = self.path.clone();
        let reader =
            tokio::task::spawn_blocking(move || -> Result<(), Box<dyn Error + Send + Sync>> {
                loop {
                    if report_tx.is_closed() {
                        break;
                    }
                    let Some(report) = driver.poll()? else {
                        continue;
                    };
                    if report_tx.blocking_send(report).is_err() {
                        break;
                    }
                }
                log::debug!("Stopped reading from {path}");
                Ok(())
            });

        loop {
            tokio::select! {
                report = report_rx.recv() => {
                    let Some(report) = report else {
                        log::debug!("Report reader for {} stopped", self.path);
                        break;
                    };
                    session.deliver(&report, self.sink.as_mut());
                }
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(DeviceCommand::Reload(config)) => {
                            let (mappings, _) = resolve_mappings(&config, &descriptor);
                            session.reload(Arc::new(mappings));
                            self.config = config;
                        }
                        Some(DeviceCommand::Stop) | None => break,
                    }
                }
            }
        }

        session.on_detach(self.sink.as_mut());
        drop(report_rx);

        // A vanished device ends the reader with an error, which is expected
        match reader.await? {
            Ok(()) => (),
            Err(e) => log::debug!("Reader for {} exited: {e}", self.path),
        }

        Ok(())
    }
}
