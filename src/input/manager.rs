use std::{collections::HashMap, error::Error, path::PathBuf, sync::Arc, time::Duration};

use hidapi::{DeviceInfo, HidApi};
use tokio::sync::mpsc;

use crate::{
    config::{DeviceConfig, DriverConfig},
    drivers::tablet::devices,
    input::device::{DeviceCommand, DeviceTask, COMMAND_BUFFER_SIZE},
    watcher,
};

const DEV_PATH: &str = "/dev";
const BUFFER_SIZE: usize = 1024;
/// How long shutdown waits for device tasks to remove their virtual devices
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Manager commands define all the different ways to interact with [Manager]
/// over a channel. These commands are processed in an asyncronous thread and
/// dispatched as they come in.
#[derive(Debug, Clone)]
pub enum ManagerCommand {
    HIDRawAdded {
        name: String,
    },
    HIDRawRemoved {
        name: String,
    },
    /// A device task exited. The id tells a task apart from a newer one
    /// started for the same path.
    DeviceStopped {
        path: String,
        id: u64,
    },
    /// A device attached without a stored mapping and got its defaults
    DefaultsCreated {
        vendor_id: u16,
        product_id: u16,
        config: DeviceConfig,
    },
    /// Re-read the configuration file and update every device
    Reload,
    Shutdown,
}

/// Command channel of one running device task
#[derive(Debug)]
struct ManagedDevice {
    id: u64,
    tx: mpsc::Sender<DeviceCommand>,
}

/// Manages attached tablets
///
/// The [Manager] discovers hidraw devices, starts a [DeviceTask] for every
/// supported tablet interface and keeps the driver configuration that those
/// tasks build their mappings from.
pub struct Manager {
    config_path: PathBuf,
    config: Arc<DriverConfig>,
    /// The transmit side of the [rx] channel used to send [ManagerCommand]
    /// messages. This can be cloned to allow child objects to communicate up
    /// to the manager.
    tx: mpsc::Sender<ManagerCommand>,
    rx: mpsc::Receiver<ManagerCommand>,
    /// All running device tasks keyed by hidraw path.
    /// E.g. {"/dev/hidraw3": ManagedDevice { id: 1, tx: <Sender> }}
    devices: HashMap<String, ManagedDevice>,
    /// Id handed to the most recently started device task
    last_task_id: u64,
}

impl Manager {
    pub fn new(config_path: PathBuf) -> Manager {
        let (tx, rx) = mpsc::channel(BUFFER_SIZE);
        let config = match DriverConfig::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Unable to load config {config_path:?}: {e}. Using defaults.");
                DriverConfig::default()
            }
        };

        Manager {
            config_path,
            config: Arc::new(config),
            tx,
            rx,
            devices: HashMap::new(),
            last_task_id: 0,
        }
    }

    /// Returns a transmitter that can be used to send commands to the manager
    pub fn transmitter(&self) -> mpsc::Sender<ManagerCommand> {
        self.tx.clone()
    }

    /// Paths of all devices with a running task
    pub fn device_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.devices.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Current driver configuration
    pub fn config(&self) -> &Arc<DriverConfig> {
        &self.config
    }

    /// Starts listening for [ManagerCommand] messages and discovering devices
    pub async fn run(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.watch_devices().await?;

        log::debug!("Starting manager command processing");
        while let Some(cmd) = self.rx.recv().await {
            log::trace!("Received command: {cmd:?}");
            match cmd {
                ManagerCommand::HIDRawAdded { name } => self.on_hidraw_added(name).await,
                ManagerCommand::HIDRawRemoved { name } => self.on_hidraw_removed(name).await,
                ManagerCommand::DeviceStopped { path, id } => self.on_device_stopped(path, id),
                ManagerCommand::DefaultsCreated {
                    vendor_id,
                    product_id,
                    config,
                } => self.on_defaults_created(vendor_id, product_id, config),
                ManagerCommand::Reload => self.reload().await,
                ManagerCommand::Shutdown => {
                    self.shutdown().await;
                    break;
                }
            }
        }

        log::debug!("Manager stopped");
        Ok(())
    }

    /// Called when a hidraw node appears. Starts a device task unless the
    /// device is known to be something else.
    pub async fn on_hidraw_added(&mut self, name: String) {
        let path = format!("{DEV_PATH}/{name}");
        if self.devices.contains_key(&path) {
            log::trace!("Device {path} is already managed");
            return;
        }

        // New nodes may not be enumerable yet. Those are left to the device
        // task, which retries until the node can be opened.
        if let Some(info) = hidraw_info(&path) {
            if !is_supported_interface(&info) {
                log::trace!(
                    "Ignoring {path} ({:04x}:{:04x} interface {})",
                    info.vendor_id(),
                    info.product_id(),
                    info.interface_number()
                );
                return;
            }
        }

        let (id, rx) = self.register_device(&path);
        log::info!("Starting device task {id} for {path}");
        let task = DeviceTask::new(path.clone(), id, self.config.clone(), rx, self.tx.clone());
        tokio::spawn(async move {
            if let Err(e) = task.run().await {
                log::error!("Device task for {path} failed: {e}");
            }
        });
    }

    /// Track a new device task for the given path. Returns the task id and
    /// the receiving end of its command channel.
    pub fn register_device(&mut self, path: &str) -> (u64, mpsc::Receiver<DeviceCommand>) {
        self.last_task_id += 1;
        let id = self.last_task_id;
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        if let Some(previous) = self.devices.insert(path.to_string(), ManagedDevice { id, tx }) {
            log::debug!("Device task {} for {path} was replaced", previous.id);
        }
        (id, rx)
    }

    /// Called when a hidraw node goes away
    pub async fn on_hidraw_removed(&mut self, name: String) {
        let path = format!("{DEV_PATH}/{name}");
        let Some(device) = self.devices.remove(&path) else {
            log::debug!("Ignoring removal of unmanaged device {path}");
            return;
        };
        log::info!("Device {path} was removed");
        if let Err(e) = device.tx.send(DeviceCommand::Stop).await {
            log::debug!("Device task {} for {path} already stopped: {e}", device.id);
        }
    }

    /// Forget a device task that exited. Tasks that were already replaced by
    /// a newer one for the same path are ignored.
    pub fn on_device_stopped(&mut self, path: String, id: u64) {
        match self.devices.get(&path) {
            Some(device) if device.id == id => {
                self.devices.remove(&path);
                log::debug!("Device task {id} for {path} stopped");
            }
            Some(device) => {
                log::debug!(
                    "Ignoring stop of device task {id} for {path}, task {} is current",
                    device.id
                );
            }
            None => (),
        }
    }

    /// Store a synthesized default mapping and save it so users can edit it
    pub fn on_defaults_created(&mut self, vendor_id: u16, product_id: u16, config: DeviceConfig) {
        if let Some(existing) = self.config.device(vendor_id, product_id) {
            if existing.mapping.is_some() {
                return;
            }
        }
        log::info!("Saving default mapping for {vendor_id:04x}:{product_id:04x}");
        let mut updated = self.config.as_ref().clone();
        updated.set_device(vendor_id, product_id, config);
        if let Err(e) = updated.save(&self.config_path) {
            log::warn!("Unable to save config {:?}: {e}", self.config_path);
        }
        self.config = Arc::new(updated);
    }

    /// Re-read the configuration file and hand it to every device. A file
    /// that fails to load leaves the current configuration in place.
    pub async fn reload(&mut self) {
        log::info!("Reloading config from {:?}", self.config_path);
        let config = match DriverConfig::load(&self.config_path) {
            Ok(config) => Arc::new(config),
            Err(e) => {
                log::error!("Unable to reload config: {e}");
                return;
            }
        };
        self.config = config.clone();

        for (path, device) in self.devices.iter() {
            if let Err(e) = device.tx.send(DeviceCommand::Reload(config.clone())).await {
                log::debug!("Unable to reload {path}: {e}");
            }
        }
    }

    /// Stop all device tasks and wait for them to clean up
    async fn shutdown(&mut self) {
        log::info!("Stopping {} device(s)", self.devices.len());
        for (path, device) in self.devices.iter() {
            if let Err(e) = device.tx.send(DeviceCommand::Stop).await {
                log::debug!("Device task for {path} already stopped: {e}");
            }
        }

        let wait = async {
            while !self.devices.is_empty() {
                match self.rx.recv().await {
                    Some(ManagerCommand::DeviceStopped { path, id }) => {
                        self.on_device_stopped(path, id)
                    }
                    Some(_) => (),
                    None => break,
                }
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait).await.is_err() {
            log::warn!("Timed out waiting for devices to stop");
        }
    }

    /// Start watching /dev for hidraw changes and queue every hidraw node
    /// that already exists
    async fn watch_devices(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        // Create a channel to handle watch events
        let (watcher_tx, mut watcher_rx) = mpsc::channel(BUFFER_SIZE);

        // Start watcher thread to listen for hidraw device changes
        let tx = watcher_tx.clone();
        tokio::task::spawn_blocking(move || {
            log::debug!("Started watcher thread");
            if let Err(e) = watcher::watch(DEV_PATH.into(), tx) {
                log::error!("Device watcher stopped: {e}");
            }
        });

        // Perform an initial hidraw device discovery
        let mut names = Vec::new();
        for entry in std::fs::read_dir(DEV_PATH)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Unable to read from directory: {e:?}");
                    continue;
                }
            };
            let Some(name) = entry.file_name().into_string().ok() else {
                continue;
            };
            if name.starts_with("hidraw") {
                names.push(name);
            }
        }
        names.sort();
        for name in names {
            log::debug!("Discovered hidraw device: {name}");
            let event = watcher::WatchEvent::Create {
                name,
                base_path: DEV_PATH.into(),
            };
            if let Err(e) = watcher_tx.send(event).await {
                log::error!("Unable to send command: {e:?}");
            }
        }

        // Start a task to dispatch filesystem watch events to the `run()` loop
        let cmd_tx = self.tx.clone();
        tokio::spawn(async move {
            log::debug!("Dispatching filesystem watch events");
            while let Some(event) = watcher_rx.recv().await {
                log::trace!("Received watch event: {event:?}");
                let cmd = match event {
                    watcher::WatchEvent::Create { name, .. } if name.starts_with("hidraw") => {
                        ManagerCommand::HIDRawAdded { name }
                    }
                    watcher::WatchEvent::Delete { name, .. } if name.starts_with("hidraw") => {
                        ManagerCommand::HIDRawRemoved { name }
                    }
                    _ => continue,
                };
                if let Err(e) = cmd_tx.send(cmd).await {
                    log::error!("Unable to send command: {e:?}");
                    break;
                }
            }
        });

        Ok(())
    }
}

/// Returns the hidapi info for the given hidraw path, if it can be enumerated
fn hidraw_info(path: &str) -> Option<DeviceInfo> {
    let api = match HidApi::new() {
        Ok(api) => api,
        Err(e) => {
            log::warn!("Unable to enumerate HID devices: {e}");
            return None;
        }
    };
    let info = api
        .device_list()
        .find(|info| info.path().to_string_lossy() == path)
        .cloned();
    info
}

/// Returns true if the device info describes an interface of a supported
/// tablet that reports pen and pad data, or its touch pad
pub fn is_supported_interface(info: &DeviceInfo) -> bool {
    if !devices::is_supported_vendor(info.vendor_id()) {
        return false;
    }
    devices::lookup_interface(info.vendor_id(), info.product_id(), info.interface_number())
        .is_some()
}
