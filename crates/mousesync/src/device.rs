//! Settings-file device.
//!
//! A `DeviceCapability` backed by a JSON document in the snapshot payload
//! format. Every access holds one lock; each write is a read-modify-write of
//! the whole document, replaced through a sibling temp file and a rename.
//! A missing document is created with factory defaults on first read.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use mousesync_core::{
    CapabilityError, DeviceCapability, IlluminationBehavior, PollingRate, Resolution,
    ResolutionStage, RgbColor, SnapshotPayload, StagePayload, StageTable, TargetPlatform,
};

pub struct SettingsFileDevice {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SettingsFileDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw document contents, seeding factory defaults if absent.
    async fn load_raw(&self, operation: &str) -> Result<String, CapabilityError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "creating settings with factory defaults");
                let raw = encode(operation, &factory_defaults())?;
                self.store_raw(operation, &raw).await?;
                Ok(raw)
            }
            Err(e) => Err(CapabilityError::rejected(operation, e.to_string())),
        }
    }

    async fn store_raw(&self, operation: &str, raw: &str) -> Result<(), CapabilityError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CapabilityError::rejected(operation, e.to_string()))?;
        }
        let staging = self.staging_path();
        tokio::fs::write(&staging, raw)
            .await
            .map_err(|e| CapabilityError::rejected(operation, e.to_string()))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| CapabilityError::rejected(operation, e.to_string()))
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn load(&self, operation: &str) -> Result<SnapshotPayload, CapabilityError> {
        let raw = self.load_raw(operation).await?;
        serde_json::from_str(&raw).map_err(|e| CapabilityError::rejected(operation, e.to_string()))
    }

    /// Locked read of the parsed document.
    async fn read(&self, operation: &str) -> Result<SnapshotPayload, CapabilityError> {
        let _guard = self.lock.lock().await;
        self.load(operation).await
    }

    /// Read-modify-write the document.
    async fn update(
        &self,
        operation: &str,
        f: impl FnOnce(&mut SnapshotPayload) + Send,
    ) -> Result<(), CapabilityError> {
        let _guard = self.lock.lock().await;
        let mut payload = self.load(operation).await?;
        f(&mut payload);
        let raw = encode(operation, &payload)?;
        self.store_raw(operation, &raw).await?;
        debug!(operation, "settings written");
        Ok(())
    }
}

fn encode(operation: &str, payload: &SnapshotPayload) -> Result<String, CapabilityError> {
    serde_json::to_string_pretty(payload)
        .map_err(|e| CapabilityError::rejected(operation, e.to_string()))
}

fn host_platform() -> TargetPlatform {
    match std::env::consts::OS {
        "windows" => TargetPlatform::Windows,
        "linux" => TargetPlatform::Linux,
        "macos" => TargetPlatform::Macos,
        _ => TargetPlatform::Unknown,
    }
}

/// State of a freshly reset device.
pub fn factory_defaults() -> SnapshotPayload {
    let stage = |index: u8, dpi: u16| StagePayload {
        dpi_x: dpi,
        dpi_y: dpi,
        stage: index,
        active: index == 4,
    };
    SnapshotPayload {
        battery_level: 100,
        is_charging: false,
        polling_rate: PollingRate::Hz1000.hz(),
        dpi_xy: [3200, 3200],
        backlight_brightness: 100,
        backlight_color: RgbColor::new(255, 255, 255),
        matrix_behavior: IlluminationBehavior::Static,
        target_os: host_platform(),
        smart_wheel_enabled: false,
        mouse_wheel_inverted: false,
        dpi_stages: vec![
            stage(1, 400),
            stage(2, 800),
            stage(3, 1600),
            stage(4, 3200),
            stage(5, 6400),
        ],
    }
}

#[async_trait]
impl DeviceCapability for SettingsFileDevice {
    async fn read_snapshot(&self) -> Result<String, CapabilityError> {
        let _guard = self.lock.lock().await;
        self.load_raw("read_snapshot").await
    }

    async fn set_polling_rate(&self, rate: PollingRate) -> Result<(), CapabilityError> {
        self.update("set_polling_rate", |p| p.polling_rate = rate.hz())
            .await
    }

    async fn set_resolution(&self, resolution: Resolution) -> Result<(), CapabilityError> {
        self.update("set_resolution", |p| {
            p.dpi_xy = [resolution.x, resolution.y];
        })
        .await
    }

    async fn resolution_stages(&self) -> Result<Vec<ResolutionStage>, CapabilityError> {
        let payload = self.read("resolution_stages").await?;
        Ok(payload.dpi_stages.into_iter().map(Into::into).collect())
    }

    async fn set_resolution_stages(&self, stages: &StageTable) -> Result<(), CapabilityError> {
        let stages: Vec<StagePayload> = stages.iter().map(StagePayload::from).collect();
        self.update("set_resolution_stages", |p| p.dpi_stages = stages)
            .await
    }

    async fn battery_level(&self) -> Result<u8, CapabilityError> {
        Ok(self.read("battery_level").await?.battery_level)
    }

    async fn is_charging(&self) -> Result<bool, CapabilityError> {
        Ok(self.read("is_charging").await?.is_charging)
    }

    async fn set_illumination_brightness(&self, level: u8) -> Result<(), CapabilityError> {
        self.update("set_illumination_brightness", |p| {
            p.backlight_brightness = level;
        })
        .await
    }

    async fn set_illumination_color(&self, color: RgbColor) -> Result<(), CapabilityError> {
        self.update("set_illumination_color", |p| p.backlight_color = color)
            .await
    }

    async fn set_illumination_behavior(
        &self,
        behavior: IlluminationBehavior,
    ) -> Result<(), CapabilityError> {
        self.update("set_illumination_behavior", |p| {
            p.matrix_behavior = behavior;
        })
        .await
    }

    async fn target_platform(&self) -> Result<TargetPlatform, CapabilityError> {
        Ok(self.read("target_platform").await?.target_os)
    }

    async fn set_scroll_inverted(&self, inverted: bool) -> Result<(), CapabilityError> {
        self.update("set_scroll_inverted", |p| p.mouse_wheel_inverted = inverted)
            .await
    }

    async fn set_smart_wheel_enabled(&self, enabled: bool) -> Result<(), CapabilityError> {
        self.update("set_smart_wheel_enabled", |p| p.smart_wheel_enabled = enabled)
            .await
    }
}
