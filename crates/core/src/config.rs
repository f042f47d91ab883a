use crate::common::PixelRatio;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 全局配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KagamiConfig {
    pub sync: SyncConfig,
    pub overlay: OverlayConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    // 定时帧调度器的帧间隔（毫秒），约 60 FPS
    pub frame_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub epoch_ms_threshold: i64,
    pub entry_label_template: String,
    pub exit_label_template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub pixel_ratio: f64,
    // 宿主未给出 bar 间距时信号带的最小宽度（媒体像素）
    pub signal_min_bar_width: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frame_interval_ms: 16,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            epoch_ms_threshold: 10_000_000_000,
            entry_label_template: "{trade_type} @ {entry_price}".to_string(),
            exit_label_template: "exit @ {exit_price} ({pnl})".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            signal_min_bar_width: 1.0,
        }
    }
}

impl RenderConfig {
    /// 未由宿主提供像素比时使用的默认值。
    pub fn pixel_ratio(&self) -> PixelRatio {
        PixelRatio::uniform(self.pixel_ratio)
    }
}

impl Default for KagamiConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            overlay: OverlayConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl KagamiConfig {
    /// # Summary
    /// 分层加载配置。
    ///
    /// # Logic
    /// 1. 以 `KagamiConfig::default()` 作为最底层。
    /// 2. 若给出路径，叠加配置文件（格式按扩展名识别）。
    /// 3. 最后叠加 `KAGAMI__` 前缀的环境变量，`__` 表示嵌套，例如 `KAGAMI__SYNC__ENABLED=false`。
    ///
    /// # Arguments
    /// * `path`: 可选的配置文件路径。
    ///
    /// # Returns
    /// 合并后的配置，文件不存在或字段类型不符时返回 `ConfigError`。
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&KagamiConfig::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder
            .add_source(
                config::Environment::with_prefix("KAGAMI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = KagamiConfig::default();
        assert!(config.sync.enabled);
        assert_eq!(config.sync.frame_interval_ms, 16);
        assert_eq!(config.overlay.epoch_ms_threshold, 10_000_000_000);
        assert_eq!(config.render.pixel_ratio, 1.0);
    }

    #[test]
    fn test_load_layers_file_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[sync]\nenabled = false\n\n[render]\npixel_ratio = 2.0").unwrap();

        let config = KagamiConfig::load(Some(file.path())).unwrap();
        assert!(!config.sync.enabled);
        // 未覆盖的字段保持默认
        assert_eq!(config.sync.frame_interval_ms, 16);
        assert_eq!(config.render.pixel_ratio, 2.0);
        assert_eq!(config.render.pixel_ratio().vertical, 2.0);
        assert_eq!(config.overlay, OverlayConfig::default());
    }

    #[test]
    fn test_load_without_file_returns_defaults() {
        let config = KagamiConfig::load(None).unwrap();
        assert_eq!(config.sync, SyncConfig::default());
    }
}
