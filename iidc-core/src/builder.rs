use crate::video::{FrameRate, IsoSpeed};

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// DMA 环形缓冲区大小，固定值，不对调用者开放
pub const CAPTURE_BUFFER_COUNT: u32 = 4;

/// 打开相机会话时的配置
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct SessionConfig {
    /// 枚举结果中的相机序号
    pub node: u32,
    /// 等时传输速率，默认 S400
    pub speed: IsoSpeed,
    /// 强制帧率；`None` 表示自动选择相机支持的最高帧率
    pub frame_rate: Option<FrameRate>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            node: 0,
            speed: IsoSpeed::S400,
            frame_rate: None,
        }
    }

    pub fn node(mut self, node: u32) -> Self {
        self.node = node;
        self
    }

    pub fn speed(mut self, speed: IsoSpeed) -> Self {
        self.speed = speed;
        self
    }

    /// 强制使用指定帧率
    pub fn frame_rate(mut self, rate: FrameRate) -> Self {
        self.frame_rate = Some(rate);
        self
    }

    pub fn force_frame_rate(&self) -> bool {
        self.frame_rate.is_some()
    }

    /// 从 JSON 读取配置，缺省字段取默认值
    #[cfg(feature = "serialize")]
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_node_zero_at_s400_without_forced_rate() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.node, 0);
        assert_eq!(cfg.speed, IsoSpeed::S400);
        assert!(!cfg.force_frame_rate());
    }

    #[test]
    fn builder_chains() {
        let cfg = SessionConfig::new()
            .node(2)
            .speed(IsoSpeed::S800)
            .frame_rate(FrameRate::F15);
        assert_eq!(cfg.node, 2);
        assert_eq!(cfg.speed, IsoSpeed::S800);
        assert_eq!(cfg.frame_rate, Some(FrameRate::F15));
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn loads_partial_json() -> anyhow::Result<()> {
        let cfg = SessionConfig::from_json(r#"{ "node": 1, "frame_rate": "F30" }"#)?;
        assert_eq!(cfg, SessionConfig::new().node(1).frame_rate(FrameRate::F30));
        Ok(())
    }
}
