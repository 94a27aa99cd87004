//! # Params 模块
//!
//! 每个节点的随机动画参数。
//!
//! | 参数 | 范围 |
//! |---|---|
//! | `delay_ms` | `[0, 0.375 × duration]` |
//! | `speed_ms` | `[0.25 × duration, 0.625 × duration]` |
//! | `rotate_deg` | `[-15, 15]` |
//! | `offset_x` | `[-80, 80]` |
//! | `translate_y` | `1.5 × document_height` |

use rand::Rng;
use serde::Serialize;

/// 最大延迟占总时长的比例
pub const DELAY_FRACTION: f64 = 0.375;
/// 最短运动时长占总时长的比例
pub const SPEED_MIN_FRACTION: f64 = 0.25;
/// 最长运动时长占总时长的比例
pub const SPEED_MAX_FRACTION: f64 = 0.625;
/// 最大旋转角度（度）
pub const MAX_ROTATE_DEG: f64 = 15.0;
/// 最大水平偏移
pub const MAX_OFFSET_X: f64 = 80.0;
/// 纵向位移相对文档高度的倍数
pub const VERTICAL_FACTOR: f64 = 1.5;

/// 单个节点的动画参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnimationParams {
    /// 开始运动前的等待（毫秒）
    pub delay_ms: f64,
    /// 运动时长（毫秒）
    pub speed_ms: f64,
    pub rotate_deg: f64,
    pub offset_x: f64,
    pub translate_y: f64,
}

impl AnimationParams {
    /// 在固定范围内随机生成参数
    ///
    /// 调用方保证 `duration_ms` 为大于 0 的有限值。
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, duration_ms: f64, document_height: f64) -> Self {
        Self {
            delay_ms: rng.gen_range(0.0..=duration_ms * DELAY_FRACTION),
            speed_ms: rng.gen_range(
                duration_ms * SPEED_MIN_FRACTION..=duration_ms * SPEED_MAX_FRACTION,
            ),
            rotate_deg: rng.gen_range(-MAX_ROTATE_DEG..=MAX_ROTATE_DEG),
            offset_x: rng.gen_range(-MAX_OFFSET_X..=MAX_OFFSET_X),
            translate_y: document_height * VERTICAL_FACTOR,
        }
    }

    /// 该节点动画结束的时间点（毫秒）
    pub fn completion_ms(&self) -> f64 {
        self.delay_ms + self.speed_ms
    }

    /// `transform` 样式值
    pub fn transform_css(&self) -> String {
        format!(
            "translateY({}px) translateX({}px) rotate({}deg)",
            self.translate_y, self.offset_x, self.rotate_deg
        )
    }

    /// `transition` 样式值
    pub fn transition_css(&self) -> String {
        format!("transform {}ms ease-out", self.speed_ms)
    }

    /// `transition-delay` 样式值
    pub fn transition_delay_css(&self) -> String {
        format!("{}ms", self.delay_ms)
    }
}
