//! 岗位处理上下文
//!
//! 封装"我正在处理第几页的哪个岗位"这一信息

use std::fmt::Display;

/// 岗位处理上下文
#[derive(Debug, Clone)]
pub struct ListingCtx {
    /// 稳定 id（重新定位元素的唯一依据）
    pub id: String,

    /// 本次渲染中的视觉位置（仅用于日志显示）
    pub position: usize,

    /// 页码（从1开始，仅用于日志显示）
    pub page_index: usize,
}

impl ListingCtx {
    /// 创建新的岗位上下文
    pub fn new(id: String, position: usize, page_index: usize) -> Self {
        Self {
            id,
            position,
            page_index,
        }
    }
}

impl Display for ListingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[第{}页 #{} id={}]",
            self.page_index,
            self.position + 1,
            self.id
        )
    }
}
