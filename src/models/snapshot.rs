//! 页面快照模型
//!
//! 通过脚本能力一次性从页面取回的纯数据结构，
//! 后续的抽取与分类都在快照上进行，不再触碰 DOM

/// 岗位卡片快照
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CardSnapshot {
    /// 身份属性原始值（`<marker>|<id>`）
    #[serde(default)]
    pub identity: String,
    /// 卡片主链接的 href
    #[serde(default)]
    pub href: String,
    /// 主链接的无障碍标签
    #[serde(default)]
    pub link_label: String,
    /// 卡片图片（公司 logo）的无障碍标签
    #[serde(default)]
    pub img_label: String,
    /// 卡片内按行切分后的可见文本
    #[serde(default)]
    pub lines: Vec<String>,
}

/// 详情面板快照
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct PaneSnapshot {
    /// 面板全文
    #[serde(default)]
    pub text: String,
    /// 是否存在投递按钮
    #[serde(default)]
    pub apply_present: bool,
    /// 投递按钮的标签（无障碍标签优先，其次可见文本）
    #[serde(default)]
    pub apply_label: String,
    /// 投递按钮是否被禁用
    #[serde(default)]
    pub apply_disabled: bool,
}

/// 表单控件信息
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ControlInfo {
    /// 控件种类：input 的 type，或标签名（textarea / select）
    #[serde(default)]
    pub kind: String,
    /// 是否可见
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub placeholder: String,
    /// 无障碍标签或关联 label 的文本
    #[serde(default)]
    pub label: String,
    /// 当前值
    #[serde(default)]
    pub value: String,
}

impl ControlInfo {
    /// 占位文本 + 标签，分类关键字在这上面匹配
    pub fn hint(&self) -> String {
        format!("{} {}", self.placeholder, self.label).to_lowercase()
    }
}

/// 投递表单快照
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct FormSnapshot {
    /// 表单全文
    #[serde(default)]
    pub text: String,
    /// 所有可输入控件
    #[serde(default)]
    pub controls: Vec<ControlInfo>,
}
