//! 站点启发式规则表
//!
//! 所有依赖目标站点当前标记结构的选择器和关键字都集中在这里，
//! 带版本号，可以用 TOML 文件整体覆盖。站点改版时只改这一处。

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// 规则表
///
/// `default()` 内置当前站点版本的契约；`load()` 在规则文件存在时用其覆盖
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuleTable {
    /// 规则版本号，仅用于日志排查
    pub version: u32,

    // --- 选择器 ---
    /// 岗位卡片容器
    pub card_selector: String,
    /// 卡片上的稳定身份属性名，属性值形如 `<marker>|<id>`
    pub identity_attr: String,
    /// 详情面板容器
    pub detail_pane_selector: String,
    /// 投递表单容器
    pub form_selector: String,
    /// 简历选择弹层里的候选项
    pub picker_option_selector: String,
    /// 清理残留遮罩时要移除的元素
    pub overlay_selectors: Vec<String>,

    // --- 按钮文案与标签 ---
    /// 下一页控件的无障碍标签
    pub next_button_label: String,
    /// 投递按钮的文本特征（小写）
    pub apply_button_text: String,
    /// 最终提交按钮的文本特征（小写）
    pub submit_button_text: String,
    /// 表示外部投递的文本特征（小写）
    pub external_markers: Vec<String>,
    /// 投递成功后详情面板中会出现的指示短语（小写）
    pub applied_indicators: Vec<String>,

    // --- 表单门槛关键字（小写） ---
    pub cover_letter_keywords: Vec<String>,
    pub transcript_keywords: Vec<String>,
    pub other_documents_keywords: Vec<String>,
    /// 识别"选择器类"输入框的词
    pub selector_tokens: Vec<String>,
    /// 识别简历选择器的词
    pub resume_tokens: Vec<String>,

    // --- 抽取启发式 ---
    /// 由稳定 id 拼出岗位链接的模板（`{id}` 占位）
    pub job_link_template: String,
    /// 主链接无障碍标签上要剥掉的前缀
    pub title_view_prefix: String,
    /// 地点行的远程标记
    pub remote_token: String,
    /// 岗位类型关键字
    pub job_type_keywords: Vec<String>,
    /// 薪酬行的货币标记（正则）
    pub pay_pattern: String,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            version: 3,
            card_selector: "div[data-hook^='job-result-card']".to_string(),
            identity_attr: "data-hook".to_string(),
            detail_pane_selector: "div[data-hook='details-pane']".to_string(),
            form_selector: "div[data-hook='apply-modal-content']".to_string(),
            picker_option_selector: "[role='option']".to_string(),
            overlay_selectors: vec![
                "div[data-hook='modal-backdrop']".to_string(),
                "div[class*='ReactModal__Overlay']".to_string(),
            ],
            next_button_label: "next page".to_string(),
            apply_button_text: "apply".to_string(),
            submit_button_text: "submit application".to_string(),
            external_markers: vec!["external".to_string()],
            applied_indicators: vec![
                "withdraw application".to_string(),
                "see application".to_string(),
                "applied".to_string(),
            ],
            cover_letter_keywords: vec!["cover letter".to_string()],
            transcript_keywords: vec!["transcript".to_string()],
            other_documents_keywords: vec!["other required documents".to_string()],
            selector_tokens: vec!["search".to_string(), "filter".to_string()],
            resume_tokens: vec!["resume".to_string()],
            job_link_template: "https://app.joinhandshake.com/jobs/{id}".to_string(),
            title_view_prefix: "View ".to_string(),
            remote_token: "Remote".to_string(),
            job_type_keywords: vec![
                "Full-Time".to_string(),
                "Part-Time".to_string(),
                "Internship".to_string(),
                "Contract".to_string(),
                "Temporary".to_string(),
            ],
            pay_pattern: r"[$€£]\s?\d[\d,]*(?:\.\d+)?\s*(?:[kK])?".to_string(),
        }
    }
}

impl RuleTable {
    /// 卡片身份属性值里 marker 和 id 的分隔符
    pub const IDENTITY_SEPARATOR: char = '|';

    /// 从身份属性值中取出稳定 id
    ///
    /// 属性值形如 `job-result-card|8421337`；没有分隔符时整串即为 id
    pub fn parse_identity(value: &str) -> Option<String> {
        let id = match value.split_once(Self::IDENTITY_SEPARATOR) {
            Some((_, id)) => id.trim(),
            None => value.trim(),
        };
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }

    /// 下一页控件的选择器
    pub fn next_button_selector(&self) -> String {
        format!("button[aria-label='{}']", self.next_button_label)
    }
}

/// 加载规则表
///
/// 文件不存在时使用内置规则；解析失败时告警并退回内置规则，
/// 规则文件坏了不应该挡住整次运行
pub async fn load_rules(path: &str) -> RuleTable {
    if !Path::new(path).exists() {
        info!("未找到规则文件 {}，使用内置规则", path);
        return RuleTable::default();
    }

    match read_rules(path).await {
        Ok(rules) => {
            info!("✓ 已加载规则文件 {} (版本 {})", path, rules.version);
            rules
        }
        Err(e) => {
            warn!("⚠️ 规则文件 {} 加载失败，退回内置规则: {}", path, e);
            RuleTable::default()
        }
    }
}

async fn read_rules(path: &str) -> Result<RuleTable> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取规则文件: {}", path))?;
    let rules: RuleTable =
        toml::from_str(&content).with_context(|| format!("无法解析规则文件: {}", path))?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_takes_segment_after_separator() {
        assert_eq!(
            RuleTable::parse_identity("job-result-card|8421337"),
            Some("8421337".to_string())
        );
        assert_eq!(
            RuleTable::parse_identity("8421337"),
            Some("8421337".to_string())
        );
        assert_eq!(RuleTable::parse_identity("job-result-card|"), None);
        assert_eq!(RuleTable::parse_identity("  "), None);
    }

    #[test]
    fn partial_toml_overrides_keep_defaults() {
        let rules: RuleTable = toml::from_str(
            r#"
            version = 9
            card_selector = "div.new-card"
            "#,
        )
        .unwrap();
        assert_eq!(rules.version, 9);
        assert_eq!(rules.card_selector, "div.new-card");
        // 未覆盖的字段保持内置值
        assert_eq!(rules.next_button_label, "next page");
    }

    #[test]
    fn next_button_selector_uses_label() {
        let rules = RuleTable::default();
        assert_eq!(
            rules.next_button_selector(),
            "button[aria-label='next page']"
        );
    }
}
