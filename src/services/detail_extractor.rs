//! 字段抽取 - 业务能力层
//!
//! 从列表卡片和详情面板抽取结构化字段（公司、职位、薪酬、地点、类型）。
//! 每一步都有明确的优先级和回退：身份属性 → 无障碍标签 → 文本行启发式。
//! 任何一步失败都落到占位值，允许部分数据，不允许整体失败。

use regex::Regex;
use serde_json::json;
use tracing::debug;

use crate::infrastructure::Session;
use crate::models::record::ListingDraft;
use crate::models::rules::RuleTable;
use crate::models::snapshot::{CardSnapshot, PaneSnapshot};

const CARD_SNAPSHOT_JS: &str = r#"
(() => {
    const attr = __ATTR__;
    const id = __ID__;
    const cards = Array.from(document.querySelectorAll(__CARD_SEL__));
    const card = cards.find(el => {
        const value = el.getAttribute(attr) || '';
        return value === id || value.endsWith('|' + id);
    });
    if (!card) return null;
    const link = card.querySelector('a[href]');
    const img = card.querySelector('img');
    const lines = (card.innerText || '')
        .split('\n')
        .map(s => s.trim())
        .filter(s => s.length > 0);
    return {
        identity: card.getAttribute(attr) || '',
        href: link ? (link.href || '') : '',
        link_label: link ? (link.getAttribute('aria-label') || '') : '',
        img_label: img ? (img.getAttribute('aria-label') || img.getAttribute('alt') || '') : '',
        lines
    };
})()
"#;

const PANE_SNAPSHOT_JS: &str = r#"
(() => {
    const pane = document.querySelector(__PANE_SEL__);
    if (!pane) return null;
    const applyText = __APPLY_TEXT__;
    const norm = s => (s || '').trim().toLowerCase();
    const candidates = Array.from(pane.querySelectorAll("button, a[role='button']"));
    const apply = candidates.find(el => {
        const label = norm(el.innerText) + ' ' + norm(el.getAttribute('aria-label'));
        return label.includes(applyText) && !label.includes('applied');
    });
    return {
        text: pane.innerText || '',
        apply_present: !!apply,
        apply_label: apply ? (apply.getAttribute('aria-label') || apply.innerText || '') : '',
        apply_disabled: apply
            ? (apply.disabled === true || apply.getAttribute('aria-disabled') === 'true')
            : false
    };
})()
"#;

/// 字段抽取器
pub struct DetailExtractor;

impl DetailExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 按稳定 id 取卡片快照
    pub async fn card_snapshot(
        &self,
        session: &Session,
        rules: &RuleTable,
        id: &str,
    ) -> Option<CardSnapshot> {
        let js = CARD_SNAPSHOT_JS
            .replace("__ATTR__", &json!(rules.identity_attr).to_string())
            .replace("__ID__", &json!(id).to_string())
            .replace("__CARD_SEL__", &json!(rules.card_selector).to_string());

        match session.eval_as::<Option<CardSnapshot>>(js).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("卡片快照失败 ({}): {}", id, e);
                None
            }
        }
    }

    /// 取详情面板快照
    pub async fn pane_snapshot(
        &self,
        session: &Session,
        rules: &RuleTable,
    ) -> Option<PaneSnapshot> {
        let js = PANE_SNAPSHOT_JS
            .replace("__PANE_SEL__", &json!(rules.detail_pane_selector).to_string())
            .replace(
                "__APPLY_TEXT__",
                &json!(rules.apply_button_text.to_lowercase()).to_string(),
            );

        match session.eval_as::<Option<PaneSnapshot>>(js).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("详情面板快照失败: {}", e);
                None
            }
        }
    }

    /// 从卡片快照抽取字段草稿
    ///
    /// 优先级：
    /// - link: 身份属性里的稳定 id 套链接模板，回退到主链接的 href
    /// - company: 图片无障碍标签，回退到文本第二行
    /// - title: 主链接无障碍标签（剥掉 "View " 前缀），回退到文本第一行
    /// - location: 尾部第一个含逗号或远程标记的文本行
    pub fn draft_from_card(&self, snapshot: &CardSnapshot, rules: &RuleTable) -> ListingDraft {
        let mut draft = ListingDraft::default();

        if let Some(id) = RuleTable::parse_identity(&snapshot.identity) {
            draft.link = rules.job_link_template.replace("{id}", &id);
        } else if !snapshot.href.trim().is_empty() {
            draft.link = snapshot.href.trim().to_string();
        }

        let img_label = snapshot.img_label.trim();
        if !img_label.is_empty() {
            draft.company = img_label.to_string();
        } else if snapshot.lines.len() >= 2 {
            draft.company = snapshot.lines[1].clone();
        }

        let link_label = snapshot.link_label.trim();
        if !link_label.is_empty() {
            let title = link_label
                .strip_prefix(&rules.title_view_prefix)
                .unwrap_or(link_label);
            draft.title = title.trim().to_string();
        } else if let Some(first) = snapshot.lines.first() {
            draft.title = first.clone();
        }

        if let Some(location) = snapshot
            .lines
            .iter()
            .skip(2)
            .find(|line| line.contains(',') || line.contains(&rules.remote_token))
        {
            draft.location = location.clone();
        }

        draft
    }

    /// 详情面板的第二遍抽取
    ///
    /// 出现货币标记时覆盖薪酬；出现已知类型关键字时覆盖岗位类型
    pub fn enrich_from_pane(&self, draft: &mut ListingDraft, pane_text: &str, rules: &RuleTable) {
        if let Ok(re) = Regex::new(&rules.pay_pattern) {
            if let Some(found) = re.find(pane_text) {
                draft.pay = found.as_str().trim().to_string();
            }
        }

        let lowered = pane_text.to_lowercase();
        for keyword in &rules.job_type_keywords {
            if lowered.contains(&keyword.to_lowercase()) {
                draft.job_type = keyword.clone();
                break;
            }
        }
    }
}

impl Default for DetailExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(
        identity: &str,
        href: &str,
        link_label: &str,
        img_label: &str,
        lines: &[&str],
    ) -> CardSnapshot {
        CardSnapshot {
            identity: identity.to_string(),
            href: href.to_string(),
            link_label: link_label.to_string(),
            img_label: img_label.to_string(),
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn prefers_identity_and_accessible_labels() {
        let extractor = DetailExtractor::new();
        let rules = RuleTable::default();
        let snap = snapshot(
            "job-result-card|8421337",
            "https://example.com/whatever",
            "View Backend Intern",
            "Acme Corp",
            &["Backend Intern", "Acme Corp", "Boston, MA", "$25/hr"],
        );

        let draft = extractor.draft_from_card(&snap, &rules);
        assert_eq!(draft.title, "Backend Intern");
        assert_eq!(draft.company, "Acme Corp");
        // 身份属性优先于链接 href
        assert_eq!(draft.link, "https://app.joinhandshake.com/jobs/8421337");
        assert_eq!(draft.location, "Boston, MA");
    }

    #[test]
    fn falls_back_to_text_lines_and_href() {
        let extractor = DetailExtractor::new();
        let rules = RuleTable::default();
        let snap = snapshot(
            "",
            "https://example.com/jobs/2",
            "",
            "",
            &["Data Intern", "Globex", "Remote", "Posted today"],
        );

        let draft = extractor.draft_from_card(&snap, &rules);
        assert_eq!(draft.title, "Data Intern");
        assert_eq!(draft.company, "Globex");
        assert_eq!(draft.location, "Remote");
        assert_eq!(draft.link, "https://example.com/jobs/2");
    }

    #[test]
    fn empty_card_keeps_placeholders() {
        let extractor = DetailExtractor::new();
        let rules = RuleTable::default();
        let draft = extractor.draft_from_card(&snapshot("", "", "", "", &[]), &rules);
        assert_eq!(draft.title, "Unknown");
        assert_eq!(draft.company, "Unknown");
        assert_eq!(draft.location, "");
        assert_eq!(draft.link, "");
    }

    #[test]
    fn pane_pass_overwrites_pay_and_job_type() {
        let extractor = DetailExtractor::new();
        let rules = RuleTable::default();
        let mut draft = ListingDraft::default();

        extractor.enrich_from_pane(
            &mut draft,
            "Great role. Pay: $25.50 per hour. This is a Full-Time position.",
            &rules,
        );
        assert_eq!(draft.pay, "$25.50");
        assert_eq!(draft.job_type, "Full-Time");
    }

    #[test]
    fn pane_pass_without_markers_changes_nothing() {
        let extractor = DetailExtractor::new();
        let rules = RuleTable::default();
        let mut draft = ListingDraft::default();
        draft.pay = "kept".to_string();

        extractor.enrich_from_pane(&mut draft, "no compensation mentioned here", &rules);
        assert_eq!(draft.pay, "kept");
        assert_eq!(draft.job_type, "");
    }
}
