//! 门槛分类 - 业务能力层
//!
//! 检查打开的投递表单，判定是"只要简历"（可自动投递）还是需要人工。
//! 设计是保守的、出错即关闭的：看不懂的表单内容一律偏向 `Saved`，
//! 绝不偏向静默投递。
//!
//! 分类本身是快照上的纯函数；DOM 只在取快照时碰一次。

use serde_json::json;
use tracing::debug;

use crate::infrastructure::Session;
use crate::models::record::Barrier;
use crate::models::rules::RuleTable;
use crate::models::snapshot::{ControlInfo, FormSnapshot};

const FORM_SNAPSHOT_JS: &str = r#"
(() => {
    const root = document.querySelector(__FORM_SEL__);
    if (!root) return null;
    const controls = [];
    root.querySelectorAll('input, textarea, select').forEach(el => {
        const tag = el.tagName.toLowerCase();
        const kind = tag === 'input'
            ? ((el.getAttribute('type') || 'text').toLowerCase())
            : tag;
        const style = window.getComputedStyle(el);
        const visible = style.display !== 'none'
            && style.visibility !== 'hidden'
            && el.getClientRects().length > 0;
        let label = el.getAttribute('aria-label') || '';
        if (!label && el.labels && el.labels.length > 0) {
            label = el.labels[0].innerText || '';
        }
        controls.push({
            kind,
            visible,
            placeholder: el.getAttribute('placeholder') || '',
            label,
            value: el.value || ''
        });
    });
    return { text: root.innerText || '', controls };
})()
"#;

/// 门槛分类器
pub struct BarrierClassifier;

impl BarrierClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 取投递表单快照；表单容器不存在时返回 None
    pub async fn snapshot(&self, session: &Session, rules: &RuleTable) -> Option<FormSnapshot> {
        let js = FORM_SNAPSHOT_JS.replace("__FORM_SEL__", &json!(rules.form_selector).to_string());

        match session.eval_as::<Option<FormSnapshot>>(js).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("表单快照失败: {}", e);
                None
            }
        }
    }

    /// 对表单快照做门槛判定
    ///
    /// 返回首次命中顺序、去重后的门槛集合，规则按优先级：
    /// 1. 全文必需文档关键字：求职信 / 成绩单 / 其他必需文档
    /// 2. 控件类型扫描：hidden|submit|button|file 完全忽略；
    ///    任何 radio|checkbox 直接判 ChoiceQuestion 并短路后续输入判定
    /// 3. 剩余可见文本输入：search/filter 且提到 resume 的是允许的
    ///    简历选择器，跳过；提到 search/filter 但没提 resume 的判
    ///    DocumentSelector；其余可见文本/下拉控件判 TextQuestion
    pub fn classify(&self, form: &FormSnapshot, rules: &RuleTable) -> Vec<Barrier> {
        let mut barriers = Vec::new();
        let text = form.text.to_lowercase();

        // 1) 必需文档关键字扫描
        if rules.cover_letter_keywords.iter().any(|k| text.contains(k)) {
            push_unique(&mut barriers, Barrier::CoverLetterRequired);
        }
        if rules.transcript_keywords.iter().any(|k| text.contains(k)) {
            push_unique(&mut barriers, Barrier::TranscriptRequired);
        }
        if rules
            .other_documents_keywords
            .iter()
            .any(|k| text.contains(k))
        {
            push_unique(&mut barriers, Barrier::OtherDocumentsRequired);
        }

        // 2) 任何选择类控件一票否决，不再细分剩余输入
        let has_choice = form
            .controls
            .iter()
            .any(|c| matches!(c.kind.as_str(), "radio" | "checkbox"));
        if has_choice {
            push_unique(&mut barriers, Barrier::ChoiceQuestion);
            return barriers;
        }

        // 3) 剩余可见文本输入逐个判定
        for control in &form.controls {
            if matches!(
                control.kind.as_str(),
                "hidden" | "submit" | "button" | "file"
            ) {
                continue;
            }
            if !control.visible {
                continue;
            }

            let hint = control.hint();
            let is_selector = rules.selector_tokens.iter().any(|t| hint.contains(t));
            let mentions_resume = rules.resume_tokens.iter().any(|t| hint.contains(t));

            if is_selector && mentions_resume {
                // 允许的简历选择器
                continue;
            }
            if is_selector {
                push_unique(&mut barriers, Barrier::DocumentSelector);
                continue;
            }
            push_unique(&mut barriers, Barrier::TextQuestion);
        }

        barriers
    }
}

impl Default for BarrierClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// 控件是否是允许的简历选择器
pub fn is_resume_picker(control: &ControlInfo, rules: &RuleTable) -> bool {
    if matches!(
        control.kind.as_str(),
        "hidden" | "submit" | "button" | "file" | "radio" | "checkbox"
    ) {
        return false;
    }
    if !control.visible {
        return false;
    }
    let hint = control.hint();
    rules.selector_tokens.iter().any(|t| hint.contains(t))
        && rules.resume_tokens.iter().any(|t| hint.contains(t))
}

fn push_unique(barriers: &mut Vec<Barrier>, barrier: Barrier) {
    if !barriers.contains(&barrier) {
        barriers.push(barrier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(kind: &str, visible: bool, placeholder: &str, label: &str) -> ControlInfo {
        ControlInfo {
            kind: kind.to_string(),
            visible,
            placeholder: placeholder.to_string(),
            label: label.to_string(),
            value: String::new(),
        }
    }

    fn form(text: &str, controls: Vec<ControlInfo>) -> FormSnapshot {
        FormSnapshot {
            text: text.to_string(),
            controls,
        }
    }

    #[test]
    fn choice_control_fails_closed_regardless_of_other_content() {
        let classifier = BarrierClassifier::new();
        let rules = RuleTable::default();

        // 只有一个隐藏 file 输入和一个 checkbox 的表单
        let snapshot = form(
            "Anything at all",
            vec![
                control("file", false, "", ""),
                control("checkbox", true, "", "I agree"),
            ],
        );
        assert_eq!(
            classifier.classify(&snapshot, &rules),
            vec![Barrier::ChoiceQuestion]
        );

        // 不可见的 radio 同样一票否决
        let snapshot = form("", vec![control("radio", false, "", "")]);
        assert_eq!(
            classifier.classify(&snapshot, &rules),
            vec![Barrier::ChoiceQuestion]
        );
    }

    #[test]
    fn choice_short_circuits_text_scan() {
        let classifier = BarrierClassifier::new();
        let rules = RuleTable::default();

        let snapshot = form(
            "",
            vec![
                control("text", true, "Your answer", ""),
                control("radio", true, "", ""),
            ],
        );
        // 文本题不再细分，只报 ChoiceQuestion
        assert_eq!(
            classifier.classify(&snapshot, &rules),
            vec![Barrier::ChoiceQuestion]
        );
    }

    #[test]
    fn resume_search_control_is_allowed() {
        let classifier = BarrierClassifier::new();
        let rules = RuleTable::default();

        let snapshot = form(
            "Attach your resume to apply",
            vec![
                control("text", true, "Search your resumes", ""),
                control("hidden", false, "", ""),
                control("submit", true, "", ""),
            ],
        );
        assert!(classifier.classify(&snapshot, &rules).is_empty());
    }

    #[test]
    fn search_without_resume_is_a_document_selector() {
        let classifier = BarrierClassifier::new();
        let rules = RuleTable::default();

        let snapshot = form(
            "",
            vec![control("text", true, "Search your documents", "")],
        );
        assert_eq!(
            classifier.classify(&snapshot, &rules),
            vec![Barrier::DocumentSelector]
        );
    }

    #[test]
    fn other_visible_text_controls_are_questions() {
        let classifier = BarrierClassifier::new();
        let rules = RuleTable::default();

        let snapshot = form(
            "",
            vec![
                control("text", true, "Why do you want this job?", ""),
                control("select", true, "", "Choose a start date"),
            ],
        );
        assert_eq!(
            classifier.classify(&snapshot, &rules),
            vec![Barrier::TextQuestion]
        );
    }

    #[test]
    fn invisible_text_controls_are_ignored() {
        let classifier = BarrierClassifier::new();
        let rules = RuleTable::default();

        let snapshot = form("", vec![control("text", false, "hidden question", "")]);
        assert!(classifier.classify(&snapshot, &rules).is_empty());
    }

    #[test]
    fn keyword_scan_orders_before_input_scan() {
        let classifier = BarrierClassifier::new();
        let rules = RuleTable::default();

        let snapshot = form(
            "A cover letter is required. Please also upload your transcript.",
            vec![control("text", true, "Anything", "")],
        );
        assert_eq!(
            classifier.classify(&snapshot, &rules),
            vec![
                Barrier::CoverLetterRequired,
                Barrier::TranscriptRequired,
                Barrier::TextQuestion
            ]
        );
    }

    #[test]
    fn barriers_are_deduplicated() {
        let classifier = BarrierClassifier::new();
        let rules = RuleTable::default();

        let snapshot = form(
            "",
            vec![
                control("text", true, "Question one", ""),
                control("textarea", true, "Question two", ""),
            ],
        );
        assert_eq!(
            classifier.classify(&snapshot, &rules),
            vec![Barrier::TextQuestion]
        );
    }

    #[test]
    fn resume_picker_detection() {
        let rules = RuleTable::default();
        assert!(is_resume_picker(
            &control("text", true, "Search your resumes", ""),
            &rules
        ));
        assert!(!is_resume_picker(
            &control("text", true, "Search your documents", ""),
            &rules
        ));
        assert!(!is_resume_picker(
            &control("file", true, "Search your resumes", ""),
            &rules
        ));
        assert!(!is_resume_picker(
            &control("text", false, "Search your resumes", ""),
            &rules
        ));
    }
}
