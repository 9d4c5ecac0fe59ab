//! 自动投递 - 业务能力层
//!
//! 执行最终提交并用后置条件验证结果。成功的标准不是"没有报错"，
//! 而是静置之后页面上出现已投递指示短语；没出现就是 `Failed`，
//! 绝不静默当成成功。

use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::Session;
use crate::models::rules::RuleTable;
use crate::models::snapshot::FormSnapshot;
use crate::services::barrier_classifier::is_resume_picker;
use crate::services::interaction::Interactor;

/// 提交按钮的临时标记值
const SUBMIT_MARK: &str = "submit";
/// 简历选择输入框的临时标记值
const PICKER_MARK: &str = "picker";

const MARK_PICKER_JS: &str = r#"
(() => {
    const selectorTokens = __SELECTOR_TOKENS__;
    const resumeTokens = __RESUME_TOKENS__;
    const root = document.querySelector(__FORM_SEL__) || document;
    document.querySelectorAll('[data-agent-mark="picker"]')
        .forEach(el => el.removeAttribute('data-agent-mark'));
    const norm = s => (s || '').toLowerCase();
    const inputs = Array.from(root.querySelectorAll('input, textarea'));
    const target = inputs.find(el => {
        const hint = norm(el.getAttribute('placeholder')) + ' ' + norm(el.getAttribute('aria-label'));
        return selectorTokens.some(t => hint.includes(t))
            && resumeTokens.some(t => hint.includes(t));
    });
    if (!target) return false;
    target.setAttribute('data-agent-mark', 'picker');
    return true;
})()
"#;

const VISIBLE_TEXT_JS: &str = r#"
(() => {
    const pane = document.querySelector(__PANE_SEL__);
    if (pane) return pane.innerText || '';
    return document.body ? (document.body.innerText || '') : '';
})()
"#;

/// 提交尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 后置条件验证通过
    Applied,
    /// 提交失败，附带原因（仅用于日志，不入库）
    Failed(&'static str),
}

/// 自动投递器
pub struct Submitter {
    action_settle_ms: u64,
    submit_settle_ms: u64,
}

impl Submitter {
    pub fn new(config: &Config) -> Self {
        Self {
            action_settle_ms: config.action_settle_ms,
            submit_settle_ms: config.submit_settle_ms,
        }
    }

    /// 执行提交
    ///
    /// 流程：补齐未选值的简历选择器 → 定位提交按钮（禁用即失败，
    /// 不尝试点击）→ 点击 → 静置 → 检查已投递指示短语
    pub async fn submit(
        &self,
        session: &Session,
        interactor: &Interactor,
        rules: &RuleTable,
        form: &FormSnapshot,
    ) -> SubmitOutcome {
        // 简历选择器没选值时先给它一个值
        let picker_unset = form
            .controls
            .iter()
            .any(|c| is_resume_picker(c, rules) && c.value.trim().is_empty());
        if picker_unset {
            self.fill_resume_picker(session, interactor, rules).await;
        }

        // 定位提交按钮：先在表单容器里找，找不到再全局兜底
        let mark = match interactor
            .mark_button(
                session,
                Some(rules.form_selector.as_str()),
                &rules.submit_button_text,
                None,
                SUBMIT_MARK,
            )
            .await
        {
            Some(m) if m.found => m,
            _ => match interactor
                .mark_button(session, None, &rules.submit_button_text, None, SUBMIT_MARK)
                .await
            {
                Some(m) if m.found => m,
                _ => return SubmitOutcome::Failed("submit control missing"),
            },
        };

        // 禁用的提交按钮意味着表单校验没过，直接失败
        if mark.disabled {
            return SubmitOutcome::Failed("validation error");
        }

        info!("📤 正在提交申请...");
        if !interactor.click_marked(session, SUBMIT_MARK).await.acted() {
            return SubmitOutcome::Failed("submit click failed");
        }

        session.settle(self.submit_settle_ms).await;

        // 后置条件：页面上必须出现已投递指示短语
        let confirmed = self.confirmation_visible(session, rules).await;

        // 尽力关掉成功弹层，失败无所谓
        session.press_escape().await;

        if confirmed {
            SubmitOutcome::Applied
        } else {
            SubmitOutcome::Failed("submission not confirmed")
        }
    }

    /// 给未选值的简历选择器补上第一个候选项
    ///
    /// 尽力而为：任何一步没成功都只记日志往下走，最终由后置条件兜底
    async fn fill_resume_picker(
        &self,
        session: &Session,
        interactor: &Interactor,
        rules: &RuleTable,
    ) {
        let js = MARK_PICKER_JS
            .replace(
                "__SELECTOR_TOKENS__",
                &json!(rules.selector_tokens).to_string(),
            )
            .replace("__RESUME_TOKENS__", &json!(rules.resume_tokens).to_string())
            .replace("__FORM_SEL__", &json!(rules.form_selector).to_string());

        match session.eval_as::<bool>(js).await {
            Ok(true) => {}
            _ => {
                debug!("未定位到简历选择输入框");
                return;
            }
        }

        // 打开选择器
        if !interactor.click_marked(session, PICKER_MARK).await.acted() {
            warn!("⚠️ 简历选择器点击未生效");
            return;
        }
        session.settle(self.action_settle_ms).await;

        // 选第一个候选项
        if !interactor
            .click(session, &rules.picker_option_selector)
            .await
            .acted()
        {
            warn!("⚠️ 没有可选的简历候选项");
            return;
        }
        session.settle(self.action_settle_ms).await;

        // 有确认按钮的话顺手点掉
        if let Some(m) = interactor
            .mark_button(
                session,
                Some(rules.form_selector.as_str()),
                "select",
                None,
                "picker-confirm",
            )
            .await
        {
            if m.found && !m.disabled {
                let _ = interactor.click_marked(session, "picker-confirm").await;
                session.settle(self.action_settle_ms).await;
            }
        }
        info!("✓ 已为简历选择器补上第一个候选项");
    }

    /// 检查详情面板/页面上是否出现已投递指示短语
    async fn confirmation_visible(&self, session: &Session, rules: &RuleTable) -> bool {
        let js =
            VISIBLE_TEXT_JS.replace("__PANE_SEL__", &json!(rules.detail_pane_selector).to_string());

        let text = match session.eval_as::<String>(js).await {
            Ok(t) => t.to_lowercase(),
            Err(e) => {
                debug!("读取确认文本失败: {}", e);
                return false;
            }
        };

        rules
            .applied_indicators
            .iter()
            .any(|phrase| text.contains(phrase))
    }
}
