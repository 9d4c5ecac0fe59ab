//! 韧性交互 - 业务能力层
//!
//! 所有碰 UI 的组件都经由这里动手。每个动作走同一个状态机：
//! 滚动到可视区 → 短静置 → 命中检测 → 直接点击；
//! 被遮挡 → 发 Escape 重试一次；仍失败 → 脚本级强制点击兜底；
//! 目标已不存在 → 汇报 Gone，绝不无限重试。
//!
//! 只能靠可见文本定位的按钮，先用脚本打上临时的 data-agent-mark
//! 属性，再按选择器走同一套点击状态机。

use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::infrastructure::Session;
use crate::models::rules::RuleTable;

/// 临时标记属性名
pub const MARK_ATTR: &str = "data-agent-mark";

/// 单次 UI 动作的显式结果
///
/// 调用方据此决定继续/重试/升级，而不是靠异常压制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// 直接点击成功
    Clicked,
    /// 强制点击兜底成功
    ClickedForced,
    /// 目标已不存在（失效/消失），视为"没点上，继续往下走"
    Gone,
}

impl ClickOutcome {
    /// 动作是否实际发生
    pub fn acted(self) -> bool {
        !matches!(self, ClickOutcome::Gone)
    }
}

/// 命中检测结果
#[derive(Debug, serde::Deserialize)]
struct HitProbe {
    found: bool,
    clear: bool,
}

/// 文本定位按钮的标记结果
#[derive(Debug, serde::Deserialize)]
pub struct MarkResult {
    pub found: bool,
    pub disabled: bool,
}

const HIT_PROBE_JS: &str = r#"
(() => {
    const el = document.querySelector(__SEL__);
    if (!el) return { found: false, clear: false };
    el.scrollIntoView({ block: 'center' });
    const r = el.getBoundingClientRect();
    if (r.width === 0 && r.height === 0) return { found: false, clear: false };
    const hit = document.elementFromPoint(r.x + r.width / 2, r.y + r.height / 2);
    const clear = !!hit && (hit === el || el.contains(hit) || hit.contains(el));
    return { found: true, clear };
})()
"#;

const FORCE_CLICK_JS: &str = r#"
(() => {
    const el = document.querySelector(__SEL__);
    if (!el) return false;
    el.click();
    return true;
})()
"#;

const OVERLAY_PURGE_JS: &str = r#"
(() => {
    let removed = 0;
    document.querySelectorAll(__SEL__).forEach(el => { el.remove(); removed += 1; });
    return removed;
})()
"#;

const MARK_BUTTON_JS: &str = r#"
(() => {
    const mark = __MARK__;
    const scopeSel = __SCOPE__;
    const text = __TEXT__;
    const exclude = __EXCLUDE__;
    const scope = scopeSel ? document.querySelector(scopeSel) : document;
    if (!scope) return { found: false, disabled: false };
    document.querySelectorAll('[data-agent-mark="' + mark + '"]')
        .forEach(el => el.removeAttribute('data-agent-mark'));
    const norm = s => (s || '').trim().toLowerCase();
    const candidates = Array.from(scope.querySelectorAll("button, a[role='button']"));
    const target = candidates.find(el => {
        const label = norm(el.innerText) + ' ' + norm(el.getAttribute('aria-label'));
        if (!label.includes(text)) return false;
        if (exclude && label.includes(exclude)) return false;
        return true;
    });
    if (!target) return { found: false, disabled: false };
    target.setAttribute('data-agent-mark', mark);
    const disabled = target.disabled === true
        || target.getAttribute('aria-disabled') === 'true';
    return { found: true, disabled };
})()
"#;

/// 韧性交互器
pub struct Interactor {
    action_settle_ms: u64,
}

impl Interactor {
    pub fn new(config: &Config) -> Self {
        Self {
            action_settle_ms: config.action_settle_ms,
        }
    }

    /// 按选择器点击，走完整的韧性状态机
    pub async fn click(&self, session: &Session, selector: &str) -> ClickOutcome {
        for attempt in 0..2 {
            let probe: HitProbe = match session
                .eval_as(HIT_PROBE_JS.replace("__SEL__", &js_str(selector)))
                .await
            {
                Ok(p) => p,
                Err(e) => {
                    debug!("命中检测失败 ({}): {}", selector, e);
                    return ClickOutcome::Gone;
                }
            };

            if !probe.found {
                return ClickOutcome::Gone;
            }

            session.settle(self.action_settle_ms).await;

            if probe.clear {
                match session.find(selector).await {
                    Some(element) => match element.click().await {
                        Ok(_) => return ClickOutcome::Clicked,
                        Err(e) => {
                            // 点击瞬间元素失效，转入强制兜底
                            debug!("直接点击失败 ({}): {}", selector, e);
                            break;
                        }
                    },
                    None => return ClickOutcome::Gone,
                }
            }

            if attempt == 0 {
                debug!("点击被遮挡，发送 Escape 后重试: {}", selector);
                session.press_escape().await;
                session.settle(self.action_settle_ms).await;
            }
        }

        match session
            .eval_as::<bool>(FORCE_CLICK_JS.replace("__SEL__", &js_str(selector)))
            .await
        {
            Ok(true) => {
                debug!("强制点击兜底成功: {}", selector);
                ClickOutcome::ClickedForced
            }
            _ => ClickOutcome::Gone,
        }
    }

    /// 给只能按文本找到的按钮打标记，返回是否找到及禁用状态
    ///
    /// `exclude` 用于排除文本上是超集的状态（如 apply 与 applied）
    pub async fn mark_button(
        &self,
        session: &Session,
        scope_selector: Option<&str>,
        text: &str,
        exclude: Option<&str>,
        mark: &str,
    ) -> Option<MarkResult> {
        let js = MARK_BUTTON_JS
            .replace("__MARK__", &js_str(mark))
            .replace(
                "__SCOPE__",
                &scope_selector.map(js_str).unwrap_or_else(|| "null".to_string()),
            )
            .replace("__TEXT__", &js_str(&text.to_lowercase()))
            .replace(
                "__EXCLUDE__",
                &exclude
                    .map(|e| js_str(&e.to_lowercase()))
                    .unwrap_or_else(|| "null".to_string()),
            );

        match session.eval_as::<MarkResult>(js).await {
            Ok(result) => Some(result),
            Err(e) => {
                debug!("标记按钮失败 ({}): {}", text, e);
                None
            }
        }
    }

    /// 点击之前标记过的按钮
    pub async fn click_marked(&self, session: &Session, mark: &str) -> ClickOutcome {
        let selector = format!("[{}='{}']", MARK_ATTR, mark);
        self.click(session, &selector).await
    }

    /// 清理残留遮罩
    ///
    /// 自身就是恢复路径，必须幂等且永不报错：内部所有失败全部吞掉
    pub async fn clear_overlays(&self, session: &Session, rules: &RuleTable) {
        session.press_escape().await;
        session.settle(self.action_settle_ms).await;

        for selector in &rules.overlay_selectors {
            let js = OVERLAY_PURGE_JS.replace("__SEL__", &js_str(selector));
            match session.eval(js).await {
                Ok(removed) => {
                    if removed.as_u64().unwrap_or(0) > 0 {
                        debug!("已移除遮罩 {} x{}", selector, removed);
                    }
                }
                Err(e) => debug!("清理遮罩失败 ({}): {}", selector, e),
            }
        }
    }
}

/// 把 Rust 字符串安全地嵌入 JS 源码（JSON 字面量）
fn js_str(s: &str) -> String {
    json!(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_str_escapes_quotes() {
        assert_eq!(js_str("plain"), "\"plain\"");
        assert_eq!(js_str("a'b\"c"), "\"a'b\\\"c\"");
    }

    #[test]
    fn gone_means_no_action() {
        assert!(!ClickOutcome::Gone.acted());
        assert!(ClickOutcome::Clicked.acted());
        assert!(ClickOutcome::ClickedForced.acted());
    }
}
