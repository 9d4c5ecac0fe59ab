//! 卡片扫描 - 业务能力层
//!
//! 枚举当前页上渲染出来的岗位卡片，读出稳定 id，并按历史库过滤。
//! 枚举和读取之间元素消失是常态，静默跳过即可，绝不中断整页扫描。
//!
//! 约定：扫描产出 (位置, id) 对；之后任何动作都按稳定 id 重新定位
//! 元素，绝不假设位置在重渲染之后仍然有效。

use tracing::debug;

use crate::infrastructure::Session;
use crate::models::rules::RuleTable;
use crate::services::history_store::HistoryStore;

/// 选中卡片时使用的临时标记值
pub const CARD_MARK: &str = "card";

const MARK_CARD_JS: &str = r#"
(() => {
    const attr = __ATTR__;
    const id = __ID__;
    document.querySelectorAll('[data-agent-mark="card"]')
        .forEach(el => el.removeAttribute('data-agent-mark'));
    const cards = Array.from(document.querySelectorAll(__CARD_SEL__));
    const target = cards.find(el => {
        const value = el.getAttribute(attr) || '';
        return value === id || value.endsWith('|' + id);
    });
    if (!target) return false;
    target.setAttribute('data-agent-mark', 'card');
    return true;
})()
"#;

/// 工作项：当前页上一个待处理岗位
///
/// 页面周期内的临时数据，从不持久化
#[derive(Debug, Clone)]
pub struct Card {
    /// 在本次渲染中的视觉位置（仅作提示，不作定位依据）
    pub position: usize,
    /// 稳定 id
    pub id: String,
}

/// 卡片扫描器
pub struct CardScanner;

impl CardScanner {
    pub fn new() -> Self {
        Self
    }

    /// 枚举当前渲染的所有岗位卡片
    pub async fn scan(&self, session: &Session, rules: &RuleTable) -> Vec<Card> {
        let elements = session.find_all(&rules.card_selector).await;
        let mut cards = Vec::new();

        for (position, element) in elements.iter().enumerate() {
            let value = match element.attribute(rules.identity_attr.clone()).await {
                Ok(Some(v)) => v,
                Ok(None) => {
                    debug!("第 {} 张卡片没有身份属性，跳过", position);
                    continue;
                }
                Err(e) => {
                    // 元素在枚举后消失了
                    debug!("读取第 {} 张卡片的身份属性失败: {}", position, e);
                    continue;
                }
            };

            match RuleTable::parse_identity(&value) {
                Some(id) => cards.push(Card { position, id }),
                None => debug!("身份属性值无法解析: {}", value),
            }
        }

        cards
    }

    /// 过滤掉已有终态记录的岗位，保持页面视觉顺序
    pub fn filter_unseen(&self, cards: Vec<Card>, store: &HistoryStore) -> Vec<Card> {
        cards
            .into_iter()
            .filter(|card| !store.contains(&card.id))
            .collect()
    }

    /// 按稳定 id 重新定位卡片并打上临时标记
    ///
    /// 返回 false 表示卡片已不在当前渲染中
    pub async fn mark_card(&self, session: &Session, rules: &RuleTable, id: &str) -> bool {
        let js = MARK_CARD_JS
            .replace("__ATTR__", &serde_json::json!(rules.identity_attr).to_string())
            .replace("__ID__", &serde_json::json!(id).to_string())
            .replace(
                "__CARD_SEL__",
                &serde_json::json!(rules.card_selector).to_string(),
            );

        match session.eval_as::<bool>(js).await {
            Ok(found) => found,
            Err(e) => {
                debug!("定位卡片 {} 失败: {}", id, e);
                false
            }
        }
    }
}

impl Default for CardScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{ListingDraft, ListingRecord, Outcome};
    use tempfile::TempDir;

    #[test]
    fn filter_unseen_preserves_page_order() {
        let dir = TempDir::new().unwrap();
        let mut store = HistoryStore::open(dir.path().join("log.csv")).unwrap();
        store.record(&ListingRecord::new(
            "b".to_string(),
            Outcome::Applied,
            vec![],
            ListingDraft::default(),
        ));

        let scanner = CardScanner::new();
        let cards = vec![
            Card { position: 0, id: "a".to_string() },
            Card { position: 1, id: "b".to_string() },
            Card { position: 2, id: "c".to_string() },
        ];

        let unseen = scanner.filter_unseen(cards, &store);
        let ids: Vec<_> = unseen.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(unseen[0].position, 0);
        assert_eq!(unseen[1].position, 2);
    }
}
