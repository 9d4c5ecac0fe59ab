//! 岗位处理记录模型
//!
//! 一条 `ListingRecord` 对应一个已处理完毕的岗位，写入后不再修改

use chrono::NaiveDateTime;

/// 时间戳的存储格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 终态枚举
///
/// 每个岗位 id 只会得到一个终态，写入后该 id 永久排除在后续处理之外
/// （包括 `Failed`：失败的投递不会在下次运行时自动重试）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Outcome {
    /// 已自动投递成功
    Applied,
    /// 跳过（通常是已经投递过）
    Skipped,
    /// 仅支持外部投递
    External,
    /// 存在门槛，留待人工处理
    Saved,
    /// 投递尝试失败
    Failed,
    /// 页面上没有投递入口
    NoApplyPath,
}

impl Outcome {
    /// 存储到 CSV 的状态名
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Applied => "Applied",
            Outcome::Skipped => "Skipped",
            Outcome::External => "External",
            Outcome::Saved => "Saved",
            Outcome::Failed => "Failed",
            Outcome::NoApplyPath => "NoApplyPath",
        }
    }

    /// 从存储的状态名解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Applied" => Some(Outcome::Applied),
            "Skipped" => Some(Outcome::Skipped),
            "External" => Some(Outcome::External),
            "Saved" => Some(Outcome::Saved),
            "Failed" => Some(Outcome::Failed),
            "NoApplyPath" => Some(Outcome::NoApplyPath),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 门槛枚举
///
/// 分类器在投递表单里识别出的、使岗位无法无人值守投递的要求。
/// 门槛集合非空 ⇒ 终态 `Saved`；为空 ⇒ 尝试自动投递
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Barrier {
    /// 要求求职信
    CoverLetterRequired,
    /// 要求成绩单
    TranscriptRequired,
    /// 要求其他附加文档
    OtherDocumentsRequired,
    /// 存在单选/多选题
    ChoiceQuestion,
    /// 存在自由文本问题
    TextQuestion,
    /// 要求选择简历以外的文档
    DocumentSelector,
}

impl Barrier {
    /// 存储到 CSV 的要求名
    pub fn as_str(self) -> &'static str {
        match self {
            Barrier::CoverLetterRequired => "Cover Letter",
            Barrier::TranscriptRequired => "Transcript",
            Barrier::OtherDocumentsRequired => "Other Documents",
            Barrier::ChoiceQuestion => "Choice Question",
            Barrier::TextQuestion => "Text Question",
            Barrier::DocumentSelector => "Document Selector",
        }
    }
}

impl std::fmt::Display for Barrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 岗位字段草稿
///
/// 抽取器逐步填充的中间产物，任何一步失败都以占位值代替，
/// 不向上传播错误（允许部分数据，不允许整体失败）
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub company: String,
    pub title: String,
    pub link: String,
    pub location: String,
    pub pay: String,
    pub job_type: String,
}

impl Default for ListingDraft {
    fn default() -> Self {
        Self {
            company: "Unknown".to_string(),
            title: "Unknown".to_string(),
            link: String::new(),
            location: String::new(),
            pay: String::new(),
            job_type: String::new(),
        }
    }
}

/// 岗位处理记录
///
/// 追加写入历史库的一行，id 为主键，整个库的生命周期内每个 id 至多一行
#[derive(Debug, Clone)]
pub struct ListingRecord {
    pub id: String,
    pub timestamp: NaiveDateTime,
    pub outcome: Outcome,
    pub barriers: Vec<Barrier>,
    pub company: String,
    pub title: String,
    pub link: String,
    pub location: String,
    pub pay: String,
    pub job_type: String,
}

impl ListingRecord {
    /// 由终态和字段草稿组装一条记录，时间戳取当前本地时间
    pub fn new(id: String, outcome: Outcome, barriers: Vec<Barrier>, draft: ListingDraft) -> Self {
        Self {
            id,
            timestamp: chrono::Local::now().naive_local(),
            outcome,
            barriers,
            company: draft.company,
            title: draft.title,
            link: draft.link,
            location: draft.location,
            pay: draft.pay,
            job_type: draft.job_type,
        }
    }

    /// 门槛列表的存储形式
    pub fn barriers_str(&self) -> String {
        self.barriers
            .iter()
            .map(|b| b.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// 按存储列顺序展开为字段列表
    pub fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.outcome.as_str().to_string(),
            self.barriers_str(),
            self.company.clone(),
            self.title.clone(),
            self.link.clone(),
            self.location.clone(),
            self.pay.clone(),
            self.job_type.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_round_trip() {
        for outcome in [
            Outcome::Applied,
            Outcome::Skipped,
            Outcome::External,
            Outcome::Saved,
            Outcome::Failed,
            Outcome::NoApplyPath,
        ] {
            assert_eq!(Outcome::from_str(outcome.as_str()), Some(outcome));
        }
        assert_eq!(Outcome::from_str("Whatever"), None);
    }

    #[test]
    fn barriers_join_in_order() {
        let record = ListingRecord::new(
            "123".to_string(),
            Outcome::Saved,
            vec![Barrier::CoverLetterRequired, Barrier::ChoiceQuestion],
            ListingDraft::default(),
        );
        assert_eq!(record.barriers_str(), "Cover Letter; Choice Question");
    }

    #[test]
    fn fields_follow_store_layout() {
        let mut draft = ListingDraft::default();
        draft.company = "Acme Corp".to_string();
        draft.title = "Backend Intern".to_string();
        let record = ListingRecord::new("42".to_string(), Outcome::Applied, vec![], draft);
        let fields = record.to_fields();
        assert_eq!(fields.len(), 10);
        assert_eq!(fields[0], "42");
        assert_eq!(fields[2], "Applied");
        assert_eq!(fields[3], "");
        assert_eq!(fields[4], "Acme Corp");
    }
}
