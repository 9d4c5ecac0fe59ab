//! 历史库 - 业务能力层
//!
//! 只追加的 CSV 记录库，去重和限频都以它为准。
//! 每次追加都是一次独立的打开-写入-关闭，崩溃不会破坏已写入的行。
//! 单写者假设：一个历史库文件同一时间只有一个编排器实例在写。

use crate::error::{AppError, AppResult};
use crate::models::record::{ListingRecord, Outcome, TIMESTAMP_FORMAT};
use chrono::{Duration, NaiveDateTime};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// 存储列，顺序即行布局
pub const STORE_HEADER: [&str; 10] = [
    "Job ID",
    "Date",
    "Status",
    "Requirements",
    "Company",
    "Title",
    "Job Link",
    "Location",
    "Pay",
    "Job Type",
];

/// 历史库
///
/// 职责：
/// - 打开/创建存储文件，校验表头
/// - 回放所有行重建内存中的 id 集合（HistorySet）
/// - 追加终态记录（失败只记日志，不中断运行）
/// - 按时间窗口统计某终态的行数（供限频器使用）
///
/// id 集合由本类型独占持有和修改，其他组件只能通过 `contains` 只读查询
pub struct HistoryStore {
    path: PathBuf,
    seen: HashSet<String>,
}

impl HistoryStore {
    /// 打开历史库
    ///
    /// 文件不存在时创建并写入表头。已有文件的表头与当前列布局不一致时，
    /// 不动旧文件，在旁边创建一个带时间戳后缀的新库（绝不静默合并两种结构）。
    /// 这一步失败是致命错误，由顶层汇报后退出。
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let requested: PathBuf = path.into();
        let path = Self::resolve_store_path(requested)?;

        if !path.exists() {
            fs::write(&path, format!("{}\n", header_row()))
                .map_err(|e| AppError::store_create_failed(path.display().to_string(), e))?;
            info!("✓ 已创建历史库: {}", path.display());
        }

        let mut store = Self {
            path,
            seen: HashSet::new(),
        };
        store.load_history()?;
        Ok(store)
    }

    /// 表头不匹配时决定实际使用的文件路径
    fn resolve_store_path(requested: PathBuf) -> AppResult<PathBuf> {
        if !requested.exists() {
            return Ok(requested);
        }

        let content = fs::read_to_string(&requested)
            .map_err(|e| AppError::store_read_failed(requested.display().to_string(), e))?;
        let first_line = content.lines().next().unwrap_or("");

        if first_line.trim_end() == header_row() {
            return Ok(requested);
        }

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let stem = requested
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("application_log");
        let ext = requested
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("csv");
        let stamped = requested.with_file_name(format!("{}_{}.{}", stem, stamp, ext));

        warn!(
            "⚠️ 历史库 {} 的表头与当前结构不一致，旧文件保持原样，改用新库 {}",
            requested.display(),
            stamped.display()
        );
        Ok(stamped)
    }

    /// 回放所有行，重建 id 集合；坏行跳过，不致命
    fn load_history(&mut self) -> AppResult<()> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| AppError::store_read_failed(self.path.display().to_string(), e))?;

        let mut malformed = 0usize;
        for line in content.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let fields = parse_row(line);
            if fields.len() != STORE_HEADER.len() || fields[0].is_empty() {
                malformed += 1;
                debug!("跳过坏行: {}", line);
                continue;
            }
            self.seen.insert(fields[0].clone());
        }

        if malformed > 0 {
            warn!("⚠️ 历史库中有 {} 个坏行已跳过", malformed);
        }
        info!("✓ 历史库加载完成，共 {} 条已处理岗位", self.seen.len());
        Ok(())
    }

    /// 查询某个 id 是否已有终态记录
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// 已处理岗位总数
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// 实际使用的存储文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入一条终态记录并登记到 id 集合
    ///
    /// 同一 id 只会写一次，重复写入被拒绝（debug 日志，空操作）。
    /// 追加失败只记日志不中断：丢一行记录不能让整个运行崩掉。
    pub fn record(&mut self, record: &ListingRecord) {
        if self.seen.contains(&record.id) {
            debug!("id {} 已有终态记录，拒绝重复写入", record.id);
            return;
        }
        self.seen.insert(record.id.clone());

        if let Err(e) = self.append_row(record) {
            error!("⚠️ 追加记录失败（该行丢失，继续运行）: {}", e);
        }
    }

    /// 单次原子的打开-追加-关闭
    fn append_row(&self, record: &ListingRecord) -> AppResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::store_append_failed(self.path.display().to_string(), e))?;

        let line = format!("{}\n", format_row(&record.to_fields()));
        file.write_all(line.as_bytes())
            .map_err(|e| AppError::store_append_failed(self.path.display().to_string(), e))?;
        Ok(())
    }

    /// 统计时间窗口内某终态的行数
    ///
    /// 全量扫描存储文件；时间戳或状态解析不出来的行不计入
    pub fn count_recent(&self, outcome: Outcome, window: Duration) -> AppResult<usize> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| AppError::store_read_failed(self.path.display().to_string(), e))?;

        let cutoff = chrono::Local::now().naive_local() - window;
        let mut count = 0usize;

        for line in content.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let fields = parse_row(line);
            if fields.len() != STORE_HEADER.len() {
                continue;
            }
            if fields[2] != outcome.as_str() {
                continue;
            }
            match NaiveDateTime::parse_from_str(&fields[1], TIMESTAMP_FORMAT) {
                Ok(ts) if ts >= cutoff => count += 1,
                _ => {}
            }
        }
        Ok(count)
    }
}

/// 表头行
fn header_row() -> String {
    STORE_HEADER.join(",")
}

/// 转义单个字段：含逗号/引号/换行时整体加引号，内部引号翻倍
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// 拼装一行
fn format_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// 解析一行，容忍带引号的字段
pub(crate) fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{Barrier, ListingDraft};
    use tempfile::TempDir;

    fn make_record(id: &str, outcome: Outcome) -> ListingRecord {
        ListingRecord::new(id.to_string(), outcome, vec![], ListingDraft::default())
    }

    #[test]
    fn open_creates_file_with_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application_log.csv");
        let store = HistoryStore::open(&path).unwrap();

        assert!(store.is_empty());
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().next().unwrap(), header_row());
    }

    #[test]
    fn record_then_reopen_replays_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application_log.csv");

        let mut store = HistoryStore::open(&path).unwrap();
        store.record(&make_record("8421337", Outcome::Applied));
        store.record(&make_record("8421338", Outcome::Saved));
        drop(store);

        let reopened = HistoryStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(reopened.contains("8421337"));
        assert!(reopened.contains("8421338"));
        assert!(!reopened.contains("8421339"));
    }

    #[test]
    fn duplicate_id_is_written_at_most_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application_log.csv");

        let mut store = HistoryStore::open(&path).unwrap();
        store.record(&make_record("777", Outcome::Applied));
        store.record(&make_record("777", Outcome::Failed));

        let content = fs::read_to_string(&path).unwrap();
        let data_rows: Vec<_> = content.lines().skip(1).filter(|l| !l.is_empty()).collect();
        assert_eq!(data_rows.len(), 1);
        assert!(data_rows[0].starts_with("777,"));
    }

    #[test]
    fn mismatched_header_leaves_old_store_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application_log.csv");
        let old_content = "Company,Title,Status,Notes,Date\nAcme,Intern,APPLIED,,2024-01-01 10:00:00\n";
        fs::write(&path, old_content).unwrap();

        let mut store = HistoryStore::open(&path).unwrap();
        assert_ne!(store.path(), path.as_path());
        store.record(&make_record("1", Outcome::Applied));

        // 旧文件一个字节都没变
        assert_eq!(fs::read_to_string(&path).unwrap(), old_content);
        // 新库有自己的表头
        let new_content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(new_content.lines().next().unwrap(), header_row());
    }

    #[test]
    fn malformed_rows_are_skipped_on_replay() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application_log.csv");
        let content = format!(
            "{}\n8421337,2024-01-01 10:00:00,Applied,,Acme,Intern,,,,\ngarbage line\n,,,,,,,,,\n",
            header_row()
        );
        fs::write(&path, content).unwrap();

        let store = HistoryStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains("8421337"));
    }

    #[test]
    fn fields_with_commas_and_quotes_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application_log.csv");

        let mut draft = ListingDraft::default();
        draft.company = "Acme, Inc.".to_string();
        draft.title = "Engineer \"Backend\"".to_string();
        draft.location = "Boston, MA".to_string();
        let record = ListingRecord::new(
            "99".to_string(),
            Outcome::Saved,
            vec![Barrier::CoverLetterRequired],
            draft,
        );

        let mut store = HistoryStore::open(&path).unwrap();
        store.record(&record);
        drop(store);

        let content = fs::read_to_string(&path).unwrap();
        let row = parse_row(content.lines().nth(1).unwrap());
        assert_eq!(row.len(), STORE_HEADER.len());
        assert_eq!(row[0], "99");
        assert_eq!(row[3], "Cover Letter");
        assert_eq!(row[4], "Acme, Inc.");
        assert_eq!(row[5], "Engineer \"Backend\"");
        assert_eq!(row[7], "Boston, MA");

        // 重新打开也能认出这个 id
        let reopened = HistoryStore::open(&path).unwrap();
        assert!(reopened.contains("99"));
    }

    #[test]
    fn count_recent_honors_window_and_outcome() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application_log.csv");

        let mut store = HistoryStore::open(&path).unwrap();

        let mut fresh = make_record("1", Outcome::Applied);
        fresh.timestamp = chrono::Local::now().naive_local() - Duration::hours(1);
        let mut stale = make_record("2", Outcome::Applied);
        stale.timestamp = chrono::Local::now().naive_local() - Duration::hours(48);
        let mut saved = make_record("3", Outcome::Saved);
        saved.timestamp = chrono::Local::now().naive_local();

        store.record(&fresh);
        store.record(&stale);
        store.record(&saved);

        assert_eq!(
            store.count_recent(Outcome::Applied, Duration::hours(24)).unwrap(),
            1
        );
        assert_eq!(
            store.count_recent(Outcome::Applied, Duration::hours(72)).unwrap(),
            2
        );
        assert_eq!(
            store.count_recent(Outcome::Saved, Duration::hours(24)).unwrap(),
            1
        );
    }

    #[test]
    fn parse_row_handles_quoted_fields() {
        assert_eq!(parse_row("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_row("\"a,b\",c"), vec!["a,b", "c"]);
        assert_eq!(parse_row("\"say \"\"hi\"\"\",x"), vec!["say \"hi\"", "x"]);
        assert_eq!(parse_row(""), vec![""]);
    }
}
