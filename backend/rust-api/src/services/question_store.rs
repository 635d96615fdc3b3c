//! Loads the question spreadsheet into memory.
//!
//! Excel-family workbooks are read with `calamine` (first worksheet only),
//! `.csv` files with `csv`. The loaded bank is immutable and shared between
//! sessions through an `Arc`.

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::QuestionsConfig;
use crate::error::{QuizError, QuizResult};
use crate::metrics::QUESTION_BANK_LOADS_TOTAL;
use crate::models::question::QuestionRecord;

pub const CHAPTER_COLUMN: &str = "大分類";
pub const SUB_TOPIC_COLUMN: &str = "中分類";
pub const TOPIC_COLUMN: &str = "topic";
pub const QUESTION_COLUMN: &str = "question";
pub const OPTION_COLUMNS: [&str; 4] = ["option_1", "option_2", "option_3", "option_4"];
pub const CORRECT_ANSWER_COLUMN: &str = "correct_answer";
pub const FAQ_COLUMN: &str = "faq";
pub const ANSWER_COLUMN: &str = "answer";
pub const REFERENCE_COLUMN: &str = "q-id";

/// Options up to this index must exist as columns; later ones may be absent.
const REQUIRED_OPTION_COLUMNS: usize = 3;

/// In-memory question table.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    records: Vec<QuestionRecord>,
    has_sessions: bool,
}

impl QuestionBank {
    pub fn new(records: Vec<QuestionRecord>, has_sessions: bool) -> Self {
        Self {
            records,
            has_sessions,
        }
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the source carried the session-tag column.
    pub fn has_sessions(&self) -> bool {
        self.has_sessions
    }
}

/// Lazily loaded, cached question bank.
///
/// A failed load is not cached: the next render tries again, so fixing the
/// file placement is enough to recover.
pub struct QuestionStore {
    config: QuestionsConfig,
    bank: RwLock<Option<Arc<QuestionBank>>>,
}

impl QuestionStore {
    pub fn new(config: QuestionsConfig) -> Self {
        Self {
            config,
            bank: RwLock::new(None),
        }
    }

    /// Store that never touches the filesystem.
    pub fn preloaded(config: QuestionsConfig, bank: QuestionBank) -> Self {
        Self {
            config,
            bank: RwLock::new(Some(Arc::new(bank))),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.config.path
    }

    pub async fn is_loaded(&self) -> bool {
        self.bank.read().await.is_some()
    }

    pub async fn bank(&self) -> QuizResult<Arc<QuestionBank>> {
        if let Some(bank) = self.bank.read().await.as_ref() {
            return Ok(bank.clone());
        }

        let mut slot = self.bank.write().await;
        if let Some(bank) = slot.as_ref() {
            return Ok(bank.clone());
        }

        let config = self.config.clone();
        let loaded = tokio::task::spawn_blocking(move || load_question_bank(&config))
            .await
            .map_err(|e| QuizError::Spreadsheet(format!("loader task failed: {}", e)))?;

        match loaded {
            Ok(bank) => {
                QUESTION_BANK_LOADS_TOTAL.with_label_values(&["success"]).inc();
                tracing::info!(
                    "Loaded {} questions from {}",
                    bank.len(),
                    self.config.path.display()
                );
                let bank = Arc::new(bank);
                *slot = Some(bank.clone());
                Ok(bank)
            }
            Err(e) => {
                QUESTION_BANK_LOADS_TOTAL.with_label_values(&["error"]).inc();
                tracing::error!("Failed to load question source: {}", e);
                Err(e)
            }
        }
    }
}

/// Reads the configured source into a [`QuestionBank`].
pub fn load_question_bank(config: &QuestionsConfig) -> QuizResult<QuestionBank> {
    let path = config.path.as_path();
    if !path.exists() {
        return Err(QuizError::SourceNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let table = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path)?,
        "csv" => read_csv(path)?,
        _ => return Err(QuizError::UnsupportedFormat(extension)),
    };

    build_bank(table, config)
}

/// Header row plus data rows, all as strings.
struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn read_workbook(path: &Path) -> QuizResult<RawTable> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| QuizError::Spreadsheet(format!("failed to open workbook: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| QuizError::Spreadsheet("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| QuizError::Spreadsheet(format!("failed to read sheet: {}", e)))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or_else(|| QuizError::Spreadsheet("sheet has no header row".to_string()))?
        .iter()
        .map(cell_to_string)
        .collect();
    let rows = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn read_csv(path: &Path) -> QuizResult<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| QuizError::Spreadsheet(format!("failed to open CSV file: {}", e)))?;

    let headers = reader
        .headers()
        .map_err(|e| QuizError::Spreadsheet(format!("failed to read CSV headers: {}", e)))?
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| QuizError::Spreadsheet(format!("failed to read CSV row: {}", e)))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    Ok(RawTable { headers, rows })
}

fn normalize_header(header: &str, lowercase: bool) -> String {
    let trimmed = header.trim();
    if lowercase {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

struct ColumnMap {
    chapter: usize,
    sub_topic: usize,
    topic: usize,
    question: usize,
    options: Vec<Option<usize>>,
    correct_answer: usize,
    faq: usize,
    answer: usize,
    reference: usize,
    session: Option<usize>,
}

impl ColumnMap {
    fn detect(headers: &[String], config: &QuestionsConfig) -> QuizResult<Self> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| normalize_header(h, config.lowercase_headers))
            .collect();
        let find = |name: &str| normalized.iter().position(|h| h == name);
        let require = |name: &str| find(name).ok_or_else(|| QuizError::MissingColumn(name.to_string()));

        let options = OPTION_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if i < REQUIRED_OPTION_COLUMNS {
                    require(name).map(Some)
                } else {
                    Ok(find(name))
                }
            })
            .collect::<QuizResult<Vec<_>>>()?;

        let session = match &config.session_column {
            Some(column) => {
                let name = normalize_header(column, config.lowercase_headers);
                Some(require(&name)?)
            }
            None => None,
        };

        Ok(Self {
            chapter: require(CHAPTER_COLUMN)?,
            sub_topic: require(SUB_TOPIC_COLUMN)?,
            topic: require(TOPIC_COLUMN)?,
            question: require(QUESTION_COLUMN)?,
            options,
            correct_answer: require(CORRECT_ANSWER_COLUMN)?,
            faq: require(FAQ_COLUMN)?,
            answer: require(ANSWER_COLUMN)?,
            reference: require(REFERENCE_COLUMN)?,
            session,
        })
    }
}

fn build_bank(table: RawTable, config: &QuestionsConfig) -> QuizResult<QuestionBank> {
    let columns = ColumnMap::detect(&table.headers, config)?;

    let mut records = Vec::with_capacity(table.rows.len());
    let mut skipped = 0usize;
    for row in &table.rows {
        let cell = |index: usize| row.get(index).cloned().unwrap_or_default();

        let question = cell(columns.question);
        if question.trim().is_empty() {
            skipped += 1;
            continue;
        }

        records.push(QuestionRecord {
            chapter: cell(columns.chapter),
            sub_topic: cell(columns.sub_topic),
            topic: cell(columns.topic),
            session: columns.session.map(cell),
            question,
            options: columns
                .options
                .iter()
                .map(|index| index.map(cell).unwrap_or_default())
                .collect(),
            correct_answer: cell(columns.correct_answer),
            faq: cell(columns.faq),
            answer_text: cell(columns.answer),
            reference_id: cell(columns.reference),
        });
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} rows without question text", skipped);
    }

    Ok(QuestionBank::new(records, columns.session.is_some()))
}

/// Cell text as the quiz shows it. Strings are kept verbatim so grading stays
/// an exact comparison.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
        Data::Empty => String::new(),
    }
}
