//! Raw dataset loading and normalization.
//!
//! Upstream files are JSON arrays or JSONL, with two spellings for both
//! the question (`query`/`question`) and the answer (`solution`/`answer`),
//! and answers stored as integers or numeric strings. Records that lack a
//! question or whose answer does not cast to an integer are skipped with a
//! warning rather than failing the whole load.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use deckeval_core::{GroundTruth, Message};

use crate::prompt;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One record as it appears in the raw file.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    data_id: Option<String>,
    #[serde(default)]
    question_id: Option<Value>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    solution: Option<Value>,
    #[serde(default)]
    answer: Option<Value>,
    #[serde(default)]
    images: Vec<String>,
}

/// A normalized evaluation case.
#[derive(Debug, Clone, Serialize)]
pub struct EvalCase {
    pub data_id: Option<String>,
    pub question_id: Option<Value>,
    pub question: String,
    pub ground_truth: GroundTruth,
    pub images: Vec<String>,
}

/// Load and normalize a dataset file.
///
/// `filter` keeps only records whose `data_id` contains the substring.
pub fn load_cases(path: &Path, filter: Option<&str>) -> Result<Vec<EvalCase>, DatasetError> {
    let content = std::fs::read_to_string(path)?;

    let records: Vec<RawRecord> = if path.extension().is_some_and(|e| e == "jsonl") {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?
    } else {
        serde_json::from_str(&content)?
    };

    let mut cases = Vec::new();
    for record in records {
        if let Some(substr) = filter {
            let matches = record
                .data_id
                .as_deref()
                .is_some_and(|id| id.contains(substr));
            if !matches {
                continue;
            }
        }

        let Some(question) = record
            .query
            .as_deref()
            .or(record.question.as_deref())
            .filter(|q| !q.is_empty())
        else {
            warn!(data_id = ?record.data_id, "skipping record without question/query");
            continue;
        };

        let raw_answer = record.solution.as_ref().or(record.answer.as_ref());
        let Some(answer) = raw_answer.and_then(cast_answer) else {
            warn!(data_id = ?record.data_id, answer = ?raw_answer, "skipping record with non-integer answer");
            continue;
        };

        cases.push(EvalCase {
            data_id: record.data_id,
            question_id: record.question_id,
            question: question.to_string(),
            ground_truth: GroundTruth::new(answer),
            images: record.images,
        });
    }
    Ok(cases)
}

fn cast_answer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A case in the on-disk evaluation format produced by `prepare`.
#[derive(Debug, Serialize)]
struct PreparedRecord {
    messages: Vec<Message>,
    reward_model: RewardModel,
    extra_info: ExtraInfo,
}

#[derive(Debug, Serialize)]
struct RewardModel {
    ground_truth: GroundTruth,
}

#[derive(Debug, Serialize)]
struct ExtraInfo {
    id: Option<String>,
    question_id: Option<Value>,
    interaction_kwargs: InteractionKwargs,
}

#[derive(Debug, Serialize)]
struct InteractionKwargs {
    identity: GroundTruth,
}

/// Write normalized cases as JSONL evaluation records.
pub fn write_prepared(path: &Path, cases: &[EvalCase]) -> Result<usize, DatasetError> {
    let mut file = std::fs::File::create(path)?;
    for case in cases {
        let record = PreparedRecord {
            messages: vec![Message::user(prompt::build_prompt(&case.question))],
            reward_model: RewardModel {
                ground_truth: case.ground_truth.clone(),
            },
            extra_info: ExtraInfo {
                id: case.data_id.clone(),
                question_id: case.question_id.clone(),
                interaction_kwargs: InteractionKwargs {
                    identity: case.ground_truth.clone(),
                },
            },
        };
        serde_json::to_writer(&mut file, &record)?;
        writeln!(file)?;
    }
    Ok(cases.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(name: &str, content: &str) -> tempfile::TempPath {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("deckeval-test-{}-{name}", std::process::id()));
        std::fs::write(&path, content).unwrap();
        tempfile::TempPath::from_path(path)
    }

    #[test]
    fn loads_json_array() {
        let path = write_temp(
            "array.json",
            r#"[
                {"data_id": "free_cell_1", "question": "Which option?", "answer": 2},
                {"data_id": "free_cell_2", "query": "Pick one", "solution": "3"}
            ]"#,
        );
        let cases = load_cases(&path, None).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].question, "Which option?");
        assert_eq!(cases[0].ground_truth.answer_index(), Some(2));
        // solution/query spellings and string answers normalize too
        assert_eq!(cases[1].question, "Pick one");
        assert_eq!(cases[1].ground_truth.answer_index(), Some(3));
    }

    #[test]
    fn loads_jsonl() {
        let mut file = tempfile::Builder::new()
            .suffix(".jsonl")
            .tempfile()
            .unwrap();
        writeln!(file, r#"{{"data_id": "free_cell_1", "question": "Q1", "answer": 1}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"data_id": "free_cell_2", "question": "Q2", "answer": 2}}"#).unwrap();

        let cases = load_cases(file.path(), None).unwrap();
        assert_eq!(cases.len(), 2);
    }

    #[test]
    fn filter_keeps_matching_data_ids() {
        let path = write_temp(
            "filter.json",
            r#"[
                {"data_id": "free_cell_1", "question": "Q", "answer": 1},
                {"data_id": "klondike_1", "question": "Q", "answer": 1},
                {"question": "Q", "answer": 1}
            ]"#,
        );
        let cases = load_cases(&path, Some("free_cell")).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].data_id.as_deref(), Some("free_cell_1"));
    }

    #[test]
    fn skips_records_missing_question_or_answer() {
        let path = write_temp(
            "skip.json",
            r#"[
                {"data_id": "a", "answer": 1},
                {"data_id": "b", "question": "", "answer": 1},
                {"data_id": "c", "question": "Q", "answer": "not a number"},
                {"data_id": "d", "question": "Q"},
                {"data_id": "e", "question": "Q", "answer": 4}
            ]"#,
        );
        let cases = load_cases(&path, None).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].data_id.as_deref(), Some("e"));
    }

    #[test]
    fn prepared_records_carry_prompt_and_ground_truth() {
        let cases = vec![EvalCase {
            data_id: Some("free_cell_1".to_string()),
            question_id: Some(Value::from(7)),
            question: "Which option?".to_string(),
            ground_truth: GroundTruth::new(2),
            images: vec![],
        }];

        let file = tempfile::NamedTempFile::new().unwrap();
        let written = write_prepared(file.path(), &cases).unwrap();
        assert_eq!(written, 1);

        let content = std::fs::read_to_string(file.path()).unwrap();
        let record: Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record["messages"][0]["role"], "user");
        assert!(
            record["messages"][0]["content"]
                .as_str()
                .unwrap()
                .starts_with("Which option?")
        );
        assert_eq!(record["reward_model"]["ground_truth"]["answer"], 2);
        assert_eq!(
            record["extra_info"]["interaction_kwargs"]["identity"]["answer"],
            2
        );
    }
}
