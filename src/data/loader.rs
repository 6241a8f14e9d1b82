// ============================================================
// Layer 4 — Parallel Dataset Loader
// ============================================================
// Reads a labelled text dataset and normalises every row on a
// fixed-size worker pool.
//
// Supported formats (picked from the file extension):
//   .json / .jsonl — one JSON object per line
//                    e.g. {"headline": "...", "is_sarcastic": 1}
//   .csv           — header row + records
//                    e.g. tweets,class
//
// Pipeline for one file:
//
//   file ──read──▶ Vec<LabeledExample> (raw text + label)
//        ──pool──▶ clean_text filled in, same order
//        ──opt───▶ labels binarised against a positive class
//
// Any read or parse error aborts the whole load; there is no
// partial result. Rows whose clean text ends up empty are NOT
// removed here; callers do that with `drop_empty`.
//
// Reference: rayon ThreadPoolBuilder / ParallelIterator docs
//            csv crate documentation

use std::{
    collections::BTreeMap,
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Result;
use rayon::prelude::*;
use serde_json::Value;

use crate::data::error::{DataError, DataResult};
use crate::data::normalizer::TextNormalizer;
use crate::domain::example::LabeledExample;
use crate::domain::traits::ExampleSource;

// ─── DatasetSpec ──────────────────────────────────────────────────────────────
/// Where a dataset lives and which fields hold the text and the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    /// Short name used in logs and default run names
    pub name:        String,
    pub path:        PathBuf,
    pub text_field:  String,
    pub label_field: String,
    /// When set, labels become "1" (== positive) or "0" (anything else)
    pub positive:    Option<String>,
    preset:          bool,
}

impl DatasetSpec {
    pub fn new(
        path:        impl Into<PathBuf>,
        text_field:  impl Into<String>,
        label_field: impl Into<String>,
    ) -> Self {
        let path: PathBuf = path.into();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string();
        Self {
            name,
            path,
            text_field:  text_field.into(),
            label_field: label_field.into(),
            positive:    None,
            preset:      false,
        }
    }

    pub fn with_positive(mut self, positive: impl Into<String>) -> Self {
        self.positive = Some(positive.into());
        self
    }

    fn preset(name: &str, file: &str, text: &str, label: &str, positive: Option<&str>) -> Self {
        Self {
            name:        name.to_string(),
            path:        PathBuf::from(file),
            text_field:  text.to_string(),
            label_field: label.to_string(),
            positive:    positive.map(str::to_string),
            preset:      true,
        }
    }

    /// Preset file names are relative to the data directory; custom paths are kept as given.
    pub fn resolve(mut self, data_dir: &Path) -> Self {
        if self.preset {
            self.path = data_dir.join(&self.path);
        }
        self
    }
}

impl FromStr for DatasetSpec {
    type Err = DataError;

    /// Accepts a preset name or `path,text_field,label_field[,positive_label]`.
    fn from_str(s: &str) -> DataResult<Self> {
        let spec = match s {
            "headlines" => Self::preset(
                "headlines", "Sarcasm_Headlines_Dataset.json", "headline", "is_sarcastic", None,
            ),
            "tweets"             => Self::preset("tweets", "train.csv", "tweets", "class", None),
            "tweets-test"        => Self::preset("tweets-test", "test.csv", "tweets", "class", None),
            "tweets-binary"      => Self::preset("tweets", "train.csv", "tweets", "class", Some("sarcasm")),
            "tweets-test-binary" => Self::preset("tweets-test", "test.csv", "tweets", "class", Some("sarcasm")),
            custom => {
                let parts: Vec<&str> = custom.split(',').map(str::trim).collect();
                match parts.as_slice() {
                    [path, text, label] if !path.is_empty() => Self::new(*path, *text, *label),
                    [path, text, label, positive] if !path.is_empty() => {
                        Self::new(*path, *text, *label).with_positive(*positive)
                    }
                    _ => return Err(DataError::InvalidSpec(custom.to_string())),
                }
            }
        };
        Ok(spec)
    }
}

impl fmt::Display for DatasetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

// ─── DatasetLoader ────────────────────────────────────────────────────────────
/// Loads one dataset and normalises it on a worker pool.
pub struct DatasetLoader {
    spec:       DatasetSpec,
    /// None = one worker per available core
    workers:    Option<usize>,
    normalizer: TextNormalizer,
}

impl DatasetLoader {
    pub fn new(spec: DatasetSpec, workers: Option<usize>) -> Self {
        Self { spec, workers, normalizer: TextNormalizer::new() }
    }
}

impl ExampleSource for DatasetLoader {
    fn load_all(&self) -> Result<Vec<LabeledExample>> {
        let spec = &self.spec;
        tracing::info!("Loading dataset {}", spec);

        let raw = read_records(spec)?;
        let mut examples = normalize_parallel(raw, &self.normalizer, self.workers)?;

        if let Some(positive) = &spec.positive {
            examples = examples.into_iter().map(|e| e.binarize(positive)).collect();
        }

        tracing::info!(
            "Loaded {} rows from '{}', label distribution: {}",
            examples.len(),
            spec.name,
            label_distribution(&examples)
        );
        Ok(examples)
    }
}

/// Read raw rows (text + label) without any cleaning.
pub fn read_records(spec: &DatasetSpec) -> DataResult<Vec<LabeledExample>> {
    let ext = spec
        .path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("json") | Some("jsonl") => read_json_lines(spec),
        Some("csv") => read_csv(spec),
        _ => Err(DataError::UnsupportedFormat(spec.path.clone())),
    }
}

fn read_json_lines(spec: &DatasetSpec) -> DataResult<Vec<LabeledExample>> {
    let path = &spec.path;
    let file = File::open(path).map_err(|source| DataError::Io { path: path.clone(), source })?;

    let mut rows = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| DataError::Io { path: path.clone(), source })?;
        if line.trim().is_empty() {
            continue;
        }

        let record: Value = serde_json::from_str(&line).map_err(|source| DataError::Json {
            path: path.clone(),
            line: line_no,
            source,
        })?;

        let text  = scalar_field(&record, &spec.text_field, path, line_no)?;
        let label = scalar_field(&record, &spec.label_field, path, line_no)?;
        rows.push(LabeledExample::new(text, label));
    }
    Ok(rows)
}

/// Render a JSON scalar as the string form used for labels and text.
fn scalar_field(record: &Value, field: &str, path: &Path, line: usize) -> DataResult<String> {
    match record.get(field) {
        None => Err(DataError::MissingField {
            path:  path.to_path_buf(),
            line,
            field: field.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b))   => Ok(if *b { "1" } else { "0" }.to_string()),
        Some(_) => Err(DataError::InvalidField {
            path:  path.to_path_buf(),
            line,
            field: field.to_string(),
        }),
    }
}

fn read_csv(spec: &DatasetSpec) -> DataResult<Vec<LabeledExample>> {
    let path = &spec.path;
    let csv_err = |source| DataError::Csv { path: path.clone(), source };

    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();

    let text_idx  = headers.iter().position(|h| h == &spec.text_field);
    let label_idx = headers.iter().position(|h| h == &spec.label_field);
    let (Some(text_idx), Some(label_idx)) = (text_idx, label_idx) else {
        return Err(DataError::MissingColumns {
            path:     path.clone(),
            expected: vec![spec.text_field.clone(), spec.label_field.clone()],
            found:    headers,
        });
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let text   = record.get(text_idx).unwrap_or_default();
        let label  = record.get(label_idx).unwrap_or_default();
        rows.push(LabeledExample::new(text, label));
    }
    Ok(rows)
}

/// Fill in `clean_text` for every row on a pool of `workers` threads.
///
/// Blocks until every row is done; output order equals input order.
pub fn normalize_parallel(
    examples:   Vec<LabeledExample>,
    normalizer: &TextNormalizer,
    workers:    Option<usize>,
) -> DataResult<Vec<LabeledExample>> {
    // 0 tells rayon to use one thread per available core
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.unwrap_or(0))
        .thread_name(|i| format!("normalize-{i}"))
        .build()?;

    tracing::debug!(
        "Normalising {} rows on {} workers",
        examples.len(),
        pool.current_num_threads()
    );

    let cleaned = pool.install(|| {
        examples
            .into_par_iter()
            .map(|example| {
                let clean = normalizer.normalize(&example.text);
                example.with_clean_text(clean)
            })
            .collect()
    });
    Ok(cleaned)
}

/// "label: pct%" pairs in label order, for log lines.
pub fn label_distribution(examples: &[LabeledExample]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for e in examples {
        *counts.entry(e.label.as_str()).or_insert(0) += 1;
    }
    let total = examples.len().max(1) as f64;
    counts
        .iter()
        .map(|(label, n)| format!("{label}: {:.2}%", *n as f64 * 100.0 / total))
        .collect::<Vec<_>>()
        .join(", ")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_reads_json_lines_with_numeric_labels() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "headlines.json",
            "{\"headline\": \"Area man wins\", \"is_sarcastic\": 1, \"article_link\": \"x\"}\n\
             \n\
             {\"headline\": \"Senate passes bill\", \"is_sarcastic\": 0}\n",
        );
        let spec = DatasetSpec::new(&path, "headline", "is_sarcastic");
        let rows = DatasetLoader::new(spec, Some(2)).load_all().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "1");
        assert_eq!(rows[0].clean_text, "area man win");
        assert_eq!(rows[1].label, "0");
        assert_eq!(rows[1].clean_text, "senate pass bill");
    }

    #[test]
    fn test_json_missing_field_reports_line() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.jsonl", "{\"headline\": \"a\", \"is_sarcastic\": 0}\n{\"headline\": \"b\"}\n");
        let spec = DatasetSpec::new(&path, "headline", "is_sarcastic");
        match read_records(&spec) {
            Err(DataError::MissingField { line, field, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(field, "is_sarcastic");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_csv_missing_column_is_validation_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "train.csv", "text,label\nhello,sarcasm\n");
        let spec = DatasetSpec::new(&path, "tweets", "class");
        let err  = read_records(&spec).unwrap_err();
        assert!(matches!(err, DataError::MissingColumns { .. }));
        assert!(err.to_string().contains("tweets"));
    }

    #[test]
    fn test_csv_binarised_labels() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "train.csv",
            "tweets,class\n\"Love waiting, in lines!\",sarcasm\njust a day,regular\n\"so ironic\",irony\n",
        );
        let spec = DatasetSpec::new(&path, "tweets", "class").with_positive("sarcasm");
        let rows = DatasetLoader::new(spec, None).load_all().unwrap();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["1", "0", "0"]);
        assert_eq!(rows[0].clean_text, "love waiting line");
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let spec = DatasetSpec::new("data.parquet", "t", "l");
        assert!(matches!(read_records(&spec), Err(DataError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_parallel_normalisation_keeps_order() {
        let rows: Vec<LabeledExample> = (0..200)
            .map(|i| LabeledExample::new(format!("Item{i} cats"), "0"))
            .collect();
        let out = normalize_parallel(rows, &TextNormalizer::new(), Some(4)).unwrap();
        for (i, row) in out.iter().enumerate() {
            assert_eq!(row.clean_text, format!("item{i} cat"));
        }
    }

    #[test]
    fn test_spec_parsing() {
        let h: DatasetSpec = "headlines".parse().unwrap();
        assert_eq!(h.text_field, "headline");
        let h = h.resolve(Path::new("data"));
        assert_eq!(h.path, PathBuf::from("data/Sarcasm_Headlines_Dataset.json"));

        let t: DatasetSpec = "tweets-test-binary".parse().unwrap();
        assert_eq!(t.positive.as_deref(), Some("sarcasm"));

        let c: DatasetSpec = "my/file.csv,body,tag,yes".parse().unwrap();
        assert_eq!(c.name, "file");
        assert_eq!(c.positive.as_deref(), Some("yes"));
        let c = c.resolve(Path::new("data"));
        assert_eq!(c.path, PathBuf::from("my/file.csv"));

        assert!("nonsense".parse::<DatasetSpec>().is_err());
    }

    #[test]
    fn test_label_distribution_format() {
        let rows = vec![
            LabeledExample::new("a", "1"),
            LabeledExample::new("b", "0"),
            LabeledExample::new("c", "1"),
            LabeledExample::new("d", "1"),
        ];
        assert_eq!(label_distribution(&rows), "0: 25.00%, 1: 75.00%");
    }
}
