use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use survlog_analysis::{config::AnalysisConfig, event::Event};

use crate::schema::event_record::EventRecord;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read an analysis configuration from a JSON file
pub fn read_config_file<P>(path: P) -> anyhow::Result<AnalysisConfig>
where
    P: AsRef<Path>,
{
    read_json_file("config", path)
}

/// Read an event log
///
/// Files with a `.jsonl` extension are read as JSON Lines (one event object
/// per line, blank lines skipped). Anything else is read as a JSON array of
/// event objects.
pub fn read_event_log<P>(path: P) -> anyhow::Result<Vec<Event>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let records: Vec<EventRecord> = if path.extension().is_some_and(|ext| ext == "jsonl") {
        let file = File::open(path)
            .with_context(|| format!("Failed to open event log file: {}", path.display()))?;
        parse_json_lines(io::BufReader::new(file))
            .with_context(|| format!("Failed to parse event log file: {}", path.display()))?
    } else {
        read_json_file("event log", path)?
    };

    let events = records
        .into_iter()
        .map(EventRecord::into_event)
        .collect::<anyhow::Result<Vec<_>>>()
        .with_context(|| format!("Invalid event in {}", path.display()))?;
    tracing::info!(events = events.len(), path = %path.display(), "event log loaded");
    Ok(events)
}

fn parse_json_lines<R>(reader: R) -> anyhow::Result<Vec<EventRecord>>
where
    R: io::BufRead,
{
    let mut records = vec![];
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("Invalid JSON on line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_lines_skips_blank_lines() {
        let input = concat!(
            r#"{"timestamp": 1000, "visitorid": 1, "event": "view"}"#,
            "\n\n",
            r#"{"timestamp": 2000, "visitorid": 1, "event": "transaction"}"#,
            "\n",
        );
        let records = parse_json_lines(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].event, "transaction");
    }

    #[test]
    fn test_parse_json_lines_reports_line_number() {
        let input = "{\"timestamp\": 1000, \"visitorid\": 1, \"event\": \"view\"}\nnot json\n";
        let err = parse_json_lines(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
