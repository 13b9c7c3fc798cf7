use serde::de::DeserializeOwned;
use tokio::{
    fs::File,
    io::{self, AsyncBufReadExt, Lines},
};

/// Read JSON records from a file holding either a JSON array or one JSON value per line
pub async fn read_json_records<T: DeserializeOwned>(path: &str) -> anyhow::Result<Vec<T>> {
    let lines = read_lines(path)
        .await
        .map_err(|e| anyhow!("Unable to read {}: {}", path, e))?;

    parse_json_records(&lines).map_err(|e| anyhow!("Invalid JSON in {}: {}", path, e))
}

/// Parse lines as a JSON array when the first non-blank line opens one, or as JSON Lines
/// otherwise. Blank lines between records are skipped.
pub fn parse_json_records<T: DeserializeOwned>(lines: &[String]) -> serde_json::Result<Vec<T>> {
    let mut records = lines.iter().filter(|line| !line.trim().is_empty()).peekable();

    let is_array = records
        .peek()
        .map_or(false, |line| line.trim_start().starts_with('['));

    if is_array {
        serde_json::from_str(&lines.join("\n"))
    } else {
        records.map(|line| serde_json::from_str(line)).collect()
    }
}

async fn read_lines(path: &str) -> io::Result<Vec<String>> {
    let mut r = file_reader(path).await?;
    let mut lines = Vec::new();

    while let Some(line) = r.next_line().await? {
        lines.push(line);
    }

    Ok(lines)
}

async fn file_reader(path: &str) -> io::Result<Lines<io::BufReader<File>>> {
    let f = File::open(path).await?;

    Ok(io::BufReader::new(f).lines())
}
