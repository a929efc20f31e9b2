use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

/// Writes `data` as pretty-printed JSON, replacing any existing file.
pub fn save_json<T: Serialize>(
    data: &T,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    file.write_all(serde_json::to_string_pretty(data)?.as_bytes())?;
    file.write_all(b"\n")?;
    info!(path = %path.display(), "wrote analysis");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnalysisRequest, JobRecord};
    use uuid::Uuid;

    #[test]
    fn writes_record_as_json() {
        let request = AnalysisRequest::new("https://github.com/acme/app", 2);
        let record = JobRecord::new(Uuid::new_v4(), &request);
        let path = std::env::temp_dir().join(format!("analysis-{}.json", record.id));

        save_json(&record, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let written: JobRecord = serde_json::from_str(&contents).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written, record);
    }
}
