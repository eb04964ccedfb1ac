use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::record::{column_headers, Record};
use crate::settings::Settings;

/// Header row then one row per record, in `column_headers` order.
pub fn write_csv<W: Write>(records: &[Record], settings: &Settings, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(column_headers(settings))?;
    for record in records {
        wtr.write_record(record.to_row(settings))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[Record], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

pub fn save_csv(records: &[Record], settings: &Settings, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(records, settings, BufWriter::new(file))?;
    info!(path = %path.display(), records = records.len(), "wrote csv");
    Ok(())
}

pub fn save_json(records: &[Record], path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_json(records, &mut out)?;
    out.flush()?;
    info!(path = %path.display(), records = records.len(), "wrote json");
    Ok(())
}

/// `<out_dir>/<input stem>_<stamp>.<extension>`
pub fn output_path(out_dir: &Path, input: &Path, stamp: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "roster".to_string());
    out_dir.join(format!("{}_{}.{}", stem, stamp, extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Extractor;

    fn records(settings: &Settings) -> Vec<Record> {
        let extractor = Extractor::new(settings.clone()).unwrap();
        extractor.extract("1班 山田太郎\n東京都渋谷区1-2-3\n03-1234-5678 / 090-1111-2222\n事務局①\n2班 佐藤花子\n平日, 夜")
    }

    #[test]
    fn csv_has_header_and_rows() {
        let s = Settings::default();
        let mut buf = Vec::new();
        write_csv(&records(&s), &s, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "班,氏名,住所,TEL,メールアドレス,事務局,会計,書記,名簿,防犯防災,回覧広報,地域コミュ,環境美化,厚生福祉,補足事項"
        );
        assert_eq!(
            lines[1],
            "1班,山田太郎,東京都渋谷区1-2-3,03-1234-5678/090-1111-2222,null,1,null,null,null,null,null,null,null,null,null"
        );
        // the comma inside the note forces quoting
        assert!(lines[2].ends_with("\"平日, 夜\""));
    }

    #[test]
    fn csv_reads_back_with_fifteen_fields() {
        let s = Settings::default();
        let mut buf = Vec::new();
        write_csv(&records(&s), &s, &mut buf).unwrap();

        let mut rdr = csv::Reader::from_reader(buf.as_slice());
        let rows: Vec<csv::StringRecord> = rdr.records().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == 15));
        assert_eq!(&rows[1][1], "佐藤花子");
        assert_eq!(&rows[1][3], "null");
    }

    #[test]
    fn json_keeps_structure() {
        let s = Settings::default();
        let mut buf = Vec::new();
        write_json(&records(&s), &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let first = &value[0];
        assert_eq!(first["team_number"], "1班");
        assert_eq!(first["phones"][1], "090-1111-2222");
        assert_eq!(first["preferences"][0]["department"], "事務局");
        assert_eq!(first["preferences"][0]["rank"], 1);
        assert!(first["preferences"][1]["rank"].is_null());
    }

    #[test]
    fn save_to_disk() {
        let s = Settings::default();
        let dir = tempfile::tempdir().unwrap();
        let csv_path = output_path(dir.path(), Path::new("scans/roster.p1.txt"), "20240401_090000", "csv");
        assert_eq!(csv_path.file_name().unwrap(), "roster.p1_20240401_090000.csv");
        let json_path = output_path(dir.path(), Path::new("scans/roster.p1.txt"), "20240401_090000", "json");

        save_csv(&records(&s), &s, &csv_path).unwrap();
        save_json(&records(&s), &json_path).unwrap();

        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv_text.starts_with("班,氏名"));
        let json_text = std::fs::read_to_string(&json_path).unwrap();
        assert!(json_text.contains("佐藤花子"));
    }

    #[test]
    fn save_into_missing_dir_fails() {
        let s = Settings::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        assert!(save_csv(&records(&s), &s, &path).is_err());
    }
}
