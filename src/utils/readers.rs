use super::Result;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read as ioRead};
use std::path::Path;

pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".gzip") || path_str.ends_with(".bgz")
}

/// Opens a plain or gzip-compressed text file (panel or genotype matrix).
pub fn open_text_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead + Send>>> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(BufReader::new(Box::new(gz_decoder)))
        } else {
            Err(format!("Invalid gzip header: {}", path.to_string_lossy()))
        }
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::{BufRead, Write};

    #[test]
    fn test_is_gzipped() {
        assert!(is_gzipped(Path::new("matrix.tsv.gz")));
        assert!(is_gzipped(Path::new("MATRIX.TSV.GZ")));
        assert!(!is_gzipped(Path::new("panel.csv")));
    }

    #[test]
    fn test_open_text_reader_plain_and_gzip() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("panel.csv");
        std::fs::write(&plain, "SNP,Allele\nrs1805007,T\n").unwrap();
        let lines: Vec<String> = open_text_reader(&plain)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["SNP,Allele", "rs1805007,T"]);

        let gz = dir.path().join("panel.csv.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(b"SNP,Allele\nrs1805007,T\n").unwrap();
        encoder.finish().unwrap();
        let lines: Vec<String> = open_text_reader(&gz)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["SNP,Allele", "rs1805007,T"]);
    }

    #[test]
    fn test_open_text_reader_missing_file() {
        let result = open_text_reader(Path::new("/nonexistent/panel.csv"));
        assert!(result.is_err());
    }
}
