use flate2::{write::GzEncoder, Compression};
use panelcount::matrix::MatrixReader;
use panelcount::panel::load_panel;
use panelcount::utils::open_text_reader;
use panelcount::workflows::{run_panel, Params, PanelRun, SiteStatus};
use panelcount::writers::write_diagnostics;
use std::{fs, io::Write, path::Path};

const PANEL: &str = "\
SNP,Allele,strand_sensitive,site_type
rs312262906,A,false,INDEL
rs1805007,T,,
rs12913832,T,,
rs16891982,C,,
rs885479,T,yes,
rs1805009,C,,
";

const MATRIX: &str = "\
CHROM\tPOS\tID\tREF\tALT\tHG00096\tHG00097\tHG00099\tNA12878
16\t89919736\trs312262906\tC\tCA\t0|1\t0|0\t1|1\t0|0
16\t89986117\trs1805007\tC\tT\t1|1\t0|1\t./.\t0|0
15\t28365618\trs12913832\tA\tG\t1|1\t0|1\t0|0\t1|0
16\t89985844\trs885479\tG\tA\t0|1\t1|1\t0|0\t0|0
X\t1000\trs1805009\tG\tC\t1\t0\t.\t0|1
22\t50000\trs_not_in_panel\tA\tT\t1|1\t1|1\t1|1\t1|1
";

fn run(dir: &Path, matrix_name: &str) -> PanelRun {
    let panel_path = dir.join("panel.csv");
    fs::write(&panel_path, PANEL).unwrap();
    let panel = load_panel(&panel_path).unwrap();

    let matrix_path = dir.join(matrix_name);
    let source = MatrixReader::new(open_text_reader(&matrix_path).unwrap()).unwrap();
    run_panel(
        source,
        &panel,
        &Params {
            num_threads: 2,
            max_retries: 0,
        },
    )
    .unwrap()
}

#[test]
fn test_count_table_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("matrix.tsv"), MATRIX).unwrap();
    let run = run(dir.path(), "matrix.tsv");

    let output = dir.path().join("hirisplex_by_sample.csv");
    run.table.write_csv(&output).unwrap();
    let expected = "\
sampleid,rs312262906_A,rs1805007_T,rs12913832_T,rs16891982_C,rs885479_T,rs1805009_C
HG00096,1,2,0,NA,NA,1
HG00097,0,1,1,NA,NA,0
HG00099,2,NA,2,NA,NA,NA
NA12878,0,0,1,NA,NA,1
";
    assert_eq!(fs::read_to_string(&output).unwrap(), expected);

    assert_eq!(run.sites[3].status, SiteStatus::Absent);
    assert_eq!(run.sites[4].status, SiteStatus::Unmatched);
}

#[test]
fn test_table_shape_invariant() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("matrix.tsv"), MATRIX).unwrap();
    let run = run(dir.path(), "matrix.tsv");

    let output = dir.path().join("counts.csv");
    run.table.write_csv(&output).unwrap();
    let content = fs::read_to_string(&output).unwrap();
    let rows: Vec<Vec<&str>> = content
        .lines()
        .map(|line| line.split(',').collect())
        .collect();

    // Header plus one row per sample, one column per panel entry
    assert_eq!(rows.len(), 1 + 4);
    for row in &rows {
        assert_eq!(row.len(), 1 + 6);
    }
    for row in &rows[1..] {
        for cell in &row[1..] {
            assert!(["0", "1", "2", "NA"].contains(cell), "bad cell {}", cell);
        }
    }
}

#[test]
fn test_gzipped_matrix_and_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let gz_path = dir.path().join("matrix.tsv.gz");
    let mut encoder = GzEncoder::new(fs::File::create(&gz_path).unwrap(), Compression::default());
    encoder.write_all(MATRIX.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let run = run(dir.path(), "matrix.tsv.gz");
    let diagnostics_path = dir.path().join("diagnostics.tsv");
    write_diagnostics(&diagnostics_path, &run.diagnostics).unwrap();

    let expected = "\
sample_id\tvariant_id\treason
HG00099\trs1805007\tmissing_call
HG00096\trs885479\tunmatched_allele
HG00097\trs885479\tunmatched_allele
HG00099\trs885479\tunmatched_allele
NA12878\trs885479\tunmatched_allele
HG00099\trs1805009\tmissing_call
";
    assert_eq!(fs::read_to_string(&diagnostics_path).unwrap(), expected);
}

#[test]
fn test_structural_error_fails_before_output() {
    let dir = tempfile::tempdir().unwrap();
    let matrix_path = dir.path().join("matrix.tsv");
    fs::write(&matrix_path, "CHROM\tPOS\tID\tREF\tALT\n1\t1\trs1\tA\tG\n").unwrap();
    assert!(MatrixReader::new(open_text_reader(&matrix_path).unwrap()).is_err());
}
