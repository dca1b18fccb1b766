//! End-to-end tests through the public library API.

use std::path::Path;

use lexlink::annotate::Annotator;
use lexlink::config::{CorpusConfig, LexConfig};
use lexlink::corpus::{self, TrainingArchive};
use lexlink::extract::{TrainingModel, collect_outputs};

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

#[test]
fn annotate_html_judgment_with_default_config() {
    let annotator = Annotator::from_config(&LexConfig::default()).unwrap();
    let input = "<html><head><style>p { color: red }</style></head><body>\
        <p>The appellant, Tata Motors LIMITED, relied on State of Punjab v. Gurdev Singh in appeal.</p>\n\
        <p>the claim is barred by section 3 of the Limitation Act, 1963.</p>\n\
        <script>var x = 'section 9 of the Arbitration and Conciliation Act, 1996';</script>\
        </body></html>";

    let out = annotator.annotate(input).unwrap();

    assert_eq!(out.acts, vec!["limitation-act-1963"]);
    assert_eq!(out.citations, vec!["State of Punjab v. Gurdev Singh"]);
    assert_eq!(out.organizations, vec!["Tata Motors LIMITED"]);
    assert!(out.html.contains(
        "<a href=\"https://www.quickcompany.in/acts/limitation-act-1963#3\">section 3 of the Limitation Act, 1963</a>"
    ));
    // Script content is not visible text, so it is never recognized.
    assert!(!out.html.contains("arbitration-and-conciliation-act-1996"));
    assert!(out.html.starts_with("<html>"));
}

#[test]
fn act_table_from_config_extends_builtins() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        dir.path(),
        "acts.json",
        r#"{"The Widget Safety Act, 2020": "widget-safety-act-2020"}"#,
    );
    let mut config = LexConfig::default();
    config.annotate.act_table = Some(dir.path().join("acts.json"));
    config.annotate.link_base = "https://acts.example/".into();

    let annotator = Annotator::from_config(&config).unwrap();
    let out = annotator
        .annotate_statutes("Inspections under section 12 of the Widget Safety Act, 2020 continue.")
        .unwrap();

    assert_eq!(out.acts, vec!["widget-safety-act-2020"]);
    assert!(out.html.contains("href=\"https://acts.example/widget-safety-act-2020#12\""));
    assert!(annotator.dictionary().lookup("companies act 2013").is_some());

    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["Acts"][0], "widget-safety-act-2020");
    assert!(json["html data"].as_str().unwrap().contains("<a href="));
}

#[test]
fn missing_act_table_is_reported() {
    let mut config = LexConfig::default();
    config.annotate.act_table = Some("/nonexistent/acts.json".into());
    let err = Annotator::from_config(&config).unwrap_err();
    assert!(format!("{err}").contains("/nonexistent/acts.json"));
}

#[test]
fn remote_backend_requires_urls() {
    let config: LexConfig = toml::from_str("[ner]\nbackend = \"remote\"\n").unwrap();
    assert!(Annotator::from_config(&config).is_err());
}

#[test]
fn tool_outputs_flow_through_corpus_tools() {
    let out = tempfile::TempDir::new().unwrap();
    write(out.path(), "judgment.training.header.tei.xml", "<tei>header</tei>");
    write(out.path(), "judgment.training.header", "The 1 2\nCourt 3 4\n");
    write(out.path(), "judgment.training.table", "a 1 2\nb 3\n");
    write(out.path(), "orphan.training.header", "x 1 2\n");

    let outputs = collect_outputs(out.path(), "judgment", &TrainingModel::CREATE_TRAINING).unwrap();
    let map = outputs.to_map();
    assert_eq!(map.len(), 8);
    assert_eq!(map["header_xml"], "<tei>header</tei>");
    assert_eq!(map["table_xml"], "");

    let sorted = tempfile::TempDir::new().unwrap();
    let counts = corpus::sort_outputs(out.path(), sorted.path(), &TrainingModel::CREATE_TRAINING)
        .unwrap();
    assert_eq!(counts[&TrainingModel::Header].raw, 2);
    assert_eq!(counts[&TrainingModel::Header].tei, 1);

    let header = sorted.path().join("header");
    let unpaired =
        corpus::unpaired_files(&header.join("raw"), &header.join("tei"), TrainingModel::Header)
            .unwrap();
    assert_eq!(unpaired.raw_only, vec!["orphan"]);
    assert!(unpaired.tei_only.is_empty());

    let reports = corpus::check_feature_dir(&sorted.path().join("table/raw")).unwrap();
    assert_eq!(reports.len(), 1);
    // One line of 3 fields and one of 2: the tie goes to 3.
    assert_eq!(reports[0].expected, 3);
    assert_eq!(reports[0].deviations[0].line, 2);
}

#[test]
fn local_archive_install_replaces_corpora() {
    use std::io::Write;

    let dir = tempfile::TempDir::new().unwrap();
    let corpus = CorpusConfig {
        dataset_root: dir.path().join("dataset"),
        staging_dir: dir.path().join("trainingData"),
        ..Default::default()
    };
    write(&corpus.dataset_root, "header/corpus/tei/old.tei.xml", "old");

    let zip_path = dir.path().join("training.zip");
    let mut zip = zip::ZipWriter::new(std::fs::File::create(&zip_path).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file("header/corpus/tei/new.training.header.tei.xml", options)
        .unwrap();
    zip.write_all(b"<tei/>").unwrap();
    zip.start_file("header/corpus/raw/new.training.header", options)
        .unwrap();
    zip.write_all(b"w 1 2").unwrap();
    zip.finish().unwrap();

    let report =
        TrainingArchive::install_from_zip(&zip_path, &corpus, &TrainingModel::ALL).unwrap();

    let header = &report.models[&TrainingModel::Header];
    assert_eq!((header.removed, header.installed), (1, 2));
    assert!(corpus.dataset_root.join("header/corpus/raw/new.training.header").is_file());
    assert!(!corpus.dataset_root.join("header/corpus/tei/old.tei.xml").exists());
    assert!(!corpus.staging_dir.exists());
    assert_eq!(
        report.models[&TrainingModel::Figure].notes,
        vec!["no existing data", "not present in archive"]
    );
}
