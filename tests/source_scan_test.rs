//! Scanner and folder integration tests over the fixture source tree.

use callsweep::actions::error_calls::ERROR_CALL_FUNCTIONS;
use callsweep::reports::RunSummary;
use callsweep::{CallMatcher, SourceFile, SourceFolder};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fake_source_folder")
}

fn analysis_root() -> PathBuf {
    fixture_root().join("src/EnergyPlus")
}

fn matcher() -> CallMatcher {
    CallMatcher::new(ERROR_CALL_FUNCTIONS).unwrap()
}

#[test]
fn finds_all_calls_in_the_fixture_file() {
    let sf = SourceFile::parse(&analysis_root().join("test_file.cc"), &matcher()).unwrap();
    assert_eq!(sf.found_functions.len(), 9);
    assert_eq!(sf.groups.len(), 5);
    assert!(sf.found_functions.iter().all(|c| c.appears_successful));
}

#[test]
fn preview_lists_every_found_call() {
    let sf = SourceFile::parse(&analysis_root().join("test_file.cc"), &matcher()).unwrap();
    let preview = sf.preview();
    assert_eq!(preview.lines().count(), 9);
    assert!(preview.starts_with("#0000: 6 - 6 : ShowSevereError(state, \"Something"));
}

#[test]
fn near_identical_fixture_parses_to_the_same_shape() {
    let sf = SourceFile::parse(&analysis_root().join("second_file.cc"), &matcher()).unwrap();
    assert_eq!(sf.found_functions.len(), 9);
    assert_eq!(sf.groups.len(), 5);
}

#[test]
fn complex_file_reports_exact_call_spans() {
    let raw_text = r#"// INCLUDES
#include <string>

namespace UnitarySystems {
Object *Object::factory(std::string objectName)
{
    ShowSevereError(state, format("Factory Error: {}", objectName));
    return nullptr;
}

void func()
{
    ShowContinueError(state,
        format(
            "It might be this: {} or that: {}",
            state.data->Node(1).Temp,
            state.data->CoolVector[x].attributeY
        )
    );
}
}
"#;
    let sf = SourceFile::from_text(Path::new("demo.cc"), raw_text.to_string(), &matcher());
    assert_eq!(sf.found_functions.len(), 2);

    let first = &sf.found_functions[0];
    assert!(first.appears_successful);
    assert_eq!(first.char_start_in_file, 112);
    assert_eq!(first.char_end_in_file, 175);

    let second = &sf.found_functions[1];
    assert!(second.appears_successful);
    assert_eq!(second.char_start_in_file, 218);
    assert_eq!(second.char_end_in_file, 409);
}

#[test]
fn call_after_text_on_the_same_line_is_found() {
    let raw_text =
        "\n      if (j > NumCur) ShowFatalError(state, \"Out of range, too high (FAN) in ADS simulation\");\n    ";
    let sf = SourceFile::from_text(Path::new("demo.cc"), raw_text.to_string(), &matcher());
    assert_eq!(sf.found_functions.len(), 1);

    let found = &sf.found_functions[0];
    assert!(found.appears_successful);
    assert_eq!(found.char_start_in_file, 23);
    assert_eq!(found.char_end_in_file, 94);
    assert_eq!(found.preceding_text, "if (j > NumCur)");
}

#[test]
fn overlong_call_is_marked_unsuccessful() {
    let raw_text = r#"
ShowContinueError(state,
    format(
        "It might be this: {} or that: {}",
        state.data->Node(1).Temp,
        state.data->CoolVector[x].attributeY,
        OK,
        SO,
        WELL,
        THIS,
        THIS,
        THIS,
        THIS,
        THIS,
        IS,
        LONG
    )
);
    "#;
    let sf = SourceFile::from_text(Path::new("demo.cc"), raw_text.to_string(), &matcher());
    assert!(!sf.found_functions[0].appears_successful);
}

#[test]
fn call_visitor_rewrite_replaces_in_file_text() {
    let raw_text = "ShowContinueError(s, \nx);";
    let sf = SourceFile::from_text(Path::new("demo.cc"), raw_text.to_string(), &matcher());
    let new_text = sf.text_with_calls_replaced(|call| call.rewrite());
    assert_eq!(new_text, "ShowContinueError(s, x);");
}

#[test]
fn group_visitor_rewrite_replaces_whole_span() {
    let raw_text = "ShowContinueError(s, \nx);";
    let sf = SourceFile::from_text(Path::new("demo.cc"), raw_text.to_string(), &matcher());
    let new_text = sf.text_with_groups_replaced(|group| {
        let first_args = group.function_calls[0].parse_arguments();
        let last_args = group.function_calls[group.len() - 1].parse_arguments();
        let start = first_args[0].chars().next().unwrap();
        let end = last_args[last_args.len() - 1].chars().last().unwrap();
        format!("{start}{end}")
    });
    assert_eq!(new_text, "sx");
}

#[test]
fn folder_finds_matching_files_recursively() {
    let folder = SourceFolder::new(&analysis_root(), ERROR_CALL_FUNCTIONS).unwrap();
    let files = folder.find_files(&[]).unwrap();
    assert_eq!(files.len(), 4);
}

#[test]
fn folder_honors_the_ignore_list() {
    let folder = SourceFolder::new(&analysis_root(), ERROR_CALL_FUNCTIONS).unwrap();
    let files = folder.find_files(&["file_to_ignore.cc".to_string()]).unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| !f.ends_with("file_to_ignore.cc")));
}

#[test]
fn full_workflow_writes_every_report() {
    let out = tempfile::tempdir().unwrap();
    let folder = SourceFolder::new(&analysis_root(), ERROR_CALL_FUNCTIONS).unwrap();
    let files = folder.find_files(&["file_to_ignore.cc".to_string()]).unwrap();
    let processed = folder.analyze(&files).unwrap();
    folder.generate_reports(&processed, out.path()).unwrap();

    for name in ["results.json", "file_summary.csv", "lines_summary.csv", "types_summary.csv"] {
        assert!(out.path().join(name).exists(), "missing report {name}");
    }

    let summary: RunSummary =
        serde_json::from_str(&fs::read_to_string(out.path().join("results.json")).unwrap()).unwrap();
    assert_eq!(summary.files.len(), 3);
    assert!(summary.files.values().all(|f| f.source_hash.starts_with("sha256:")));
    assert_eq!(summary.files["test_file.cc"].groups.len(), 5);

    let file_summary = fs::read_to_string(out.path().join("file_summary.csv")).unwrap();
    assert_eq!(file_summary.lines().count(), 4);
    assert!(file_summary.starts_with("File,Good,Bad"));
}

#[test]
fn reports_create_the_output_directory_when_missing() {
    let out = tempfile::tempdir().unwrap();
    let nested = out.path().join("does").join("not").join("exist");
    let folder = SourceFolder::new(&analysis_root(), ERROR_CALL_FUNCTIONS).unwrap();
    let files = folder.find_files(&[]).unwrap();
    let processed = folder.analyze(&files).unwrap();
    folder.generate_reports(&processed, &nested).unwrap();
    assert!(nested.join("results.json").exists());
}
