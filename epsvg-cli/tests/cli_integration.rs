use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TestDir {
    path: PathBuf,
}

impl TestDir {
    fn new(tag: &str) -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let path =
            std::env::temp_dir().join(format!("epsvg_cli_{tag}_{}_{}", std::process::id(), ts));
        fs::create_dir_all(&path).expect("create temp test dir");
        Self { path }
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_epsvg(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_epsvg"))
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("run epsvg")
}

#[test]
fn eval_prints_program_output() {
    let dir = TestDir::new("eval_print");
    let output = run_epsvg(&["-e", "3 4 add =", "-o", "out"], &dir.path);

    assert!(output.status.success(), "process failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "7\n");
    assert!(dir.path.join("out/eval.svg").is_file());
}

#[test]
fn eps_file_becomes_svg_with_page_box() {
    let dir = TestDir::new("eps_file");
    fs::write(
        dir.path.join("box.eps"),
        "%!PS-Adobe-3.0 EPSF-3.0\n\
         %%BoundingBox: 0 0 200 100\n\
         %%EndComments\n\
         1 0 0 setrgbcolor 10 10 50 50 rectfill\n\
         0 0 1 setrgbcolor 2 setlinewidth newpath 0 0 moveto 200 100 lineto stroke\n",
    )
    .expect("write eps");

    let output = run_epsvg(&["box.eps", "-o", "out"], &dir.path);
    assert!(output.status.success(), "process failed: {output:?}");

    let svg = fs::read_to_string(dir.path.join("out/box.svg")).expect("read svg output");
    assert!(svg.contains("<svg"), "{svg}");
    assert!(svg.contains("viewBox=\"0 -100 200 100\""), "{svg}");
    assert!(svg.contains("fill=\"#ff0000\""), "{svg}");
    assert!(svg.contains("stroke=\"#0000ff\""), "{svg}");
}

#[test]
fn each_showpage_writes_a_numbered_file() {
    let dir = TestDir::new("pages");
    let output = run_epsvg(
        &["-e", "0 0 10 10 rectfill showpage 5 5 10 10 rectfill showpage"],
        &dir.path,
    );
    assert!(output.status.success(), "process failed: {output:?}");
    assert!(dir.path.join("eval.1.svg").is_file());
    assert!(dir.path.join("eval.2.svg").is_file());
    assert!(!dir.path.join("eval.3.svg").exists());
}

#[test]
fn bbox_option_overrides_header() {
    let dir = TestDir::new("bbox");
    let output = run_epsvg(
        &["-e", "%%BoundingBox: 0 0 10 10\n0 0 5 5 rectfill", "--bbox", "0 0 30 20"],
        &dir.path,
    );
    assert!(output.status.success(), "process failed: {output:?}");
    let svg = fs::read_to_string(dir.path.join("eval.svg")).expect("read svg output");
    assert!(svg.contains("viewBox=\"0 -20 30 20\""), "{svg}");
}

#[test]
fn run_reads_files_next_to_the_input() {
    let dir = TestDir::new("run");
    fs::write(dir.path.join("lib.ps"), "/greet { (hello) print } def\n").expect("write lib");
    fs::write(dir.path.join("main.ps"), "(lib.ps) run greet\n").expect("write main");

    let output = run_epsvg(&["main.ps"], &dir.path);
    assert!(output.status.success(), "process failed: {output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello");
}

#[test]
fn unhandled_error_is_reported_and_fails() {
    let dir = TestDir::new("error");
    let output = run_epsvg(&["-e", "1 nosuchop"], &dir.path);

    assert_eq!(output.status.code(), Some(1), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("%%[ Error: undefined; OffendingCommand: nosuchop ]%%"),
        "{stdout}"
    );
}

#[test]
fn missing_input_fails() {
    let dir = TestDir::new("missing");
    let output = run_epsvg(&["nope.eps"], &dir.path);
    assert_eq!(output.status.code(), Some(1), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error reading"), "{stderr}");
}
