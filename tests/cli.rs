use std::process::Command;

fn fftbench() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fftbench"))
}

#[test]
fn dry_run_prints_rider_commands() {
    let out = fftbench()
        .args(["-w", "build", "--run-type", "efficiency", "-d", "1"])
        .args(["--short", "--dry-run", "--no-plots"])
        .env_remove("FFTBENCH_RIDER")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    let first = stdout.lines().next().unwrap();
    assert!(first.starts_with("build/rocfft-rider -x 8 -y 1 -z 1 -N 10 -b 1 --device 0"));
    assert!(first.ends_with("-o"));
    // 10 + 6 + 4 + 3 sizes, for both precisions
    assert_eq!(stdout.lines().count(), 46);
    assert_eq!(stdout.lines().filter(|l| l.contains("--double")).count(), 23);
}

#[test]
fn rider_name_from_the_environment() {
    let out = fftbench()
        .args(["-w", "build", "--run-type", "efficiency", "-d", "2"])
        .args(["--short", "--dry-run", "--no-plots"])
        .env("FFTBENCH_RIDER", "vkfft-rider")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.lines().all(|l| l.starts_with("build/vkfft-rider ")));
}

#[test]
fn usage_errors_exit_with_status_2() {
    let out = fftbench().args(["-w", "build", "-d", "5"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));

    let out = fftbench()
        .args(["-w", "a", "-w", "b", "-o", "out", "--dry-run"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn missing_rider_exits_with_status_3() {
    let dir = tempfile::tempdir().unwrap();
    let out = fftbench()
        .arg("-w")
        .arg(dir.path())
        .arg("-o")
        .arg(dir.path().join("out"))
        .args(["-d", "1", "--short", "--no-plots"])
        .env_remove("FFTBENCH_RIDER")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unable to find"));
}
