use std::fs;
use std::path::{Path, PathBuf};

use num_traits::Float;
use rand::{distributions::Uniform, prelude::*};

/// Asserts that two fp numbers are approximately equal.
///
/// # Panics
///
/// Panics if `actual` and `expected` are too far from each other
#[allow(dead_code)]
#[track_caller]
pub fn assert_float_closeness<T: Float + std::fmt::Display>(actual: T, expected: T, epsilon: T) {
    if (actual - expected).abs() >= epsilon {
        panic!(
            "Assertion failed: {actual} too far from expected value {expected} (with epsilon {epsilon})",
        );
    }
}

/// Generate `n` random measurements in `[1e-6, 1.0)`, shaped like timings in
/// seconds
pub fn gen_random_samples(n: usize) -> Vec<f64> {
    let mut rng = thread_rng();
    let uniform_dist = Uniform::new(1e-6, 1.0);
    (0..n).map(|_| uniform_dist.sample(&mut rng)).collect()
}

/// Writes an executable `sh` script named `name` into `dir` and returns its
/// path. `body` is the script without the shebang line.
///
/// # Panics
///
/// Panics if the file cannot be written
#[cfg(unix)]
pub fn write_fake_rider(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
