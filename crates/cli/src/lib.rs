//! Library half of `oclc`: the read-file -> compile -> execute pipeline,
//! split out from `main` so integration tests can drive it without
//! shelling out to the built binary.

use std::fs;
use std::path::Path;
use std::time::Instant;

use ocl_compiler::{CompileOutcome, CompilerConfig};
use ocl_vm::Vm;

/// Run one source file end to end. Returns the process exit code; prints
/// diagnostics to stderr on failure and, if `show_time` is set, the
/// elapsed-time report after execution.
pub fn run_file(path: &Path, show_time: bool) -> i32 {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: could not open file '{}': {}", path.display(), e);
            return 1;
        }
    };

    let filename = path.display().to_string();
    run_source(&source, &filename, show_time)
}

/// Same pipeline, source already in memory. Exposed for tests that don't
/// want to round-trip through the filesystem.
pub fn run_source(source: &str, filename: &str, show_time: bool) -> i32 {
    let config = CompilerConfig::default();
    let bytecode = match ocl_compiler::compile_source(source, filename, &config) {
        CompileOutcome::Ok(bc) => bc,
        CompileOutcome::Err(errors) => {
            errors.print_all();
            return 1;
        }
    };

    let mut vm = Vm::new(bytecode);
    let start = show_time.then(Instant::now);
    let exit_code = vm.execute();
    if let Some(start) = start {
        print_elapsed(start.elapsed());
    }
    exit_code
}

fn print_elapsed(elapsed: std::time::Duration) {
    let secs = elapsed.as_secs_f64();
    if secs < 1e-3 {
        eprintln!("\n[time] {:.3} \u{b5}s", secs * 1e6);
    } else if secs < 1.0 {
        eprintln!("\n[time] {:.3} ms", secs * 1e3);
    } else {
        eprintln!("\n[time] {:.6} s", secs);
    }
}
