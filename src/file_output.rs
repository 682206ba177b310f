use crate::CompiledProgram;
use crate::compiler::compiler_errors::CompileError;
use crate::return_file_error;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the `.wasm` and `.wat` artifacts for a compiled source file.
/// They land next to the source unless an output directory is configured.
/// Returns the path of the binary artifact.
pub fn write_artifacts(
    program: &CompiledProgram,
    source_path: &Path,
    output_dir: Option<&Path>,
    wat_only: bool,
) -> Result<PathBuf, CompileError> {
    let stem = match source_path.file_stem() {
        Some(stem) => PathBuf::from(stem),
        None => return_file_error!("No file name in path: {}", source_path.display()),
    };

    let target_dir = match output_dir {
        Some(dir) => dir.to_owned(),
        None => source_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .to_owned(),
    };

    if !target_dir.as_os_str().is_empty() && !target_dir.exists() {
        if let Err(e) = fs::create_dir_all(&target_dir) {
            return_file_error!(
                "Could not create output directory {}: {e}",
                target_dir.display()
            );
        }
    }

    let wat_path = target_dir.join(stem.with_extension("wat"));
    if let Err(e) = fs::write(&wat_path, &program.wat) {
        return_file_error!("Could not write {}: {e}", wat_path.display());
    }

    let wasm_path = target_dir.join(stem.with_extension("wasm"));
    if wat_only {
        return Ok(wat_path);
    }

    if let Err(e) = fs::write(&wasm_path, &program.wasm) {
        return_file_error!("Could not write {}: {e}", wasm_path.display());
    }

    Ok(wasm_path)
}
