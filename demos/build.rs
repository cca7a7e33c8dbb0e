// Compile the GLSL sources under shaders/ into SPIR-V next to them.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const SHADER_EXTENSIONS: [&str; 2] = ["vert", "frag"];

/// Prefer the compiler of the Vulkan SDK, fall back to `glslc` on the PATH.
fn find_glslc() -> Option<PathBuf> {

    println!("cargo:rerun-if-env-changed=VULKAN_SDK");

    if let Ok(vulkan_sdk) = env::var("VULKAN_SDK") {
        let glslc = if cfg!(target_os = "windows") {
            Path::new(&vulkan_sdk).join("Bin").join("glslc.exe")
        } else {
            Path::new(&vulkan_sdk).join("bin").join("glslc")
        };
        if glslc.exists() {
            return Some(glslc)
        }
    }

    match Command::new("glslc").arg("--version").output() {
        | Ok(output) if output.status.success() => Some(PathBuf::from("glslc")),
        | _ => None,
    }
}

fn compile_shaders(shader_dir: &Path, glslc: &Path) {

    let entries = match std::fs::read_dir(shader_dir) {
        | Ok(entries) => entries,
        | Err(e) => {
            println!("cargo:warning=Failed to read shader directory {:?}: {}", shader_dir, e);
            return
        },
    };

    for entry in entries.filter_map(Result::ok) {

        let path = entry.path();
        if path.is_dir() {
            compile_shaders(&path, glslc);
            continue
        }

        let is_shader = path.extension()
            .and_then(|extension| extension.to_str())
            .map_or(false, |extension| SHADER_EXTENSIONS.contains(&extension));
        if !is_shader {
            continue
        }

        // triangle.vert -> triangle.vert.spv
        let mut output = path.clone().into_os_string();
        output.push(".spv");
        let output = PathBuf::from(output);

        let is_up_to_date = match (std::fs::metadata(&path), std::fs::metadata(&output)) {
            | (Ok(source), Ok(target)) => match (source.modified(), target.modified()) {
                | (Ok(source), Ok(target)) => source <= target,
                | _ => false,
            },
            | _ => false,
        };
        if is_up_to_date {
            continue
        }

        let status = Command::new(glslc)
            .arg(&path)
            .arg("-o")
            .arg(&output)
            .status();

        match status {
            | Ok(status) if status.success() => {},
            | Ok(status) => panic!("glslc failed for {:?} with exit code {:?}", path, status.code()),
            | Err(e) => panic!("Failed to run glslc for {:?}: {}", path, e),
        }
    }
}

fn main() {

    let shader_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders");
    println!("cargo:rerun-if-changed={}", shader_dir.display());

    if env::var("SKIP_SHADERS").is_ok() {
        return
    }

    match find_glslc() {
        | Some(glslc) => compile_shaders(&shader_dir, &glslc),
        | None => println!("cargo:warning=glslc was not found, compile the shaders by hand (see shaders/README.md)."),
    }
}
