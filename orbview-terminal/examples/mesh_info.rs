/// Example: Load an OBJ file and print what the loader produced
///
/// Usage: cargo run --example mesh_info -- path/to/file.obj

use std::env;
use std::process::ExitCode;

use orbview_core::{LoadOptions, ObjLoader};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("Usage: mesh_info <obj-file>");
        return ExitCode::FAILURE;
    };

    let mesh = match ObjLoader::new(LoadOptions::default()).load(&path) {
        Ok(mesh) => mesh,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("{path}");
    println!("  vertices:  {}", mesh.vertex_count());
    println!("  triangles: {}", mesh.triangle_count());
    println!("  floats:    {}", mesh.interleaved().len());
    if let Some((min, max)) = mesh.bounds() {
        println!("  bounds:    {:?} .. {:?}", min.coords.as_slice(), max.coords.as_slice());
    }
    ExitCode::SUCCESS
}
