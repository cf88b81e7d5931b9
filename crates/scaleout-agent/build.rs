//! Build script for generating the decision-service client
//!
//! Generation only runs with the `proto-gen` feature and a working protoc;
//! the hand-maintained stubs in `decision::proto` are used otherwise.

use std::path::PathBuf;
use std::process::Command;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Re-run if the proto definition changes
    println!("cargo:rerun-if-changed=../../proto/scaleout/v1/decision.proto");

    if std::env::var_os("CARGO_FEATURE_PROTO_GEN").is_none() {
        return Ok(());
    }

    // Check if protoc is available
    let protoc_available =
        std::env::var("PROTOC").is_ok() || Command::new("protoc").arg("--version").output().is_ok();

    if !protoc_available {
        println!("cargo:warning=protoc not found, skipping proto generation");
        println!("cargo:warning=Install protoc or set PROTOC env var to generate proto code");
        return Ok(());
    }

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    tonic_build::configure()
        .build_server(false) // Agent only needs the client
        .build_client(true)
        .out_dir(&out_dir)
        .compile(
            &["../../proto/scaleout/v1/decision.proto"],
            &["../../proto"],
        )?;

    Ok(())
}
