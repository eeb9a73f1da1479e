use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    use_vendored_protoc()?;
    let well_known = protoc_bin_vendored::include_path()?;

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &[PathBuf::from("proto/polymetis.proto")],
            &[PathBuf::from("proto"), well_known],
        )?;

    println!("cargo:rerun-if-changed=proto/polymetis.proto");

    Ok(())
}

#[expect(unsafe_code, reason = "PROTOC must be exported before prost-build spawns it")]
fn use_vendored_protoc() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_some() {
        return Ok(());
    }
    let protoc = protoc_bin_vendored::protoc_bin_path()?;
    // SAFETY: build scripts run single-threaded; nothing else reads the environment concurrently.
    unsafe { std::env::set_var("PROTOC", protoc) };
    Ok(())
}
