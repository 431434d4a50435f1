fn main() {
    println!("cargo:rerun-if-changed=d3d9.def");

    // The export table only matters for the Windows DLL.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let def_file = std::path::Path::new(&manifest_dir).join("d3d9.def");
    let target_env = std::env::var("CARGO_CFG_TARGET_ENV").unwrap();

    match target_env.as_str() {
        "msvc" => {
            println!("cargo:rustc-cdylib-link-arg=/DEF:{}", def_file.display());
        }
        "gnu" => {
            println!("cargo:rustc-cdylib-link-arg={}", def_file.display());
        }
        _ => {}
    }
}
