fn get_protobuf_codegen_customize_config() -> protobuf_codegen::Customize {
    protobuf_codegen::Customize::default()
        .generate_accessors(true)
        .gen_mod_rs(true)
        .lite_runtime(true)
}

fn main() {
    // Always rerun if the build script itself changes.
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=proto/ddsketch.proto");

    // We use the pure Rust parser so that building this crate doesn't depend on `protoc` being installed.
    protobuf_codegen::Codegen::new()
        .pure()
        .includes(["proto"])
        .inputs(["proto/ddsketch.proto"])
        .cargo_out_dir("protos")
        .customize(get_protobuf_codegen_customize_config())
        .run_from_script();
}
