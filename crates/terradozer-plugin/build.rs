fn main() {
    tonic_prost_build::configure()
        .build_server(false)
        .compile_protos(&["proto/plugin.proto"], &["proto"])
        .expect("compile provider plugin protocol");
}
