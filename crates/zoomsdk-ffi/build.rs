fn main() {
    uniffi::generate_scaffolding("src/zoomsdk.udl").unwrap();
}
