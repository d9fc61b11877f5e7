fn main() {
    // Rerun if the embedded frontend changes
    println!("cargo:rerun-if-changed=frontend/");
}
